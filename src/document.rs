//! Query and fragment documents.
//!
//! Wraps `apollo-compiler`'s executable document, picks the one operation or
//! fragment a shape is generated for, and implements the field collection
//! both walkers share.
use std::collections::HashSet;

use apollo_compiler::ExecutableDocument;
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::executable::{Field, Fragment, Operation, Selection, SelectionSet};
use apollo_compiler::validation::Valid;
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::graph::{OutputType, TypeGraph};

/// What a shape is generated for.
#[derive(Debug, Clone)]
pub enum Target {
    Operation(Node<Operation>),
    Fragment(Node<Fragment>),
}

#[derive(Debug, Clone)]
pub struct Document {
    doc: Valid<ExecutableDocument>,
    target: Target,
}

/// Fields sharing one response key, in document order.
pub type FieldGroups<'d> = IndexMap<&'d Name, Vec<&'d Node<Field>>>;

impl Document {
    /// A document with exactly one operation. Fragments it spreads are allowed.
    pub fn operation(graph: &TypeGraph, source: &str) -> Result<Self> {
        let doc = ExecutableDocument::parse_and_validate(graph.schema(), source, "query.graphql")
            .map_err(|invalid| Error::InvalidDocument(invalid.errors.to_string()))?;

        let count = doc.operations.named.len() + usize::from(doc.operations.anonymous.is_some());
        if count != 1 {
            return Err(Error::InvalidDocument(format!(
                "expected exactly one operation in the document, found {count}"
            )));
        }
        let operation = doc
            .operations
            .get(None)
            .map_err(|_| Error::InvalidDocument("cannot select the operation".to_owned()))?
            .clone();

        tracing::debug!(name = ?operation.name, kind = ?operation.operation_type, "selected operation");
        Ok(Document { doc, target: Target::Operation(operation) })
    }

    /// A fragment-only document. `name` picks one when there are several.
    ///
    /// The document is validated like an operation document, except that
    /// fragments are not required to be used by an operation.
    pub fn fragment(graph: &TypeGraph, source: &str, name: Option<&str>) -> Result<Self> {
        let doc = ExecutableDocument::parse(graph.schema(), source, "fragment.graphql")
            .map_err(|invalid| Error::InvalidDocument(invalid.errors.to_string()))?;

        if doc.operations.anonymous.is_some() || !doc.operations.named.is_empty() {
            return Err(Error::InvalidDocument(
                "fragment documents must not contain operations".to_owned(),
            ));
        }
        check_spreads(&doc)?;

        let doc = match doc.validate(graph.schema()) {
            Ok(valid) => valid,
            Err(invalid) => {
                let errors: Vec<String> = invalid
                    .errors
                    .iter()
                    .map(|diagnostic| diagnostic.to_string())
                    .filter(|message| !message.contains(UNUSED_FRAGMENT))
                    .collect();
                if !errors.is_empty() {
                    return Err(Error::InvalidDocument(errors.join("\n")));
                }
                Valid::assume_valid(invalid.partial)
            }
        };

        let fragment = match name {
            Some(name) => doc.fragments.get(name).cloned().ok_or_else(|| {
                Error::InvalidDocument(format!("no fragment named `{name}` in the document"))
            })?,
            None => {
                let mut fragments = doc.fragments.values();
                match (fragments.next(), fragments.next()) {
                    (Some(only), None) => only.clone(),
                    (None, _) => {
                        return Err(Error::InvalidDocument(
                            "expected a fragment in the document, found none".to_owned(),
                        ));
                    }
                    (Some(_), Some(_)) => {
                        return Err(Error::InvalidDocument(format!(
                            "the document has {} fragments, name the one to use",
                            doc.fragments.len()
                        )));
                    }
                }
            }
        };

        tracing::debug!(name = %fragment.name, "selected fragment");
        Ok(Document { doc, target: Target::Fragment(fragment) })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Root type name and selection.
    pub fn root(&self) -> &SelectionSet {
        match &self.target {
            Target::Operation(operation) => &operation.selection_set,
            Target::Fragment(fragment) => &fragment.selection_set,
        }
    }

    pub fn fragment_def(&self, name: &str) -> Result<&Node<Fragment>> {
        self.doc
            .fragments
            .get(name)
            .ok_or_else(|| Error::InvalidDocument(format!("unknown fragment `{name}`")))
    }

    /// Group the fields of `sets` that apply to the concrete type `object`
    /// by response key, descending into matching fragments.
    pub fn collect_fields<'d>(
        &'d self,
        graph: &TypeGraph,
        object: &str,
        sets: &[&'d SelectionSet],
    ) -> FieldGroups<'d> {
        let mut groups = FieldGroups::new();
        let mut visited = HashSet::new();
        for set in sets {
            self.collect_into(graph, object, set, &mut groups, &mut visited);
        }
        groups
    }

    fn collect_into<'d>(
        &'d self,
        graph: &TypeGraph,
        object: &str,
        set: &'d SelectionSet,
        groups: &mut FieldGroups<'d>,
        visited: &mut HashSet<&'d str>,
    ) {
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => {
                    groups.entry(field.response_key()).or_default().push(field);
                }
                Selection::InlineFragment(inline) => {
                    let applies = inline
                        .type_condition
                        .as_ref()
                        .is_none_or(|condition| graph.fragment_applies(condition, object));
                    if applies {
                        self.collect_into(graph, object, &inline.selection_set, groups, visited);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if !visited.insert(spread.fragment_name.as_str()) {
                        continue;
                    }
                    // both constructors reject undefined spreads
                    let Some(fragment) = self.doc.fragments.get(&spread.fragment_name) else {
                        tracing::error!(fragment = %spread.fragment_name, "spread of an undefined fragment");
                        continue;
                    };
                    if graph.fragment_applies(&fragment.selection_set.ty, object) {
                        self.collect_into(graph, object, &fragment.selection_set, groups, visited);
                    }
                }
            }
        }
    }

    /// Custom scalars reachable from the target selection.
    pub fn custom_scalars<'g>(&self, graph: &'g TypeGraph) -> Vec<&'g Name> {
        let mut found: Vec<&'g Name> = Vec::new();
        let mut visited = HashSet::new();
        self.scalars_in(graph, self.root(), &mut found, &mut visited);
        found
    }

    fn scalars_in<'g>(
        &self,
        graph: &'g TypeGraph,
        set: &SelectionSet,
        found: &mut Vec<&'g Name>,
        visited: &mut HashSet<Name>,
    ) {
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => {
                    let named = field.definition.ty.inner_named_type();
                    if let Ok(OutputType::Custom(scalar)) = graph.output_type(named) {
                        if !found.contains(&&scalar.name) {
                            found.push(&scalar.name);
                        }
                    }
                    self.scalars_in(graph, &field.selection_set, found, visited);
                }
                Selection::InlineFragment(inline) => {
                    self.scalars_in(graph, &inline.selection_set, found, visited);
                }
                Selection::FragmentSpread(spread) => {
                    if visited.insert(spread.fragment_name.clone()) {
                        if let Some(fragment) = self.doc.fragments.get(&spread.fragment_name) {
                            self.scalars_in(graph, &fragment.selection_set, found, visited);
                        }
                    }
                }
            }
        }
    }
}

/// Validation diagnostic for a fragment no operation spreads.
const UNUSED_FRAGMENT: &str = "must be used in an operation";

/// Every spread names a defined fragment and no fragment spreads itself,
/// directly or through others.
fn check_spreads(doc: &ExecutableDocument) -> Result<()> {
    let mut done = HashSet::new();
    for name in doc.fragments.keys() {
        visit_fragment(doc, name, &mut Vec::new(), &mut done)?;
    }
    Ok(())
}

fn visit_fragment<'d>(
    doc: &'d ExecutableDocument,
    name: &'d Name,
    stack: &mut Vec<&'d Name>,
    done: &mut HashSet<&'d Name>,
) -> Result<()> {
    if done.contains(name) {
        return Ok(());
    }
    if let Some(start) = stack.iter().position(|active| *active == name) {
        let cycle: Vec<&str> = stack[start..].iter().map(|name| name.as_str()).collect();
        return Err(Error::InvalidDocument(format!(
            "fragment `{name}` spreads itself ({} -> {name})",
            cycle.join(" -> ")
        )));
    }
    let fragment = doc
        .fragments
        .get(name)
        .ok_or_else(|| Error::InvalidDocument(format!("unknown fragment `{name}`")))?;

    let mut spreads = Vec::new();
    spreads_in(&fragment.selection_set, &mut spreads);
    stack.push(name);
    for spread in spreads {
        visit_fragment(doc, spread, stack, done)?;
    }
    stack.pop();
    done.insert(name);
    Ok(())
}

fn spreads_in<'d>(set: &'d SelectionSet, into: &mut Vec<&'d Name>) {
    for selection in &set.selections {
        match selection {
            Selection::Field(field) => spreads_in(&field.selection_set, into),
            Selection::InlineFragment(inline) => spreads_in(&inline.selection_set, into),
            Selection::FragmentSpread(spread) => into.push(&spread.fragment_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDL: &str = r#"
        scalar DateTime
        type Query { favourite: Favourite hello: String! friend: Friend }
        type Friend { name: String! friends: [Friend!]! }
        type Color { hex: String! seen: DateTime }
        type Book { author: String! }
        union Favourite = Color | Book
    "#;

    fn graph() -> TypeGraph {
        TypeGraph::load(SDL).unwrap()
    }

    #[test]
    fn operation_documents_need_exactly_one_operation() {
        let graph = graph();
        assert!(Document::operation(&graph, "{ hello }").is_ok());
        let err = Document::operation(&graph, "query A { hello } query B { hello }").unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(message) if message.contains("found 2")));
        let err = Document::operation(&graph, "fragment F on Book { author }").unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn fragment_documents_need_one_fragment_or_a_name() {
        let graph = graph();
        let source = "fragment A on Book { author } fragment B on Color { hex }";
        let err = Document::fragment(&graph, source, None).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(message) if message.contains("name the one")));
        let doc = Document::fragment(&graph, source, Some("B")).unwrap();
        assert_eq!(doc.root().ty.as_str(), "Color");
        assert!(Document::fragment(&graph, source, Some("C")).is_err());
        assert!(Document::fragment(&graph, "{ hello }", None).is_err());
    }

    #[test]
    fn fragment_documents_reject_cycles() {
        let graph = graph();
        let err = Document::fragment(&graph, "fragment F on Friend { name friends { ...F } }", None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(message) if message.contains("fragment `F` spreads itself")));

        let source = "fragment A on Friend { friends { ...B } } fragment B on Friend { name ...A }";
        let err = Document::fragment(&graph, source, Some("A")).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(message) if message.contains("A -> B -> A")));
    }

    #[test]
    fn fragment_documents_reject_undefined_spreads() {
        let graph = graph();
        let err = Document::fragment(&graph, "fragment F on Book { author ...Missing }", None).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(message) if message.contains("unknown fragment `Missing`")));
    }

    #[test]
    fn fragment_documents_are_validated() {
        let graph = graph();
        // composite field without a selection
        let err = Document::fragment(&graph, "fragment F on Friend { friends }", None).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
        // leaf field with a selection
        let err = Document::fragment(&graph, "fragment F on Book { author { x } }", None).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
        // spreads between fragments of the same document are fine
        let source = "fragment A on Friend { name friends { ...B } } fragment B on Friend { name }";
        let doc = Document::fragment(&graph, source, Some("A")).unwrap();
        assert!(doc.fragment_def("B").is_ok());
    }

    #[test]
    fn collect_fields_filters_by_concrete_type() {
        let graph = graph();
        let doc = Document::operation(
            &graph,
            "{ favourite { __typename ... on Color { hex } ...BookFields } } fragment BookFields on Book { author }",
        )
        .unwrap();
        let Some(Selection::Field(favourite)) = doc.root().selections.first() else {
            panic!("expected a field");
        };
        let sets = [&favourite.selection_set];
        let book: Vec<&str> =
            doc.collect_fields(&graph, "Book", &sets).keys().map(|k| k.as_str()).collect();
        assert_eq!(book, ["__typename", "author"]);
        let color: Vec<&str> =
            doc.collect_fields(&graph, "Color", &sets).keys().map(|k| k.as_str()).collect();
        assert_eq!(color, ["__typename", "hex"]);
    }

    #[test]
    fn custom_scalars_are_found_through_fragments() {
        let graph = graph();
        let doc = Document::operation(
            &graph,
            "{ favourite { ...ColorFields } } fragment ColorFields on Color { seen }",
        )
        .unwrap();
        let names: Vec<&str> = doc.custom_scalars(&graph).iter().map(|n| n.as_str()).collect();
        assert_eq!(names, ["DateTime"]);
    }
}
