//! Structural schema generation.
//!
//! Walks the type graph and a selection set together and produces the JSON
//! Schema of the data that selection returns:
//!
//! - `T!` strips the null alternative, everything else gains one.
//! - `[T]` becomes an array whose items are generated against the same selection.
//! - Built-in scalars are inline primitives; custom scalars and enums are
//!   registered once in the definitions registry and referenced.
//! - Objects become required-property maps keyed by response key; applicable
//!   fragments are composed with `allOf`, each part titled with its fragment.
//! - Interfaces and unions become a `oneOf` with one object per possible type,
//!   each always exposing a `__typename` constant.
//!
//! Generation is fail-fast: any error aborts the whole pass.
pub mod defs;
pub mod dialect;
pub mod ir;

use std::fmt;
use std::str::FromStr;

use apollo_compiler::Name;
use apollo_compiler::ast::Type;
use apollo_compiler::executable::{Selection, SelectionSet};
use apollo_compiler::schema::ObjectType;
use serde_json::{Map, Value};

use crate::codec::ScalarCodecs;
use crate::document::{Document, FieldGroups};
use crate::error::{Error, Result};
use crate::graph::{BuiltinScalar, OutputType, TYPENAME, TypeGraph};

pub use defs::{DefKind, Definitions};
pub use dialect::Dialect;
pub use ir::{Object, Ty};

/// Which representation of custom scalars a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// what travels over the network
    #[default]
    Wire,
    /// what application code holds after deserializing
    Internal,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Wire => f.write_str("wire"),
            Direction::Internal => f.write_str("internal"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "wire" => Ok(Direction::Wire),
            "internal" => Ok(Direction::Internal),
            other => Err(format!("unknown direction `{other}` (expected wire or internal)")),
        }
    }
}

/// `Int` is a signed 32-bit integer.
const INT_RANGE: (i64, i64) = (i32::MIN as i64, i32::MAX as i64);

// ————————————————————————————————————————————————————————————————————————————
// ENTRY
// ————————————————————————————————————————————————————————————————————————————

/// Generate the full JSON Schema document for `document`'s target.
#[tracing::instrument(skip_all, level = "trace", fields(%direction, %dialect))]
pub fn json_schema(
    graph: &TypeGraph,
    codecs: &ScalarCodecs,
    document: &Document,
    direction: Direction,
    dialect: Dialect,
) -> Result<Value> {
    let mut walker = SchemaWalker::new(graph, codecs, document, direction);
    let root = walker.root()?;
    let defs = walker.into_definitions();
    tracing::debug!(defs_empty = defs.is_empty(), "generated structural schema");
    Ok(assemble(&root, defs, dialect))
}

/// Root schema: `$schema`, then the root node, then the registry.
pub fn assemble(root: &Ty, defs: Definitions, dialect: Dialect) -> Value {
    let mut map = Map::new();
    map.insert("$schema".into(), Value::from(dialect.uri()));
    if let Value::Object(body) = ir::render(root, dialect) {
        map.extend(body);
    }
    if !defs.is_empty() {
        map.insert(dialect.defs_keyword().into(), defs.into_json());
    }
    Value::Object(map)
}

// ————————————————————————————————————————————————————————————————————————————
// WALKER
// ————————————————————————————————————————————————————————————————————————————

pub struct SchemaWalker<'a> {
    graph: &'a TypeGraph,
    codecs: &'a ScalarCodecs,
    document: &'a Document,
    direction: Direction,
    defs: Definitions,
    /// named fragments being expanded, innermost last
    active: Vec<Name>,
}

impl<'a> SchemaWalker<'a> {
    pub fn new(
        graph: &'a TypeGraph,
        codecs: &'a ScalarCodecs,
        document: &'a Document,
        direction: Direction,
    ) -> Self {
        SchemaWalker { graph, codecs, document, direction, defs: Definitions::default(), active: Vec::new() }
    }

    pub fn into_definitions(self) -> Definitions {
        self.defs
    }

    /// Node for the document's target: the operation's root type, or the
    /// fragment's type condition. Never nullable.
    pub fn root(&mut self) -> Result<Ty> {
        let graph = self.graph;
        let document = self.document;
        let set = document.root();
        let name = set.ty.as_str();
        if graph.is_abstract(name) {
            self.abstract_ty(name, &[set])
        } else {
            let object = graph.object(name)?;
            self.object_ty(object, &[set], false)
        }
    }

    /// Node for a wrapped type reference. `sets` holds the selections of
    /// every field merged under one response key.
    pub fn generate(&mut self, ty: &Type, sets: &[&SelectionSet], coordinate: &str) -> Result<Ty> {
        Ok(match ty {
            Type::NonNullNamed(name) => self.named(name, sets, coordinate)?,
            Type::Named(name) => self.named(name, sets, coordinate)?.nullable(),
            Type::NonNullList(item) => Ty::Array(Box::new(self.generate(item, sets, coordinate)?)),
            Type::List(item) => {
                Ty::Array(Box::new(self.generate(item, sets, coordinate)?)).nullable()
            }
        })
    }

    fn named(&mut self, name: &str, sets: &[&SelectionSet], coordinate: &str) -> Result<Ty> {
        let graph = self.graph;
        match graph.output_type(name)? {
            OutputType::Builtin(builtin) => Ok(builtin_ty(builtin)),
            OutputType::Custom(scalar) => {
                let codec = self
                    .codecs
                    .get(name)
                    .ok_or_else(|| Error::UnknownScalar(name.to_owned()))?;
                let direction = self.direction;
                let key = self.defs.ensure(DefKind::Scalar, name, || {
                    let fragment = match direction {
                        Direction::Wire => codec.wire_schema(),
                        Direction::Internal => codec.internal_schema(),
                    };
                    defs::documented(fragment, name, scalar.description.as_deref())
                });
                Ok(Ty::Ref(key))
            }
            OutputType::Enum(enum_) => {
                let key = self.defs.ensure(DefKind::Enum, name, || {
                    let values: Vec<Value> =
                        enum_.values.keys().map(|value| Value::from(value.as_str())).collect();
                    let mut map = Map::new();
                    map.insert("title".into(), Value::from(name));
                    if let Some(description) = enum_.description.as_deref() {
                        map.insert("description".into(), Value::from(description));
                    }
                    map.insert("type".into(), Value::from("string"));
                    map.insert("enum".into(), Value::Array(values));
                    Value::Object(map)
                });
                Ok(Ty::Ref(key))
            }
            OutputType::Object(object) => {
                require_selection(sets, coordinate, name)?;
                self.object_ty(object, sets, false)
            }
            OutputType::Abstract(_) => {
                require_selection(sets, coordinate, name)?;
                self.abstract_ty(name, sets)
            }
        }
    }

    /// One branch per possible type; a branch no selection applies to still
    /// carries its discriminator.
    fn abstract_ty(&mut self, name: &str, sets: &[&SelectionSet]) -> Result<Ty> {
        let graph = self.graph;
        let mut arms = Vec::new();
        for possible in graph.possible_types(name) {
            let object = graph.object(possible)?;
            arms.push(self.object_ty(object, sets, true)?);
        }
        Ok(Ty::OneOf(arms))
    }

    fn object_ty(&mut self, object: &ObjectType, sets: &[&SelectionSet], discriminated: bool) -> Result<Ty> {
        let type_name = object.name.as_str();
        let mut base = Object::titled(type_name, object.description.as_deref());
        if discriminated {
            base.properties.insert(TYPENAME.to_owned(), Ty::Const(type_name.to_owned()));
        }
        let parts = self.selections_into(object, sets, &mut base)?;
        Ok(if parts.is_empty() { Ty::Object(base) } else { Ty::Composed { base, parts } })
    }

    /// Fields go into `into`, one property per response key; each applicable
    /// fragment becomes its own part.
    fn selections_into(
        &mut self,
        object: &ObjectType,
        sets: &[&SelectionSet],
        into: &mut Object,
    ) -> Result<Vec<Object>> {
        let graph = self.graph;
        let document = self.document;
        let type_name = object.name.as_str();
        let mut fields: FieldGroups<'_> = FieldGroups::new();
        let mut parts = Vec::new();
        for selection in sets.iter().copied().flat_map(|set| &set.selections) {
            match selection {
                Selection::Field(field) => {
                    fields.entry(field.response_key()).or_default().push(field);
                }
                Selection::InlineFragment(inline) => {
                    let applies = inline
                        .type_condition
                        .as_ref()
                        .is_none_or(|condition| graph.fragment_applies(condition, type_name));
                    if applies {
                        let mut part = Object::default();
                        let nested = self.selections_into(object, &[&inline.selection_set], &mut part)?;
                        if !part.properties.is_empty() {
                            parts.push(part);
                        }
                        parts.extend(nested);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let fragment = document.fragment_def(&spread.fragment_name)?;
                    if !graph.fragment_applies(&fragment.selection_set.ty, type_name) {
                        continue;
                    }
                    if self.active.contains(&fragment.name) {
                        return Err(Error::InvalidDocument(format!(
                            "fragment `{}` spreads itself",
                            fragment.name
                        )));
                    }
                    self.active.push(fragment.name.clone());
                    let mut part = Object::titled(fragment.name.as_str(), None);
                    let nested = self.selections_into(object, &[&fragment.selection_set], &mut part)?;
                    self.active.pop();
                    parts.push(part);
                    parts.extend(nested);
                }
            }
        }

        for (key, group) in fields {
            let Some(field) = group.first() else { continue };
            if field.name.as_str() == TYPENAME {
                into.properties.insert(key.to_string(), Ty::Const(type_name.to_owned()));
                continue;
            }
            // the concrete type may narrow the return type of an interface field
            let definition = graph.field(object, &field.name).unwrap_or(&*field.definition);
            let coordinate = format!("{type_name}.{}", field.name);
            let sub_sets: Vec<&SelectionSet> = group.iter().map(|&f| &f.selection_set).collect();
            let ty = self.generate(&definition.ty, &sub_sets, &coordinate)?;
            into.properties.insert(key.to_string(), ty);
        }
        Ok(parts)
    }
}

fn builtin_ty(builtin: BuiltinScalar) -> Ty {
    match builtin {
        BuiltinScalar::String | BuiltinScalar::Id => Ty::String,
        BuiltinScalar::Int => Ty::Integer { min: Some(INT_RANGE.0), max: Some(INT_RANGE.1) },
        BuiltinScalar::Float => Ty::Number,
        BuiltinScalar::Boolean => Ty::Bool,
    }
}

fn require_selection(sets: &[&SelectionSet], coordinate: &str, type_name: &str) -> Result<()> {
    if sets.iter().all(|set| set.selections.is_empty()) {
        return Err(Error::MissingSelection {
            coordinate: coordinate.to_owned(),
            type_name: type_name.to_owned(),
        });
    }
    Ok(())
}
