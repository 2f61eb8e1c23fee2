//! Strict runtime validation of JSON values against a selection.
//!
//! The walk mirrors result completion in a GraphQL executor, except that it
//! never coerces and never stops at the first problem: every issue is
//! collected with the path it was found at, and the value is only returned
//! when there are none.
pub mod issue;
pub mod strategy;

use std::fmt;
use std::str::FromStr;

use apollo_compiler::ast::Type;
use apollo_compiler::executable::SelectionSet;
use apollo_compiler::schema::ObjectType;
use serde_json::{Map, Value};

use crate::codec::{ScalarCodecs, describe};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::graph::{OutputType, TYPENAME, TypeGraph};

pub use issue::{Issue, Issues, Outcome, PathSegment};
pub use strategy::{ScalarRef, ScalarStrategy};

static NULL: Value = Value::Null;

/// Direction of a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// wire → wire
    #[default]
    Normalize,
    /// wire → internal
    Deserialize,
    /// internal → wire
    Serialize,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Normalize => f.write_str(strategy::Normalize::NAME),
            Mode::Deserialize => f.write_str(strategy::Deserialize::NAME),
            Mode::Serialize => f.write_str(strategy::Serialize::NAME),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normalize" => Ok(Mode::Normalize),
            "deserialize" => Ok(Mode::Deserialize),
            "serialize" => Ok(Mode::Serialize),
            other => Err(format!("unknown validation mode `{other}`")),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// VALIDATOR
// ————————————————————————————————————————————————————————————————————————————

/// Validator for one document against one type graph and codec set.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    graph: &'a TypeGraph,
    codecs: &'a ScalarCodecs,
    document: &'a Document,
}

impl<'a> Validator<'a> {
    /// Fails with [`Error::UnknownScalar`] when the selection reaches a custom
    /// scalar that has no codec.
    pub fn new(graph: &'a TypeGraph, codecs: &'a ScalarCodecs, document: &'a Document) -> Result<Self> {
        if let Some(missing) = document
            .custom_scalars(graph)
            .into_iter()
            .find(|scalar| !codecs.contains(scalar))
        {
            return Err(Error::UnknownScalar(missing.to_string()));
        }
        Ok(Validator { graph, codecs, document })
    }

    /// Check a wire value; the result is a fresh wire value with only the
    /// selected keys, in selection order.
    pub fn normalize(&self, value: &Value) -> Result<Value, Issues> {
        self.run(&strategy::Normalize, value)
    }

    /// Check a wire value and decode its custom scalars.
    pub fn deserialize(&self, value: &Value) -> Result<Value, Issues> {
        self.run(&strategy::Deserialize, value)
    }

    /// Check an internal value and encode its custom scalars.
    pub fn serialize(&self, value: &Value) -> Result<Value, Issues> {
        self.run(&strategy::Serialize, value)
    }

    pub fn validate(&self, value: &Value, mode: Mode) -> Result<Value, Issues> {
        match mode {
            Mode::Normalize => self.normalize(value),
            Mode::Deserialize => self.deserialize(value),
            Mode::Serialize => self.serialize(value),
        }
    }

    #[tracing::instrument(skip_all, level = "trace", fields(mode = S::NAME))]
    fn run<S: ScalarStrategy>(&self, strategy: &S, value: &Value) -> Result<Value, Issues> {
        let mut execution = Execution {
            graph: self.graph,
            codecs: self.codecs,
            document: self.document,
            strategy,
            issues: Vec::new(),
            path: Vec::new(),
        };
        let output = execution.root(value);
        if execution.issues.is_empty() {
            Ok(output)
        } else {
            tracing::debug!(issues = execution.issues.len(), "value rejected");
            Err(Issues(execution.issues))
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// EXECUTION
// ————————————————————————————————————————————————————————————————————————————

struct Execution<'v, 'a, S> {
    graph: &'a TypeGraph,
    codecs: &'a ScalarCodecs,
    document: &'a Document,
    strategy: &'v S,
    issues: Vec<Issue>,
    path: Vec<PathSegment>,
}

impl<'a, S: ScalarStrategy> Execution<'_, 'a, S> {
    fn issue(&mut self, message: String) {
        self.issues.push(Issue { message, path: self.path.clone() });
    }

    fn root(&mut self, value: &Value) -> Value {
        let graph = self.graph;
        let document = self.document;
        let set = document.root();
        let name = set.ty.as_str();
        if graph.is_abstract(name) {
            return self.abstract_value(name, &[set], value, name);
        }
        match graph.object(name) {
            Ok(object) => self.object_value(object, &[set], value, name, false),
            Err(err) => {
                self.issue(err.to_string());
                Value::Null
            }
        }
    }

    /// Complete `value` against a wrapped type. Missing values arrive as null.
    fn complete(&mut self, ty: &Type, sets: &[&'a SelectionSet], value: &Value, coordinate: &str) -> Value {
        if value.is_null() {
            if ty.is_non_null() {
                let message = match self.path.last() {
                    Some(PathSegment::Index(index)) => format!(
                        "Cannot return null for non-nullable array element of type {} at index {index}",
                        ty.inner_named_type()
                    ),
                    _ => format!("Cannot return null for non-nullable field {coordinate}."),
                };
                self.issue(message);
            }
            return Value::Null;
        }
        match ty {
            Type::Named(name) | Type::NonNullNamed(name) => self.named(name, sets, value, coordinate),
            Type::List(item) | Type::NonNullList(item) => {
                let Value::Array(items) = value else {
                    self.issue(format!("Expected a list for field {coordinate}, found: {}", describe(value)));
                    return Value::Null;
                };
                let mut out = Vec::with_capacity(items.len());
                for (index, element) in items.iter().enumerate() {
                    self.path.push(PathSegment::Index(index));
                    out.push(self.complete(item, sets, element, coordinate));
                    self.path.pop();
                }
                Value::Array(out)
            }
        }
    }

    fn named(&mut self, name: &str, sets: &[&'a SelectionSet], value: &Value, coordinate: &str) -> Value {
        let graph = self.graph;
        let codecs = self.codecs;
        let resolved = match graph.output_type(name) {
            Ok(resolved) => resolved,
            Err(err) => {
                self.issue(err.to_string());
                return Value::Null;
            }
        };
        match resolved {
            OutputType::Builtin(builtin) => self.scalar(ScalarRef::Builtin(builtin), value),
            OutputType::Custom(_) => match codecs.get(name) {
                Some(codec) => self.scalar(ScalarRef::Custom(codec), value),
                None => {
                    self.issue(Error::UnknownScalar(name.to_owned()).to_string());
                    Value::Null
                }
            },
            OutputType::Enum(enum_) => match value.as_str() {
                Some(text) if enum_.values.contains_key(text) => value.clone(),
                _ => {
                    self.issue(format!("Enum \"{name}\" cannot represent value: {}", describe(value)));
                    Value::Null
                }
            },
            OutputType::Object(object) => self.object_value(object, sets, value, coordinate, false),
            OutputType::Abstract(_) => self.abstract_value(name, sets, value, coordinate),
        }
    }

    fn scalar(&mut self, scalar: ScalarRef<'_>, value: &Value) -> Value {
        match self.strategy.resolve_scalar(scalar, value) {
            Ok(resolved) => resolved,
            Err(message) => {
                self.issue(message);
                Value::Null
            }
        }
    }

    /// The value's own `__typename` picks the concrete type.
    fn abstract_value(
        &mut self,
        name: &str,
        sets: &[&'a SelectionSet],
        value: &Value,
        coordinate: &str,
    ) -> Value {
        let graph = self.graph;
        let Some(map) = value.as_object() else {
            self.issue(format!("Expected an object for {coordinate}, found: {}", describe(value)));
            return Value::Null;
        };
        let typename = map.get(TYPENAME).and_then(Value::as_str);
        let resolved = typename.and_then(|typename| {
            graph
                .possible_types(name)
                .into_iter()
                .find(|possible| possible.as_str() == typename)
        });
        let object = match (typename, resolved) {
            (Some(_), Some(possible)) => graph.object(possible),
            (Some(typename), None) => {
                self.issue(format!(
                    "Abstract type \"{name}\" cannot resolve to \"{typename}\" for {coordinate}: not a possible type"
                ));
                return Value::Null;
            }
            (None, _) => {
                self.issue(format!(
                    "Abstract type \"{name}\" must resolve to an object type at runtime for {coordinate}: missing \"{TYPENAME}\""
                ));
                return Value::Null;
            }
        };
        match object {
            Ok(object) => self.object_value(object, sets, value, coordinate, true),
            Err(err) => {
                self.issue(err.to_string());
                Value::Null
            }
        }
    }

    /// Build the output map for a concrete object. Keys the selection does not
    /// ask for are dropped.
    fn object_value(
        &mut self,
        object: &'a ObjectType,
        sets: &[&'a SelectionSet],
        value: &Value,
        coordinate: &str,
        discriminated: bool,
    ) -> Value {
        let graph = self.graph;
        let document = self.document;
        let type_name = object.name.as_str();
        let Some(input) = value.as_object() else {
            self.issue(format!("Expected an object for {coordinate}, found: {}", describe(value)));
            return Value::Null;
        };

        let mut out = Map::new();
        if discriminated {
            out.insert(TYPENAME.to_owned(), Value::from(type_name));
        } else if let Some(given) = input.get(TYPENAME) {
            if given.as_str() != Some(type_name) {
                self.path.push(PathSegment::Key(TYPENAME.to_owned()));
                self.issue(format!("Expected \"{type_name}\", found: {}", describe(given)));
                self.path.pop();
            }
        }

        for (key, fields) in document.collect_fields(graph, type_name, sets) {
            let Some(field) = fields.first() else { continue };
            if field.name.as_str() == TYPENAME {
                out.insert(key.to_string(), Value::from(type_name));
                continue;
            }
            let definition = graph.field(object, &field.name).unwrap_or(&*field.definition);
            let field_coordinate = format!("{type_name}.{}", field.name);
            let sub_sets: Vec<&'a SelectionSet> = fields.iter().map(|&f| &f.selection_set).collect();
            let raw = input.get(key.as_str()).unwrap_or(&NULL);

            self.path.push(PathSegment::Key(key.to_string()));
            let completed = self.complete(&definition.ty, &sub_sets, raw, &field_coordinate);
            self.path.pop();
            out.insert(key.to_string(), completed);
        }
        Value::Object(out)
    }
}
