//! Read-only view of the schema's type graph.
//!
//! Parsing and static validation of SDL is delegated to `apollo-compiler`;
//! this module only answers the three questions the walkers need:
//! what is this named type, which concrete types can an abstract type
//! resolve to, and does a fragment's type condition cover a given type.
use apollo_compiler::Name;
use apollo_compiler::Schema;
use apollo_compiler::schema::EnumType;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::FieldDefinition;
use apollo_compiler::schema::ObjectType;
use apollo_compiler::schema::ScalarType;
use apollo_compiler::validation::Valid;

use crate::error::{Error, Result};

pub const TYPENAME: &str = "__typename";

// ————————————————————————————————————————————————————————————————————————————
// SOURCES
// ————————————————————————————————————————————————————————————————————————————

/// Anything a type graph can be built from.
#[derive(Debug, Clone)]
pub enum SchemaSource {
    /// SDL text, parsed and validated on load.
    Sdl(String),
    /// A parsed schema that still needs validation.
    Parsed(Schema),
    Valid(Valid<Schema>),
}

impl From<&str> for SchemaSource {
    fn from(sdl: &str) -> Self { SchemaSource::Sdl(sdl.to_owned()) }
}

impl From<String> for SchemaSource {
    fn from(sdl: String) -> Self { SchemaSource::Sdl(sdl) }
}

impl From<Schema> for SchemaSource {
    fn from(schema: Schema) -> Self { SchemaSource::Parsed(schema) }
}

impl From<Valid<Schema>> for SchemaSource {
    fn from(schema: Valid<Schema>) -> Self { SchemaSource::Valid(schema) }
}

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// The five scalars every schema has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinScalar {
    String,
    Int,
    Float,
    Boolean,
    Id,
}

impl BuiltinScalar {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "String" => Some(Self::String),
            "Int" => Some(Self::Int),
            "Float" => Some(Self::Float),
            "Boolean" => Some(Self::Boolean),
            "ID" => Some(Self::Id),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Id => "ID",
        }
    }
}

/// A named output type, resolved.
#[derive(Debug, Clone, Copy)]
pub enum OutputType<'a> {
    Builtin(BuiltinScalar),
    Custom(&'a ScalarType),
    Enum(&'a EnumType),
    Object(&'a ObjectType),
    /// Interface or union.
    Abstract(&'a ExtendedType),
}

#[derive(Debug, Clone)]
pub struct TypeGraph {
    schema: Valid<Schema>,
}

impl TypeGraph {
    pub fn load(source: impl Into<SchemaSource>) -> Result<Self> {
        let schema = match source.into() {
            SchemaSource::Sdl(sdl) => Schema::parse_and_validate(sdl, "schema.graphql")
                .map_err(|invalid| Error::SchemaType(invalid.errors.to_string()))?,
            SchemaSource::Parsed(schema) => schema
                .validate()
                .map_err(|invalid| Error::SchemaType(invalid.errors.to_string()))?,
            SchemaSource::Valid(schema) => schema,
        };
        tracing::debug!(types = schema.types.len(), "loaded type graph");
        Ok(Self { schema })
    }

    pub fn schema(&self) -> &Valid<Schema> {
        &self.schema
    }

    pub fn output_type(&self, name: &str) -> Result<OutputType<'_>> {
        if let Some(builtin) = BuiltinScalar::from_name(name) {
            return Ok(OutputType::Builtin(builtin));
        }
        match self.schema.types.get(name) {
            Some(ExtendedType::Scalar(scalar)) => Ok(OutputType::Custom(scalar)),
            Some(ExtendedType::Enum(enum_)) => Ok(OutputType::Enum(enum_)),
            Some(ExtendedType::Object(object)) => Ok(OutputType::Object(object)),
            Some(ty @ (ExtendedType::Interface(_) | ExtendedType::Union(_))) => {
                Ok(OutputType::Abstract(ty))
            }
            Some(ExtendedType::InputObject(_)) | None => Err(Error::UnknownType(name.to_owned())),
        }
    }

    pub fn object(&self, name: &str) -> Result<&ObjectType> {
        match self.schema.types.get(name) {
            Some(ExtendedType::Object(object)) => Ok(&**object),
            _ => Err(Error::UnknownType(name.to_owned())),
        }
    }

    pub fn is_abstract(&self, name: &str) -> bool {
        matches!(
            self.schema.types.get(name),
            Some(ExtendedType::Interface(_) | ExtendedType::Union(_))
        )
    }

    /// Concrete object types an abstract type can resolve to, in schema order.
    ///
    /// Union members keep their declared order; interface implementers follow
    /// type definition order.
    pub fn possible_types(&self, abstract_type: &str) -> Vec<&Name> {
        match self.schema.types.get(abstract_type) {
            Some(ExtendedType::Union(union_)) => {
                union_.members.iter().map(|member| &member.name).collect()
            }
            Some(ExtendedType::Interface(_)) => self
                .schema
                .types
                .iter()
                .filter_map(|(name, ty)| match ty {
                    ExtendedType::Object(object)
                        if object
                            .implements_interfaces
                            .iter()
                            .any(|i| i.name.as_str() == abstract_type) =>
                    {
                        Some(name)
                    }
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// `true` when `maybe_subtype` implements, or is a member of, `abstract_type`.
    pub fn is_subtype(&self, abstract_type: &str, maybe_subtype: &str) -> bool {
        match self.schema.types.get(abstract_type) {
            Some(ExtendedType::Union(union_)) => union_
                .members
                .iter()
                .any(|member| member.name.as_str() == maybe_subtype),
            Some(ExtendedType::Interface(_)) => {
                let implements = match self.schema.types.get(maybe_subtype) {
                    Some(ExtendedType::Object(object)) => &object.implements_interfaces,
                    Some(ExtendedType::Interface(interface)) => &interface.implements_interfaces,
                    _ => return false,
                };
                implements.iter().any(|i| i.name.as_str() == abstract_type)
            }
            _ => false,
        }
    }

    /// Whether a fragment with `type_condition` applies to values of the concrete type `object`.
    pub fn fragment_applies(&self, type_condition: &str, object: &str) -> bool {
        type_condition == object || self.is_subtype(type_condition, object)
    }

    /// Field definition as declared on the concrete type.
    pub fn field<'a>(&'a self, object: &'a ObjectType, field: &str) -> Option<&'a FieldDefinition> {
        object.fields.get(field).map(|component| &*component.node)
    }
}
