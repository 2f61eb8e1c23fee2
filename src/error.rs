//! Fatal errors.
//!
//! Everything here aborts the call that produced it: no partial schema, no
//! partial validator. Per-value problems are `validator::Issue`s instead.

/// Configuration and document-shape failures.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The schema input could not be turned into a type graph.
    #[error("invalid schema: {0}")]
    SchemaType(String),

    /// A custom scalar is reachable but no codec was registered for it.
    #[error("no codec registered for custom scalar `{0}`")]
    UnknownScalar(String),

    #[error("unsupported JSON Schema dialect `{0}` (expected `draft-07` or `2020-12`)")]
    UnsupportedDialect(String),

    /// Wrong number or kind of operations/fragments, or the query engine rejected the document.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A composite return type was selected without a selection set.
    #[error("field `{coordinate}` of type `{type_name}` must have a selection of subfields")]
    MissingSelection { coordinate: String, type_name: String },

    #[error("type `{0}` is not defined in the schema or cannot appear in a response")]
    UnknownType(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
