//! Structural JSON Schemas and strict validators for the data a GraphQL
//! operation or fragment returns.
//!
//! Given a schema and one document, [`Generator`] produces a [`Shape`]:
//! a JSON Schema of the response data (wire or internal representation of
//! custom scalars) and a [`Validator`] that checks candidate values against
//! the same selection, converting custom scalars in either direction.
pub mod cli;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod generator;
pub mod graph;
pub mod jq_exec;
pub mod path_de;
pub mod shape;
pub mod validator;

pub use codec::{CodecError, FnCodec, ScalarCodec, ScalarCodecs};
pub use error::{Error, Result};
pub use generator::{Dialect, Direction};
pub use graph::{SchemaSource, TypeGraph};
pub use shape::{Generator, Shape};
pub use validator::{Issue, Issues, Mode, Outcome, PathSegment, Validator};
