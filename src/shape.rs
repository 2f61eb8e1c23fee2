//! Entry points: a [`Generator`] owns the configuration, a [`Shape`] is one
//! document resolved against it.
//!
//! ```no_run
//! use gql_osi::{Dialect, Direction, Generator, ScalarCodecs};
//! use gql_osi::codec::DateTimeCodec;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let codecs = ScalarCodecs::new().with("DateTime", DateTimeCodec);
//! let generator = Generator::new("scalar DateTime type Query { now: DateTime! }", codecs)?;
//! let shape = generator.operation("{ now }")?;
//! let schema = shape.json_schema(Direction::Wire, Dialect::Draft2020_12)?;
//! let value = shape.validator()?.deserialize(&serde_json::json!({ "now": "2024-01-01T00:00:00Z" }))?;
//! # Ok(()) }
//! ```
use serde_json::Value;

use crate::codec::ScalarCodecs;
use crate::document::{Document, Target};
use crate::error::Result;
use crate::generator::{self, Dialect, Direction};
use crate::graph::{SchemaSource, TypeGraph};
use crate::validator::Validator;

/// Type graph plus codec registry.
///
/// Configuration only changes through the `replace_*` methods, which take
/// `&mut self`: no [`Shape`] borrowed from the old configuration can outlive
/// the replacement.
#[derive(Debug, Clone)]
pub struct Generator {
    graph: TypeGraph,
    codecs: ScalarCodecs,
}

impl Generator {
    pub fn new(schema: impl Into<SchemaSource>, codecs: ScalarCodecs) -> Result<Self> {
        Ok(Generator { graph: TypeGraph::load(schema)?, codecs })
    }

    /// Swap the schema. On error the previous schema stays in place.
    pub fn replace_schema(&mut self, schema: impl Into<SchemaSource>) -> Result<()> {
        self.graph = TypeGraph::load(schema)?;
        Ok(())
    }

    /// Swap the codec registry, returning the previous one.
    pub fn replace_codecs(&mut self, codecs: ScalarCodecs) -> ScalarCodecs {
        std::mem::replace(&mut self.codecs, codecs)
    }

    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    pub fn codecs(&self) -> &ScalarCodecs {
        &self.codecs
    }

    /// Shape of a document holding exactly one operation.
    pub fn operation(&self, source: &str) -> Result<Shape<'_>> {
        let document = Document::operation(&self.graph, source)?;
        Ok(Shape { generator: self, document })
    }

    /// Shape of a fragment document. `name` is required when it defines more
    /// than one fragment.
    pub fn fragment(&self, source: &str, name: Option<&str>) -> Result<Shape<'_>> {
        let document = Document::fragment(&self.graph, source, name)?;
        Ok(Shape { generator: self, document })
    }
}

/// A document resolved against a [`Generator`].
#[derive(Debug, Clone)]
pub struct Shape<'g> {
    generator: &'g Generator,
    document: Document,
}

impl<'g> Shape<'g> {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn target(&self) -> &Target {
        self.document.target()
    }

    /// Generated fresh on every call.
    pub fn json_schema(&self, direction: Direction, dialect: Dialect) -> Result<Value> {
        generator::json_schema(
            &self.generator.graph,
            &self.generator.codecs,
            &self.document,
            direction,
            dialect,
        )
    }

    pub fn validator(&self) -> Result<Validator<'_>> {
        Validator::new(&self.generator.graph, &self.generator.codecs, &self.document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    #[test]
    fn replace_schema_keeps_old_graph_on_error() {
        let mut generator = Generator::new("type Query { a: Int }", ScalarCodecs::new()).unwrap();
        assert!(generator.replace_schema("type Query { a: Missing }").is_err());
        assert!(generator.operation("{ a }").is_ok());
        generator.replace_schema("type Query { b: Int }").unwrap();
        assert!(generator.operation("{ a }").is_err());
        assert!(generator.operation("{ b }").is_ok());
    }

    #[test]
    fn replaced_codecs_apply_to_new_shapes() {
        let sdl = "scalar Money type Query { price: Money! }";
        let mut generator = Generator::new(sdl, ScalarCodecs::new()).unwrap();
        let err = generator.operation("{ price }").unwrap().validator().unwrap_err();
        assert!(matches!(err, Error::UnknownScalar(name) if name == "Money"));

        let previous = generator.replace_codecs(
            ScalarCodecs::new().with("Money", crate::codec::JsonKindCodec::integer()),
        );
        assert!(previous.is_empty());
        let shape = generator.operation("{ price }").unwrap();
        assert_eq!(shape.validator().unwrap().normalize(&json!({ "price": 5 })).unwrap(), json!({ "price": 5 }));
    }
}
