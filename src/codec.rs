//! Custom scalar codecs.
//!
//! A codec converts a custom scalar between its wire form (what travels in a
//! response) and its internal form (what application code holds), and
//! describes both forms as JSON Schema fragments for the generator.
pub mod builtin;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

pub use builtin::{CodecKind, DateTimeCodec, JsonKindCodec};

/// Conversion failure. The message is reported to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CodecError(pub String);

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        CodecError(message.into())
    }
}

/// Both directions must be total-or-fail: never hand back a sentinel for a
/// value they could not convert.
pub trait ScalarCodec: Send + Sync {
    /// wire → internal
    fn deserialize(&self, wire: &Value) -> Result<Value, CodecError>;
    /// internal → wire
    fn serialize(&self, internal: &Value) -> Result<Value, CodecError>;
    fn wire_schema(&self) -> Value;
    fn internal_schema(&self) -> Value;
}

type Convert = dyn Fn(&Value) -> Result<Value, CodecError> + Send + Sync;

/// Codec assembled from two closures.
pub struct FnCodec {
    deserialize: Box<Convert>,
    serialize: Box<Convert>,
    wire_schema: Value,
    internal_schema: Value,
}

impl FnCodec {
    /// Both schema fragments default to `{}` (accept anything).
    pub fn new<D, S>(deserialize: D, serialize: S) -> Self
    where
        D: Fn(&Value) -> Result<Value, CodecError> + Send + Sync + 'static,
        S: Fn(&Value) -> Result<Value, CodecError> + Send + Sync + 'static,
    {
        FnCodec {
            deserialize: Box::new(deserialize),
            serialize: Box::new(serialize),
            wire_schema: Value::Object(Default::default()),
            internal_schema: Value::Object(Default::default()),
        }
    }

    pub fn with_wire_schema(mut self, schema: Value) -> Self {
        self.wire_schema = schema;
        self
    }

    pub fn with_internal_schema(mut self, schema: Value) -> Self {
        self.internal_schema = schema;
        self
    }
}

impl fmt::Debug for FnCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCodec")
            .field("wire_schema", &self.wire_schema)
            .field("internal_schema", &self.internal_schema)
            .finish_non_exhaustive()
    }
}

impl ScalarCodec for FnCodec {
    fn deserialize(&self, wire: &Value) -> Result<Value, CodecError> {
        (self.deserialize)(wire)
    }
    fn serialize(&self, internal: &Value) -> Result<Value, CodecError> {
        (self.serialize)(internal)
    }
    fn wire_schema(&self) -> Value {
        self.wire_schema.clone()
    }
    fn internal_schema(&self) -> Value {
        self.internal_schema.clone()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// REGISTRY
// ————————————————————————————————————————————————————————————————————————————

/// Custom scalar name → codec. Cheap to clone.
#[derive(Clone, Default)]
pub struct ScalarCodecs {
    codecs: IndexMap<String, Arc<dyn ScalarCodec>>,
}

impl ScalarCodecs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, scalar: impl Into<String>, codec: impl ScalarCodec + 'static) {
        self.codecs.insert(scalar.into(), Arc::new(codec));
    }

    pub fn insert_shared(&mut self, scalar: impl Into<String>, codec: Arc<dyn ScalarCodec>) {
        self.codecs.insert(scalar.into(), codec);
    }

    pub fn with(mut self, scalar: impl Into<String>, codec: impl ScalarCodec + 'static) -> Self {
        self.insert(scalar, codec);
        self
    }

    pub fn get(&self, scalar: &str) -> Option<&dyn ScalarCodec> {
        self.codecs.get(scalar).map(|codec| codec.as_ref())
    }

    pub fn contains(&self, scalar: &str) -> bool {
        self.codecs.contains_key(scalar)
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl fmt::Debug for ScalarCodecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.codecs.keys()).finish()
    }
}

/// Short description of a JSON value for error messages.
pub(crate) fn describe(value: &Value) -> String {
    let mut text = value.to_string();
    if text.len() > 64 {
        let mut cut = 61;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("...");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upper() -> FnCodec {
        FnCodec::new(
            |wire| match wire.as_str() {
                Some(s) => Ok(Value::from(s.to_uppercase())),
                None => Err(CodecError::new(format!("Shout cannot represent value: {wire}"))),
            },
            |internal| match internal.as_str() {
                Some(s) => Ok(Value::from(s.to_lowercase())),
                None => Err(CodecError::new(format!("Shout cannot represent value: {internal}"))),
            },
        )
        .with_wire_schema(json!({ "type": "string" }))
    }

    #[test]
    fn fn_codec_runs_both_directions() {
        let codec = upper();
        assert_eq!(codec.deserialize(&json!("hi")).unwrap(), json!("HI"));
        assert_eq!(codec.serialize(&json!("HI")).unwrap(), json!("hi"));
        assert_eq!(
            codec.deserialize(&json!(1)).unwrap_err().to_string(),
            "Shout cannot represent value: 1"
        );
        assert_eq!(codec.wire_schema(), json!({ "type": "string" }));
        assert_eq!(codec.internal_schema(), json!({}));
    }

    #[test]
    fn registry_lookup() {
        let codecs = ScalarCodecs::new().with("Shout", upper());
        assert!(codecs.contains("Shout"));
        assert!(codecs.get("Whisper").is_none());
        assert_eq!(codecs.len(), 1);
    }

    #[test]
    fn describe_truncates_on_char_boundary() {
        let long = Value::from("é".repeat(80));
        let text = describe(&long);
        assert!(text.ends_with("..."));
        assert!(text.len() <= 64);
    }
}
