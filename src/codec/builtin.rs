use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat};
use serde::de::IntoDeserializer;
use serde::de::value::StrDeserializer;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{CodecError, ScalarCodec, describe};

/// Codecs that can be named from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodecKind {
    Any,
    String,
    Number,
    Integer,
    Boolean,
    Object,
    DateTime,
}

impl CodecKind {
    pub fn codec(self) -> Arc<dyn ScalarCodec> {
        match self {
            CodecKind::DateTime => Arc::new(DateTimeCodec),
            kind => Arc::new(JsonKindCodec { kind }),
        }
    }
}

impl FromStr for CodecKind {
    type Err = String;

    /// Same names as the configuration file.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let de: StrDeserializer<'_, serde::de::value::Error> = s.into_deserializer();
        CodecKind::deserialize(de).map_err(|err| format!("invalid codec `{s}`: {err}"))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// JSON KIND
// ————————————————————————————————————————————————————————————————————————————

/// Pass-through codec that only checks the JSON kind. Wire and internal
/// forms are identical.
#[derive(Debug, Clone, Copy)]
pub struct JsonKindCodec {
    kind: CodecKind,
}

impl JsonKindCodec {
    pub fn any() -> Self { JsonKindCodec { kind: CodecKind::Any } }
    pub fn string() -> Self { JsonKindCodec { kind: CodecKind::String } }
    pub fn number() -> Self { JsonKindCodec { kind: CodecKind::Number } }
    pub fn integer() -> Self { JsonKindCodec { kind: CodecKind::Integer } }
    pub fn boolean() -> Self { JsonKindCodec { kind: CodecKind::Boolean } }
    pub fn object() -> Self { JsonKindCodec { kind: CodecKind::Object } }

    fn accepts(&self, value: &Value) -> bool {
        match self.kind {
            CodecKind::Any => true,
            CodecKind::String => value.is_string(),
            CodecKind::Number => value.is_number(),
            CodecKind::Integer => {
                value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            CodecKind::Boolean => value.is_boolean(),
            CodecKind::Object => value.is_object(),
            // never constructed with this kind, see `CodecKind::codec`
            CodecKind::DateTime => value.is_string(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self.kind {
            CodecKind::Any => "any",
            CodecKind::String | CodecKind::DateTime => "string",
            CodecKind::Number => "number",
            CodecKind::Integer => "integer",
            CodecKind::Boolean => "boolean",
            CodecKind::Object => "object",
        }
    }

    fn check(&self, value: &Value) -> Result<Value, CodecError> {
        if self.accepts(value) {
            Ok(value.clone())
        } else {
            Err(CodecError::new(format!(
                "Expected a value of JSON type {}, found: {}",
                self.type_name(),
                describe(value)
            )))
        }
    }

    fn schema(&self) -> Value {
        match self.kind {
            CodecKind::Any => json!({}),
            _ => json!({ "type": self.type_name() }),
        }
    }
}

impl ScalarCodec for JsonKindCodec {
    fn deserialize(&self, wire: &Value) -> Result<Value, CodecError> {
        self.check(wire)
    }
    fn serialize(&self, internal: &Value) -> Result<Value, CodecError> {
        self.check(internal)
    }
    fn wire_schema(&self) -> Value {
        self.schema()
    }
    fn internal_schema(&self) -> Value {
        self.schema()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DATE-TIME
// ————————————————————————————————————————————————————————————————————————————

/// RFC 3339 string on the wire, milliseconds since the Unix epoch internally.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeCodec;

impl ScalarCodec for DateTimeCodec {
    fn deserialize(&self, wire: &Value) -> Result<Value, CodecError> {
        let parsed = wire
            .as_str()
            .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
            .ok_or_else(|| {
                CodecError::new(format!(
                    "DateTime cannot represent value: {} (expected an RFC 3339 date-time string)",
                    describe(wire)
                ))
            })?;
        Ok(Value::from(parsed.timestamp_millis()))
    }

    fn serialize(&self, internal: &Value) -> Result<Value, CodecError> {
        let instant = internal
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| {
                CodecError::new(format!(
                    "DateTime cannot serialize value: {} (expected milliseconds since the Unix epoch)",
                    describe(internal)
                ))
            })?;
        Ok(Value::from(instant.to_rfc3339_opts(SecondsFormat::Millis, true)))
    }

    fn wire_schema(&self) -> Value {
        json!({ "type": "string", "format": "date-time" })
    }

    fn internal_schema(&self) -> Value {
        json!({ "type": "integer" })
    }
}
