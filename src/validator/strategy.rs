// Direction strategies. One is picked per validation call; every scalar leaf
// goes through it.

use serde_json::Value;

use crate::codec::{ScalarCodec, describe};
use crate::graph::BuiltinScalar;

/// The declared scalar type of a leaf.
#[derive(Clone, Copy)]
pub enum ScalarRef<'a> {
    Builtin(BuiltinScalar),
    Custom(&'a dyn ScalarCodec),
}

pub trait ScalarStrategy {
    const NAME: &'static str;

    /// Produce the output value for `raw`, or the issue message.
    fn resolve_scalar(&self, scalar: ScalarRef<'_>, raw: &Value) -> Result<Value, String>;
}

/// wire → wire, validating only. Values are never coerced.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalize;

/// wire → internal through each codec's `deserialize`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deserialize;

/// internal → wire through each codec's `serialize`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Serialize;

impl ScalarStrategy for Normalize {
    const NAME: &'static str = "normalize";

    fn resolve_scalar(&self, scalar: ScalarRef<'_>, raw: &Value) -> Result<Value, String> {
        match scalar {
            ScalarRef::Builtin(builtin) => strict(builtin, raw),
            // the codec decides what a valid wire value is, the value itself is kept
            ScalarRef::Custom(codec) => codec
                .deserialize(raw)
                .map(|_| raw.clone())
                .map_err(|err| err.0),
        }
    }
}

impl ScalarStrategy for Deserialize {
    const NAME: &'static str = "deserialize";

    fn resolve_scalar(&self, scalar: ScalarRef<'_>, raw: &Value) -> Result<Value, String> {
        match scalar {
            ScalarRef::Builtin(builtin) => strict(builtin, raw),
            ScalarRef::Custom(codec) => codec.deserialize(raw).map_err(|err| err.0),
        }
    }
}

impl ScalarStrategy for Serialize {
    const NAME: &'static str = "serialize";

    fn resolve_scalar(&self, scalar: ScalarRef<'_>, raw: &Value) -> Result<Value, String> {
        match scalar {
            ScalarRef::Builtin(builtin) => strict(builtin, raw),
            ScalarRef::Custom(codec) => codec.serialize(raw).map_err(|err| err.0),
        }
    }
}

/// Built-in scalars accept their wire type only. A numeric string is not a
/// number and a number is not a string.
pub fn strict(scalar: BuiltinScalar, raw: &Value) -> Result<Value, String> {
    let accepted = match scalar {
        BuiltinScalar::String => raw.is_string(),
        BuiltinScalar::Id => raw.is_string(),
        BuiltinScalar::Boolean => raw.is_boolean(),
        BuiltinScalar::Float => raw.is_number(),
        BuiltinScalar::Int => {
            if let Some(i) = raw.as_i64() {
                if i32::try_from(i).is_err() {
                    return Err(format!(
                        "Int cannot represent non 32-bit signed integer value: {}",
                        describe(raw)
                    ));
                }
                true
            } else if raw.is_u64() {
                // above i64::MAX
                return Err(format!(
                    "Int cannot represent non 32-bit signed integer value: {}",
                    describe(raw)
                ));
            } else if let Some(f) = raw.as_f64() {
                // 1.0 is the same JSON number as 1
                f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64
            } else {
                false
            }
        }
    };
    if accepted {
        return Ok(raw.clone());
    }
    Err(match scalar {
        BuiltinScalar::String => format!("String cannot represent a non string value: {}", describe(raw)),
        BuiltinScalar::Id => format!("ID cannot represent a non string value: {}", describe(raw)),
        BuiltinScalar::Boolean => {
            format!("Boolean cannot represent a non boolean value: {}", describe(raw))
        }
        BuiltinScalar::Float => format!("Float cannot represent non numeric value: {}", describe(raw)),
        BuiltinScalar::Int => format!("Int cannot represent non-integer value: {}", describe(raw)),
    })
}
