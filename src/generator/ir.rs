// Structural schema IR. Rendered to JSON only at the very end so the walker
// never deals with serde_json::Value.

use indexmap::IndexMap;
use serde_json::{Map, Value, json};

use super::dialect::Dialect;

#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Bool,
    String,
    Integer { min: Option<i64>, max: Option<i64> },
    Number,
    /// fixed value, used for the type discriminator
    Const(String),
    Object(Object),
    /// base object plus every fragment that applied to it
    Composed { base: Object, parts: Vec<Object> },
    Array(Box<Ty>),
    Nullable(Box<Ty>),
    /// one object per possible concrete type
    OneOf(Vec<Ty>),
    /// key into the definitions registry
    Ref(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    pub title: Option<String>,
    pub description: Option<String>,
    /// every property is required; insertion order is document order
    pub properties: IndexMap<String, Ty>,
}

impl Object {
    pub fn titled(title: impl Into<String>, description: Option<&str>) -> Self {
        Object {
            title: Some(title.into()),
            description: description.map(str::to_owned),
            properties: IndexMap::new(),
        }
    }
}

impl Ty {
    pub fn nullable(self) -> Ty {
        match self {
            Ty::Nullable(_) => self,
            other => Ty::Nullable(Box::new(other)),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// JSON SCHEMA CG
// ————————————————————————————————————————————————————————————————————————————

pub fn render(ty: &Ty, dialect: Dialect) -> Value {
    match ty {
        Ty::Bool => json!({ "type": "boolean" }),
        Ty::String => json!({ "type": "string" }),
        Ty::Number => json!({ "type": "number" }),

        Ty::Integer { min, max } => {
            let mut o = json!({ "type": "integer" });
            if let Some(m) = *min { o["minimum"] = Value::from(m); }
            if let Some(m) = *max { o["maximum"] = Value::from(m); }
            o
        }

        Ty::Const(value) => json!({ "const": value }),

        Ty::Object(object) => render_object(object, dialect),

        Ty::Composed { base, parts } => {
            let mut all_of = Vec::with_capacity(parts.len() + 1);
            all_of.push(render_object(base, dialect));
            all_of.extend(parts.iter().map(|part| render_object(part, dialect)));
            json!({ "allOf": all_of })
        }

        Ty::Array(item) => json!({
            "type": "array",
            "items": render(item, dialect),
        }),

        Ty::Nullable(inner) => json!({
            "anyOf": [render(inner, dialect), { "type": "null" }]
        }),

        Ty::OneOf(arms) => {
            json!({ "oneOf": arms.iter().map(|arm| render(arm, dialect)).collect::<Vec<_>>() })
        }

        Ty::Ref(key) => json!({ "$ref": dialect.reference(key) }),
    }
}

fn render_object(object: &Object, dialect: Dialect) -> Value {
    let mut map = Map::new();
    map.insert("type".into(), Value::from("object"));
    if let Some(title) = &object.title {
        map.insert("title".into(), Value::from(title.as_str()));
    }
    if let Some(description) = &object.description {
        map.insert("description".into(), Value::from(description.as_str()));
    }
    let mut props = Map::new();
    for (name, ty) in &object.properties {
        props.insert(name.clone(), render(ty, dialect));
    }
    map.insert("properties".into(), Value::Object(props));
    map.insert(
        "required".into(),
        Value::Array(object.properties.keys().cloned().map(Value::from).collect()),
    );
    Value::Object(map)
}
