// Definitions registry for one generation pass. Owned by the walker, handed
// back with the root and dropped after rendering.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Kinds of named types that live in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    Scalar,
    Enum,
}

impl DefKind {
    fn prefix(self) -> &'static str {
        match self {
            DefKind::Scalar => "scalar",
            DefKind::Enum => "enum",
        }
    }
}

#[derive(Debug, Default)]
pub struct Definitions {
    entries: IndexMap<String, Value>,
}

impl Definitions {
    pub fn key(kind: DefKind, name: &str) -> String {
        format!("{}.{name}", kind.prefix())
    }

    /// Register `name` once. `build` only runs the first time; the key is
    /// returned either way.
    pub fn ensure(&mut self, kind: DefKind, name: &str, build: impl FnOnce() -> Value) -> String {
        let key = Self::key(kind, name);
        if !self.entries.contains_key(&key) {
            self.entries.insert(key.clone(), build());
        }
        key
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.entries.into_iter().collect::<Map<String, Value>>())
    }
}

/// Attach `title`/`description` to a schema fragment supplied from outside.
pub fn documented(fragment: Value, title: &str, description: Option<&str>) -> Value {
    let mut map = match fragment {
        Value::Object(map) => map,
        // boolean schemas (`true`/`false`) cannot carry annotations directly
        other => {
            let mut map = Map::new();
            map.insert("allOf".into(), Value::Array(vec![other]));
            map
        }
    };
    map.entry("title").or_insert_with(|| Value::from(title));
    if let Some(description) = description {
        map.entry("description").or_insert_with(|| Value::from(description));
    }
    Value::Object(map)
}
