use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// One step from the root of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self { PathSegment::Key(key.to_owned()) }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self { PathSegment::Index(index) }
}

/// A single value-shape problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub message: String,
    /// empty for problems with the root value itself
    pub path: Vec<PathSegment>,
}

impl Issue {
    /// Dotted rendering, `favourite.items[1].name`.
    pub fn path_string(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                PathSegment::Index(index) => {
                    out.push_str(&format!("[{index}]"));
                }
            }
        }
        out
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path_string(), self.message)
        }
    }
}

/// Every issue found in one pass, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
pub struct Issues(pub Vec<Issue>);

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => f.write_str("no issues"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(f, "{first} (and {} more)", rest.len()),
        }
    }
}

impl Issues {
    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Issues {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// `{ "value": .. }` or `{ "issues": [..] }`, the serialized form of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Value { value: Value },
    Issues { issues: Vec<Issue> },
}

impl From<Result<Value, Issues>> for Outcome {
    fn from(result: Result<Value, Issues>) -> Self {
        match result {
            Ok(value) => Outcome::Value { value },
            Err(Issues(issues)) => Outcome::Issues { issues },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_rendering() {
        let issue = Issue {
            message: "boom".into(),
            path: vec!["favourite".into(), "items".into(), 1.into(), "name".into()],
        };
        assert_eq!(issue.path_string(), "favourite.items[1].name");
        assert_eq!(issue.to_string(), "favourite.items[1].name: boom");
        let root = Issue { message: "boom".into(), path: vec![] };
        assert_eq!(root.to_string(), "boom");
    }

    #[test]
    fn outcome_serializes_as_value_or_issues() {
        let ok = Outcome::from(Ok(json!({ "hello": "world" })));
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({ "value": { "hello": "world" } }));

        let issues = Issues(vec![Issue { message: "bad".into(), path: vec!["hello".into()] }]);
        let bad = Outcome::from(Err(issues));
        assert_eq!(
            serde_json::to_value(&bad).unwrap(),
            json!({ "issues": [{ "message": "bad", "path": ["hello"] }] })
        );
    }
}
