//! Scalar-to-codec bindings for the command line.
//!
//! Bindings come from repeatable `--scalar NAME=KIND` flags and from a JSON
//! file of `{ "NAME": "KIND" }`. Later bindings win.
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::codec::{CodecKind, ScalarCodecs};
use crate::path_de::{PathError, from_str_with_path};

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[_A-Za-z][_0-9A-Za-z]*$").expect("invalid name pattern"));

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read scalar bindings from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scalar bindings in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: PathError,
    },
    #[error("`{0}` is not a valid GraphQL scalar name")]
    InvalidName(String),
    #[error("expected NAME=KIND, found `{0}`")]
    InvalidBinding(String),
}

/// One `NAME=KIND` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarBinding {
    pub name: String,
    pub kind: CodecKind,
}

impl FromStr for ScalarBinding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, kind) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidBinding(s.to_owned()).to_string())?;
        let name = name.trim();
        check_name(name).map_err(|err| err.to_string())?;
        Ok(ScalarBinding { name: name.to_owned(), kind: kind.trim().parse()? })
    }
}

impl fmt::Display for ScalarBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = serde_json::to_value(self.kind).map_err(|_| fmt::Error)?;
        write!(f, "{}={}", self.name, kind.as_str().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ScalarBindings {
    bindings: IndexMap<String, CodecKind>,
}

impl ScalarBindings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_owned(), source })?;
        Self::parse(&source).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse { path: path.to_owned(), source },
            other => other,
        })
    }

    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let bindings: Self = from_str_with_path(source)
            .map_err(|source| ConfigError::Parse { path: PathBuf::from("<inline>"), source })?;
        for name in bindings.bindings.keys() {
            check_name(name)?;
        }
        Ok(bindings)
    }

    pub fn push(&mut self, binding: ScalarBinding) {
        self.bindings.insert(binding.name, binding.kind);
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn into_codecs(self) -> ScalarCodecs {
        let mut codecs = ScalarCodecs::new();
        for (name, kind) in self.bindings {
            codecs.insert_shared(name, kind.codec());
        }
        codecs
    }
}

fn check_name(name: &str) -> Result<(), ConfigError> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidName(name.to_owned()))
    }
}
