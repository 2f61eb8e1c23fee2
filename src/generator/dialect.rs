use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// JSON Schema dialects the generator can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// draft-07, still the most widely supported
    Draft07,
    #[default]
    Draft2020_12,
}

impl Dialect {
    pub fn uri(self) -> &'static str {
        match self {
            Dialect::Draft07 => "http://json-schema.org/draft-07/schema#",
            Dialect::Draft2020_12 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    /// Keyword the definitions registry lives under.
    pub fn defs_keyword(self) -> &'static str {
        match self {
            Dialect::Draft07 => "definitions",
            Dialect::Draft2020_12 => "$defs",
        }
    }

    pub fn reference(self, key: &str) -> String {
        format!("#/{}/{key}", self.defs_keyword())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "draft-07" | "draft7" | "http://json-schema.org/draft-07/schema#"
            | "http://json-schema.org/draft-07/schema" => Ok(Dialect::Draft07),
            "2020-12" | "draft-2020-12" | "https://json-schema.org/draft/2020-12/schema" => {
                Ok(Dialect::Draft2020_12)
            }
            other => Err(Error::UnsupportedDialect(other.to_owned())),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Draft07 => f.write_str("draft-07"),
            Dialect::Draft2020_12 => f.write_str("2020-12"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_uris() {
        assert_eq!("draft-07".parse::<Dialect>().unwrap(), Dialect::Draft07);
        assert_eq!(Dialect::Draft2020_12.uri().parse::<Dialect>().unwrap(), Dialect::Draft2020_12);
        assert_eq!(Dialect::Draft07.to_string().parse::<Dialect>().unwrap(), Dialect::Draft07);
    }

    #[test]
    fn other_dialects_are_rejected() {
        let err = "draft-04".parse::<Dialect>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedDialect(name) if name == "draft-04"));
    }
}
