//! Hook visibility.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a hook applies once its owning plugin is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Routes registered directly on the owning instance.
    #[default]
    Local,
    /// Every route of the owning instance, including routes of plugins it mounted.
    Scoped,
    /// Every route of the final application.
    Global,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Local => "local",
            Scope::Scoped => "scoped",
            Scope::Global => "global",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized scope name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown hook scope: {0:?} (expected local, scoped or global)")]
pub struct ParseScopeError(String);

impl FromStr for Scope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Scope::Local),
            "scoped" => Ok(Scope::Scoped),
            "global" => Ok(Scope::Global),
            other => Err(ParseScopeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scope() {
        assert_eq!("global".parse::<Scope>().unwrap(), Scope::Global);
        assert_eq!("scoped".parse::<Scope>().unwrap(), Scope::Scoped);
        assert_eq!("local".parse::<Scope>().unwrap(), Scope::Local);
        assert!("Global".parse::<Scope>().is_err());
    }

    #[test]
    fn test_default_is_local() {
        assert_eq!(Scope::default(), Scope::Local);
        assert_eq!(Scope::Scoped.to_string(), "scoped");
    }
}
