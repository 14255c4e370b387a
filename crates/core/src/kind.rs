//! Generation kinds: what the caller handed us to design tests for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two inputs the service knows how to design tests for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    /// Source code of a single function.
    Function,
    /// A natural-language requirement description.
    Requirement,
}

impl GenerationKind {
    /// Wire name, as accepted in the `type` field of `/api/generate`.
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationKind::Function => "function",
            GenerationKind::Requirement => "requirement",
        }
    }

    /// Heading shown on the results page.
    pub fn label(self) -> &'static str {
        match self {
            GenerationKind::Function => "函数测试用例",
            GenerationKind::Requirement => "需求测试用例",
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `type` value that is neither `function` nor `requirement`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown generation type '{0}' (expected 'function' or 'requirement')")]
pub struct UnknownKind(pub String);

impl FromStr for GenerationKind {
    type Err = UnknownKind;

    /// Exact, case-sensitive match on the wire names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "function" => Ok(GenerationKind::Function),
            "requirement" => Ok(GenerationKind::Requirement),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}
