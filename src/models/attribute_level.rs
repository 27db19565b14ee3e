use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OmsError;

/// Granularity of the metadata being fetched.
///
/// Each level carries a fixed pair of limits: the page size used for a single
/// request (`entry_limit`) and the widest run span fetched in one request
/// (`range_limit`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeLevel {
    Runs,
    Lumisections,
}

impl AttributeLevel {
    /// Maximum number of entries requested per query.
    pub fn entry_limit(self) -> u32 {
        match self {
            AttributeLevel::Runs => 5_000,
            AttributeLevel::Lumisections => 100_000,
        }
    }

    /// Widest run span (`end - start`) fetched by a single query.
    pub fn range_limit(self) -> u64 {
        match self {
            AttributeLevel::Runs => 5_000,
            AttributeLevel::Lumisections => 1_000,
        }
    }

    /// OMS endpoint serving this level.
    pub fn endpoint(self) -> &'static str {
        match self {
            AttributeLevel::Runs => "runs",
            AttributeLevel::Lumisections => "lumisections",
        }
    }
}

impl FromStr for AttributeLevel {
    type Err = OmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "runs" => Ok(AttributeLevel::Runs),
            "lumisections" => Ok(AttributeLevel::Lumisections),
            other => Err(OmsError::UnsupportedLevel(other.to_string())),
        }
    }
}

impl TryFrom<&str> for AttributeLevel {
    type Error = OmsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for AttributeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}
