//! Enum types for the kmer cache

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which result collection receives the payload of a cache hit.
///
/// There is no "unset" variant. Every batch names a concrete
/// destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationTag {
    /// Kmers proposed by the alignment pass.
    Alignment,
    /// Scrambled baseline kmers.
    Scrambled,
    /// Enumerated baseline kmers.
    Enumerated,
}

impl DestinationTag {
    pub const ALL: [DestinationTag; 3] = [
        DestinationTag::Alignment,
        DestinationTag::Scrambled,
        DestinationTag::Enumerated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationTag::Alignment => "alignment",
            DestinationTag::Scrambled => "scrambled",
            DestinationTag::Enumerated => "enumerated",
        }
    }
}

impl fmt::Display for DestinationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DestinationTag {
    type Err = DestinationTagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alignment" => Ok(DestinationTag::Alignment),
            "scrambled" => Ok(DestinationTag::Scrambled),
            "enumerated" => Ok(DestinationTag::Enumerated),
            _ => Err(DestinationTagParseError(s.to_string())),
        }
    }
}

/// Error when parsing an invalid destination tag string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationTagParseError(pub String);

impl fmt::Display for DestinationTagParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid destination tag: {}", self.0)
    }
}

impl std::error::Error for DestinationTagParseError {}
