//! Key types: kmers and refinement iterations

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Nucleotide alphabet accepted in a kmer.
pub const NUCLEOTIDES: [char; 4] = ['A', 'C', 'G', 'T'];

/// A fixed-length nucleotide sequence used verbatim as a cache key.
///
/// Construction only checks the alphabet; the text is never case-folded or
/// otherwise normalized, so two kmers are the same key iff their strings are
/// byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Kmer(String);

impl Kmer {
    /// Validate and wrap a kmer string.
    pub fn new(sequence: impl Into<String>) -> Result<Self, ValidationError> {
        let sequence = sequence.into();
        if sequence.is_empty() {
            return Err(ValidationError::InvalidKmer {
                kmer: sequence,
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(bad) = sequence.chars().find(|c| !NUCLEOTIDES.contains(c)) {
            return Err(ValidationError::InvalidKmer {
                reason: format!("unexpected character {:?}", bad),
                kmer: sequence,
            });
        }
        Ok(Self(sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of nucleotides. Always non-zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Kmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Kmer {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Kmer {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Kmer> for String {
    fn from(kmer: Kmer) -> Self {
        kmer.0
    }
}

impl AsRef<str> for Kmer {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Kmer {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Generation counter of the refinement loop that owns a cache file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Iteration(u32);

impl Iteration {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// The following generation, or `None` past `u32::MAX`.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Value as stored in an SQLite INTEGER column.
    pub const fn as_i64(self) -> i64 {
        self.0 as i64
    }
}

impl From<u32> for Iteration {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl TryFrom<i64> for Iteration {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .map(Self)
            .map_err(|_| ValidationError::IterationOutOfRange { value })
    }
}

impl fmt::Display for Iteration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
