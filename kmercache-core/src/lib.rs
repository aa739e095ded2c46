//! kmercache Core - Data Types
//!
//! Pure data structures shared by the cache store and its callers:
//! validated kmer keys, iteration counters, the closed destination tag,
//! batch input, the narrow gate context, configuration and errors.
//! This crate does no database I/O.

pub mod config;
pub mod context;
pub mod enums;
pub mod error;
pub mod kmer;

pub use config::{CacheConfig, DEFAULT_BUSY_TIMEOUT_MS};
pub use context::{Batch, DestinationBuckets, GateContext};
pub use enums::{DestinationTag, DestinationTagParseError};
pub use error::{CacheResult, ConfigError, KmerCacheError, StorageError, ValidationError};
pub use kmer::{Iteration, Kmer, NUCLEOTIDES};
