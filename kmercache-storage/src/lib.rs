//! kmercache Storage - SQLite Result Cache and Staging Gate
//!
//! Given a batch of candidate kmers for one refinement iteration, this crate
//! returns results computed in earlier iterations, drops kmers an earlier
//! iteration already queued, and reports the rest as needing computation.
//! Result rows themselves are written by an external collaborator once that
//! computation finishes.
//!
//! The usual entry point is [`check_cache`]; [`CacheStore`] exposes the same
//! lifecycle step by step.

pub mod gate;
pub mod schema;
pub mod store;

pub use gate::{BatchOutcome, DedupGate};
pub use schema::SchemaInitializer;
pub use store::CacheStore;

use kmercache_core::{Batch, CacheConfig, CacheResult, GateContext};

/// Open the cache named by `config`, process `batch` into `ctx`, and close.
///
/// A failed batch rolls back. On a fresh file that leaves no cache tables
/// behind, so the next call bootstraps again.
pub fn check_cache(
    config: &CacheConfig,
    batch: &Batch,
    ctx: &mut GateContext<'_>,
) -> CacheResult<()> {
    // Rejected before open so a bad batch never creates the file.
    if let Some(expected) = config.kmer_length {
        batch.check_length(expected)?;
    }

    let mut store = CacheStore::open(config)?;
    match store.process(batch, ctx) {
        Ok(()) => store.close(),
        Err(err) => {
            if let Err(close_err) = store.close() {
                tracing::warn!(error = %close_err, "Failed to close kmer cache after error");
            }
            Err(err)
        }
    }
}
