//! kmercache Test Utilities
//!
//! Centralized test infrastructure for the kmercache workspace:
//! - Proptest generators for kmers, iterations, tags and batches
//! - Fixtures: temporary cache files and a stand-in for the external result
//!   writer
//! - Custom assertions for cache-specific checks

// Re-export core types for convenience
pub use kmercache_core::{
    Batch, CacheConfig, CacheResult, ConfigError, DestinationBuckets, DestinationTag,
    GateContext, Iteration, Kmer, KmerCacheError, StorageError, ValidationError,
};
pub use kmercache_storage::{check_cache, CacheStore};

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a test-writer tracing subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to `kmercache_storage=debug`.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kmercache_storage=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating kmercache input types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a kmer of exactly `length` nucleotides.
    pub fn arb_kmer(length: usize) -> impl Strategy<Value = Kmer> {
        prop::collection::vec(prop::sample::select(vec!['A', 'C', 'G', 'T']), length)
            .prop_map(|chars| {
                let s: String = chars.into_iter().collect();
                Kmer::new(s).expect("generated kmer uses the nucleotide alphabet")
            })
    }

    /// Generate a small iteration number.
    pub fn arb_iteration() -> impl Strategy<Value = Iteration> {
        (0u32..64).prop_map(Iteration::new)
    }

    /// Generate a DestinationTag variant.
    pub fn arb_destination_tag() -> impl Strategy<Value = DestinationTag> {
        prop_oneof![
            Just(DestinationTag::Alignment),
            Just(DestinationTag::Scrambled),
            Just(DestinationTag::Enumerated),
        ]
    }

    /// Generate a batch of 4-mers drawn from a small pool, so repeats within
    /// and across batches are common.
    pub fn arb_batch() -> impl Strategy<Value = Batch> {
        (
            prop::collection::vec(arb_kmer(4), 0..24),
            arb_iteration(),
            arb_destination_tag(),
        )
            .prop_map(|(kmers, iteration, destination)| {
                Batch::new(kmers, iteration, destination).expect("generated kmers share a length")
            })
    }

    /// Generate a list of distinct kmers of `length`.
    pub fn arb_distinct_kmers(
        length: usize,
        max: usize,
    ) -> impl Strategy<Value = Vec<Kmer>> {
        prop::collection::btree_set(arb_kmer(length), 0..max)
            .prop_map(|set| set.into_iter().collect())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use rusqlite::{params, Connection};
    use std::path::Path;
    use tempfile::TempDir;

    /// A config pointing at a not-yet-existing cache file in a fresh
    /// temporary directory. Keep the `TempDir` alive for the test's duration.
    pub fn temp_cache() -> (CacheConfig, TempDir) {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let config = CacheConfig::new(dir.path().join("cache.db"));
        (config, dir)
    }

    /// Build a batch from literal sequences.
    pub fn batch(kmers: &[&str], iteration: u32, destination: DestinationTag) -> Batch {
        Batch::parse(kmers.iter().copied(), Iteration::new(iteration), destination)
            .expect("fixture kmers should be valid")
    }

    /// Collected outputs of one cache call.
    #[derive(Debug, Default, Clone, PartialEq, Eq)]
    pub struct CallOutput {
        pub buckets: DestinationBuckets,
        pub needs_computation: Vec<Kmer>,
    }

    impl CallOutput {
        pub fn needs(&self) -> Vec<&str> {
            self.needs_computation.iter().map(Kmer::as_str).collect()
        }
    }

    /// Run `check_cache` once with fresh output collections.
    pub fn run_batch(
        config: &CacheConfig,
        kmers: &[&str],
        iteration: u32,
        destination: DestinationTag,
    ) -> CacheResult<CallOutput> {
        let batch = batch(kmers, iteration, destination);
        run_prepared(config, &batch)
    }

    /// Run `check_cache` once for an already built batch.
    pub fn run_prepared(config: &CacheConfig, batch: &Batch) -> CacheResult<CallOutput> {
        let mut out = CallOutput::default();
        let mut ctx = GateContext::new(&mut out.buckets, &mut out.needs_computation);
        check_cache(config, batch, &mut ctx)?;
        Ok(out)
    }

    /// Stand-in for the external result writer: store a computed payload.
    pub fn write_result(path: &Path, kmer: &str, payload: &str) {
        let conn = Connection::open(path).expect("cache file should open");
        conn.execute(
            "INSERT OR REPLACE INTO kmer_cache (kmer, payload) VALUES (?1, ?2)",
            params![kmer, payload.as_bytes()],
        )
        .expect("result row should insert");
    }

    /// Every seen record as `(kmer, iteration)`, sorted by kmer.
    pub fn seen_records(path: &Path) -> Vec<(String, i64)> {
        let conn = Connection::open(path).expect("cache file should open");
        let mut stmt = conn
            .prepare("SELECT kmer, iteration FROM seen_cache ORDER BY kmer")
            .expect("seen query should prepare");
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .expect("seen query should run");
        rows.map(|r| r.expect("seen row should decode")).collect()
    }

    /// Number of result rows.
    pub fn result_count(path: &Path) -> i64 {
        let conn = Connection::open(path).expect("cache file should open");
        conn.query_row("SELECT COUNT(*) FROM kmer_cache", [], |row| row.get(0))
            .expect("count should run")
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertions for kmercache-specific validation.

    use super::*;

    /// Assert that a result is a storage error.
    pub fn assert_storage_error<T: std::fmt::Debug>(result: &CacheResult<T>) {
        match result {
            Err(KmerCacheError::Storage(_)) => {}
            other => panic!("Expected storage error, got {:?}", other),
        }
    }

    /// Assert that a result is a validation error.
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &CacheResult<T>) {
        match result {
            Err(KmerCacheError::Validation(_)) => {}
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    /// Assert that only the bucket for `tag` received payloads.
    pub fn assert_only_bucket(buckets: &DestinationBuckets, tag: DestinationTag) {
        for other in DestinationTag::ALL {
            if other != tag {
                assert!(
                    buckets.bucket(other).is_empty(),
                    "Bucket {} should be empty, has {:?}",
                    other,
                    buckets.bucket(other)
                );
            }
        }
    }

    /// Assert the seen record for `kmer` carries `iteration`.
    pub fn assert_seen_at(records: &[(String, i64)], kmer: &str, iteration: i64) {
        match records.iter().find(|(k, _)| k == kmer) {
            Some((_, got)) => assert_eq!(
                *got, iteration,
                "Kmer {} seen at iteration {}, expected {}",
                kmer, got, iteration
            ),
            None => panic!("Kmer {} has no seen record", kmer),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
