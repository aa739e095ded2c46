//! The staging gate: resolve each candidate kmer to a cached result, a drop,
//! or new work.
//!
//! For every kmer, in batch order:
//!
//! 1. A `kmer_cache` row is a hit. Its payload goes to the batch's
//!    destination bucket.
//! 2. Otherwise a `seen_cache` row at a *different* iteration means the kmer
//!    was staged by an earlier generation. It is dropped.
//! 3. Otherwise the kmer is marked seen at the current iteration and staged.
//!
//! A kmer repeated within one batch is staged once; later repeats count as
//! duplicates. Hits are routed per occurrence.
//!
//! The three statements are prepared once per gate and rebound per kmer.

use std::collections::HashSet;

use kmercache_core::{Batch, CacheResult, DestinationTag, Iteration, Kmer, StorageError};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Statement};

use crate::schema::{step_error, RESULT_LOOKUP_SQL, SEEN_INSERT_SQL, SEEN_LOOKUP_SQL};

/// What one batch produced, held back until the transaction commits.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Decoded payloads of cache hits, in batch order.
    pub hits: Vec<String>,
    /// Kmers that need out-of-band computation, in staging order.
    pub staged: Vec<Kmer>,
    /// Kmers already staged by an earlier iteration.
    pub dropped: usize,
    /// Repeats of a kmer this batch already staged.
    pub duplicates: usize,
}

impl BatchOutcome {
    /// Move hits into the destination bucket and staged kmers into the
    /// needs-computation list.
    pub(crate) fn apply(
        self,
        destination: DestinationTag,
        buckets: &mut kmercache_core::DestinationBuckets,
        needs_computation: &mut Vec<Kmer>,
    ) {
        buckets.bucket_mut(destination).extend(self.hits);
        needs_computation.extend(self.staged);
    }
}

/// Prepared queries for one pass over a batch on an initialized cache.
pub struct DedupGate<'c> {
    result_lookup: Statement<'c>,
    seen_lookup: Statement<'c>,
    seen_insert: Statement<'c>,
}

impl<'c> DedupGate<'c> {
    /// Compile the lookup and insert statements.
    ///
    /// Fails with a schema error when the tables are missing.
    pub fn prepare(conn: &'c Connection) -> CacheResult<Self> {
        Ok(Self {
            result_lookup: prepare(conn, "result lookup", RESULT_LOOKUP_SQL)?,
            seen_lookup: prepare(conn, "seen lookup", SEEN_LOOKUP_SQL)?,
            seen_insert: prepare(conn, "seen insert", SEEN_INSERT_SQL)?,
        })
    }

    pub fn run(&mut self, batch: &Batch) -> CacheResult<BatchOutcome> {
        let iteration = batch.iteration();
        let mut outcome = BatchOutcome::default();
        let mut staged_here: HashSet<&str> = HashSet::new();

        for kmer in batch.kmers() {
            if let Some(payload) = self.lookup_result(kmer)? {
                outcome.hits.push(payload);
                continue;
            }
            if staged_here.contains(kmer.as_str()) {
                outcome.duplicates += 1;
                continue;
            }
            if self.seen_at_other_iteration(kmer, iteration)? {
                outcome.dropped += 1;
                continue;
            }
            self.mark_seen(kmer, iteration)?;
            staged_here.insert(kmer.as_str());
            outcome.staged.push(kmer.clone());
        }
        Ok(outcome)
    }

    fn lookup_result(&mut self, kmer: &Kmer) -> CacheResult<Option<String>> {
        let value = self
            .result_lookup
            .query_row(params![kmer.as_str()], |row| row.get::<_, Value>(0))
            .optional()
            .map_err(|e| step_error("result lookup", kmer, e))?;
        match value {
            Some(value) => Ok(Some(decode_payload(kmer, value)?)),
            None => Ok(None),
        }
    }

    fn seen_at_other_iteration(&mut self, kmer: &Kmer, iteration: Iteration) -> CacheResult<bool> {
        let found = self
            .seen_lookup
            .query_row(params![kmer.as_str(), iteration.as_i64()], |row| {
                row.get::<_, i64>(0)
            })
            .optional()
            .map_err(|e| step_error("seen lookup", kmer, e))?;
        Ok(found.is_some())
    }

    fn mark_seen(&mut self, kmer: &Kmer, iteration: Iteration) -> CacheResult<()> {
        self.seen_insert
            .execute(params![kmer.as_str(), iteration.as_i64()])
            .map_err(|e| step_error("seen insert", kmer, e))?;
        Ok(())
    }
}

fn prepare<'c>(conn: &'c Connection, name: &str, sql: &str) -> CacheResult<Statement<'c>> {
    conn.prepare(sql).map_err(|e| {
        StorageError::Schema {
            object: format!("{} statement", name),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Decode a stored payload as text. TEXT and UTF-8 BLOB values are accepted,
/// numeric values are rendered, NULL is an error.
pub(crate) fn decode_payload(kmer: &Kmer, value: Value) -> Result<String, StorageError> {
    match value {
        Value::Text(text) => Ok(text),
        Value::Blob(bytes) => String::from_utf8(bytes).map_err(|e| StorageError::Payload {
            kmer: kmer.to_string(),
            reason: e.to_string(),
        }),
        Value::Integer(n) => Ok(n.to_string()),
        Value::Real(x) => Ok(x.to_string()),
        Value::Null => Err(StorageError::Payload {
            kmer: kmer.to_string(),
            reason: "payload is NULL".to_string(),
        }),
    }
}
