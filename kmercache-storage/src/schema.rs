//! Cache file schema and the first-use bootstrap.
//!
//! A cache file holds two tables:
//!
//! ```text
//! kmer_cache(kmer TEXT PRIMARY KEY NOT NULL, payload BLOB)               + UNIQUE INDEX(kmer)
//! seen_cache(kmer TEXT PRIMARY KEY NOT NULL, iteration INTEGER NOT NULL) + UNIQUE INDEX(kmer)
//! ```
//!
//! `kmer_cache` rows are written by the external result writer only.
//! `seen_cache` rows are append-only and record the first iteration that
//! staged a kmer.

use kmercache_core::{Batch, CacheResult, Kmer, StorageError};
use rusqlite::{params, Connection};

use crate::gate::BatchOutcome;

pub(crate) const RESULT_LOOKUP_SQL: &str = "SELECT payload FROM kmer_cache WHERE kmer = ?1";
pub(crate) const SEEN_LOOKUP_SQL: &str =
    "SELECT iteration FROM seen_cache WHERE kmer = ?1 AND iteration != ?2 LIMIT 1";
pub(crate) const SEEN_INSERT_SQL: &str =
    "INSERT OR IGNORE INTO seen_cache (kmer, iteration) VALUES (?1, ?2)";

/// DDL in creation order. Plain `CREATE` so a second bootstrap on the same
/// file fails instead of passing silently.
const SCHEMA_DDL: [(&str, &str); 4] = [
    (
        "table kmer_cache",
        "CREATE TABLE kmer_cache (kmer TEXT PRIMARY KEY NOT NULL, payload BLOB)",
    ),
    (
        "index kmer_cache_idx",
        "CREATE UNIQUE INDEX kmer_cache_idx ON kmer_cache(kmer)",
    ),
    (
        "table seen_cache",
        "CREATE TABLE seen_cache (kmer TEXT PRIMARY KEY NOT NULL, iteration INTEGER NOT NULL)",
    ),
    (
        "index seen_cache_idx",
        "CREATE UNIQUE INDEX seen_cache_idx ON seen_cache(kmer)",
    ),
];

/// Creates both tables on a fresh cache file and seeds `seen_cache` with the
/// initial batch.
pub struct SchemaInitializer<'c> {
    conn: &'c Connection,
}

impl<'c> SchemaInitializer<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Create tables and indexes, then mark every kmer of `batch` as seen at
    /// the batch iteration.
    ///
    /// A fresh cache has no results, so each distinct kmer is also staged for
    /// computation, in first-occurrence order.
    pub fn run(&self, batch: &Batch) -> CacheResult<BatchOutcome> {
        self.create_tables()?;

        let mut outcome = BatchOutcome::default();
        let mut insert = self
            .conn
            .prepare(SEEN_INSERT_SQL)
            .map_err(|e| StorageError::Schema {
                object: "seen insert statement".to_string(),
                reason: e.to_string(),
            })?;

        let iteration = batch.iteration().as_i64();
        for kmer in batch.kmers() {
            let inserted = insert
                .execute(params![kmer.as_str(), iteration])
                .map_err(|e| step_error("seen insert", kmer, e))?;
            // Zero rows changed means an earlier occurrence in this batch
            // already claimed the key.
            if inserted == 0 {
                outcome.duplicates += 1;
            } else {
                outcome.staged.push(kmer.clone());
            }
        }
        Ok(outcome)
    }

    fn create_tables(&self) -> CacheResult<()> {
        for (object, ddl) in SCHEMA_DDL {
            self.conn
                .execute(ddl, [])
                .map_err(|e| StorageError::Schema {
                    object: object.to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }
}

pub(crate) fn step_error(query: &'static str, kmer: &Kmer, e: rusqlite::Error) -> StorageError {
    StorageError::Step {
        query,
        kmer: kmer.to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kmercache_core::{DestinationTag, Iteration, KmerCacheError};

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'index') ORDER BY name")
            .unwrap();
        let rows = stmt.query_map([], |row| row.get::<_, String>(0)).unwrap();
        rows.map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_creates_tables_and_unique_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        let batch = Batch::new(vec![], Iteration::new(0), DestinationTag::Alignment).unwrap();
        let outcome = SchemaInitializer::new(&conn).run(&batch).unwrap();
        assert!(outcome.staged.is_empty());

        let names = table_names(&conn);
        for expected in ["kmer_cache", "kmer_cache_idx", "seen_cache", "seen_cache_idx"] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_seeds_seen_and_skips_in_batch_duplicates() {
        let conn = Connection::open_in_memory().unwrap();
        let batch = Batch::parse(
            ["AAAA", "CCCC", "AAAA"],
            Iteration::new(3),
            DestinationTag::Alignment,
        )
        .unwrap();
        let outcome = SchemaInitializer::new(&conn).run(&batch).unwrap();

        let staged: Vec<&str> = outcome.staged.iter().map(Kmer::as_str).collect();
        assert_eq!(staged, vec!["AAAA", "CCCC"]);
        assert_eq!(outcome.duplicates, 1);

        let seen: i64 = conn
            .query_row("SELECT COUNT(*) FROM seen_cache WHERE iteration = 3", [], |r| r.get(0))
            .unwrap();
        assert_eq!(seen, 2);
        let results: i64 = conn
            .query_row("SELECT COUNT(*) FROM kmer_cache", [], |r| r.get(0))
            .unwrap();
        assert_eq!(results, 0);
    }

    #[test]
    fn test_second_bootstrap_fails_with_schema_error() {
        let conn = Connection::open_in_memory().unwrap();
        let batch = Batch::new(vec![], Iteration::new(0), DestinationTag::Alignment).unwrap();
        SchemaInitializer::new(&conn).run(&batch).unwrap();

        let err = SchemaInitializer::new(&conn).run(&batch).unwrap_err();
        match err {
            KmerCacheError::Storage(StorageError::Schema { object, .. }) => {
                assert_eq!(object, "table kmer_cache");
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }
}
