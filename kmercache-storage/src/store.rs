//! Connection lifecycle for one cache file.
//!
//! A [`CacheStore`] lives for exactly one batch: open, process, close. It is
//! never pooled or shared. Whether the cache tables are already in place
//! decides which path `process` takes:
//!
//! - fresh file: [`SchemaInitializer`] creates the tables and seeds them
//! - existing cache: [`DedupGate`] resolves the batch against the cache
//!
//! A file that did not exist before open is fresh. A file that existed but
//! holds neither table (empty, or left behind by a rolled-back bootstrap) is
//! fresh too.
//!
//! Each call to `process` runs in a single transaction. Outputs are handed to
//! the caller only after commit, so a failed batch leaves neither the file nor
//! the caller's collections half-updated.

use std::path::{Path, PathBuf};

use kmercache_core::{
    Batch, CacheConfig, CacheResult, GateContext, Iteration, Kmer, StorageError,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use crate::gate::{decode_payload, BatchOutcome, DedupGate};
use crate::schema::{step_error, SchemaInitializer};

/// An open cache file.
#[derive(Debug)]
pub struct CacheStore {
    conn: Connection,
    path: PathBuf,
    schema_exists: bool,
    kmer_length: Option<usize>,
    verbose: bool,
}

impl CacheStore {
    /// Open (or create) the cache file named by `config`.
    ///
    /// The existence check happens before the connection is opened, since
    /// opening creates the file. An existing file is then probed for the
    /// cache tables.
    pub fn open(config: &CacheConfig) -> CacheResult<Self> {
        config.validate()?;
        let path = config.path.clone();
        let existed = path.exists();

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&path, flags).map_err(|e| {
            StorageError::Connection {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        conn.busy_timeout(config.busy_timeout())
            .map_err(|e| StorageError::Connection {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let schema_exists = existed && probe_schema(&conn, &path)?;
        tracing::debug!(path = %path.display(), existed, schema_exists, "Opened kmer cache");

        Ok(Self {
            conn,
            path,
            schema_exists,
            kmer_length: config.kmer_length,
            verbose: config.verbose,
        })
    }

    /// Whether the cache tables are in place. False only for a file this
    /// store created and has not yet processed a batch against.
    pub fn schema_exists(&self) -> bool {
        self.schema_exists
    }

    /// Run one batch: bootstrap on a fresh file, gate on an existing one.
    ///
    /// On success, hits are appended to the bucket named by the batch's
    /// destination and staged kmers to `ctx.needs_computation`.
    ///
    /// The configured kmer length is checked here for callers driving a
    /// store directly. [`crate::check_cache`] checks it before opening.
    pub fn process(&mut self, batch: &Batch, ctx: &mut GateContext<'_>) -> CacheResult<()> {
        if let Some(expected) = self.kmer_length {
            batch.check_length(expected)?;
        }
        let verbose = self.verbose || ctx.verbose;
        let fresh = !self.schema_exists;

        if verbose {
            if fresh {
                tracing::info!(path = %self.path.display(), "No existing cache, initializing");
            } else {
                tracing::info!(path = %self.path.display(), "Querying cache for processed kmers");
            }
        }

        let tx = self
            .conn
            .transaction()
            .map_err(|e| StorageError::Transaction {
                reason: e.to_string(),
            })?;

        let outcome = if fresh {
            SchemaInitializer::new(&tx).run(batch)?
        } else {
            let mut gate = DedupGate::prepare(&tx)?;
            gate.run(batch)?
        };

        tx.commit().map_err(|e| StorageError::Transaction {
            reason: e.to_string(),
        })?;
        self.schema_exists = true;

        log_outcome(batch, &outcome, fresh, verbose);
        outcome.apply(batch.destination(), ctx.buckets, ctx.needs_computation);
        Ok(())
    }

    /// Iteration at which `kmer` was first staged, if ever.
    pub fn seen_iteration(&self, kmer: &Kmer) -> CacheResult<Option<Iteration>> {
        let raw = self
            .conn
            .query_row(
                "SELECT iteration FROM seen_cache WHERE kmer = ?1",
                params![kmer.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map_err(|e| step_error("seen iteration", kmer, e))?;
        match raw {
            Some(value) => Ok(Some(Iteration::try_from(value)?)),
            None => Ok(None),
        }
    }

    /// Decoded payload stored for `kmer`, if the result writer produced one.
    pub fn result_payload(&self, kmer: &Kmer) -> CacheResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT payload FROM kmer_cache WHERE kmer = ?1",
                params![kmer.as_str()],
                |row| row.get::<_, Value>(0),
            )
            .optional()
            .map_err(|e| step_error("result payload", kmer, e))?;
        match value {
            Some(value) => Ok(Some(decode_payload(kmer, value)?)),
            None => Ok(None),
        }
    }

    pub fn seen_count(&self) -> CacheResult<u64> {
        self.count("seen_cache")
    }

    pub fn result_count(&self) -> CacheResult<u64> {
        self.count("kmer_cache")
    }

    fn count(&self, table: &'static str) -> CacheResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let n = self
            .conn
            .query_row(&sql, [], |row| row.get::<_, i64>(0))
            .map_err(|e| StorageError::Step {
                query: table,
                kmer: String::new(),
                reason: e.to_string(),
            })?;
        Ok(n.max(0) as u64)
    }

    /// Finalize statements and release the connection.
    pub fn close(self) -> CacheResult<()> {
        let path = self.path;
        self.conn
            .close()
            .map_err(|(_, e)| StorageError::Close {
                path,
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

/// True when both cache tables exist, false when neither does.
fn probe_schema(conn: &Connection, path: &Path) -> CacheResult<bool> {
    let present: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('kmer_cache', 'seen_cache')",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StorageError::Connection {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    match present {
        0 => Ok(false),
        2 => Ok(true),
        _ => Err(StorageError::Schema {
            object: "cache tables".to_string(),
            reason: "only one of kmer_cache and seen_cache exists".to_string(),
        }
        .into()),
    }
}

fn log_outcome(batch: &Batch, outcome: &BatchOutcome, fresh: bool, verbose: bool) {
    let iteration = batch.iteration().get();
    let destination = batch.destination().as_str();
    if verbose {
        tracing::info!(
            iteration,
            destination,
            fresh,
            candidates = batch.len(),
            hits = outcome.hits.len(),
            staged = outcome.staged.len(),
            dropped = outcome.dropped,
            duplicates = outcome.duplicates,
            "Kmer cache batch complete"
        );
    } else {
        tracing::debug!(
            iteration,
            destination,
            fresh,
            candidates = batch.len(),
            hits = outcome.hits.len(),
            staged = outcome.staged.len(),
            dropped = outcome.dropped,
            duplicates = outcome.duplicates,
            "Kmer cache batch complete"
        );
    }
}
