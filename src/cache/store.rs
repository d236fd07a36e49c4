//! SQLite-backed fingerprint cache.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};

use crate::fingerprint::Fingerprint;

/// Errors that can occur while opening or using the fingerprint cache.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The cache location could not be created or opened, or another
    /// process already holds it.
    #[error("Cache unavailable at {path}: {source}")]
    Unavailable {
        /// Location that failed to open
        path: PathBuf,
        /// The underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },

    /// The cache location's parent directory could not be created.
    #[error("Cache location {path} could not be created: {source}")]
    CreateLocation {
        /// Location that failed to be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No fingerprint has been recorded for the given document path.
    #[error("No fingerprint recorded for {0}")]
    NotFound(PathBuf),

    /// A stored entry does not have the expected fingerprint width,
    /// typically because it was written by an incompatible version.
    #[error("Cache entry for {0} has an unexpected fingerprint width")]
    Corrupt(PathBuf),

    /// An error reading or writing the underlying store.
    #[error("Cache storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Durable mapping from document path to last-seen fingerprint.
///
/// Opened exclusively: only one process may hold a given cache location at
/// a time. The exclusive lock is acquired at open time and released when
/// the cache is dropped, on every exit path of the owning process.
///
/// Every [`put`](Self::put) is committed with `synchronous=FULL`, so a
/// successful return means the entry survives a crash.
pub struct FingerprintCache {
    conn: Connection,
}

impl FingerprintCache {
    /// Open (or create) the cache at the given location.
    ///
    /// Fails with [`CacheError::Unavailable`] if the location cannot be
    /// created or opened, or if another process already holds the lock.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| CacheError::CreateLocation {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }

        let conn = Connection::open(path).map_err(|e| CacheError::Unavailable {
            path: path.to_path_buf(),
            source: e,
        })?;

        // With locking_mode=exclusive the first write transaction takes the
        // file lock and keeps it until the connection closes; synchronous=FULL
        // makes every committed put durable before it returns.
        let setup = || -> Result<(), rusqlite::Error> {
            conn.pragma_update(None, "locking_mode", "exclusive")?;
            conn.pragma_update(None, "synchronous", "FULL")?;
            conn.execute_batch(
                "BEGIN EXCLUSIVE;
                 CREATE TABLE IF NOT EXISTS fingerprints (
                     path   TEXT PRIMARY KEY,
                     digest BLOB NOT NULL
                 );
                 COMMIT;",
            )
        };

        setup().map_err(|e| CacheError::Unavailable {
            path: path.to_path_buf(),
            source: e,
        })?;

        log::debug!("Opened fingerprint cache at {}", path.display());
        Ok(Self { conn })
    }

    /// Record the fingerprint last seen for a document path.
    ///
    /// Upsert: overwrites any previous fingerprint for the same path. The
    /// write is durable before this returns.
    pub fn put(&self, path: &Path, fingerprint: &Fingerprint) -> Result<(), CacheError> {
        self.conn.execute(
            "INSERT INTO fingerprints (path, digest) VALUES (?1, ?2)
             ON CONFLICT(path) DO UPDATE SET digest = excluded.digest",
            rusqlite::params![path.to_string_lossy(), fingerprint.as_bytes().as_slice()],
        )?;
        Ok(())
    }

    /// Look up the last-seen fingerprint for a document path.
    ///
    /// Returns [`CacheError::NotFound`] if the path has never been scanned.
    pub fn get(&self, path: &Path) -> Result<Fingerprint, CacheError> {
        let digest: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT digest FROM fingerprints WHERE path = ?1",
                [path.to_string_lossy()],
                |row| row.get(0),
            )
            .optional()?;

        match digest {
            Some(bytes) => Fingerprint::from_bytes(&bytes)
                .ok_or_else(|| CacheError::Corrupt(path.to_path_buf())),
            None => Err(CacheError::NotFound(path.to_path_buf())),
        }
    }

    /// Number of entries currently stored. Mostly useful for tests and
    /// diagnostics.
    pub fn len(&self) -> Result<u64, CacheError> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM fingerprints", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Close the cache explicitly, surfacing any error.
    ///
    /// Dropping the cache also releases the lock; this is for callers that
    /// want to observe close failures instead of ignoring them.
    pub fn close(self) -> Result<(), CacheError> {
        self.conn.close().map_err(|(_, e)| CacheError::Storage(e))
    }
}
