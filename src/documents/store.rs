//! Document scanning, fingerprinting, and parse memoization.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use super::{BoardKind, BoardSpec, DocumentError};
use crate::cache::{CacheError, FingerprintCache};
use crate::fingerprint::Fingerprint;

/// Errors that can occur while scanning or rendering documents.
///
/// Per-file read failures are not errors: the offending file is excluded
/// from the scan (with a warning). Anything here aborts the whole call.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The fingerprint cache could not be updated; fingerprint-state
    /// integrity can no longer be guaranteed, so the run must stop.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A document's content is malformed.
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Produces the current set of rendered documents for one kind and keeps
/// the fingerprint cache current.
///
/// The store owns the cache for its kind; dropping the store releases the
/// cache's exclusive lock. Parsed documents are memoized by fingerprint
/// (not path), so identical content is parsed at most once per process
/// run, even across repeated [`render`](Self::render) calls.
pub struct DocumentStore {
    root: PathBuf,
    kind: BoardKind,
    cache: FingerprintCache,
    /// Raw content of every file found by the latest scan.
    contents: HashMap<PathBuf, Vec<u8>>,
    /// Fingerprint of every file found by the latest scan.
    fingerprints: HashMap<PathBuf, Fingerprint>,
    /// Parse memoization, keyed by content fingerprint. Survives re-scans
    /// within a run; rebuilt from scratch each process start.
    rendered: HashMap<Fingerprint, Arc<BoardSpec>>,
}

/// Recognized document-file suffixes.
fn is_document_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}

impl DocumentStore {
    /// Create a store scanning `root` for documents of `kind`, recording
    /// fingerprints into `cache`.
    #[must_use]
    pub fn new(root: &Path, kind: BoardKind, cache: FingerprintCache) -> Self {
        Self {
            root: root.to_path_buf(),
            kind,
            cache,
            contents: HashMap::new(),
            fingerprints: HashMap::new(),
            rendered: HashMap::new(),
        }
    }

    /// Last scanned fingerprint for a path, from the durable cache.
    pub fn last_fingerprint(&self, path: &Path) -> Result<Fingerprint, CacheError> {
        self.cache.get(path)
    }

    /// Enumerate all document files under the root, fingerprint them, and
    /// record the fingerprints in the cache.
    ///
    /// Returns the set of paths found. Unreadable entries are excluded
    /// with a warning; a cache write failure aborts the scan.
    pub fn scan(&mut self) -> Result<Vec<PathBuf>, StoreError> {
        let mut contents = HashMap::new();
        let mut fingerprints = HashMap::new();

        for entry in WalkDir::new(&self.root) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("Skipping unreadable entry under {}: {}", self.root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_document_file(entry.path()) {
                continue;
            }

            let data = match fs::read(entry.path()) {
                Ok(d) => d,
                Err(e) => {
                    log::warn!("Skipping unreadable file {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            let fingerprint = Fingerprint::of(&data);
            self.cache.put(entry.path(), &fingerprint)?;

            let path = entry.path().to_path_buf();
            fingerprints.insert(path.clone(), fingerprint);
            contents.insert(path, data);
        }

        self.contents = contents;
        self.fingerprints = fingerprints;

        let paths: Vec<PathBuf> = self.fingerprints.keys().cloned().collect();
        log::debug!(
            "Scanned {} {} document(s) under {}",
            paths.len(),
            self.kind,
            self.root.display()
        );
        Ok(paths)
    }

    /// Re-scan the root and return the parsed form of every distinct
    /// document found.
    ///
    /// Documents sharing a fingerprint share one parsed instance, and the
    /// result contains that instance once. A parse failure aborts the whole
    /// call; there is no partial-success mode.
    pub fn render(&mut self) -> Result<Vec<Arc<BoardSpec>>, StoreError> {
        self.scan()?;

        for (path, data) in &self.contents {
            let fingerprint = self.fingerprints[path];
            if !self.rendered.contains_key(&fingerprint) {
                let spec = BoardSpec::parse(self.kind, path, data)?;
                self.rendered.insert(fingerprint, Arc::new(spec));
            }
        }

        // One entry per distinct fingerprint present in the current scan;
        // memo entries for content no longer on disk are not returned.
        let mut seen = std::collections::HashSet::new();
        let mut docs = Vec::new();
        for fingerprint in self.fingerprints.values() {
            if seen.insert(*fingerprint) {
                docs.push(Arc::clone(&self.rendered[fingerprint]));
            }
        }
        Ok(docs)
    }
}
