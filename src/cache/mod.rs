//! Fingerprint caching module for boardsync.
//!
//! This module provides durable storage for document fingerprints so that
//! a later run can tell whether a file's content changed since it was last
//! scanned.
//!
//! # Architecture
//!
//! * [`store`]: SQLite-backed persistence of the path → fingerprint mapping.
//!
//! # Semantics
//!
//! * Keys are document paths as scanned; values are fixed-width
//!   [`Fingerprint`](crate::fingerprint::Fingerprint) bytes.
//! * Every `put` is durable before it returns; a crash after a successful
//!   scan never loses fingerprint state for files already processed.
//! * The store is held with an exclusive lock for the lifetime of the
//!   owning process and released on drop, including error paths.
//! * Entries are never deleted: a stale entry for a removed file persists
//!   until the same path is scanned again.

pub mod store;

pub use store::{CacheError, FingerprintCache};
