//! Remote API surface: CRUD calls, retry policy, and the trait seam the
//! reconciliation engine works against.
//!
//! # Retry semantics
//!
//! Only idempotent (read) calls are retried, with bounded exponential
//! backoff:
//!
//! * 2xx stops retrying and is a success.
//! * 4xx stops retrying immediately; it is the terminal response, handed
//!   back to the caller rather than treated as a retry-loop failure.
//! * Anything else (5xx, network failure) is retried until the elapsed-time
//!   budget runs out, after which the last error is returned.
//!
//! Non-idempotent verbs (create, update, delete) execute exactly once;
//! retrying them risks duplicate side effects against the remote resource
//! set.

pub mod client;

pub use client::DatadogClient;

use std::time::Duration;

use serde_json::{Map, Value};

use crate::documents::BoardKind;

/// A remote resource as the engine needs to see it: identity and title.
///
/// Fetched fresh before each reconciliation decision, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResource {
    /// Remote identifier (numeric ids are normalized to strings).
    pub id: String,
    /// The resource's title.
    pub title: String,
}

/// Errors from talking to the remote service.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The request could not be completed at the transport level.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a terminal non-2xx status.
    #[error("API error {status}: {body}")]
    Status {
        /// HTTP status code of the final response
        status: u16,
        /// Response body, verbatim
        body: String,
    },

    /// The service answered 2xx but the body was not what we expect.
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),
}

/// Bounded exponential backoff configuration for idempotent calls.
///
/// One instance per client; not persisted.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// First wait between attempts; subsequent waits grow exponentially.
    pub initial_interval: Duration,
    /// Total elapsed-time budget across all attempts.
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_elapsed: Duration::from_secs(50),
        }
    }
}

impl RetryPolicy {
    fn to_backoff(&self) -> backoff::ExponentialBackoff {
        backoff::ExponentialBackoff {
            current_interval: self.initial_interval,
            initial_interval: self.initial_interval,
            max_elapsed_time: Some(self.max_elapsed),
            ..backoff::ExponentialBackoff::default()
        }
    }
}

/// How a response status affects the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// 2xx: done, success.
    Success,
    /// 4xx: done, terminal; hand the response back as-is.
    Terminal,
    /// Anything else: retry until the budget is exhausted.
    Retry,
}

pub(crate) fn classify(status: u16) -> Disposition {
    match status {
        200..=299 => Disposition::Success,
        400..=499 => Disposition::Terminal,
        _ => Disposition::Retry,
    }
}

/// Run `op` under `policy`, unwrapping the backoff error envelope.
///
/// `op` decides retryability itself: return `backoff::Error::transient`
/// to request another attempt, `backoff::Error::permanent` to stop.
pub(crate) fn run_with_retries<T, F>(policy: &RetryPolicy, op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Result<T, backoff::Error<ApiError>>,
{
    backoff::retry(policy.to_backoff(), op).map_err(|e| match e {
        backoff::Error::Permanent(err) | backoff::Error::Transient { err, .. } => err,
    })
}

/// CRUD operations the reconciliation engine needs from the remote service.
///
/// [`DatadogClient`] is the production implementation; tests substitute an
/// in-memory fake to observe call sequences.
pub trait RemoteApi {
    /// Check whether the configured credentials are accepted by the
    /// remote service. Idempotent; retried.
    fn validate_credentials(&self) -> Result<bool, ApiError>;

    /// List existing resources of `kind`. Idempotent; retried.
    fn list(&self, kind: BoardKind) -> Result<Vec<RemoteResource>, ApiError>;

    /// Create a resource of `kind` from a full document body, returning the
    /// created resource's id. Single attempt, never retried.
    fn create(&self, kind: BoardKind, body: &Map<String, Value>) -> Result<String, ApiError>;

    /// Delete the resource of `kind` with the given id. Single attempt,
    /// never retried.
    fn delete(&self, kind: BoardKind, id: &str) -> Result<(), ApiError>;
}
