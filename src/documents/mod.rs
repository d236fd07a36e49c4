//! Document model and scanning for declaratively-authored boards.
//!
//! A *document* is one YAML file declaring a dashboard or screenboard. This
//! module provides:
//!
//! - [`BoardKind`]: the two resource kinds and their per-kind conventions
//!   (API path, wrapper key, title key).
//! - [`BoardSpec`]: the parsed form of a document — a typed `title` plus an
//!   open extension bag carrying every other field through to the create
//!   call untouched.
//! - [`store::DocumentStore`]: scanning, fingerprinting, and parse
//!   memoization.

pub mod store;

pub use store::{DocumentStore, StoreError};

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// The kind of board a document (and its remote resource) describes.
///
/// Each kind carries its own API conventions, observed from the remote
/// service:
///
/// | kind        | API root     | list key       | wrapper | title key     |
/// |-------------|--------------|----------------|---------|---------------|
/// | Dashboard   | `/v1/dash`   | `dashes`       | `dash:` | `title`       |
/// | Screenboard | `/v1/screen` | `screenboards` | none    | `board_title` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardKind {
    /// A timeboard-style dashboard.
    Dashboard,
    /// A free-form screenboard.
    Screenboard,
}

impl BoardKind {
    /// API path root for this kind, e.g. `/v1/dash`.
    #[must_use]
    pub fn api_root(self) -> &'static str {
        match self {
            Self::Dashboard => "/v1/dash",
            Self::Screenboard => "/v1/screen",
        }
    }

    /// Key naming the resource array in this kind's list response.
    #[must_use]
    pub fn list_key(self) -> &'static str {
        match self {
            Self::Dashboard => "dashes",
            Self::Screenboard => "screenboards",
        }
    }

    /// Top-level wrapper key in document files, if this kind uses one.
    ///
    /// Dashboard files nest the actual board one level down under `dash:`;
    /// screenboard files declare the board at the top level.
    #[must_use]
    pub fn wrapper_key(self) -> Option<&'static str> {
        match self {
            Self::Dashboard => Some("dash"),
            Self::Screenboard => None,
        }
    }

    /// Key holding the board's title inside the (unwrapped) body.
    #[must_use]
    pub fn title_key(self) -> &'static str {
        match self {
            Self::Dashboard => "title",
            Self::Screenboard => "board_title",
        }
    }
}

impl fmt::Display for BoardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dashboard => f.write_str("dashboard"),
            Self::Screenboard => f.write_str("screenboard"),
        }
    }
}

/// Errors that can occur while parsing a document file.
#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    /// The file's content is not valid YAML.
    #[error("Failed to parse {path}: {source}")]
    Yaml {
        /// File that failed to parse
        path: PathBuf,
        /// The underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// The content parsed, but could not be represented as a JSON object
    /// (e.g. non-string mapping keys, or a top-level scalar/sequence).
    #[error("Document {path} is not a string-keyed mapping: {detail}")]
    NotAMapping {
        /// File with the offending content
        path: PathBuf,
        /// What was wrong with the shape
        detail: String,
    },

    /// A dashboard document is missing its top-level wrapper key.
    #[error("Document {path} has no top-level `{key}:` entry")]
    MissingWrapper {
        /// File with the offending content
        path: PathBuf,
        /// The expected wrapper key
        key: &'static str,
    },

    /// The document body has no usable string title.
    #[error("Document {path} has no usable `{key}` field")]
    MissingTitle {
        /// File with the offending content
        path: PathBuf,
        /// The expected title key
        key: &'static str,
    },
}

/// Parsed form of one document: the title the reconciliation engine matches
/// on, plus everything else the file declared, preserved verbatim.
///
/// The extension bag keeps round-trip fidelity: fields this tool does not
/// recognize still reach the remote service unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSpec {
    /// Declared board title, extracted from the kind-specific title key.
    pub title: String,
    /// Every other field of the (unwrapped) board body.
    pub extra: Map<String, Value>,
}

impl BoardSpec {
    /// Parse raw YAML bytes into a `BoardSpec` using `kind`'s conventions.
    ///
    /// `path` is used only for error context. Malformed content, a missing
    /// wrapper, or a missing title are all hard errors; there is no
    /// partial-success mode.
    pub fn parse(kind: BoardKind, path: &Path, bytes: &[u8]) -> Result<Self, DocumentError> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_slice(bytes).map_err(|source| DocumentError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;

        let json = serde_json::to_value(&yaml).map_err(|e| DocumentError::NotAMapping {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let Value::Object(mut top) = json else {
            return Err(DocumentError::NotAMapping {
                path: path.to_path_buf(),
                detail: "top level is not a mapping".to_string(),
            });
        };

        let mut body = match kind.wrapper_key() {
            Some(key) => match top.remove(key) {
                Some(Value::Object(inner)) => inner,
                Some(_) | None => {
                    return Err(DocumentError::MissingWrapper {
                        path: path.to_path_buf(),
                        key,
                    })
                }
            },
            None => top,
        };

        let title = match body.remove(kind.title_key()) {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => {
                return Err(DocumentError::MissingTitle {
                    path: path.to_path_buf(),
                    key: kind.title_key(),
                })
            }
        };

        Ok(Self { title, extra: body })
    }

    /// Reassemble the full JSON body to send to the create endpoint:
    /// the title under `kind`'s title key plus every extension field.
    #[must_use]
    pub fn to_body(&self, kind: BoardKind) -> Map<String, Value> {
        let mut body = Map::with_capacity(self.extra.len() + 1);
        body.insert(
            kind.title_key().to_string(),
            Value::String(self.title.clone()),
        );
        for (k, v) in &self.extra {
            body.insert(k.clone(), v.clone());
        }
        body
    }
}
