//! Reconciliation engine: converge remote state toward the desired
//! document set.
//!
//! One document at a time, in no particular order between documents:
//! list the existing resources fresh, find one with the exact same title,
//! delete it if present, then create the document as a new resource. The
//! delete+create pair is not transactional; when the create fails after a
//! successful delete, the error says so explicitly so the operator knows
//! the resource is currently absent and can re-run.

use std::sync::Arc;

use crate::documents::{BoardKind, BoardSpec};
use crate::remote::{ApiError, RemoteApi};

/// Errors from a reconciliation run.
#[derive(thiserror::Error, Debug)]
pub enum ReconcileError {
    /// A remote call failed before any destructive step had happened for
    /// the current document.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The old resource was deleted, then the replacement create failed.
    /// The resource named by `title` is now absent remotely until a re-run
    /// succeeds.
    #[error("Deleted {kind} {id} (\"{title}\") but creating its replacement failed: {source}")]
    CreateFailedAfterDelete {
        /// Kind of the affected resource
        kind: BoardKind,
        /// Remote id that was deleted
        id: String,
        /// Title of the affected document
        title: String,
        /// The create failure
        #[source]
        source: ApiError,
    },
}

/// Pushes desired documents to the remote service through a [`RemoteApi`].
pub struct Reconciler<'a, A: RemoteApi> {
    api: &'a A,
}

impl<'a, A: RemoteApi> Reconciler<'a, A> {
    /// Create an engine over the given API handle.
    #[must_use]
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Apply every document: delete any same-titled existing resource,
    /// then create the document as a new resource.
    ///
    /// The resource list is re-fetched before every document so each
    /// decision observes the effects of the previous one. Stops at the
    /// first failure; there is no partial-success report.
    pub fn apply(&self, kind: BoardKind, docs: &[Arc<BoardSpec>]) -> Result<(), ReconcileError> {
        for doc in docs {
            let existing = self.api.list(kind)?;
            // First match wins if the remote set carries duplicate titles.
            let matched = existing.iter().find(|r| r.title == doc.title);

            let deleted = match matched {
                Some(resource) => {
                    log::info!(
                        "Replacing {} {} (\"{}\")",
                        kind,
                        resource.id,
                        resource.title
                    );
                    self.api.delete(kind, &resource.id)?;
                    Some(resource)
                }
                None => None,
            };

            match self.api.create(kind, &doc.to_body(kind)) {
                Ok(id) => log::info!("Created {} \"{}\" as {}", kind, doc.title, id),
                Err(source) => {
                    return Err(match deleted {
                        Some(resource) => ReconcileError::CreateFailedAfterDelete {
                            kind,
                            id: resource.id.clone(),
                            title: doc.title.clone(),
                            source,
                        },
                        None => ReconcileError::Api(source),
                    })
                }
            }
        }
        Ok(())
    }

    /// Validate every document against the remote service without leaving
    /// residue: create each one, then immediately delete it again.
    ///
    /// Any failure at either step aborts the run.
    pub fn dry_run(&self, kind: BoardKind, docs: &[Arc<BoardSpec>]) -> Result<(), ReconcileError> {
        for doc in docs {
            let id = self.api.create(kind, &doc.to_body(kind))?;
            self.api.delete(kind, &id)?;
            log::info!("Dry run accepted {} \"{}\"", kind, doc.title);
        }
        Ok(())
    }
}
