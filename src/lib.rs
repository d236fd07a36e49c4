//! boardsync - Dashboards as Code for Datadog
//!
//! Scans directories of YAML dashboard/screenboard definitions, tracks
//! content fingerprints in a durable cache, and reconciles the remote API
//! so its state matches the latest file contents.

pub mod cache;
pub mod cli;
pub mod config;
pub mod documents;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod reconcile;
pub mod remote;

use anyhow::Context;

use crate::cache::FingerprintCache;
use crate::cli::Cli;
use crate::config::{KindPaths, Settings};
use crate::documents::{BoardKind, DocumentStore};
use crate::error::ExitCode;
use crate::reconcile::Reconciler;
use crate::remote::{DatadogClient, RemoteApi};

/// Run the full apply (or dry-run) sequence against the production API
/// client.
pub fn run_app(cli: &Cli, settings: &Settings) -> anyhow::Result<ExitCode> {
    let client = DatadogClient::new(settings).context("Failed to build API client")?;
    run_sync(&client, cli, settings)
}

/// Validate credentials, then for each kind scan, render, and reconcile.
///
/// Rejected credentials stop the run before anything is scanned. Stops at
/// the first failure. Each kind's fingerprint cache is opened for the
/// duration of that kind's pass and released on every exit path.
pub fn run_sync<A: RemoteApi>(api: &A, cli: &Cli, settings: &Settings) -> anyhow::Result<ExitCode> {
    let valid = api
        .validate_credentials()
        .context("Failed to validate credentials")?;
    if !valid {
        log::error!("The remote service rejected the configured credentials");
        return Ok(ExitCode::InvalidCredentials);
    }
    log::debug!("Credentials accepted");

    let kinds: [(BoardKind, &KindPaths); 2] = [
        (BoardKind::Dashboard, &settings.dashboards),
        (BoardKind::Screenboard, &settings.screenboards),
    ];

    for (kind, paths) in kinds {
        let cache = FingerprintCache::open(&paths.cache)
            .with_context(|| format!("Failed to open the {} fingerprint cache", kind))?;
        let mut store = DocumentStore::new(&paths.root, kind, cache);

        let docs = store
            .render()
            .with_context(|| format!("Failed to render {} documents", kind))?;
        log::info!(
            "Rendered {} distinct {} document(s) from {}",
            docs.len(),
            kind,
            paths.root.display()
        );

        let engine = Reconciler::new(api);
        if cli.dry_run {
            engine
                .dry_run(kind, &docs)
                .with_context(|| format!("Dry run failed for {}s", kind))?;
        } else {
            engine
                .apply(kind, &docs)
                .with_context(|| format!("Reconciliation failed for {}s", kind))?;
        }
    }

    Ok(ExitCode::Success)
}
