//! End-to-end flow: files on disk through the document store into the
//! reconciliation engine.

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tempfile::tempdir;

use boardsync::cache::FingerprintCache;
use boardsync::documents::{BoardKind, DocumentStore};
use boardsync::reconcile::Reconciler;
use boardsync::remote::{ApiError, RemoteApi, RemoteResource};

/// Minimal remote fake that stores the full created bodies.
#[derive(Default)]
struct RecordingApi {
    resources: RefCell<Vec<RemoteResource>>,
    created_bodies: RefCell<Vec<Map<String, Value>>>,
    next_id: RefCell<u64>,
    reject_credentials: bool,
    validations: RefCell<u32>,
}

impl RemoteApi for RecordingApi {
    fn validate_credentials(&self) -> Result<bool, ApiError> {
        *self.validations.borrow_mut() += 1;
        Ok(!self.reject_credentials)
    }

    fn list(&self, _kind: BoardKind) -> Result<Vec<RemoteResource>, ApiError> {
        Ok(self.resources.borrow().clone())
    }

    fn create(&self, kind: BoardKind, body: &Map<String, Value>) -> Result<String, ApiError> {
        let title = body
            .get(kind.title_key())
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.created_bodies.borrow_mut().push(body.clone());
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        let id = next.to_string();
        self.resources.borrow_mut().push(RemoteResource {
            id: id.clone(),
            title,
        });
        Ok(id)
    }

    fn delete(&self, _kind: BoardKind, id: &str) -> Result<(), ApiError> {
        self.resources.borrow_mut().retain(|r| r.id != id);
        Ok(())
    }
}

fn store_for(root: &Path, kind: BoardKind, cache_dir: &Path) -> DocumentStore {
    let cache = FingerprintCache::open(&cache_dir.join("cache.db")).unwrap();
    DocumentStore::new(root, kind, cache)
}

#[test]
fn test_apply_pushes_dashboard_documents_from_disk() {
    let root = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    fs::write(
        root.path().join("cpu.yml"),
        "dash:\n  title: CPU Usage\n  description: Host CPU\n  graphs: []\n",
    )
    .unwrap();
    fs::write(
        root.path().join("mem.yml"),
        "dash:\n  title: Memory\n  graphs: []\n",
    )
    .unwrap();

    let mut store = store_for(root.path(), BoardKind::Dashboard, cache_dir.path());
    let docs = store.render().unwrap();

    let api = RecordingApi::default();
    Reconciler::new(&api)
        .apply(BoardKind::Dashboard, &docs)
        .unwrap();

    let mut titles: Vec<String> = api
        .resources
        .borrow()
        .iter()
        .map(|r| r.title.clone())
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["CPU Usage", "Memory"]);

    // The full unwrapped body reached the create call.
    let bodies = api.created_bodies.borrow();
    let cpu = bodies
        .iter()
        .find(|b| b.get("title") == Some(&Value::String("CPU Usage".into())))
        .unwrap();
    assert_eq!(cpu.get("description"), Some(&Value::String("Host CPU".into())));
    assert!(cpu.get("graphs").is_some());
    assert!(!cpu.contains_key("dash"));
}

#[test]
fn test_duplicate_files_yield_one_remote_resource() {
    let root = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let content = "board_title: Fleet Overview\nwidgets: []\n";
    fs::write(root.path().join("a.yml"), content).unwrap();
    fs::write(root.path().join("b.yml"), content).unwrap();

    let mut store = store_for(root.path(), BoardKind::Screenboard, cache_dir.path());
    let docs = store.render().unwrap();
    assert_eq!(docs.len(), 1);

    let api = RecordingApi::default();
    Reconciler::new(&api)
        .apply(BoardKind::Screenboard, &docs)
        .unwrap();

    assert_eq!(api.resources.borrow().len(), 1);
}

#[test]
fn test_second_run_replaces_instead_of_duplicating() {
    let root = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let doc = root.path().join("fleet.yml");
    fs::write(&doc, "board_title: Fleet Overview\nwidgets: []\n").unwrap();

    let api = RecordingApi::default();

    {
        let mut store = store_for(root.path(), BoardKind::Screenboard, cache_dir.path());
        let docs = store.render().unwrap();
        Reconciler::new(&api)
            .apply(BoardKind::Screenboard, &docs)
            .unwrap();
    }

    // New process run against the same cache location, changed file.
    fs::write(&doc, "board_title: Fleet Overview\nwidgets: [{}]\n").unwrap();
    {
        let mut store = store_for(root.path(), BoardKind::Screenboard, cache_dir.path());
        let docs = store.render().unwrap();
        Reconciler::new(&api)
            .apply(BoardKind::Screenboard, &docs)
            .unwrap();
    }

    let resources = api.resources.borrow();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].title, "Fleet Overview");
    // The surviving resource is the second create.
    assert_eq!(resources[0].id, "2");
}

fn settings_for(dash: &Path, screen: &Path, cache_dir: &Path) -> boardsync::config::Settings {
    boardsync::config::Settings {
        api_key: "api".to_string(),
        app_key: "app".to_string(),
        host: "https://app.datadoghq.com".to_string(),
        dashboards: boardsync::config::KindPaths {
            root: dash.to_path_buf(),
            cache: cache_dir.join("dash.db"),
        },
        screenboards: boardsync::config::KindPaths {
            root: screen.to_path_buf(),
            cache: cache_dir.join("screen.db"),
        },
        request_timeout: std::time::Duration::from_secs(10),
        retry_timeout: std::time::Duration::from_secs(50),
    }
}

fn apply_cli() -> boardsync::cli::Cli {
    boardsync::cli::Cli {
        dry_run: false,
        verbose: 0,
        quiet: false,
    }
}

#[test]
fn test_rejected_credentials_stop_the_run_before_scanning() {
    let dash = tempdir().unwrap();
    let screen = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    fs::write(dash.path().join("cpu.yml"), "dash:\n  title: CPU Usage\n").unwrap();

    let api = RecordingApi {
        reject_credentials: true,
        ..RecordingApi::default()
    };
    let settings = settings_for(dash.path(), screen.path(), cache_dir.path());

    let code = boardsync::run_sync(&api, &apply_cli(), &settings).unwrap();

    assert_eq!(code, boardsync::error::ExitCode::InvalidCredentials);
    assert_eq!(*api.validations.borrow(), 1);
    // Nothing was scanned or pushed: no cache was even opened.
    assert!(api.created_bodies.borrow().is_empty());
    assert!(!settings.dashboards.cache.exists());
    assert!(!settings.screenboards.cache.exists());
}

#[test]
fn test_accepted_credentials_run_both_kinds() {
    let dash = tempdir().unwrap();
    let screen = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    fs::write(dash.path().join("cpu.yml"), "dash:\n  title: CPU Usage\n").unwrap();
    fs::write(screen.path().join("fleet.yml"), "board_title: Fleet\n").unwrap();

    let api = RecordingApi::default();
    let settings = settings_for(dash.path(), screen.path(), cache_dir.path());

    let code = boardsync::run_sync(&api, &apply_cli(), &settings).unwrap();

    assert_eq!(code, boardsync::error::ExitCode::Success);
    assert_eq!(*api.validations.borrow(), 1);
    let mut titles: Vec<String> = api
        .resources
        .borrow()
        .iter()
        .map(|r| r.title.clone())
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["CPU Usage", "Fleet"]);
    assert!(settings.dashboards.cache.exists());
    assert!(settings.screenboards.cache.exists());
}
