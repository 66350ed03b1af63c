//! End-to-end `generate` pipeline.
//!
//! Every selected repository runs checkout → preprocess → scan → copy →
//! index as one unit of work on a bounded worker pool. A failure only fails
//! its own repository; the run always ends with a [`RunSummary`] and a
//! single `.gitignore` merge covering every scheduled repository.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{Instrument, info, info_span, instrument, warn};

use docpup_scanner::{scan, scan_multiple_paths};
use docpup_shared::{CheckoutRequest, DocpupError, ProjectConfig, RepoSpec, Result};

use crate::assembler::{copy_tree, reset_dir};
use crate::checkout::CheckoutProvider;
use crate::gitignore::{derive_entries, gitignore_path, update_ignore};
use crate::index::{build_index, write_index};
use crate::preprocess::preprocess;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Step of a repository's pipeline, reported through [`ProgressReporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Checkout,
    Preprocess,
    Scan,
    Copy,
    Index,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checkout => "checking out",
            Self::Preprocess => "preprocessing",
            Self::Scan => "scanning",
            Self::Copy => "copying",
            Self::Index => "indexing",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repository that went through the whole pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct RepoReport {
    pub name: String,
    /// Files copied into the repository's output directory.
    pub files: usize,
    pub index_path: PathBuf,
}

/// A repository that failed, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoFailure {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum RepoOutcome {
    Succeeded(RepoReport),
    Failed(RepoFailure),
}

impl RepoOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Succeeded(report) => &report.name,
            Self::Failed(failure) => &failure.name,
        }
    }
}

/// Aggregate result of a `generate` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// In configuration order.
    pub failures: Vec<RepoFailure>,
}

impl RunSummary {
    fn record(&mut self, outcome: RepoOutcome) {
        match outcome {
            RepoOutcome::Succeeded(_) => self.succeeded += 1,
            RepoOutcome::Failed(failure) => {
                self.failed += 1;
                self.failures.push(failure);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called once a worker slot picks up a repository.
    fn repo_started(&self, name: &str);
    /// Called when a repository enters a new phase.
    fn repo_phase(&self, name: &str, phase: Phase);
    /// Called when a repository finishes; `completed` counts finished repositories.
    fn repo_finished(&self, outcome: &RepoOutcome, completed: usize, total: usize);
    /// Called when the whole run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn repo_started(&self, _name: &str) {}
    fn repo_phase(&self, _name: &str, _phase: Phase) {}
    fn repo_finished(&self, _outcome: &RepoOutcome, _completed: usize, _total: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Restrict `repos` to the names in `only` (all repos when `only` is empty).
///
/// Unknown names are warned about; an empty selection is a config error.
pub fn select_repos(repos: &[RepoSpec], only: &[String]) -> Result<Vec<RepoSpec>> {
    if only.is_empty() {
        return Ok(repos.to_vec());
    }

    for name in only {
        if !repos.iter().any(|r| &r.name == name) {
            warn!(repo = %name, "requested repo is not configured");
        }
    }

    let selected: Vec<RepoSpec> = repos
        .iter()
        .filter(|r| only.contains(&r.name))
        .cloned()
        .collect();
    if selected.is_empty() {
        return Err(DocpupError::config(format!(
            "no configured repo matches '{}'",
            only.join(",")
        )));
    }
    Ok(selected)
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

struct Shared {
    config: Arc<ProjectConfig>,
    provider: Arc<dyn CheckoutProvider>,
    progress: Arc<dyn ProgressReporter>,
    completed: AtomicUsize,
    total: usize,
}

impl Shared {
    fn finish(&self, outcome: &RepoOutcome) {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.progress.repo_finished(outcome, completed, self.total);
    }
}

/// Run the pipeline for `repos` with at most `config.concurrency` in flight.
///
/// Only failing to create the docs or indices root is an error; everything
/// per-repository ends up in the returned summary.
#[instrument(skip_all, fields(repos = repos.len(), concurrency = config.concurrency))]
pub async fn generate(
    config: Arc<ProjectConfig>,
    repos: Vec<RepoSpec>,
    provider: Arc<dyn CheckoutProvider>,
    progress: Arc<dyn ProgressReporter>,
) -> Result<RunSummary> {
    let start = Instant::now();

    for dir in [config.docs_path(), config.indices_path()] {
        std::fs::create_dir_all(&dir).map_err(|e| DocpupError::io(&dir, e))?;
    }

    let total = repos.len();
    info!(total, "starting generate");

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let shared = Arc::new(Shared {
        config: Arc::clone(&config),
        provider,
        progress: Arc::clone(&progress),
        completed: AtomicUsize::new(0),
        total,
    });

    let mut handles = Vec::with_capacity(total);
    for repo in repos.iter().cloned() {
        let sem = Arc::clone(&semaphore);
        let shared = Arc::clone(&shared);
        let name = repo.name.clone();
        let span = info_span!("repo", repo = %repo.name);

        let handle = tokio::spawn(
            async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    let outcome = RepoOutcome::Failed(RepoFailure {
                        name: repo.name.clone(),
                        reason: "worker pool closed".into(),
                    });
                    shared.finish(&outcome);
                    return outcome;
                };
                process_repo(&shared, repo).await
            }
            .instrument(span),
        );
        handles.push((name, handle));
    }

    let mut summary = RunSummary {
        total,
        ..RunSummary::default()
    };
    for (name, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let outcome = RepoOutcome::Failed(RepoFailure {
                    name,
                    reason: DocpupError::Task(e.to_string()).to_string(),
                });
                shared.finish(&outcome);
                outcome
            }
        };
        summary.record(outcome);
    }

    let entries = derive_entries(&config, &repos);
    if let Err(e) = update_ignore(&config.root, &entries, &config.gitignore.section_header) {
        warn!(path = %gitignore_path(&config).display(), error = %e, "failed to update .gitignore");
    }

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "generate finished"
    );
    progress.done(&summary);
    Ok(summary)
}

async fn process_repo(shared: &Shared, repo: RepoSpec) -> RepoOutcome {
    shared.progress.repo_started(&repo.name);

    let outcome = match run_repo(shared, &repo).await {
        Ok(report) => {
            info!(files = report.files, index = %report.index_path.display(), "repo done");
            RepoOutcome::Succeeded(report)
        }
        Err(e) => {
            warn!(error = %e, "repo failed");
            RepoOutcome::Failed(RepoFailure {
                name: repo.name.clone(),
                reason: e.to_string(),
            })
        }
    };

    shared.finish(&outcome);
    outcome
}

/// Run one repository inside a private temporary workspace.
async fn run_repo(shared: &Shared, repo: &RepoSpec) -> Result<RepoReport> {
    let workspace = tempfile::Builder::new()
        .prefix(&format!("docpup-{}-", repo.name))
        .tempdir()
        .map_err(|e| DocpupError::io(std::env::temp_dir(), e))?;
    let workspace_path = workspace.path().to_path_buf();

    let result = run_in_workspace(shared, repo, &workspace_path).await;

    if let Err(e) = workspace.close() {
        warn!(path = %workspace_path.display(), error = %e, "failed to remove temporary workspace");
    }
    result
}

async fn run_in_workspace(shared: &Shared, repo: &RepoSpec, workspace: &Path) -> Result<RepoReport> {
    shared.progress.repo_phase(&repo.name, Phase::Checkout);
    let request = CheckoutRequest {
        remote: repo.remote.clone(),
        paths: repo.source_paths.clone(),
        reference: repo.reference.clone(),
        destination: workspace.join("checkout"),
    };
    let local = shared.provider.checkout(&request).await?;

    let config = Arc::clone(&shared.config);
    let progress = Arc::clone(&shared.progress);
    let repo = repo.clone();
    let checkout_root = request.destination;
    let span = tracing::Span::current();

    tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        local_steps(&config, progress.as_ref(), &repo, &checkout_root, &local)
    })
    .await
    .map_err(|e| DocpupError::Task(e.to_string()))?
}

/// Filesystem-bound part of the pipeline, run off the async workers.
fn local_steps(
    config: &ProjectConfig,
    progress: &dyn ProgressReporter,
    repo: &RepoSpec,
    checkout_root: &Path,
    local: &[PathBuf],
) -> Result<RepoReport> {
    let scan_config = repo.scan_config(&config.scan);

    let (source_root, tree) = match &repo.preprocess {
        Some(directive) => {
            progress.repo_phase(&repo.name, Phase::Preprocess);
            let output = preprocess(checkout_root, Some(directive))?;
            progress.repo_phase(&repo.name, Phase::Scan);
            let tree = scan(&output, &scan_config)?;
            (output, tree)
        }
        None => {
            progress.repo_phase(&repo.name, Phase::Scan);
            match local {
                [single] if single.is_dir() => (single.clone(), scan(single, &scan_config)?),
                _ => (
                    checkout_root.to_path_buf(),
                    scan_multiple_paths(checkout_root, local, &scan_config)?,
                ),
            }
        }
    };

    progress.repo_phase(&repo.name, Phase::Copy);
    let dest = config.repo_output_dir(&repo.name);
    reset_dir(&dest)?;
    let files = copy_tree(&tree, &source_root, &dest)?;

    progress.repo_phase(&repo.name, Phase::Index);
    let document = build_index(
        &tree,
        &repo.name,
        &config.index_root(&repo.name),
        repo.content_type,
    );
    let index_path = write_index(&config.indices_path(), &repo.name, &document)?;

    Ok(RepoReport {
        name: repo.name.clone(),
        files,
        index_path,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use docpup_shared::parse_config;

    use super::*;
    use crate::checkout::local_paths;

    /// Materializes a fixed layout; remotes containing "broken" fail.
    #[derive(Default)]
    struct FakeProvider {
        destinations: Mutex<Vec<PathBuf>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Option<Duration>,
    }

    const LAYOUT: &[(&str, &str)] = &[
        ("docs/index.md", "# Home"),
        ("docs/guide/intro.md", "# Intro"),
        ("docs/guide/notes.txt", "plain"),
        ("docs/node_modules/pkg/readme.md", "# vendored"),
        ("site/page.html", "<html><body><main><h1>Page</h1></main></body></html>"),
        ("README.md", "# Readme"),
    ];

    #[async_trait]
    impl CheckoutProvider for FakeProvider {
        async fn checkout(&self, request: &CheckoutRequest) -> Result<Vec<PathBuf>> {
            self.destinations
                .lock()
                .unwrap()
                .push(request.destination.clone());

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if request.remote.contains("broken") {
                return Err(DocpupError::Checkout("remote unreachable".into()));
            }
            for (rel, content) in LAYOUT {
                let path = request.destination.join(rel);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, content).unwrap();
            }
            local_paths(request)
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn repo_started(&self, name: &str) {
            self.events.lock().unwrap().push(format!("start {name}"));
        }
        fn repo_phase(&self, name: &str, phase: Phase) {
            self.events.lock().unwrap().push(format!("{name} {phase}"));
        }
        fn repo_finished(&self, outcome: &RepoOutcome, completed: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("finish {} {completed}/{total}", outcome.name()));
        }
        fn done(&self, summary: &RunSummary) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {}/{}", summary.succeeded, summary.total));
        }
    }

    const THREE_REPOS: &str = r#"
[gitignore]
add_docs_dir = true
add_index_files = true

[[repos]]
name = "alpha"
repo = "https://example.com/alpha.git"
source_path = "docs"

[[repos]]
name = "beta"
repo = "https://example.com/broken.git"
source_path = "docs"

[[repos]]
name = "gamma"
repo = "https://example.com/gamma.git"
source_paths = ["docs/guide", "README.md"]
content_type = "source"
"#;

    async fn run_with(
        toml: &str,
        root: &Path,
        provider: Arc<FakeProvider>,
        progress: Arc<dyn ProgressReporter>,
    ) -> RunSummary {
        let config = Arc::new(parse_config(toml, root).unwrap());
        let repos = config.repos.clone();
        generate(config, repos, provider, progress).await.unwrap()
    }

    #[tokio::test]
    async fn failing_repo_does_not_stop_others() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let provider = Arc::new(FakeProvider::default());

        let summary = run_with(THREE_REPOS, root, Arc::clone(&provider), Arc::new(SilentProgress)).await;

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].name, "beta");
        assert!(summary.failures[0].reason.contains("remote unreachable"));

        let docs = root.join("documentation");
        assert!(docs.join("alpha/index.md").is_file());
        assert!(docs.join("alpha/guide/intro.md").is_file());
        assert!(!docs.join("alpha/guide/notes.txt").exists());
        assert!(!docs.join("alpha/node_modules").exists());

        assert!(docs.join("gamma/docs/guide/intro.md").is_file());
        assert!(docs.join("gamma/README.md").is_file());

        assert!(!docs.join("beta").exists());
        assert!(!docs.join("indices/beta-index.md").exists());
    }

    #[tokio::test]
    async fn writes_indices_and_gitignore() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        run_with(THREE_REPOS, root, Arc::new(FakeProvider::default()), Arc::new(SilentProgress)).await;

        let alpha = std::fs::read_to_string(root.join("documentation/indices/alpha-index.md")).unwrap();
        assert!(alpha.starts_with("<!-- ALPHA-AGENTS-MD-START -->[alpha Docs Index]"));
        assert!(alpha.contains("|root: ./documentation/alpha|"));
        assert!(alpha.contains("|(root):{index.md}|guide:{intro.md}<!-- ALPHA-AGENTS-MD-END -->"));

        let gamma = std::fs::read_to_string(root.join("documentation/indices/gamma-index.md")).unwrap();
        assert!(gamma.contains("[gamma Source Index]"));
        assert!(gamma.contains("|(root):{README.md}|docs/guide:{intro.md}"));

        let ignore = std::fs::read_to_string(root.join(".gitignore")).unwrap();
        assert!(ignore.starts_with("# docpup generated docs\n"));
        assert!(ignore.contains("documentation/\n"));
        assert!(ignore.contains("documentation/indices/beta-index.md\n"));
    }

    #[tokio::test]
    async fn output_goes_to_each_repo_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let toml = r#"
docs_dir = "out/docs"
indices_dir = "out/idx"

[[repos]]
name = "alpha"
repo = "https://example.com/alpha.git"
source_path = "docs"

[[repos]]
name = "delta"
repo = "https://example.com/delta.git"
source_path = "docs"
"#;
        let config = parse_config(toml, tmp.path()).unwrap();
        run_with(toml, tmp.path(), Arc::new(FakeProvider::default()), Arc::new(SilentProgress)).await;

        for name in ["alpha", "delta"] {
            let out = config.repo_output_dir(name);
            assert_eq!(out, tmp.path().join("out/docs").join(name));
            assert!(out.join("guide/intro.md").is_file(), "{name}");
            assert!(tmp.path().join(format!("out/idx/{name}-index.md")).is_file());
        }
    }

    #[tokio::test]
    async fn temporary_workspaces_are_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeProvider::default());
        run_with(THREE_REPOS, tmp.path(), Arc::clone(&provider), Arc::new(SilentProgress)).await;

        let destinations = provider.destinations.lock().unwrap();
        assert_eq!(destinations.len(), 3);
        let unique: HashSet<_> = destinations.iter().collect();
        assert_eq!(unique.len(), 3);
        for dest in destinations.iter() {
            assert!(!dest.parent().unwrap().exists(), "{dest:?} left behind");
        }
    }

    #[tokio::test]
    async fn stale_output_is_replaced() {
        let tmp = tempfile::tempdir().unwrap();
        let stale = tmp.path().join("documentation/alpha/old/removed.md");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        run_with(THREE_REPOS, tmp.path(), Arc::new(FakeProvider::default()), Arc::new(SilentProgress)).await;
        assert!(!stale.exists());
        assert!(tmp.path().join("documentation/alpha/index.md").is_file());
    }

    #[tokio::test]
    async fn html_preprocess_feeds_scan() {
        let tmp = tempfile::tempdir().unwrap();
        let toml = r#"
[[repos]]
name = "web"
repo = "https://example.com/web.git"
source_path = "site"

[repos.preprocess]
kind = "html"
"#;
        let summary = run_with(toml, tmp.path(), Arc::new(FakeProvider::default()), Arc::new(SilentProgress)).await;
        assert_eq!(summary.succeeded, 1, "{:?}", summary.failures);

        let page = std::fs::read_to_string(tmp.path().join("documentation/web/page.md")).unwrap();
        assert!(page.contains("# Page"));
        let index = std::fs::read_to_string(tmp.path().join("documentation/indices/web-index.md")).unwrap();
        assert!(index.contains("|(root):{page.md}"));
    }

    #[tokio::test]
    async fn preprocess_failure_is_per_repo() {
        let tmp = tempfile::tempdir().unwrap();
        let toml = r#"
[[repos]]
name = "web"
repo = "https://example.com/web.git"
source_path = "docs"

[repos.preprocess]
kind = "html"
"#;
        let summary = run_with(toml, tmp.path(), Arc::new(FakeProvider::default()), Arc::new(SilentProgress)).await;
        assert_eq!(summary.failed, 1);
        assert!(summary.failures[0].reason.contains("produced no markdown"));
    }

    #[tokio::test]
    async fn concurrency_bounds_in_flight_repos() {
        let tmp = tempfile::tempdir().unwrap();
        let mut toml = String::from("concurrency = 2\n");
        for i in 0..5 {
            toml.push_str(&format!(
                "\n[[repos]]\nname = \"r{i}\"\nrepo = \"https://example.com/r{i}.git\"\nsource_path = \"docs\"\n"
            ));
        }
        let provider = Arc::new(FakeProvider {
            delay: Some(Duration::from_millis(20)),
            ..FakeProvider::default()
        });

        let summary = run_with(&toml, tmp.path(), Arc::clone(&provider), Arc::new(SilentProgress)).await;
        assert_eq!(summary.succeeded, 5);
        let max = provider.max_in_flight.load(Ordering::SeqCst);
        assert!((1..=2).contains(&max), "max in flight was {max}");
    }

    #[tokio::test]
    async fn progress_events_are_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let progress = Arc::new(RecordingProgress::default());
        let toml = THREE_REPOS.replacen("[gitignore]", "concurrency = 1\n\n[gitignore]", 1);

        run_with(&toml, tmp.path(), Arc::new(FakeProvider::default()), progress.clone()).await;

        let events = progress.events.lock().unwrap();
        let alpha: Vec<&str> = events
            .iter()
            .filter(|e| e.starts_with("alpha "))
            .map(String::as_str)
            .collect();
        assert_eq!(
            alpha,
            vec!["alpha checking out", "alpha scanning", "alpha copying", "alpha indexing"]
        );

        let finished: Vec<&String> = events.iter().filter(|e| e.starts_with("finish")).collect();
        assert_eq!(finished.len(), 3);
        assert!(finished.iter().any(|e| e.ends_with("3/3")));
        assert!(events.iter().any(|e| e == "start beta"));
        assert_eq!(events.last().map(String::as_str), Some("done 2/3"));
    }

    #[tokio::test]
    async fn missing_source_path_fails_repo() {
        let tmp = tempfile::tempdir().unwrap();
        let toml = r#"
[[repos]]
name = "ghost"
repo = "https://example.com/ghost.git"
source_path = "missing"
"#;
        let summary = run_with(toml, tmp.path(), Arc::new(FakeProvider::default()), Arc::new(SilentProgress)).await;
        assert_eq!(summary.failed, 1);
        assert!(summary.failures[0].reason.contains("not found in repository"));
    }

    #[test]
    fn select_repos_filters_by_name() {
        let config = parse_config(THREE_REPOS, Path::new("/p")).unwrap();

        let all = select_repos(&config.repos, &[]).unwrap();
        assert_eq!(all.len(), 3);

        let only = vec!["gamma".to_string(), "nope".to_string()];
        let picked = select_repos(&config.repos, &only).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "gamma");

        let err = select_repos(&config.repos, &["nope".to_string()]).unwrap_err();
        assert!(matches!(err, DocpupError::Config { .. }));
    }

    #[test]
    fn summary_serializes_to_json() {
        let summary = RunSummary {
            total: 2,
            succeeded: 1,
            failed: 1,
            failures: vec![RepoFailure {
                name: "beta".into(),
                reason: "checkout failed: remote unreachable".into(),
            }],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["total"], 2);
        assert_eq!(json["failures"][0]["name"], "beta");
    }
}
