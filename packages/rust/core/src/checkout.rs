//! Fetching a subset of a remote repository.
//!
//! The orchestrator talks to a [`CheckoutProvider`] so tests can swap in a
//! local fake. [`GitCheckout`] shells out to `git` with a shallow, blobless,
//! sparse clone.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use docpup_shared::{CheckoutRequest, DocpupError, Result, resolve_within};

/// Populates `request.destination` with the requested paths of a remote.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Fetch the requested paths; returns their local locations, in request order.
    ///
    /// `request.destination` does not exist yet and is created by the provider.
    async fn checkout(&self, request: &CheckoutRequest) -> Result<Vec<PathBuf>>;
}

/// Local location of each requested path, failing if any is missing.
pub fn local_paths(request: &CheckoutRequest) -> Result<Vec<PathBuf>> {
    request
        .paths
        .iter()
        .map(|p| {
            let local = resolve_within(&request.destination, p)?;
            if local.exists() {
                Ok(local)
            } else {
                Err(DocpupError::Checkout(format!(
                    "path '{p}' not found in repository {}",
                    request.remote
                )))
            }
        })
        .collect()
}

/// Whether `reference` names a full commit id rather than a branch or tag.
pub fn is_commit_sha(reference: &str) -> bool {
    reference.len() == 40 && reference.chars().all(|c| c.is_ascii_hexdigit())
}

// ---------------------------------------------------------------------------
// GitCheckout
// ---------------------------------------------------------------------------

/// Checkout provider backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCheckout {
    git: String,
}

impl Default for GitCheckout {
    fn default() -> Self {
        Self { git: "git".into() }
    }
}

impl GitCheckout {
    /// Use a specific `git` binary.
    pub fn with_binary(git: impl Into<String>) -> Self {
        Self { git: git.into() }
    }

    async fn git(&self, cwd: Option<&Path>, args: &[&str]) -> Result<()> {
        let mut cmd = Command::new(&self.git);
        if let Some(dir) = cwd {
            cmd.arg("-C").arg(dir);
        }
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(args = ?args, "running git");
        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DocpupError::Checkout(format!("git executable '{}' not found", self.git))
            } else {
                DocpupError::Checkout(format!("failed to run git: {e}"))
            }
        })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(DocpupError::Checkout(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )))
        }
    }
}

#[async_trait]
impl CheckoutProvider for GitCheckout {
    #[instrument(skip_all, fields(remote = %request.remote, reference = ?request.reference))]
    async fn checkout(&self, request: &CheckoutRequest) -> Result<Vec<PathBuf>> {
        let dest = request.destination.as_path();
        let dest_str = dest.to_string_lossy();
        let commit = request.reference.as_deref().filter(|r| is_commit_sha(r));

        let mut clone = vec!["clone", "--depth", "1", "--filter=blob:none", "--sparse"];
        if let (Some(branch), None) = (request.reference.as_deref(), commit) {
            clone.extend(["--branch", branch]);
        }
        clone.extend([request.remote.as_str(), &*dest_str]);
        self.git(None, &clone).await?;

        let patterns: Vec<String> = request
            .paths
            .iter()
            .map(|p| format!("/{}", p.trim_start_matches("./").trim_matches('/')))
            .collect();
        let mut sparse = vec!["sparse-checkout", "set", "--no-cone"];
        sparse.extend(patterns.iter().map(String::as_str));
        self.git(Some(dest), &sparse).await?;

        if let Some(sha) = commit {
            self.git(
                Some(dest),
                &["fetch", "--depth", "1", "--filter=blob:none", "origin", sha],
            )
            .await?;
            self.git(Some(dest), &["checkout", "--detach", sha]).await?;
        }

        let paths = local_paths(request)?;
        info!(paths = paths.len(), "checkout complete");
        Ok(paths)
    }
}
