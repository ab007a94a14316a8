//! Identity namespaces
//!
//! Histories recorded against different repository states must not mix, so
//! the log of a root is partitioned by the commit HEAD points at. Workspaces
//! outside version control share the `no-git` namespace.

use git2::{ErrorCode, Oid, Repository};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Namespace segment for a root's log
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// No enclosing repository, or HEAD could not be resolved
    NoVcs,
    /// Commit hash HEAD points at
    Commit(String),
}

impl Identity {
    /// Directory name used in the log layout
    pub fn segment(&self) -> &str {
        match self {
            Identity::NoVcs => "no-git",
            Identity::Commit(hash) => hash,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// How a root's identity namespace is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentitySource {
    /// Namespace by the enclosing git repository's HEAD commit
    #[default]
    Git,
    /// Single un-namespaced log per root
    None,
}

impl IdentitySource {
    /// Identity segment for `root`, or `None` when namespacing is off
    pub fn resolve(&self, root: &Path) -> Option<Identity> {
        match self {
            IdentitySource::Git => Some(GitIdentity::resolve(root)),
            IdentitySource::None => None,
        }
    }
}

/// Reads the HEAD commit of the repository enclosing a path
pub struct GitIdentity;

impl GitIdentity {
    pub fn resolve(root: &Path) -> Identity {
        match head_commit(root) {
            Ok(oid) => Identity::Commit(oid.to_string()),
            Err(err) if err.code() == ErrorCode::NotFound => {
                debug!("No git repository encloses {}", root.display());
                Identity::NoVcs
            }
            Err(err) if err.code() == ErrorCode::UnbornBranch => {
                debug!("HEAD of the repository at {} has no commits", root.display());
                Identity::NoVcs
            }
            Err(err) => {
                // Repositories libgit2 cannot open (reftable refs, newer
                // extensions) are asked of the git binary instead
                debug!("libgit2 could not read HEAD for {}: {}", root.display(), err.message());
                rev_parse_head(root).map_or(Identity::NoVcs, Identity::Commit)
            }
        }
    }
}

fn head_commit(root: &Path) -> Result<Oid, git2::Error> {
    let repository = Repository::discover(root)?;
    let commit = repository.head()?.peel_to_commit()?;
    Ok(commit.id())
}

fn rev_parse_head(root: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--verify", "--quiet", "HEAD^{commit}"])
        .current_dir(root)
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    Oid::from_str(hash).ok().map(|_| hash.to_string())
}
