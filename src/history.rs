// Git history inspection: which commits touched a page's source file.

use crate::errors::HistoryError;
use chrono::{DateTime, TimeZone, Utc};
use git2::{ErrorCode, Oid, Repository, Sort, Tree};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// A name/email pair as recorded in a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Identity {
            name: name.into(),
            email: email.into(),
        }
    }

    /// De-duplication key. Emails compare case-insensitively.
    pub fn key(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Full hex object id.
    pub id: String,
    pub author: Identity,
    /// Author timestamp.
    pub timestamp: DateTime<Utc>,
    /// First line of the commit message.
    pub summary: String,
    /// Identities from `Co-authored-by:` trailers.
    pub co_authors: Vec<Identity>,
    /// Paths changed relative to the first parent (all paths for root commits).
    pub files_changed: Vec<String>,
}

/// Result of asking for a file's history.
///
/// The three empty variants all mean "no history" but are kept apart so
/// callers can explain *why* a page has no authors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum History {
    /// Commits touching the file, most recent first. Never empty.
    Commits(Vec<Commit>),
    /// The repository has commits but none of them contain the file.
    Uncommitted,
    /// The repository has no commits at all.
    EmptyRepository,
    /// There is no repository to ask.
    NoRepository,
}

impl History {
    pub fn commits(&self) -> &[Commit] {
        match self {
            History::Commits(commits) => commits,
            _ => &[],
        }
    }
}

/// Read-only access to one repository for the duration of a build.
pub struct HistoryReader {
    repo: Option<Repository>,
    workdir: Option<PathBuf>,
}

impl HistoryReader {
    /// Open the repository containing `path`, searching parent directories.
    pub fn discover(path: &Path) -> Result<Self, HistoryError> {
        let repo = Repository::discover(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => HistoryError::NotARepository {
                path: path.to_path_buf(),
            },
            _ => HistoryError::Git(e),
        })?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| HistoryError::BareRepository {
                path: repo.path().to_path_buf(),
            })?;
        let workdir = workdir.canonicalize().map_err(|e| HistoryError::Io {
            path: workdir.to_path_buf(),
            source: e,
        })?;
        debug!("opened git repository at {}", workdir.display());
        Ok(HistoryReader {
            repo: Some(repo),
            workdir: Some(workdir),
        })
    }

    /// A reader with no repository behind it. Every query answers
    /// [`History::NoRepository`].
    pub fn unavailable() -> Self {
        HistoryReader {
            repo: None,
            workdir: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.repo.is_some()
    }

    /// Map an on-disk path to the `/`-separated form used inside git trees.
    pub fn relative_path(&self, path: &Path) -> Result<String, HistoryError> {
        let Some(workdir) = &self.workdir else {
            return Err(HistoryError::NotARepository {
                path: path.to_path_buf(),
            });
        };
        let resolved = resolve_path(path)?;
        let relative =
            resolved
                .strip_prefix(workdir)
                .map_err(|_| HistoryError::PathOutsideRepository {
                    path: path.to_path_buf(),
                    workdir: workdir.clone(),
                })?;
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Ok(parts.join("/"))
    }

    /// Commits reachable from HEAD that touched `path` (repository-relative),
    /// most recent first.
    pub fn file_history(&self, path: &str) -> Result<History, HistoryError> {
        let Some(repo) = &self.repo else {
            return Ok(History::NoRepository);
        };

        let head = match repo.head() {
            Ok(head) => head,
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(History::EmptyRepository);
            }
            Err(e) => return Err(e.into()),
        };
        let Some(head_oid) = head.target() else {
            return Ok(History::EmptyRepository);
        };

        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head_oid)?;

        let target = Path::new(path);
        let mut commits = Vec::new();

        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = repo.find_commit(oid)?;
            let tree = commit.tree()?;

            let Some(current) = entry_id(&tree, target) else {
                continue;
            };

            // Touched when the blob differs from every parent's version.
            let mut touched = true;
            for parent in commit.parents() {
                if entry_id(&parent.tree()?, target) == Some(current) {
                    touched = false;
                    break;
                }
            }
            if touched {
                commits.push(read_commit(repo, &commit, &tree)?);
            }
        }

        debug!("{path}: {} commit(s) in history", commits.len());
        if commits.is_empty() {
            Ok(History::Uncommitted)
        } else {
            Ok(History::Commits(commits))
        }
    }
}

fn entry_id(tree: &Tree<'_>, path: &Path) -> Option<Oid> {
    tree.get_path(path).ok().map(|entry| entry.id())
}

/// Canonicalize a path whose final component may not exist yet.
fn resolve_path(path: &Path) -> Result<PathBuf, HistoryError> {
    match path.canonicalize() {
        Ok(p) => Ok(p),
        Err(e) => {
            let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
                return Err(HistoryError::Io {
                    path: path.to_path_buf(),
                    source: e,
                });
            };
            let parent = parent.canonicalize().map_err(|e| HistoryError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
            Ok(parent.join(name))
        }
    }
}

fn read_commit(
    repo: &Repository,
    commit: &git2::Commit<'_>,
    tree: &Tree<'_>,
) -> Result<Commit, HistoryError> {
    let signature = commit.author();
    let author = Identity::new(
        signature.name().unwrap_or("Unknown"),
        signature.email().unwrap_or(""),
    );
    let timestamp = Utc
        .timestamp_opt(signature.when().seconds(), 0)
        .single()
        .unwrap_or_default();

    let parent_tree = match commit.parents().next() {
        Some(parent) => Some(parent.tree()?),
        None => None,
    };
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(tree), None)?;
    let files_changed = diff
        .deltas()
        .filter_map(|delta| {
            delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .collect();

    Ok(Commit {
        id: commit.id().to_string(),
        author,
        timestamp,
        summary: commit.summary().unwrap_or("").to_string(),
        co_authors: parse_co_authors(commit.message().unwrap_or("")),
        files_changed,
    })
}

/// Extract `Co-authored-by: Name <email>` trailers from a commit message.
/// Malformed trailers (no `<email>`) are skipped.
pub fn parse_co_authors(message: &str) -> Vec<Identity> {
    const TRAILER: &str = "co-authored-by:";
    message
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let prefix = line.get(..TRAILER.len())?;
            if !prefix.eq_ignore_ascii_case(TRAILER) {
                return None;
            }
            let value = line[TRAILER.len()..].trim();
            let (name, rest) = value.rsplit_once('<')?;
            let email = rest.strip_suffix('>')?.trim();
            if email.is_empty() {
                return None;
            }
            Some(Identity::new(name.trim(), email))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn co_author_trailers_are_parsed() {
        let message = "Fix typo\n\nCo-authored-by: Jane Doe <jane@example.com>\nco-authored-by: Bob <BOB@example.com>\n";
        assert_eq!(
            parse_co_authors(message),
            vec![
                Identity::new("Jane Doe", "jane@example.com"),
                Identity::new("Bob", "BOB@example.com"),
            ]
        );
    }

    #[test]
    fn malformed_co_author_trailers_are_skipped() {
        let message = "Fix\n\nCo-authored-by: nobody\nCo-authored-by: Empty <>\n";
        assert!(parse_co_authors(message).is_empty());
    }

    #[test]
    fn identity_key_ignores_case_and_whitespace() {
        assert_eq!(
            Identity::new("A", " Tim@Example.com ").key(),
            Identity::new("B", "tim@example.com").key()
        );
    }
}
