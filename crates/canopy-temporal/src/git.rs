//! Git-backed change log source.
//!
//! Walks commit history with libgit2 and diffs each commit against its
//! first parent to recover per-file add/modify/delete status. This is
//! the default `ChangeLogSource`; anything else satisfying the trait
//! can replace it.

use canopy_core::{ChangeLogSource, Commit, CommitFile, FileStatus, ProviderError, ProviderResult};
use chrono::{DateTime, Utc};
use git2::{Delta, Repository};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Upper bound on commits walked when searching for a single file's
/// history, so a lazy mining pass cannot crawl an entire monorepo.
const TOUCHING_SCAN_LIMIT: usize = 500;

/// Reads commit history from a git repository on disk.
pub struct GitChangeLog {
    repo_path: PathBuf,
}

impl GitChangeLog {
    /// Points the source at a repository root (or any path inside it).
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    fn open(&self) -> ProviderResult<Repository> {
        Repository::discover(&self.repo_path).map_err(to_provider_error)
    }

    fn read_commit(repo: &Repository, oid: git2::Oid) -> ProviderResult<Commit> {
        let commit = repo.find_commit(oid).map_err(to_provider_error)?;

        let timestamp = DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0)
            .unwrap_or_else(Utc::now);
        let author = commit.author().name().unwrap_or("unknown").to_string();
        let message = commit.summary().unwrap_or("").to_string();

        let tree = commit.tree().map_err(to_provider_error)?;
        let parent_tree = commit.parent(0).ok().and_then(|p| p.tree().ok());
        let diff = repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
            .map_err(to_provider_error)?;

        let mut files = Vec::new();
        for delta in diff.deltas() {
            let status = match delta.status() {
                Delta::Added | Delta::Copied => FileStatus::Added,
                Delta::Deleted => FileStatus::Deleted,
                Delta::Modified | Delta::Renamed | Delta::Typechange => FileStatus::Modified,
                _ => continue,
            };
            let path = match delta.status() {
                Delta::Deleted => delta.old_file().path(),
                _ => delta.new_file().path(),
            };
            if let Some(path) = path {
                files.push(CommitFile {
                    path: path.to_string_lossy().into_owned(),
                    status,
                });
            }
        }

        Ok(Commit {
            hash: oid.to_string(),
            author,
            timestamp,
            message,
            files,
        })
    }

    fn walk<F>(&self, mut visit: F) -> ProviderResult<()>
    where
        F: FnMut(&Repository, git2::Oid) -> ProviderResult<bool>,
    {
        let repo = self.open()?;
        let mut revwalk = repo.revwalk().map_err(to_provider_error)?;
        revwalk.push_head().map_err(to_provider_error)?;
        revwalk
            .set_sorting(git2::Sort::TIME)
            .map_err(to_provider_error)?;

        for oid in revwalk {
            let oid = oid.map_err(to_provider_error)?;
            if !visit(&repo, oid)? {
                break;
            }
        }
        Ok(())
    }
}

impl ChangeLogSource for GitChangeLog {
    fn commits_since(&self, since: DateTime<Utc>) -> ProviderResult<Vec<Commit>> {
        let cutoff = since.timestamp();
        let mut commits = Vec::new();

        self.walk(|repo, oid| {
            let commit = repo.find_commit(oid).map_err(to_provider_error)?;
            // Revwalk is newest-first; the first commit past the
            // cutoff ends the walk.
            if commit.time().seconds() < cutoff {
                return Ok(false);
            }
            commits.push(Self::read_commit(repo, oid)?);
            Ok(true)
        })?;

        debug!(count = commits.len(), "read commits since cutoff");
        Ok(commits)
    }

    fn recent_commits_touching(&self, path: &str, limit: usize) -> ProviderResult<Vec<Commit>> {
        let target = Path::new(path);
        let mut commits = Vec::new();
        let mut scanned = 0usize;

        self.walk(|repo, oid| {
            scanned += 1;
            if scanned > TOUCHING_SCAN_LIMIT {
                return Ok(false);
            }
            let commit = Self::read_commit(repo, oid)?;
            if commit.files.iter().any(|f| Path::new(&f.path) == target) {
                commits.push(commit);
            }
            Ok(commits.len() < limit)
        })?;

        Ok(commits)
    }
}

fn to_provider_error(err: git2::Error) -> ProviderError {
    ProviderError::VersionControl(err.message().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;

    /// Builds a throwaway repo with two commits touching a.txt and one
    /// touching only b.txt.
    fn fixture_repo() -> (tempfile::TempDir, GitChangeLog) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let sig = Signature::now("tester", "tester@example.com").unwrap();

        let mut parents: Vec<git2::Oid> = Vec::new();
        for (file, content, message) in [
            ("a.txt", "one", "add a"),
            ("b.txt", "two", "add b"),
            ("a.txt", "three", "touch a again"),
        ] {
            fs::write(dir.path().join(file), content).unwrap();
            let mut index = repo.index().unwrap();
            index.add_path(Path::new(file)).unwrap();
            index.write().unwrap();
            let tree_id = index.write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            let parent_commits: Vec<git2::Commit> = parents
                .iter()
                .map(|oid| repo.find_commit(*oid).unwrap())
                .collect();
            let parent_refs: Vec<&git2::Commit> = parent_commits.iter().collect();
            let oid = repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
                .unwrap();
            parents = vec![oid];
        }

        let log = GitChangeLog::new(dir.path());
        (dir, log)
    }

    #[test]
    fn test_commits_since_reads_files_and_status() {
        let (_dir, log) = fixture_repo();
        let since = Utc::now() - chrono::Duration::days(1);

        let commits = log.commits_since(since).unwrap();
        assert_eq!(commits.len(), 3);

        // Newest first: the last commit modified a.txt.
        assert_eq!(commits[0].message, "touch a again");
        assert_eq!(commits[0].files.len(), 1);
        assert_eq!(commits[0].files[0].path, "a.txt");
        assert_eq!(commits[0].files[0].status, FileStatus::Modified);

        // Root commit added a.txt.
        assert_eq!(commits[2].files[0].status, FileStatus::Added);
    }

    #[test]
    fn test_recent_commits_touching_filters_by_path() {
        let (_dir, log) = fixture_repo();

        let commits = log.recent_commits_touching("a.txt", 10).unwrap();
        assert_eq!(commits.len(), 2);
        assert!(commits
            .iter()
            .all(|c| c.files.iter().any(|f| f.path == "a.txt")));

        let limited = log.recent_commits_touching("a.txt", 1).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].message, "touch a again");
    }

    #[test]
    fn test_missing_repository_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = GitChangeLog::new(dir.path().join("not-a-repo"));
        assert!(log.commits_since(Utc::now()).is_err());
    }
}
