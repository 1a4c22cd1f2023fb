//! Lines-of-code aggregation over the non-merge commits of a branch.

use crate::error::{GitLocError, Result};
use crate::git::{CommandRunner, GitClient, SystemRunner, ToolConfig};
use crate::model::{CommitRecord, CountResult, FilterCriteria, ReportRow};
use std::path::Path;
use tracing::debug;

/// Sums insertions and deletions of every matching commit, one `git diff`
/// per commit, in log order.
pub struct LocCounter<R = SystemRunner> {
    client: GitClient<R>,
}

impl LocCounter<SystemRunner> {
    pub fn new<P: AsRef<Path>>(root: P, tools: ToolConfig) -> Self {
        Self {
            client: GitClient::new(root, tools),
        }
    }
}

impl<R: CommandRunner> LocCounter<R> {
    pub fn with_client(client: GitClient<R>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GitClient<R> {
        &self.client
    }

    /// Count the LOC changed by the commits matching `criteria`.
    ///
    /// Fails on the first commit that does not satisfy the author or date
    /// filter git was asked to apply; no partial result is returned.
    pub fn count(&self, criteria: &FilterCriteria) -> Result<CountResult> {
        let commits = self.client.list_commits(
            &criteria.branch,
            criteria.author.as_deref(),
            criteria.start_date,
            criteria.end_date,
        )?;

        let mut result = CountResult::default();
        for commit in commits {
            let commit = commit?;
            check_commit(&commit, criteria)?;

            let mut loc_in_commit = 0u64;
            for change in self.client.list_file_changes(&commit.hash)? {
                let change = change?;
                let ignored = criteria.is_ignored(&change.path);
                if !ignored {
                    loc_in_commit = loc_in_commit.saturating_add(change.lines_changed());
                }
                result.files.push(ReportRow {
                    commit: commit.hash.clone(),
                    insertions: change.insertions,
                    deletions: change.deletions,
                    path: change.path,
                    ignored,
                });
            }

            debug!(commit = %commit.hash, date = %commit.date, loc = loc_in_commit, "counted commit");
            result.total = result.total.saturating_add(loc_in_commit);
            result.commits += 1;
        }

        Ok(result)
    }
}

fn check_commit(commit: &CommitRecord, criteria: &FilterCriteria) -> Result<()> {
    if let Some(author) = criteria.author.as_deref() {
        if !commit.author_email.contains(author) {
            return Err(GitLocError::AuthorMismatch {
                hash: commit.hash.clone(),
                email: commit.author_email.clone(),
                expected: author.to_string(),
            });
        }
    }
    if let Some(start) = criteria.start_date {
        if commit.date < start {
            return Err(GitLocError::StartDateMismatch {
                hash: commit.hash.clone(),
                date: commit.date,
                start,
            });
        }
    }
    if let Some(end) = criteria.end_date {
        if commit.date > end {
            return Err(GitLocError::EndDateMismatch {
                hash: commit.hash.clone(),
                date: commit.date,
                end,
            });
        }
    }
    Ok(())
}
