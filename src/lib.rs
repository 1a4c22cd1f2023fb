//! Count the lines of code changed (insertions + deletions) by the non-merge
//! commits of a git branch, filtered by author, date range and ignored paths.
//!
//! History and diffs come from the `git` command line; see [`git::GitClient`].
//!
//! ```no_run
//! use git_loc::{FilterCriteria, LocCounter, ToolConfig};
//!
//! let criteria = FilterCriteria::new("master")
//!     .with_author("john")
//!     .since("2020-02-01")?
//!     .until("2020-03-01")?
//!     .ignoring(["package-lock.json", ".gitignore"]);
//! let result = LocCounter::new("/path/to/repo", ToolConfig::default()).count(&criteria)?;
//! println!("LOC: {}", result.total);
//! # Ok::<(), git_loc::GitLocError>(())
//! ```

pub mod cli;
pub mod config;
pub mod count;
pub mod counter;
pub mod error;
pub mod git;
pub mod model;

pub use config::Settings;
pub use counter::LocCounter;
pub use error::{GitLocError, RecordKind, Result};
pub use git::{CommandRunner, GitClient, InvocationMode, SystemRunner, ToolConfig};
pub use model::{
    parse_date, CommitRecord, CountResult, FileChangeRecord, FilterCriteria, LineCount, ReportRow,
};
