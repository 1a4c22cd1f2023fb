use crate::error::{GitLocError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SCHEMA_VERSION: u32 = 1;

/// Date format used on the command line and in `--date=short` log output.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` filter argument.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| GitLocError::InvalidDateArgument(input.to_string()))
}

/// One line of `git log` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: String,
    pub date: NaiveDate,
    pub author_email: String,
    pub summary: String,
}

impl fmt::Display for CommitRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.hash,
            self.date.format(DATE_FORMAT),
            self.author_email,
            self.summary
        )
    }
}

/// An insertions or deletions column from `git diff --numstat`.
///
/// Git prints `-` instead of a number for binary files; anything that is not
/// an unsigned integer is kept verbatim and counts as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineCount {
    Count(u64),
    NonNumeric(String),
}

impl LineCount {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<u64>() {
            Ok(n) => LineCount::Count(n),
            Err(_) => LineCount::NonNumeric(raw.to_string()),
        }
    }

    pub fn value(&self) -> u64 {
        match self {
            LineCount::Count(n) => *n,
            LineCount::NonNumeric(_) => 0,
        }
    }
}

impl fmt::Display for LineCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineCount::Count(n) => write!(f, "{n}"),
            LineCount::NonNumeric(raw) => f.write_str(raw),
        }
    }
}

/// One line of `git diff --numstat` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChangeRecord {
    pub insertions: LineCount,
    pub deletions: LineCount,
    pub path: String,
}

impl FileChangeRecord {
    pub fn lines_changed(&self) -> u64 {
        self.insertions.value().saturating_add(self.deletions.value())
    }
}

/// What to count: the branch plus optional author, date and path filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub branch: String,
    pub author: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub ignored_paths: Vec<String>,
}

impl FilterCriteria {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            ..Self::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Like [`with_start_date`](Self::with_start_date) but from user input.
    pub fn since(self, input: &str) -> Result<Self> {
        Ok(self.with_start_date(parse_date(input)?))
    }

    /// Like [`with_end_date`](Self::with_end_date) but from user input.
    pub fn until(self, input: &str) -> Result<Self> {
        Ok(self.with_end_date(parse_date(input)?))
    }

    pub fn ignoring<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored_paths
            .iter()
            .any(|ignored| path.contains(ignored.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub commit: String,
    pub insertions: LineCount,
    pub deletions: LineCount,
    pub path: String,
    pub ignored: bool,
}

impl ReportRow {
    pub fn insertions_display(&self) -> String {
        if self.ignored {
            "ignored".to_string()
        } else {
            self.insertions.to_string()
        }
    }

    pub fn deletions_display(&self) -> String {
        if self.ignored {
            "ignored".to_string()
        } else {
            self.deletions.to_string()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResult {
    pub total: u64,
    pub commits: usize,
    pub files: Vec<ReportRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub branch: String,
    pub author: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub ignored_paths: Vec<String>,
    pub total: u64,
    pub commits: usize,
    pub files: Vec<ReportRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(matches!(
            parse_date("yesterday"),
            Err(GitLocError::InvalidDateArgument(s)) if s == "yesterday"
        ));
        assert!(parse_date("2020-02-30").is_err());
        assert_eq!(
            parse_date("2020-02-10").unwrap(),
            NaiveDate::from_ymd_opt(2020, 2, 10).unwrap()
        );
    }

    #[test]
    fn line_count_keeps_sentinel_verbatim() {
        let binary = LineCount::parse("-");
        assert_eq!(binary, LineCount::NonNumeric("-".to_string()));
        assert_eq!(binary.value(), 0);
        assert_eq!(binary.to_string(), "-");
        assert_eq!(LineCount::parse("42").value(), 42);
    }

    #[test]
    fn huge_counts_saturate() {
        let change = FileChangeRecord {
            insertions: LineCount::Count(u64::MAX),
            deletions: LineCount::Count(5),
            path: "dump.sql".to_string(),
        };
        assert_eq!(change.lines_changed(), u64::MAX);
    }

    #[test]
    fn ignore_rules_are_plain_substrings() {
        let criteria = FilterCriteria::new("master").ignoring(["package-lock.json", ".gitignore"]);
        assert!(criteria.is_ignored("web/package-lock.json"));
        assert!(criteria.is_ignored("/tmp/.gitignore"));
        assert!(!criteria.is_ignored("src/*.json"));
        assert!(!FilterCriteria::new("master").is_ignored("anything"));
    }

    #[test]
    fn ignored_rows_display_marker() {
        let row = ReportRow {
            commit: "1111111".to_string(),
            insertions: LineCount::Count(1),
            deletions: LineCount::NonNumeric("-".to_string()),
            path: ".gitignore".to_string(),
            ignored: true,
        };
        assert_eq!(row.insertions_display(), "ignored");
        assert_eq!(row.deletions_display(), "ignored");
    }

    #[test]
    fn line_count_serializes_untagged() {
        let json = serde_json::to_string(&[LineCount::Count(3), LineCount::parse("-")]).unwrap();
        assert_eq!(json, r#"[3,"-"]"#);
    }
}
