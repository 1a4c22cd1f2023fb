use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitLocError>;

#[derive(Error, Debug)]
pub enum GitLocError {
    #[error("Invalid date: '{0}' (expected YYYY-MM-DD)")]
    InvalidDateArgument(String),
    #[error("Failed to run `{command}`: {message}")]
    ToolInvocation { command: String, message: String },
    #[error("Malformed {kind} record: {line:?}")]
    MalformedRecord { kind: RecordKind, line: String },
    #[error("Commit {hash} by '{email}' does not match the requested author '{expected}'")]
    AuthorMismatch {
        hash: String,
        email: String,
        expected: String,
    },
    #[error("Commit {hash} dated {date} is earlier than the requested start date {start}")]
    StartDateMismatch {
        hash: String,
        date: NaiveDate,
        start: NaiveDate,
    },
    #[error("Commit {hash} dated {date} is later than the requested end date {end}")]
    EndDateMismatch {
        hash: String,
        date: NaiveDate,
        end: NaiveDate,
    },
    #[error("Config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which kind of tool output line failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Commit,
    FileChange,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Commit => f.write_str("commit"),
            RecordKind::FileChange => f.write_str("file change"),
        }
    }
}

impl GitLocError {
    pub(crate) fn malformed(kind: RecordKind, line: &str) -> Self {
        GitLocError::MalformedRecord {
            kind,
            line: line.to_string(),
        }
    }

    pub(crate) fn invocation(command: impl Into<String>, message: impl ToString) -> Self {
        GitLocError::ToolInvocation {
            command: command.into(),
            message: message.to_string(),
        }
    }
}
