use super::runner::{CommandRunner, Invocation, InvocationMode, SystemRunner};
use crate::error::{GitLocError, RecordKind, Result};
use crate::model::{CommitRecord, FileChangeRecord, LineCount, DATE_FORMAT};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Log format: short hash, short author date, author email, subject and ref
/// names, wrapped in single quotes.
const LOG_FORMAT: &str = "--pretty=format:'%h %ad %ae %s%d'";

/// Where the external tool lives and how to start it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub log_bin: String,
    pub diff_bin: String,
    pub mode: InvocationMode,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            log_bin: "git".to_string(),
            diff_bin: "git".to_string(),
            mode: InvocationMode::Exec,
        }
    }
}

/// Queries a repository through the `git` command line and decodes its text
/// output.
pub struct GitClient<R = SystemRunner> {
    root: PathBuf,
    tools: ToolConfig,
    runner: R,
}

impl GitClient<SystemRunner> {
    pub fn new<P: AsRef<Path>>(root: P, tools: ToolConfig) -> Self {
        Self::with_runner(root, tools, SystemRunner)
    }
}

impl<R: CommandRunner> GitClient<R> {
    pub fn with_runner<P: AsRef<Path>>(root: P, tools: ToolConfig, runner: R) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            tools,
            runner,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Non-merge commits on `branch`, optionally restricted by author
    /// substring and by date. Date bounds are evaluated by git itself.
    pub fn list_commits(
        &self,
        branch: &str,
        author: Option<&str>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Records<CommitRecord>> {
        let mut args = vec![
            "log".to_string(),
            branch.to_string(),
            LOG_FORMAT.to_string(),
            "--date=short".to_string(),
            "--no-merges".to_string(),
        ];
        if let Some(since) = start_date {
            args.push(format!("--since={}", since.format(DATE_FORMAT)));
        }
        if let Some(before) = end_date {
            args.push(format!("--before={}", before.format(DATE_FORMAT)));
        }
        if let Some(author) = author {
            // Exec mode passes this as a single argument, spaces included.
            args.push(format!("--author={author}"));
        }

        let stdout = self.run_tool(&self.tools.log_bin, args)?;
        Ok(Records::new(stdout, parse_commit_line))
    }

    /// Per-file numeric diff stats between `hash~1` and `hash`.
    pub fn list_file_changes(&self, hash: &str) -> Result<Records<FileChangeRecord>> {
        let args = vec![
            "diff".to_string(),
            "--numstat".to_string(),
            format!("{hash}~1"),
            hash.to_string(),
        ];
        let stdout = self.run_tool(&self.tools.diff_bin, args)?;
        Ok(Records::new(stdout, parse_numstat_line))
    }

    fn run_tool(&self, program: &str, args: Vec<String>) -> Result<String> {
        let invocation = Invocation {
            program: program.to_string(),
            args,
            cwd: self.root.clone(),
            mode: self.tools.mode,
        };
        let output = self.runner.run(&invocation)?;

        let stderr = String::from_utf8(output.stderr).map_err(|_| {
            GitLocError::invocation(invocation.command_line(), "error output is not valid UTF-8")
        })?;
        if !output.success {
            warn!(
                command = %invocation.command_line(),
                code = ?output.code,
                stderr = stderr.trim(),
                "external tool exited with a failure status"
            );
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| {
            GitLocError::invocation(invocation.command_line(), "output is not valid UTF-8")
        })?;
        debug!(
            command = %invocation.command_line(),
            bytes = stdout.len(),
            "captured tool output"
        );
        Ok(stdout)
    }
}

/// Lazily parsed records, one per non-empty output line.
pub struct Records<T> {
    lines: std::vec::IntoIter<String>,
    parse: fn(&str) -> Result<T>,
}

impl<T> Records<T> {
    fn new(output: String, parse: fn(&str) -> Result<T>) -> Self {
        let lines: Vec<String> = output.lines().map(str::to_string).collect();
        Self {
            lines: lines.into_iter(),
            parse,
        }
    }
}

impl<T> Iterator for Records<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.find(|line| !line.is_empty())?;
        Some((self.parse)(&line))
    }
}

/// Parse `'<hash> <date> <email> <subject><refs>'`.
pub fn parse_commit_line(line: &str) -> Result<CommitRecord> {
    let malformed = || GitLocError::malformed(RecordKind::Commit, line);

    let mut tokens = line.splitn(4, ' ');
    let (Some(hash), Some(date), Some(email), Some(summary)) =
        (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(malformed());
    };

    let hash = hash.strip_prefix('\'').unwrap_or(hash);
    if hash.is_empty() {
        return Err(malformed());
    }
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| malformed())?;
    let summary = summary.strip_suffix('\'').unwrap_or(summary);

    Ok(CommitRecord {
        hash: hash.to_string(),
        date,
        author_email: email.to_string(),
        summary: summary.to_string(),
    })
}

/// Parse `<insertions>\t<deletions>\t<path>`.
pub fn parse_numstat_line(line: &str) -> Result<FileChangeRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    let [insertions, deletions, path] = fields.as_slice() else {
        return Err(GitLocError::malformed(RecordKind::FileChange, line));
    };

    Ok(FileChangeRecord {
        insertions: LineCount::parse(insertions),
        deletions: LineCount::parse(deletions),
        path: path.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::runner::CommandOutput;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Canned {
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        seen: RefCell<Vec<Invocation>>,
    }

    impl CommandRunner for Canned {
        fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
            self.seen.borrow_mut().push(invocation.clone());
            Ok(CommandOutput {
                success: true,
                code: Some(0),
                stdout: self.stdout.clone(),
                stderr: self.stderr.clone(),
            })
        }
    }

    fn canned(stdout: &str) -> Canned {
        Canned {
            stdout: stdout.as_bytes().to_vec(),
            ..Canned::default()
        }
    }

    #[test]
    fn parses_quoted_log_line() {
        let line = "'2fdffa2 2020-02-10 foo@gmail.com NEW Enable CORS (HEAD -> master, origin/master)'";
        let record = parse_commit_line(line).unwrap();
        assert_eq!(record.hash, "2fdffa2");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2020, 2, 10).unwrap());
        assert_eq!(record.author_email, "foo@gmail.com");
        assert_eq!(record.summary, "NEW Enable CORS (HEAD -> master, origin/master)");
    }

    #[test]
    fn log_line_survives_reserialization() {
        let raw = "1111111 2020-02-10 john@gmail.com  two  spaces kept ";
        let record = parse_commit_line(&format!("'{raw}'")).unwrap();
        assert_eq!(record.to_string(), raw);
    }

    #[test]
    fn empty_author_email_is_kept() {
        let raw = "abc1234 2020-02-10  fix things";
        let record = parse_commit_line(&format!("'{raw}'")).unwrap();
        assert_eq!(record.hash, "abc1234");
        assert_eq!(record.author_email, "");
        assert_eq!(record.summary, "fix things");
        assert_eq!(record.to_string(), raw);
    }

    #[test]
    fn empty_subject_gives_empty_summary() {
        let record = parse_commit_line("'abc1234 2020-02-10 a@b '").unwrap();
        assert_eq!(record.author_email, "a@b");
        assert_eq!(record.summary, "");
        assert_eq!(record.to_string(), "abc1234 2020-02-10 a@b ");
    }

    #[test]
    fn short_log_line_is_malformed() {
        let err = parse_commit_line("'1111111 2020-02-10'").unwrap_err();
        assert!(matches!(
            err,
            GitLocError::MalformedRecord { kind: RecordKind::Commit, .. }
        ));
        assert!(parse_commit_line("'1111111 not-a-date a@b x'").is_err());
    }

    #[test]
    fn numstat_needs_exactly_three_fields() {
        let record = parse_numstat_line("-\t-\tassets/logo.png").unwrap();
        assert_eq!(record.insertions, LineCount::NonNumeric("-".to_string()));
        assert_eq!(record.path, "assets/logo.png");

        assert!(parse_numstat_line("10\t2").is_err());
        assert!(parse_numstat_line("10\t2\ta\tb").is_err());
    }

    #[test]
    fn builds_log_invocation() {
        let runner = canned("");
        let client = GitClient::with_runner("/repo", ToolConfig::default(), &runner);
        let records: Vec<_> = client
            .list_commits(
                "master",
                Some("john doe"),
                NaiveDate::from_ymd_opt(2021, 1, 1),
                NaiveDate::from_ymd_opt(2021, 12, 31),
            )
            .unwrap()
            .collect();
        assert!(records.is_empty());

        let seen = runner.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].program, "git");
        assert_eq!(seen[0].cwd, PathBuf::from("/repo"));
        assert_eq!(
            seen[0].args,
            vec![
                "log",
                "master",
                "--pretty=format:'%h %ad %ae %s%d'",
                "--date=short",
                "--no-merges",
                "--since=2021-01-01",
                "--before=2021-12-31",
                "--author=john doe",
            ]
        );
    }

    #[test]
    fn builds_diff_invocation_with_configured_binary() {
        let runner = canned("10\t2\tsrc/main.rs\n\n3\t0\tREADME.md\n");
        let tools = ToolConfig {
            diff_bin: "/usr/local/bin/git".to_string(),
            ..ToolConfig::default()
        };
        let client = GitClient::with_runner("/repo", tools, &runner);
        let records: Vec<_> = client
            .list_file_changes("abc1234")
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].path, "README.md");

        let seen = runner.seen.borrow();
        assert_eq!(seen[0].program, "/usr/local/bin/git");
        assert_eq!(seen[0].args, vec!["diff", "--numstat", "abc1234~1", "abc1234"]);
    }

    #[test]
    fn binary_output_is_an_invocation_error() {
        let runner = Canned {
            stdout: vec![0xff, 0xfe, b'\n'],
            ..Canned::default()
        };
        let client = GitClient::with_runner("/repo", ToolConfig::default(), &runner);
        assert!(matches!(
            client.list_file_changes("abc1234"),
            Err(GitLocError::ToolInvocation { .. })
        ));

        let runner = Canned {
            stderr: vec![0xc3, 0x28],
            ..Canned::default()
        };
        let client = GitClient::with_runner("/repo", ToolConfig::default(), &runner);
        assert!(matches!(
            client.list_commits("master", None, None, None),
            Err(GitLocError::ToolInvocation { .. })
        ));
    }
}
