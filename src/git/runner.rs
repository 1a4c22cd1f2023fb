use crate::error::{GitLocError, Result};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// How the external tool is started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvocationMode {
    /// Run the executable directly with an argument vector.
    #[default]
    Exec,
    /// Join program and arguments into one line and hand it to the shell.
    Shell,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub mode: InvocationMode,
}

impl Invocation {
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Runs an [`Invocation`] to completion and captures its output.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        (**self).run(invocation)
    }
}

/// Spawns real processes and blocks until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let mut command = match invocation.mode {
            InvocationMode::Exec => {
                let mut c = Command::new(&invocation.program);
                c.args(&invocation.args);
                c
            }
            InvocationMode::Shell => shell_command(&invocation.command_line()),
        };
        command.current_dir(&invocation.cwd);

        debug!(
            command = %invocation.command_line(),
            cwd = %invocation.cwd.display(),
            mode = ?invocation.mode,
            "running external tool"
        );
        let output = command
            .output()
            .map_err(|e| GitLocError::invocation(invocation.command_line(), e))?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut c = Command::new("sh");
    c.arg("-c").arg(line);
    c
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut c = Command::new("cmd");
    c.arg("/C").arg(line);
    c
}
