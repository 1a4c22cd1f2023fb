pub mod client;
pub mod runner;

pub use client::{parse_commit_line, parse_numstat_line, GitClient, Records, ToolConfig};
pub use runner::{CommandOutput, CommandRunner, Invocation, InvocationMode, SystemRunner};
