use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "git-loc")]
#[command(about = "Count LOC changed in a Git repo branch")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, global = true, env = "GIT_LOC_CONFIG", help = "Path to a git-loc.toml settings file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Log external tool invocations to stderr")]
    pub verbose: bool,
}

#[derive(Args, Clone, Default)]
pub struct CountArgs {
    #[arg(long = "dir", help = "Git root dir")]
    pub root_dir: Option<PathBuf>,

    #[arg(long, help = "Git branch")]
    pub branch: Option<String>,

    #[arg(long, help = "Commit start date (YYYY-MM-DD)")]
    pub start_date: Option<String>,

    #[arg(long, help = "Commit end date (YYYY-MM-DD)")]
    pub end_date: Option<String>,

    #[arg(long, help = "Commit author name or email")]
    pub author: Option<String>,

    #[arg(long = "ignore-file", help = "Ignore files whose path contains this text (repeatable)")]
    pub files_to_ignore: Vec<String>,

    #[arg(long, help = "Output as JSON", conflicts_with = "ndjson")]
    pub json: bool,

    #[arg(long, help = "Output report rows as NDJSON")]
    pub ndjson: bool,

    #[arg(long, help = "Never prompt for missing options")]
    pub no_input: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count LOC in a Git repo branch
    Count(CountArgs),
    /// Print the settings
    Settings,
    /// Print the current timestamp
    Health,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        let settings =
            Settings::load(self.common.config.as_deref()).context("Failed to load settings")?;

        match self.command {
            Commands::Count(args) => crate::count::exec(&settings, args),
            Commands::Settings => {
                for (key, value) in settings.redacted_entries() {
                    println!("{key} = {value}");
                }
                Ok(())
            }
            Commands::Health => {
                println!("{}", chrono::Local::now().to_rfc3339());
                Ok(())
            }
        }
    }
}
