//! Settings for locating and invoking the external `git` tool.
//!
//! Resolution order: built-in defaults, then a TOML file, then `GIT_LOC_*`
//! environment variables.

use crate::error::{GitLocError, Result};
use crate::git::{InvocationMode, ToolConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Looked up in the current directory when no file is given explicitly.
pub const CONFIG_FILE_NAME: &str = "git-loc.toml";

pub const ENV_PREFIX: &str = "GIT_LOC_";

/// Key fragments whose string values are masked in the settings dump.
const SENSITIVE_KEYS: &[&str] = &["SECRET", "PASS", "TOKEN"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_git_bin")]
    pub git_log_bin: String,

    #[serde(default = "default_git_bin")]
    pub git_diff_bin: String,

    /// Run the tool through the shell as a single command line.
    #[serde(default)]
    pub use_shell: bool,

    /// Keys this tool does not use; kept so they show up in the dump.
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            git_log_bin: default_git_bin(),
            git_diff_bin: default_git_bin(),
            use_shell: false,
            extra: BTreeMap::new(),
        }
    }
}

fn default_git_bin() -> String {
    "git".to_string()
}

impl Settings {
    /// Load from `path`, or from `./git-loc.toml` if it exists, then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                local.is_file().then_some(local)
            }
        };

        let mut settings = match file {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        settings.apply_env(std::env::vars())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading settings");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| GitLocError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| GitLocError::Config(e.to_string()))
    }

    /// Apply `GIT_LOC_*` overrides from `vars`.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match key {
                "GIT_LOG_BIN" => self.git_log_bin = value,
                "GIT_DIFF_BIN" => self.git_diff_bin = value,
                "USE_SHELL" => self.use_shell = parse_bool(&name, &value)?,
                // Selects the file itself, handled by the CLI.
                "CONFIG" => {}
                other => {
                    self.extra
                        .insert(other.to_lowercase(), toml::Value::String(value));
                }
            }
        }
        Ok(())
    }

    pub fn tool_config(&self) -> ToolConfig {
        ToolConfig {
            log_bin: self.git_log_bin.clone(),
            diff_bin: self.git_diff_bin.clone(),
            mode: if self.use_shell {
                InvocationMode::Shell
            } else {
                InvocationMode::Exec
            },
        }
    }

    /// Every setting as `(KEY, value)`, with sensitive strings masked.
    pub fn redacted_entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![
            ("GIT_LOG_BIN".to_string(), redact("GIT_LOG_BIN", &self.git_log_bin)),
            ("GIT_DIFF_BIN".to_string(), redact("GIT_DIFF_BIN", &self.git_diff_bin)),
            ("USE_SHELL".to_string(), self.use_shell.to_string()),
        ];
        for (key, value) in &self.extra {
            let key = key.to_uppercase();
            let shown = match value {
                toml::Value::String(s) => redact(&key, s),
                other => other.to_string(),
            };
            entries.push((key, shown));
        }
        entries
    }
}

fn redact(key: &str, value: &str) -> String {
    let upper = key.to_uppercase();
    if SENSITIVE_KEYS.iter().any(|k| upper.contains(k)) {
        let prefix: String = value.chars().take(3).collect();
        format!("{prefix}**REDACTED**")
    } else {
        value.to_string()
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(GitLocError::Config(format!(
            "{name} must be a boolean, got '{value}'"
        ))),
    }
}
