//! Core data models for the AssetFlow pipeline runner

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

// Input validation limits
pub const MAX_MANIFEST_SIZE: usize = 1_048_576; // 1 MB
pub const MAX_TASK_COUNT: usize = 256;
pub const MAX_TASK_NAME_LEN: usize = 64;
pub const MAX_COMMAND_LEN: usize = 4_096; // 4 KB
pub const MAX_ARG_COUNT: usize = 256;
pub const MAX_ARG_LEN: usize = 4_096; // 4 KB
pub const MAX_CAPTURED_STDERR: usize = 10_485_760; // 10 MB

/// Pipeline manifest parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub config: GlobalConfig,
    pub tasks: Vec<TaskConfig>,
}

/// Global manifest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default = "default_timeout")]
    pub timeout_default: u64, // seconds
    /// Environment variable consulted for build-mode detection
    #[serde(default = "default_env_var")]
    pub env_var: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            timeout_default: default_timeout(),
            env_var: default_env_var(),
        }
    }
}

fn default_timeout() -> u64 {
    300
}

fn default_env_var() -> String {
    "ASSETFLOW_ENV".to_string()
}

/// Individual task configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Kind-specific configuration; group tasks carry none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<TaskPipelineConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>, // seconds
}

/// Task kind variants
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Style,
    Script,
    Watch,
    Group,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Style => write!(f, "style"),
            TaskKind::Script => write!(f, "script"),
            TaskKind::Watch => write!(f, "watch"),
            TaskKind::Group => write!(f, "group"),
        }
    }
}

/// Kind-specific configuration (enum for different task kinds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskPipelineConfig {
    Style(StyleConfig),
    Script(ScriptConfig),
    Watch(WatchConfig),
}

/// Stylesheet pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Directory walked for compilation entries
    pub source_dir: PathBuf,
    /// File name that marks a compilation entry; everything else is
    /// reachable only through imports
    #[serde(default = "default_style_entry")]
    pub entry: String,
    pub out_dir: PathBuf,
    #[serde(default)]
    pub load_paths: Vec<PathBuf>,
}

fn default_style_entry() -> String {
    "main.scss".to_string()
}

/// Script bundling pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    pub entry: PathBuf,
    /// Output file; defaults to the entry stem with a `.js` extension in
    /// the project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outfile: Option<PathBuf>,
    /// External bundler command; the entry path is appended as the final
    /// argument
    pub bundler: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra arguments appended only in live mode
    #[serde(default)]
    pub minify_args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
}

impl ScriptConfig {
    /// The output path, defaulted from the entry file name
    pub fn resolved_outfile(&self) -> PathBuf {
        match &self.outfile {
            Some(path) => path.clone(),
            None => {
                let stem = self
                    .entry
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "bundle".to_string());
                PathBuf::from(format!("{stem}.js"))
            }
        }
    }
}

/// Watch task configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Directories observed for changes
    pub paths: Vec<PathBuf>,
    /// File extensions that trigger a rebuild; empty matches everything
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Build task re-run when a matching file changes
    pub run: String,
}

/// Build mode selected by the environment flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Live,
}

impl Mode {
    /// Resolve the build mode from an environment variable. The value
    /// `live` selects production behavior; anything else (including an
    /// unset variable) is development.
    pub fn from_env(var: &str) -> Self {
        match std::env::var(var) {
            Ok(value) if value == "live" => Mode::Live,
            _ => Mode::Development,
        }
    }

    pub fn is_live(self) -> bool {
        matches!(self, Mode::Live)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Development => write!(f, "development"),
            Mode::Live => write!(f, "live"),
        }
    }
}

/// Task execution status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Failed,
    Timeout,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Timeout => write!(f, "timeout"),
        }
    }
}

/// Result of a single pipeline run
#[derive(Debug, Clone)]
pub struct TaskRunReport {
    pub status: TaskStatus,
    /// Files written by the pipeline
    pub outputs: Vec<PathBuf>,
    /// Total bytes written
    pub output_bytes: u64,
    pub duration: Duration,
    pub detail: Option<String>,
}

/// Recorded CLI invocation (one `run` of a named task)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    pub id: i64,
    pub task: String,
    pub mode: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: TaskStatus,
}

/// Recorded run of one task within an invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRun {
    pub id: i64,
    pub invocation_id: i64,
    pub task_name: String,
    pub kind: String,
    pub status: TaskStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub detail: Option<String>,
}
