//! Error types for AssetFlow

use thiserror::Error;

/// AssetFlow error types
#[derive(Error, Debug)]
pub enum AssetFlowError {
    /// YAML parsing errors
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization errors (sourcemap emission)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Manifest size exceeded limit
    #[error("Manifest exceeds 1MB limit (size: {0} bytes)")]
    ManifestSizeExceeded(usize),

    /// Task count exceeded limit
    #[error("Task count {count} exceeds limit of {limit}")]
    TaskCountExceeded { count: usize, limit: usize },

    /// Task name validation error
    #[error("Task name '{name}' exceeds {max} characters")]
    TaskNameTooLong { name: String, max: usize },

    /// Invalid task name format
    #[error("Invalid task name '{name}': only alphanumeric, underscore, dash, and colon allowed")]
    InvalidTaskName { name: String },

    /// DAG errors
    #[error("Cycle detected in task graph: {0}")]
    CycleDetected(String),

    /// Missing task dependency
    #[error("Task '{task}' depends on non-existent task '{dependency}'")]
    MissingDependency { task: String, dependency: String },

    /// Requested task does not exist in the manifest
    #[error("Unknown task '{0}'")]
    UnknownTask(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watcher errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Task execution timeout
    #[error("Task '{task}' timed out after {timeout} seconds")]
    TaskTimeout { task: String, timeout: u64 },

    /// Stylesheet compilation failure (message rendered by the compiler)
    #[error("Stylesheet compilation failed for '{path}':\n{message}")]
    StyleCompile { path: String, message: String },

    /// External bundler exited with a non-zero status
    #[error("Bundler '{command}' exited with status {status}")]
    BundlerFailed { command: String, status: i32 },

    /// Command validation errors
    #[error("Command exceeds {limit} bytes")]
    CommandTooLong { limit: usize },

    /// Argument validation errors
    #[error("Argument count {count} exceeds limit of {limit}")]
    ArgCountExceeded { count: usize, limit: usize },

    #[error("Argument exceeds {limit} bytes")]
    ArgTooLong { limit: usize },

    /// Path validation errors
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Path traversal attempt
    #[error("Path traversal detected in: {0}")]
    PathTraversal(String),

    /// Manifest validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generic error
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias using AssetFlowError
pub type Result<T> = std::result::Result<T, AssetFlowError>;
