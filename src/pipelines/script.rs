//! Script bundling pipeline
//!
//! Bundling and transpilation are delegated to an external bundler command;
//! the pipeline spawns it, captures the bundle from stdout, appends the
//! minification flags in live mode, writes the output file, and reports the
//! artifact size.

use crate::error::{AssetFlowError, Result};
use crate::models::{Mode, ScriptConfig, TaskPipelineConfig, TaskRunReport, TaskStatus};
use crate::parser::validate_script_config;
use crate::pipelines::{human_bytes, truncate_output_bytes, Pipeline};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info};

/// Script pipeline delegating to an external bundler process
#[derive(Debug, Clone)]
pub struct ScriptPipeline;

impl ScriptPipeline {
    pub fn new() -> Self {
        Self
    }

    async fn bundle(
        &self,
        config: &ScriptConfig,
        mode: Mode,
        project_root: &Path,
    ) -> Result<TaskRunReport> {
        // Validate configuration
        validate_script_config(config)?;

        let entry = project_root.join(&config.entry);
        if !entry.is_file() {
            return Err(AssetFlowError::InvalidPath(format!(
                "Entry file not found: {}",
                entry.display()
            )));
        }

        let outfile = project_root.join(config.resolved_outfile());

        info!("Bundling {} with '{}'", entry.display(), config.bundler);
        debug!("Bundler args: {:?}", config.args);

        let start = std::time::Instant::now();

        // The entry path is the final argument; live mode inserts the
        // minification flags before it
        let mut cmd = Command::new(&config.bundler);
        cmd.args(&config.args);
        if mode.is_live() {
            cmd.args(&config.minify_args);
        }
        cmd.arg(&entry);

        match &config.workdir {
            Some(dir) => cmd.current_dir(project_root.join(dir)),
            None => cmd.current_dir(project_root),
        };

        if let Some(env) = &config.env {
            for (key, value) in env {
                cmd.env(key, value);
            }
        }

        // Capture output
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        // Ensure child process is killed when the future is dropped (e.g. on
        // timeout). Without this, timed-out bundlers become orphan zombies.
        cmd.kill_on_drop(true);

        let output = cmd.output().await.map_err(AssetFlowError::Io)?;
        let duration = start.elapsed();

        let (stderr, stderr_truncated) = truncate_output_bytes(&output.stderr);
        if stderr_truncated {
            debug!("Bundler stderr truncated for logging");
        }

        if !output.status.success() {
            // The bundler's own output is the diagnostic surface
            error!(
                "Bundler '{}' failed (exit code: {:?}):\n{}",
                config.bundler,
                output.status.code(),
                stderr
            );
            return Err(AssetFlowError::BundlerFailed {
                command: config.bundler.clone(),
                status: output.status.code().unwrap_or(-1),
            });
        }

        if !stderr.is_empty() {
            debug!("Bundler stderr:\n{}", stderr);
        }

        if let Some(parent) = outfile.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&outfile, &output.stdout)?;

        let size = output.stdout.len() as u64;
        info!("Wrote {} ({})", outfile.display(), human_bytes(size));

        Ok(TaskRunReport {
            status: TaskStatus::Success,
            outputs: vec![outfile],
            output_bytes: size,
            duration,
            detail: None,
        })
    }
}

#[async_trait]
impl Pipeline for ScriptPipeline {
    async fn run(
        &self,
        config: &TaskPipelineConfig,
        mode: Mode,
        project_root: &Path,
    ) -> Result<TaskRunReport> {
        match config {
            TaskPipelineConfig::Script(script_config) => {
                self.bundle(script_config, mode, project_root).await
            }
            _ => Err(AssetFlowError::Validation(
                "Invalid config type for ScriptPipeline".to_string(),
            )),
        }
    }
}

impl Default for ScriptPipeline {
    fn default() -> Self {
        Self::new()
    }
}
