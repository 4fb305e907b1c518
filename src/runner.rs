//! Task runner: executes a task's dependency closure in order
//!
//! Style and script tasks run sequentially with per-task timeouts; group
//! tasks are dependency-only nodes; watch tasks reachable from the requested
//! task start a shared watch loop once the one-shot builds complete.

use crate::dag::DagEngine;
use crate::error::{AssetFlowError, Result};
use crate::models::{
    Mode, PipelineConfig, TaskConfig, TaskKind, TaskPipelineConfig, TaskRunReport, TaskStatus,
};
use crate::pipelines::script::ScriptPipeline;
use crate::pipelines::style::StylePipeline;
use crate::pipelines::Pipeline;
use crate::state::StateManager;
use crate::watcher::{watch_loop, WatchSpec};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Task runner over one manifest
pub struct TaskRunner {
    state: Arc<StateManager>,
    mode: Mode,
    project_root: PathBuf,
    style: StylePipeline,
    script: ScriptPipeline,
}

impl TaskRunner {
    /// Create a new task runner
    pub fn new(state: Arc<StateManager>, mode: Mode, project_root: PathBuf) -> Self {
        Self {
            state,
            mode,
            project_root,
            style: StylePipeline::new(),
            script: ScriptPipeline::new(),
        }
    }

    /// Run a named task: dependencies first, then the task itself.
    ///
    /// Returns overall success of the one-shot builds. When the requested
    /// closure contains watch tasks and the builds succeeded, this enters
    /// the watch loop and only returns on shutdown.
    pub async fn run(&self, config: &PipelineConfig, task_name: &str) -> Result<bool> {
        let dag = DagEngine::build(&config.tasks)?;
        let order = dag.execution_order_for(task_name)?;
        info!("Execution order: {:?}", order);

        let invocation_id = self.state.start_invocation(task_name, self.mode)?;

        let mut success = true;
        let mut watch_specs = Vec::new();

        for name in &order {
            // Names in the order came out of the DAG built from these tasks
            let task = config
                .tasks
                .iter()
                .find(|t| &t.name == name)
                .ok_or_else(|| AssetFlowError::UnknownTask(name.clone()))?;

            match task.kind {
                TaskKind::Group => continue,
                TaskKind::Watch => {
                    if let Some(TaskPipelineConfig::Watch(watch)) = &task.config {
                        watch_specs.push(WatchSpec::from_config(
                            &task.name,
                            watch,
                            &self.project_root,
                        ));
                    }
                }
                TaskKind::Style | TaskKind::Script => {
                    let ok = self
                        .run_build_task(invocation_id, task, config.config.timeout_default)
                        .await?;
                    if !ok {
                        // Dependents of a failed task must not run
                        error!("Task '{}' failed, stopping", task.name);
                        success = false;
                        break;
                    }
                }
            }
        }

        let final_status = if success {
            TaskStatus::Success
        } else {
            TaskStatus::Failed
        };
        self.state
            .finish_invocation(invocation_id, final_status.clone())?;
        info!("Invocation completed with status: {}", final_status);

        if success && !watch_specs.is_empty() {
            info!("Entering watch mode ({} watcher(s))", watch_specs.len());
            watch_loop(&watch_specs, |names| self.rebuild_tasks(config, names)).await?;
        }

        Ok(success)
    }

    /// Re-run build tasks from the watch loop. Failures are logged and
    /// swallowed so a broken save does not kill the watcher.
    async fn rebuild_tasks(&self, config: &PipelineConfig, names: Vec<String>) {
        for name in names {
            match self.run_single(config, &name).await {
                Ok(true) => {}
                Ok(false) => warn!("Rebuild of '{}' failed", name),
                Err(e) => error!("Rebuild of '{}' errored: {}", name, e),
            }
        }
    }

    /// Run one build task as its own recorded invocation
    async fn run_single(&self, config: &PipelineConfig, name: &str) -> Result<bool> {
        let task = config
            .tasks
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| AssetFlowError::UnknownTask(name.to_string()))?;

        let invocation_id = self.state.start_invocation(name, self.mode)?;
        let ok = self
            .run_build_task(invocation_id, task, config.config.timeout_default)
            .await?;
        let status = if ok {
            TaskStatus::Success
        } else {
            TaskStatus::Failed
        };
        self.state.finish_invocation(invocation_id, status)?;

        Ok(ok)
    }

    /// Execute a single build task, recording its run
    async fn run_build_task(
        &self,
        invocation_id: i64,
        task: &TaskConfig,
        timeout_default: u64,
    ) -> Result<bool> {
        let timeout_secs = task.timeout.unwrap_or(timeout_default);
        info!("Running task '{}'", task.name);

        let run_id = self
            .state
            .start_task_run(invocation_id, &task.name, task.kind)?;

        match self.execute_with_timeout(task, timeout_secs).await {
            Ok(report) => {
                let ok = report.status == TaskStatus::Success;
                self.state.finish_task_run(
                    run_id,
                    report.status,
                    Some(report.duration),
                    report.detail.as_deref(),
                )?;
                info!(
                    "Task '{}' completed in {:.2?} ({} file(s) written)",
                    task.name,
                    report.duration,
                    report.outputs.len()
                );
                Ok(ok)
            }
            Err(AssetFlowError::TaskTimeout { task: name, timeout }) => {
                error!("Task '{}' timed out after {} seconds", name, timeout);
                self.state.finish_task_run(
                    run_id,
                    TaskStatus::Timeout,
                    None,
                    Some(&format!("timed out after {}s", timeout)),
                )?;
                Ok(false)
            }
            Err(e) => {
                error!("Task '{}' failed: {}", task.name, e);
                self.state
                    .finish_task_run(run_id, TaskStatus::Failed, None, Some(&e.to_string()))?;
                Ok(false)
            }
        }
    }

    /// Dispatch to the task's pipeline with timeout enforcement
    async fn execute_with_timeout(
        &self,
        task: &TaskConfig,
        timeout_secs: u64,
    ) -> Result<TaskRunReport> {
        let config = task.config.as_ref().ok_or_else(|| {
            AssetFlowError::Validation(format!("Task '{}' has no pipeline config", task.name))
        })?;

        let task_future = async {
            match task.kind {
                TaskKind::Style => self.style.run(config, self.mode, &self.project_root).await,
                TaskKind::Script => self.script.run(config, self.mode, &self.project_root).await,
                _ => Err(AssetFlowError::Validation(format!(
                    "Task '{}' is not a build task",
                    task.name
                ))),
            }
        };

        match tokio::time::timeout(Duration::from_secs(timeout_secs), task_future).await {
            Ok(result) => result,
            Err(_) => Err(AssetFlowError::TaskTimeout {
                task: task.name.clone(),
                timeout: timeout_secs,
            }),
        }
    }
}
