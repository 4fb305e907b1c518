//! CLI interface for AssetFlow

use crate::dag::DagEngine;
use crate::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use crate::models::Mode;
use crate::parser::parse_manifest_file;
use crate::runner::TaskRunner;
use crate::state::StateManager;
use crate::templates;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// AssetFlow - Lightweight asset pipeline runner for web front-ends
#[derive(Parser, Debug)]
#[command(name = "assetflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Lightweight asset pipeline runner for web front-ends", long_about = None)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Log format (json or pretty)
    #[arg(long, default_value = "pretty", global = true)]
    pub log_format: String,

    /// Path to the pipeline manifest
    #[arg(short, long, default_value = "assetflow.yaml", global = true)]
    pub manifest: PathBuf,

    /// Database path for run history
    #[arg(long, default_value = "assetflow.db", global = true)]
    pub db_path: PathBuf,

    /// Override build-mode detection (defaults to the manifest's
    /// environment variable)
    #[arg(long, global = true)]
    pub mode: Option<ModeArg>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Explicit build-mode override
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Development,
    Live,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a named task (dependencies first)
    Run {
        /// Task name from the manifest (e.g. sass, react, build, watch)
        task: String,
    },

    /// Validate the manifest and task graph
    Validate,

    /// List tasks defined in the manifest
    List,

    /// Show recent run history
    History {
        /// Task name filter (optional, shows all if not specified)
        #[arg(short, long)]
        task: Option<String>,

        /// Number of records to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Generate example manifest templates
    Template {
        /// Template type (omit to list available templates)
        #[arg(short = 't', long = "type")]
        template_type: Option<TemplateType>,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Available template types for the `template` subcommand.
#[derive(Debug, Clone, ValueEnum)]
pub enum TemplateType {
    /// Single stylesheet task, no dependencies
    Minimal,
    /// Stylesheet + script pipelines with watch variants and aggregates
    Full,
}

impl Cli {
    /// Initialize logging based on CLI arguments
    pub fn init_logging(&self) -> anyhow::Result<()> {
        let log_level: LogLevel = self.log_level.as_str().into();
        let log_format = match self.log_format.as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let config = LogConfig {
            level: log_level,
            format: log_format,
        };

        init_logging(&config)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> anyhow::Result<()> {
        match &self.command {
            Commands::Run { task } => {
                self.run_task(task).await?;
            }
            Commands::Validate => {
                self.validate_manifest()?;
            }
            Commands::List => {
                self.list_tasks()?;
            }
            Commands::History { task, limit } => {
                self.show_history(task.as_deref(), *limit)?;
            }
            Commands::Template {
                template_type,
                output,
            } => {
                self.handle_template(template_type.as_ref(), output.as_ref())?;
            }
        }
        Ok(())
    }

    /// Resolve the build mode: explicit flag wins, otherwise the manifest's
    /// environment variable is consulted
    fn resolve_mode(&self, env_var: &str) -> Mode {
        match self.mode {
            Some(ModeArg::Development) => Mode::Development,
            Some(ModeArg::Live) => Mode::Live,
            None => Mode::from_env(env_var),
        }
    }

    /// Run a named task from the manifest
    async fn run_task(&self, task: &str) -> anyhow::Result<()> {
        info!("Loading manifest from: {:?}", self.manifest);

        let config = parse_manifest_file(&self.manifest)?;
        info!("Manifest '{}' loaded successfully", config.name);

        let mode = self.resolve_mode(&config.config.env_var);
        info!("Build mode: {}", mode);

        // Paths in the manifest are relative to its directory
        let project_root = self
            .manifest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let state = Arc::new(StateManager::new(&self.db_path)?);
        let runner = TaskRunner::new(state, mode, project_root);

        let success = runner.run(&config, task).await?;

        if success {
            info!("Task '{}' completed successfully", task);
            Ok(())
        } else {
            error!("Task '{}' failed", task);
            std::process::exit(1);
        }
    }

    /// Validate the manifest without executing
    fn validate_manifest(&self) -> anyhow::Result<()> {
        info!("Validating manifest: {:?}", self.manifest);

        let config = parse_manifest_file(&self.manifest)?;
        info!("Manifest '{}' parsed successfully", config.name);

        let dag = DagEngine::build(&config.tasks)?;
        dag.validate_acyclic()?;

        let execution_order = dag.topological_sort()?;

        info!("Manifest validation successful");

        println!("Manifest '{}' is valid", config.name);
        println!("Tasks: {}", config.tasks.len());
        println!("Execution order: {}", execution_order.join(" -> "));

        Ok(())
    }

    /// List tasks with kind and dependencies
    fn list_tasks(&self) -> anyhow::Result<()> {
        let config = parse_manifest_file(&self.manifest)?;

        println!("Tasks in '{}':", config.name);
        println!();
        println!("{:<20} {:<10} {}", "Name", "Kind", "Depends On");
        println!("{}", "-".repeat(60));

        for task in &config.tasks {
            let deps = if task.depends_on.is_empty() {
                "-".to_string()
            } else {
                task.depends_on.join(", ")
            };
            println!("{:<20} {:<10} {}", task.name, task.kind, deps);
        }

        Ok(())
    }

    /// Show recent invocations with their task runs
    fn show_history(&self, task: Option<&str>, limit: usize) -> anyhow::Result<()> {
        let state = StateManager::new(&self.db_path)?;
        let invocations = state.recent_invocations(task, limit)?;

        if invocations.is_empty() {
            println!("No run history found");
            return Ok(());
        }

        println!();
        println!(
            "{:<8} {:<16} {:<12} {:<20} {:<10} {:<12}",
            "ID", "Task", "Mode", "Started", "Status", "Duration"
        );
        println!("{:-<82}", "");

        for invocation in &invocations {
            let started = invocation.started_at.format("%Y-%m-%d %H:%M:%S");
            let duration = match invocation.completed_at {
                Some(completed) => {
                    let seconds = (completed - invocation.started_at).num_seconds();
                    format_duration(seconds)
                }
                None => "N/A".to_string(),
            };

            println!(
                "{:<8} {:<16} {:<12} {:<20} {:<10} {:<12}",
                invocation.id,
                invocation.task,
                invocation.mode,
                started,
                invocation.status.to_string(),
                duration
            );

            let runs = state.task_runs_for(invocation.id)?;
            for run in runs {
                let detail = run.detail.as_deref().unwrap_or("");
                println!(
                    "         - {} [{}] ({}) {}",
                    run.task_name, run.status, run.kind, detail
                );
            }
        }

        println!();
        Ok(())
    }

    /// Handle the `template` subcommand.
    fn handle_template(
        &self,
        template_type: Option<&TemplateType>,
        output: Option<&PathBuf>,
    ) -> anyhow::Result<()> {
        let Some(tt) = template_type else {
            // No type specified — list available templates.
            println!("Available templates:\n");
            let header_type = "TYPE";
            let header_desc = "DESCRIPTION";
            println!("{header_type:<12} {header_desc}");
            println!("{}", "-".repeat(60));
            for info in templates::list_templates() {
                println!("{:<12} {}", info.name, info.description);
            }
            println!();
            println!("Usage: assetflow template --type <TYPE> [-o <FILE>]");
            return Ok(());
        };

        let type_name = match tt {
            TemplateType::Minimal => "minimal",
            TemplateType::Full => "full",
        };

        let content = templates::get_template(type_name)
            .ok_or_else(|| anyhow::anyhow!("Unknown template type: {}", type_name))?;

        if let Some(path) = output {
            use std::fs::OpenOptions;
            use std::io::Write as _;
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .map_err(|e| {
                    if e.kind() == std::io::ErrorKind::AlreadyExists {
                        anyhow::anyhow!(
                            "File '{}' already exists. Remove it first or choose a different name.",
                            path.display()
                        )
                    } else {
                        e.into()
                    }
                })?;
            file.write_all(content.as_bytes())?;
            println!("Template written to {}", path.display());
        } else {
            print!("{content}");
        }

        Ok(())
    }
}

/// Format duration in seconds to human-readable string
fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!(
            "{}h {}m {}s",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        )
    }
}
