//! Manifest parser with validation for pipeline configurations

use crate::error::{AssetFlowError, Result};
use crate::models::*;
use std::fs;
use std::path::Path;

/// Parse a pipeline manifest from a YAML file.
///
/// Reads and validates an `assetflow.yaml` manifest, enforcing resource
/// limits and cross-task consistency:
/// - manifest size must be <= 1MB
/// - task count must be <= 256
/// - task names are alphanumeric plus underscore, dash, and colon
/// - dependencies and watch targets must reference existing tasks
/// - each task's config payload must match its declared kind
///
/// # Errors
///
/// * `AssetFlowError::Io` - if the file cannot be read
/// * `AssetFlowError::ManifestSizeExceeded` - if the file exceeds 1MB
/// * `AssetFlowError::YamlParse` - if the YAML is malformed
/// * `AssetFlowError::Validation` - for cross-task consistency failures
pub fn parse_manifest_file<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path)?;
    parse_manifest_yaml(&content)
}

/// Parse a pipeline manifest from a YAML string.
///
/// Validates the content and enforces the same limits as
/// [`parse_manifest_file`]; prefer that function for loading from disk.
///
/// # Example
///
/// ```
/// use assetflow::parser::parse_manifest_yaml;
///
/// let yaml = r#"
/// name: frontend-assets
/// tasks:
///   - name: sass
///     type: style
///     config:
///       source_dir: asset/sass
///       out_dir: asset/css
/// "#;
///
/// let config = parse_manifest_yaml(yaml)?;
/// assert_eq!(config.name, "frontend-assets");
/// # Ok::<(), assetflow::error::AssetFlowError>(())
/// ```
pub fn parse_manifest_yaml(content: &str) -> Result<PipelineConfig> {
    // Validate manifest size limit
    if content.len() > MAX_MANIFEST_SIZE {
        return Err(AssetFlowError::ManifestSizeExceeded(content.len()));
    }

    // Parse YAML
    let mut config: PipelineConfig = serde_yaml::from_str(content)?;

    // Validate task count
    if config.tasks.len() > MAX_TASK_COUNT {
        return Err(AssetFlowError::TaskCountExceeded {
            count: config.tasks.len(),
            limit: MAX_TASK_COUNT,
        });
    }

    // Validate task names and check for duplicates
    {
        let mut seen_names = std::collections::HashSet::with_capacity(config.tasks.len());
        for task in &config.tasks {
            validate_task_name(&task.name)?;
            if !seen_names.insert(&task.name) {
                return Err(AssetFlowError::Validation(format!(
                    "Duplicate task name '{}'",
                    task.name,
                )));
            }
        }
    }

    // Validate each task's config payload matches its declared kind
    for task in &config.tasks {
        validate_task_config(task)?;
    }

    // Validate task dependencies and watch targets reference existing tasks
    validate_dependencies(&config)?;
    validate_watch_targets(&config)?;

    // Apply global defaults to tasks
    apply_defaults(&mut config);

    Ok(config)
}

/// Validate task name format and length
fn validate_task_name(name: &str) -> Result<()> {
    // Check empty name
    if name.is_empty() {
        return Err(AssetFlowError::InvalidTaskName {
            name: name.to_string(),
        });
    }

    // Check length
    if name.len() > MAX_TASK_NAME_LEN {
        return Err(AssetFlowError::TaskNameTooLong {
            name: name.to_string(),
            max: MAX_TASK_NAME_LEN,
        });
    }

    // Check format: alphanumeric + underscore + dash, plus colon for the
    // conventional `sass:watch` naming scheme
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ':')
    {
        return Err(AssetFlowError::InvalidTaskName {
            name: name.to_string(),
        });
    }

    Ok(())
}

/// Validate that a task's config payload matches its declared kind
fn validate_task_config(task: &TaskConfig) -> Result<()> {
    match (&task.kind, &task.config) {
        (TaskKind::Group, None) => Ok(()),
        (TaskKind::Group, Some(_)) => Err(AssetFlowError::Validation(format!(
            "Group task '{}' must not carry a config payload",
            task.name
        ))),
        (_, None) => Err(AssetFlowError::Validation(format!(
            "Task '{}' of kind {} requires a config payload",
            task.name, task.kind
        ))),
        (kind, Some(config)) => {
            let config_matches = matches!(
                (kind, config),
                (TaskKind::Style, TaskPipelineConfig::Style(_))
                    | (TaskKind::Script, TaskPipelineConfig::Script(_))
                    | (TaskKind::Watch, TaskPipelineConfig::Watch(_))
            );

            if !config_matches {
                return Err(AssetFlowError::Validation(format!(
                    "Task '{}' has kind {} but config does not match",
                    task.name, task.kind
                )));
            }

            Ok(())
        }
    }
}

/// Validate that all task dependencies reference existing tasks
fn validate_dependencies(config: &PipelineConfig) -> Result<()> {
    let task_names: std::collections::HashSet<_> = config.tasks.iter().map(|t| &t.name).collect();

    for task in &config.tasks {
        for dep in &task.depends_on {
            if !task_names.contains(dep) {
                return Err(AssetFlowError::MissingDependency {
                    task: task.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Validate watch tasks: the `run` target must name an existing style or
/// script task, and at least one watch path must be given
fn validate_watch_targets(config: &PipelineConfig) -> Result<()> {
    for task in &config.tasks {
        let Some(TaskPipelineConfig::Watch(watch)) = &task.config else {
            continue;
        };

        if watch.paths.is_empty() {
            return Err(AssetFlowError::Validation(format!(
                "Watch task '{}' has no paths to watch",
                task.name
            )));
        }

        let target = config.tasks.iter().find(|t| t.name == watch.run);
        match target {
            None => {
                return Err(AssetFlowError::Validation(format!(
                    "Watch task '{}' re-runs non-existent task '{}'",
                    task.name, watch.run
                )));
            }
            Some(t) if !matches!(t.kind, TaskKind::Style | TaskKind::Script) => {
                return Err(AssetFlowError::Validation(format!(
                    "Watch task '{}' re-runs '{}', which is not a build task",
                    task.name, watch.run
                )));
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// Apply global defaults to task configurations
fn apply_defaults(config: &mut PipelineConfig) {
    for task in &mut config.tasks {
        // Apply default timeout if not specified
        if task.timeout.is_none() {
            task.timeout = Some(config.config.timeout_default);
        }
    }
}

/// Validate a script pipeline configuration.
///
/// Enforces limits on the bundler invocation:
/// - command must be non-empty and <= 4096 bytes
/// - argument count must be <= 256, each argument <= 4096 bytes
/// - the working directory must not contain `..` traversal
///
/// # Errors
///
/// * `AssetFlowError::InvalidPath` - if the command is empty
/// * `AssetFlowError::CommandTooLong` - if the command exceeds 4096 bytes
/// * `AssetFlowError::ArgCountExceeded` / `ArgTooLong` - argument limits
/// * `AssetFlowError::PathTraversal` - if the workdir contains `..`
pub fn validate_script_config(config: &ScriptConfig) -> Result<()> {
    // Validate command presence and length
    if config.bundler.is_empty() {
        return Err(AssetFlowError::InvalidPath(
            "Bundler command must not be empty".to_string(),
        ));
    }
    if config.bundler.len() > MAX_COMMAND_LEN {
        return Err(AssetFlowError::CommandTooLong {
            limit: MAX_COMMAND_LEN,
        });
    }

    // Validate argument count across both argument lists
    let arg_count = config.args.len() + config.minify_args.len();
    if arg_count > MAX_ARG_COUNT {
        return Err(AssetFlowError::ArgCountExceeded {
            count: arg_count,
            limit: MAX_ARG_COUNT,
        });
    }

    // Validate argument lengths
    for arg in config.args.iter().chain(config.minify_args.iter()) {
        if arg.len() > MAX_ARG_LEN {
            return Err(AssetFlowError::ArgTooLong { limit: MAX_ARG_LEN });
        }
    }

    // Validate working directory if specified
    if let Some(workdir) = &config.workdir {
        if workdir.contains("..") {
            return Err(AssetFlowError::PathTraversal(workdir.clone()));
        }
    }

    Ok(())
}
