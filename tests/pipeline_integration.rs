//! End-to-end integration tests for the full pipeline
//!
//! Tests the complete flow: YAML parsing → DAG building → execution →
//! filesystem artifacts → run history.

use assetflow::dag::DagEngine;
use assetflow::models::{Mode, PipelineConfig, TaskStatus};
use assetflow::parser::parse_manifest_yaml;
use assetflow::runner::TaskRunner;
use assetflow::state::StateManager;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to create a temporary project with a state database
fn setup_project() -> (TempDir, Arc<StateManager>) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("assetflow.db");
    let state = Arc::new(StateManager::new(db_path).unwrap());
    (temp_dir, state)
}

fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn manifest() -> PipelineConfig {
    parse_manifest_yaml(
        r#"
name: frontend-assets
description: "Integration test pipeline"
config:
  timeout_default: 30

tasks:
  - name: sass
    type: style
    config:
      source_dir: asset/sass
      entry: main.scss
      out_dir: asset/css

  - name: react
    type: script
    config:
      entry: app.jsx
      outfile: app.js
      bundler: /bin/cat

  - name: "sass:watch"
    type: watch
    depends_on: [sass]
    config:
      paths: [asset/sass]
      extensions: [scss]
      run: sass

  - name: "react:watch"
    type: watch
    depends_on: [react]
    config:
      paths: ["."]
      extensions: [jsx]
      run: react

  - name: build
    type: group
    depends_on: [sass, react]

  - name: watch
    type: group
    depends_on: ["sass:watch", "react:watch"]
"#,
    )
    .unwrap()
}

#[test]
fn test_manifest_parses_and_sorts() {
    let config = manifest();
    assert_eq!(config.name, "frontend-assets");
    assert_eq!(config.tasks.len(), 6);

    let dag = DagEngine::build(&config.tasks).unwrap();
    let order = dag.topological_sort().unwrap();
    assert_eq!(order.len(), 6);

    // Dependencies sort before their dependents
    let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
    assert!(pos("sass") < pos("sass:watch"));
    assert!(pos("react") < pos("react:watch"));
    assert!(pos("sass") < pos("build"));
    assert!(pos("react") < pos("build"));
    assert!(pos("sass:watch") < pos("watch"));
    assert!(pos("react:watch") < pos("watch"));
}

#[tokio::test]
async fn test_full_build_execution() {
    let (temp_dir, state) = setup_project();
    let root = temp_dir.path();

    write_file(
        root,
        "asset/sass/main.scss",
        "$accent: red;\nbody {\n  color: $accent;\n}\n",
    );
    write_file(root, "app.jsx", "const App = () => null;\n");

    let config = manifest();
    let runner = TaskRunner::new(state.clone(), Mode::Development, root.to_path_buf());

    let success = runner.run(&config, "build").await.unwrap();
    assert!(success, "Build should succeed");

    // Stylesheet pipeline artifacts
    let css = fs::read_to_string(root.join("asset/css/main.css")).unwrap();
    assert!(css.contains("color: red"));
    assert!(css.contains("sourceMappingURL=main.css.map"));
    assert!(root.join("asset/css/main.css.map").exists());

    // Script pipeline artifact (cat passes the entry through)
    let bundle = fs::read_to_string(root.join("app.js")).unwrap();
    assert!(bundle.contains("const App"));

    // Run history: one invocation with both build tasks recorded
    let history = state.recent_invocations(Some("build"), 10).unwrap();
    assert_eq!(history.len(), 1, "Should have one invocation record");
    assert_eq!(history[0].status, TaskStatus::Success);
    assert_eq!(history[0].mode, "development");

    let runs = state.task_runs_for(history[0].id).unwrap();
    assert_eq!(runs.len(), 2, "Should have 2 task run records");
    for run in &runs {
        assert_eq!(
            run.status,
            TaskStatus::Success,
            "Task {} should succeed",
            run.task_name
        );
        assert!(run.duration_ms.is_some());
    }
}

#[tokio::test]
async fn test_live_build_minifies_and_skips_sourcemaps() {
    let (temp_dir, state) = setup_project();
    let root = temp_dir.path();

    write_file(
        root,
        "asset/sass/main.scss",
        "$accent: red;\nbody {\n  color: $accent;\n}\n",
    );
    write_file(root, "app.jsx", "const App = () => null;\n");

    let config = manifest();
    let runner = TaskRunner::new(state.clone(), Mode::Live, root.to_path_buf());

    let success = runner.run(&config, "build").await.unwrap();
    assert!(success);

    let css = fs::read_to_string(root.join("asset/css/main.css")).unwrap();
    assert!(css.contains("body{color:red}"));
    assert!(!css.contains("sourceMappingURL"));
    assert!(!root.join("asset/css/main.css.map").exists());

    let history = state.recent_invocations(Some("build"), 1).unwrap();
    assert_eq!(history[0].mode, "live");
}

#[tokio::test]
async fn test_failing_bundler_fails_invocation() {
    let (temp_dir, state) = setup_project();
    let root = temp_dir.path();

    write_file(root, "asset/sass/main.scss", "a {\n  color: red;\n}\n");
    write_file(root, "app.jsx", "irrelevant\n");

    // Break the script task while keeping the stylesheet task valid
    let yaml = r#"
name: frontend-assets
config:
  timeout_default: 30
tasks:
  - name: sass
    type: style
    config:
      source_dir: asset/sass
      out_dir: asset/css
  - name: react
    type: script
    config:
      entry: app.jsx
      bundler: /bin/sh
      args: ["-c", "echo bundler exploded >&2; exit 2"]
  - name: build
    type: group
    depends_on: [sass, react]
"#;
    let config = parse_manifest_yaml(yaml).unwrap();

    let runner = TaskRunner::new(state.clone(), Mode::Development, root.to_path_buf());
    let success = runner.run(&config, "build").await.unwrap();
    assert!(!success, "Build should fail when the bundler fails");

    let history = state.recent_invocations(Some("build"), 1).unwrap();
    assert_eq!(history[0].status, TaskStatus::Failed);

    let runs = state.task_runs_for(history[0].id).unwrap();
    let failed: Vec<_> = runs
        .iter()
        .filter(|r| r.status == TaskStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].task_name, "react");
    assert!(failed[0].detail.as_deref().unwrap_or("").contains("status 2"));
}

#[tokio::test]
async fn test_single_pipeline_tasks_run_independently() {
    let (temp_dir, state) = setup_project();
    let root = temp_dir.path();

    write_file(root, "asset/sass/main.scss", "a {\n  color: red;\n}\n");
    write_file(root, "app.jsx", "const App = 1;\n");

    let config = manifest();
    let runner = TaskRunner::new(state.clone(), Mode::Development, root.to_path_buf());

    // Running only the stylesheet task must not touch the script pipeline
    let success = runner.run(&config, "sass").await.unwrap();
    assert!(success);
    assert!(root.join("asset/css/main.css").exists());
    assert!(!root.join("app.js").exists());

    // And the other way around
    let success = runner.run(&config, "react").await.unwrap();
    assert!(success);
    assert!(root.join("app.js").exists());
}

#[tokio::test]
async fn test_mode_detection_from_environment() {
    // The manifest names the environment variable consulted for mode
    // detection; `live` selects compressed output
    std::env::set_var("ASSETFLOW_INTEGRATION_MODE", "live");
    assert_eq!(Mode::from_env("ASSETFLOW_INTEGRATION_MODE"), Mode::Live);

    std::env::set_var("ASSETFLOW_INTEGRATION_MODE", "staging");
    assert_eq!(
        Mode::from_env("ASSETFLOW_INTEGRATION_MODE"),
        Mode::Development
    );
    std::env::remove_var("ASSETFLOW_INTEGRATION_MODE");
}
