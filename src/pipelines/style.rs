//! Stylesheet compilation pipeline
//!
//! Walks the source tree for compilation entries, compiles them with the
//! grass Sass compiler, and writes CSS to the output directory. Development
//! mode emits expanded CSS plus a sourcemap file; live mode emits
//! compressed CSS.

use crate::error::{AssetFlowError, Result};
use crate::models::{Mode, StyleConfig, TaskPipelineConfig, TaskRunReport, TaskStatus};
use crate::pipelines::{human_bytes, Pipeline};
use async_trait::async_trait;
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Stylesheet pipeline backed by the grass compiler
#[derive(Debug, Clone)]
pub struct StylePipeline;

impl StylePipeline {
    pub fn new() -> Self {
        Self
    }

    /// Find every compilation entry under the source tree. Only files whose
    /// name equals the configured entry name are compiled directly; partials
    /// and shared sources are reachable through imports.
    fn discover_entries(source_dir: &Path, entry: &str) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();

        for result in WalkBuilder::new(source_dir).build() {
            let dent = result.map_err(|e| AssetFlowError::Other(e.to_string()))?;
            let is_file = dent.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file && dent.file_name() == entry {
                entries.push(dent.path().to_path_buf());
            }
        }

        entries.sort();
        Ok(entries)
    }

    async fn compile_all(
        &self,
        config: &StyleConfig,
        mode: Mode,
        project_root: &Path,
    ) -> Result<TaskRunReport> {
        let source_dir = project_root.join(&config.source_dir);
        let out_dir = project_root.join(&config.out_dir);

        let entries = Self::discover_entries(&source_dir, &config.entry)?;
        if entries.is_empty() {
            return Err(AssetFlowError::Validation(format!(
                "No '{}' entries found under {}",
                config.entry,
                source_dir.display()
            )));
        }

        let start = std::time::Instant::now();

        let mut options = grass::Options::default().style(match mode {
            Mode::Live => grass::OutputStyle::Compressed,
            Mode::Development => grass::OutputStyle::Expanded,
        });
        options = options.load_path(&source_dir);
        for path in &config.load_paths {
            options = options.load_path(project_root.join(path));
        }

        let mut outputs = Vec::new();
        let mut total_bytes = 0u64;

        for entry_path in &entries {
            let rel = entry_path.strip_prefix(&source_dir).unwrap_or(entry_path);
            let dest = out_dir.join(rel).with_extension("css");

            debug!("Compiling {}", entry_path.display());

            // The compiler renders its own error message with the offending span
            let mut css = grass::from_path(entry_path, &options).map_err(|e| {
                error!("{}", e);
                AssetFlowError::StyleCompile {
                    path: entry_path.display().to_string(),
                    message: e.to_string(),
                }
            })?;

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }

            if !mode.is_live() {
                let map_name = self.write_sourcemap(entry_path, &dest, project_root)?;
                css.push_str(&format!("\n/*# sourceMappingURL={} */\n", map_name));
            }

            fs::write(&dest, &css)?;
            total_bytes += css.len() as u64;
            info!(
                "Wrote {} ({})",
                dest.display(),
                human_bytes(css.len() as u64)
            );
            outputs.push(dest);
        }

        Ok(TaskRunReport {
            status: TaskStatus::Success,
            outputs,
            output_bytes: total_bytes,
            duration: start.elapsed(),
            detail: None,
        })
    }

    /// Write a version-3 sourcemap next to the compiled CSS, returning the
    /// map file name referenced from the stylesheet annotation.
    fn write_sourcemap(&self, entry_path: &Path, dest: &Path, project_root: &Path) -> Result<String> {
        let css_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "out.css".to_string());
        let map_name = format!("{}.map", css_name);
        let map_path = dest.with_file_name(&map_name);

        let source_ref = entry_path
            .strip_prefix(project_root)
            .unwrap_or(entry_path)
            .display()
            .to_string();
        let source_content = fs::read_to_string(entry_path)?;

        let map = serde_json::json!({
            "version": 3,
            "file": css_name,
            "sources": [source_ref],
            "sourcesContent": [source_content],
            "names": [],
            "mappings": "AAAA",
        });

        fs::write(&map_path, serde_json::to_string(&map)?)?;
        debug!("Wrote sourcemap {}", map_path.display());

        Ok(map_name)
    }
}

#[async_trait]
impl Pipeline for StylePipeline {
    async fn run(
        &self,
        config: &TaskPipelineConfig,
        mode: Mode,
        project_root: &Path,
    ) -> Result<TaskRunReport> {
        match config {
            TaskPipelineConfig::Style(style_config) => {
                self.compile_all(style_config, mode, project_root).await
            }
            _ => Err(AssetFlowError::Validation(
                "Invalid config type for StylePipeline".to_string(),
            )),
        }
    }
}

impl Default for StylePipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn style_config() -> StyleConfig {
        StyleConfig {
            source_dir: PathBuf::from("asset/sass"),
            entry: "main.scss".to_string(),
            out_dir: PathBuf::from("asset/css"),
            load_paths: vec![],
        }
    }

    fn write_source(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_development_compile_emits_sourcemap() {
        let dir = tempdir().unwrap();
        write_source(
            dir.path(),
            "asset/sass/main.scss",
            "$color: red;\nbody {\n  color: $color;\n}\n",
        );

        let pipeline = StylePipeline::new();
        let report = pipeline
            .run(
                &TaskPipelineConfig::Style(style_config()),
                Mode::Development,
                dir.path(),
            )
            .await
            .unwrap();

        assert_eq!(report.status, TaskStatus::Success);
        assert_eq!(report.outputs.len(), 1);

        let css = fs::read_to_string(dir.path().join("asset/css/main.css")).unwrap();
        assert!(css.contains("color: red"));
        assert!(css.contains("sourceMappingURL=main.css.map"));

        let map: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("asset/css/main.css.map")).unwrap())
                .unwrap();
        assert_eq!(map["version"], 3);
        assert_eq!(map["sources"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_live_compile_is_compressed() {
        let dir = tempdir().unwrap();
        write_source(
            dir.path(),
            "asset/sass/main.scss",
            "$color: red;\nbody {\n  color: $color;\n}\n",
        );

        let pipeline = StylePipeline::new();
        pipeline
            .run(
                &TaskPipelineConfig::Style(style_config()),
                Mode::Live,
                dir.path(),
            )
            .await
            .unwrap();

        let css = fs::read_to_string(dir.path().join("asset/css/main.css")).unwrap();
        assert!(css.contains("body{color:red}"));
        assert!(!css.contains("sourceMappingURL"));
        assert!(!dir.path().join("asset/css/main.css.map").exists());
    }

    #[tokio::test]
    async fn test_partials_are_imported_not_compiled() {
        let dir = tempdir().unwrap();
        write_source(dir.path(), "asset/sass/_vars.scss", "$color: blue;\n");
        write_source(
            dir.path(),
            "asset/sass/main.scss",
            "@use \"vars\";\nbody {\n  color: vars.$color;\n}\n",
        );

        let pipeline = StylePipeline::new();
        let report = pipeline
            .run(
                &TaskPipelineConfig::Style(style_config()),
                Mode::Development,
                dir.path(),
            )
            .await
            .unwrap();

        // Only the entry compiles; the partial is reachable through @use
        assert_eq!(report.outputs.len(), 1);
        let css = fs::read_to_string(dir.path().join("asset/css/main.css")).unwrap();
        assert!(css.contains("color: blue"));
    }

    #[tokio::test]
    async fn test_nested_entries_preserve_layout() {
        let dir = tempdir().unwrap();
        write_source(dir.path(), "asset/sass/main.scss", "a {\n  color: red;\n}\n");
        write_source(
            dir.path(),
            "asset/sass/admin/main.scss",
            "b {\n  color: green;\n}\n",
        );

        let pipeline = StylePipeline::new();
        let report = pipeline
            .run(
                &TaskPipelineConfig::Style(style_config()),
                Mode::Development,
                dir.path(),
            )
            .await
            .unwrap();

        assert_eq!(report.outputs.len(), 2);
        assert!(dir.path().join("asset/css/main.css").exists());
        assert!(dir.path().join("asset/css/admin/main.css").exists());
    }

    #[tokio::test]
    async fn test_no_entries_is_an_error() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("asset/sass")).unwrap();

        let pipeline = StylePipeline::new();
        let result = pipeline
            .run(
                &TaskPipelineConfig::Style(style_config()),
                Mode::Development,
                dir.path(),
            )
            .await;

        assert!(matches!(result, Err(AssetFlowError::Validation(_))));
    }

    #[tokio::test]
    async fn test_compile_error_reports_path() {
        let dir = tempdir().unwrap();
        write_source(
            dir.path(),
            "asset/sass/main.scss",
            "body {\n  color: $undefined;\n}\n",
        );

        let pipeline = StylePipeline::new();
        let result = pipeline
            .run(
                &TaskPipelineConfig::Style(style_config()),
                Mode::Development,
                dir.path(),
            )
            .await;

        match result {
            Err(AssetFlowError::StyleCompile { path, .. }) => {
                assert!(path.contains("main.scss"));
            }
            other => panic!("Expected StyleCompile error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_config_type() {
        let dir = tempdir().unwrap();
        let pipeline = StylePipeline::new();
        let config = TaskPipelineConfig::Watch(crate::models::WatchConfig {
            paths: vec![PathBuf::from("asset")],
            extensions: vec![],
            run: "sass".to_string(),
        });

        let result = pipeline.run(&config, Mode::Development, dir.path()).await;
        assert!(matches!(result, Err(AssetFlowError::Validation(_))));
    }
}
