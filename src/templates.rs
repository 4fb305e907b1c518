//! Built-in manifest templates for the `assetflow template` subcommand.

/// Metadata for a template type.
#[derive(Debug, Clone)]
pub struct TemplateInfo {
    /// Template name (matches the CLI `--type` value).
    pub name: &'static str,
    /// Short description shown in the listing table.
    pub description: &'static str,
}

/// Returns metadata for every available template.
pub fn list_templates() -> Vec<TemplateInfo> {
    vec![
        TemplateInfo {
            name: "minimal",
            description: "Single stylesheet task, no dependencies",
        },
        TemplateInfo {
            name: "full",
            description: "Stylesheet + script pipelines with watch variants and aggregates",
        },
    ]
}

/// Returns the YAML content for a given template type.
///
/// The `template_type` must be one of: `minimal`, `full`.
pub fn get_template(template_type: &str) -> Option<&'static str> {
    match template_type {
        "minimal" => Some(TEMPLATE_MINIMAL),
        "full" => Some(TEMPLATE_FULL),
        _ => None,
    }
}

/// Bare-minimum manifest: one stylesheet task.
const TEMPLATE_MINIMAL: &str = r#"# AssetFlow Manifest — Minimal Example
# Compile a Sass tree to CSS.
name: minimal-pipeline
description: "A minimal pipeline with a single stylesheet task"

tasks:
  - name: sass
    type: style
    config:
      source_dir: asset/sass
      entry: main.scss
      out_dir: asset/css
"#;

/// Full pipeline: stylesheet + script bundles, watch variants, aggregates.
const TEMPLATE_FULL: &str = r#"# AssetFlow Manifest — Full Pipeline
# Stylesheet and script pipelines with watch variants and aggregate tasks.
# Set ASSETFLOW_ENV=live for compressed/minified output; any other value
# builds for development (expanded CSS plus sourcemaps).
name: frontend-assets
description: "Stylesheet and script pipelines with watch mode"

config:
  timeout_default: 300
  env_var: ASSETFLOW_ENV

tasks:
  # Compile every main.scss under the source tree to asset/css.
  - name: sass
    type: style
    config:
      source_dir: asset/sass
      entry: main.scss
      out_dir: asset/css

  # Bundle the component entry point into a single browser-loadable file.
  # NOTE: point `bundler` at the bundler installed for your project.
  - name: react
    type: script
    config:
      entry: app.jsx
      outfile: app.js
      bundler: esbuild
      args: ["--bundle", "--loader:.jsx=jsx"]
      minify_args: ["--minify"]

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
"#;
