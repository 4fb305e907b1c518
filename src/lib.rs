//! AssetFlow - Lightweight asset pipeline runner for web front-ends

pub mod cli;
pub mod dag;
pub mod error;
pub mod logging;
pub mod models;
pub mod parser;
pub mod pipelines;
pub mod runner;
pub mod state;
pub mod templates;
pub mod watcher;
