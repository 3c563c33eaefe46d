//! Per-run log directory and build summary.

use super::components::Component;
use crate::config::{BuildConfig, BuildMode};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// `logs/<timestamp>/`, one file per component.
#[derive(Clone, Debug)]
pub struct LogDir {
    dir: PathBuf,
}

impl LogDir {
    pub fn create(logs_root: &Path, now: DateTime<Local>) -> Result<Self> {
        let dir = logs_root.join(now.format("%Y%m%d-%H%M%S").to_string());
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.log"))
    }

    pub fn component_log(&self, component: Component) -> PathBuf {
        self.file(component.name())
    }

    pub fn write_summary(&self, summary: &Summary) -> Result<PathBuf> {
        let path = self.dir.join("summary.json");
        let json = serde_json::to_string_pretty(summary)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Built,
    Skipped,
    Failed,
}

#[derive(Clone, Debug, Serialize)]
pub struct ComponentReport {
    pub component: Component,
    pub outcome: Outcome,
    pub elapsed_secs: f64,
}

/// What happened in one run, written to `summary.json`.
#[derive(Clone, Debug, Serialize)]
pub struct Summary {
    pub started_at: String,
    pub mode: BuildMode,
    pub jobs: usize,
    pub target: String,
    pub components: Vec<ComponentReport>,
}

impl Summary {
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            started_at: Local::now().to_rfc3339(),
            mode: config.mode,
            jobs: config.jobs,
            target: config.target.clone(),
            components: Vec::new(),
        }
    }

    pub fn record(&mut self, component: Component, outcome: Outcome, elapsed: Duration) {
        self.components.push(ComponentReport {
            component,
            outcome,
            elapsed_secs: elapsed.as_secs_f64(),
        });
    }

    pub fn outcome(&self, component: Component) -> Option<Outcome> {
        self.components
            .iter()
            .find(|r| r.component == component)
            .map(|r| r.outcome)
    }
}
