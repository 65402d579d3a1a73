//! Run sidecar: `<out>.provenance.json` next to the event file, recording
//! what produced it (code revision, seed, generator setup, totals).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Event, vertex and particle counts of one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RunTotals {
    pub events: u64,
    pub vertices: usize,
    pub particles: usize,
}

/// One registered generator as it ran.
#[derive(Debug, Serialize)]
pub struct GeneratorEntry {
    pub label: String,
    pub kind: String,
    pub code: u32,
    pub active: bool,
    pub expected_count_per_event: f64,
    /// Normalized document, re-registrable as is.
    pub doc: Value,
}

#[derive(Deserialize)]
struct Described {
    label: String,
    #[serde(rename = "type")]
    kind: String,
    derived: Derived,
}

#[derive(Deserialize)]
struct Derived {
    generator_code: u32,
    expected_count_per_event: f64,
}

impl GeneratorEntry {
    /// Build from one element of `GeneratorRegistry::describe`.
    pub fn from_described(doc: Value, active: bool) -> Result<Self> {
        let d: Described =
            serde_json::from_value(doc.clone()).context("reading described generator")?;
        Ok(Self {
            label: d.label,
            kind: d.kind,
            code: d.derived.generator_code,
            active,
            expected_count_per_event: d.derived.expected_count_per_event,
            doc,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct RunRecord {
    pub code_rev: String,
    pub library_version: &'static str,
    pub tag: Option<String>,
    pub seed: u64,
    pub geometry: PathBuf,
    pub generators: Vec<GeneratorEntry>,
    pub totals: RunTotals,
    pub output: PathBuf,
}

/// Write the record beside `record.output` and return the sidecar path.
pub fn write_sidecar(record: &RunRecord) -> Result<PathBuf> {
    let path = sidecar_path(&record.output);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating sidecar dir {}", parent.display()))?;
    }
    fs::write(&path, serde_json::to_vec_pretty(record)?)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "provenance sidecar written");
    Ok(path)
}

fn sidecar_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "events".to_string());
    output.with_file_name(format!("{stem}.provenance.json"))
}

/// `GIT_COMMIT` (build time, then run time), else `git rev-parse HEAD`.
pub fn current_git_rev() -> String {
    let env = option_env!("GIT_COMMIT")
        .map(str::to_string)
        .or_else(|| std::env::var("GIT_COMMIT").ok())
        .filter(|s| !s.is_empty());
    if let Some(rev) = env {
        return rev;
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
