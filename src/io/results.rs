//! Run records in JSON Lines format.
//!
//! Each finished run appends one JSON document on its own line, so the file
//! can collect timings from many runs and schemes.

use crate::sim::relaxation::{RunOutcome, SolverConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Parameters and timing of one relaxation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub scheme: String,
    pub width: usize,
    pub height: usize,
    pub config: SolverConfig,
    pub epsilon: f64,
    pub total_iters: usize,
    pub final_delta: Option<f64>,
    pub converged: bool,
    pub secs: f64,
    pub usecs: u64,
    pub max_threads: usize,
    pub host: Option<String>,
}

impl RunRecord {
    pub fn from_outcome(scheme: &str, config: &SolverConfig, outcome: &RunOutcome) -> Self {
        Self {
            scheme: scheme.to_string(),
            width: outcome.grid.width(),
            height: outcome.grid.height(),
            config: *config,
            epsilon: outcome.epsilon,
            total_iters: outcome.iterations,
            final_delta: outcome.final_delta,
            converged: outcome.converged(),
            secs: outcome.elapsed.as_secs_f64(),
            usecs: outcome.elapsed.as_micros() as u64,
            max_threads: rayon::current_num_threads(),
            host: std::env::var("HOSTNAME").ok(),
        }
    }
}

/// Appends `record` as one line to `path`, creating the file if needed.
pub fn append_record(path: &Path, record: &RunRecord) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open results file: {}", path.display()))?;

    let mut line = serde_json::to_string(record).context("Failed to serialize run record")?;
    line.push('\n');
    file.write_all(line.as_bytes())
        .with_context(|| format!("Failed to append to results file: {}", path.display()))?;

    Ok(())
}

/// Reads every record from a results file. Blank lines are skipped.
pub fn read_records(path: &Path) -> Result<Vec<RunRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open results file: {}", path.display()))?;

    let mut records = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("Bad run record on line {} of {}", i + 1, path.display()))?;
        records.push(record);
    }
    Ok(records)
}
