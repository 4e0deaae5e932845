/// In-memory record of recent simulation runs, plus JSON export.
/// State lives for the process lifetime only.

use crate::model::SimulationResponse;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::RwLock;

/// Oldest entries are dropped beyond this.
const HISTORY_CAP: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub seq: u64,
    pub particles: u32,
    pub potential: String,
    pub energy: f64,
    pub entropy: f64,
}

/// Counter and runs share one lock so sequence numbers are assigned in
/// the same order the records land in the vector.
struct History {
    next_seq: u64,
    runs: Vec<RunRecord>,
}

static HISTORY: Lazy<RwLock<History>> = Lazy::new(|| {
    RwLock::new(History {
        next_seq: 0,
        runs: Vec::new(),
    })
});

/// Append a run, assigning it the next sequence number.
pub fn record(
    particles: u32,
    potential: &str,
    energy: f64,
    entropy: f64,
) -> Result<RunRecord, String> {
    let mut history = HISTORY.write().map_err(|_| "history poisoned")?;
    let entry = RunRecord {
        seq: history.next_seq,
        particles,
        potential: potential.to_string(),
        energy,
        entropy,
    };
    history.next_seq += 1;
    history.runs.push(entry.clone());
    if history.runs.len() > HISTORY_CAP {
        let excess = history.runs.len() - HISTORY_CAP;
        history.runs.drain(..excess);
    }
    Ok(entry)
}

/// Most recent runs, newest first.
pub fn recent(limit: usize) -> Result<Vec<RunRecord>, String> {
    let history = HISTORY.read().map_err(|_| "history poisoned")?;
    Ok(history.runs.iter().rev().take(limit).cloned().collect())
}

pub fn len() -> usize {
    HISTORY.read().map(|h| h.runs.len()).unwrap_or(0)
}

/// Write a full response to disk as pretty JSON.
pub fn export_results(path: &Path, response: &SimulationResponse) -> Result<(), String> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| format!("serialize results: {e}"))?;
    fs::write(path, json).map_err(|e| format!("write {}: {e}", path.display()))
}
