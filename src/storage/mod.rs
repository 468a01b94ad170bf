//! Persistence layer.
//!
//! Saves and loads completed simulation results as pretty JSON, one file
//! per club, season and mode. Each file carries the time it was written.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::{season_key, SimulationResult, StrategyMode};

/// Default results directory.
const DEFAULT_RESULTS_DIR: &str = "results";

/// A result as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedResult {
    pub saved_at: DateTime<Utc>,
    pub result: SimulationResult,
}

/// File-name-safe form of a club name: lowercase, non-alphanumerics as `-`.
pub fn club_slug(club: &str) -> String {
    club.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

/// `{dir}/{club-slug}_{YYYY-YY}_{mode}.json`
pub fn result_path(dir: Option<&Path>, club: &str, season: u16, mode: StrategyMode) -> PathBuf {
    let dir = dir.unwrap_or(Path::new(DEFAULT_RESULTS_DIR));
    dir.join(format!("{}_{}_{}.json", club_slug(club), season_key(season), mode))
}

/// Save a result, creating the directory if needed. Returns the file path.
pub fn save_result(result: &SimulationResult, dir: Option<&Path>) -> Result<PathBuf> {
    let req = &result.request;
    let path = result_path(dir, &req.club, req.season, req.mode);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create results directory {}", parent.display()))?;
    }

    let saved = SavedResult {
        saved_at: Utc::now(),
        result: result.clone(),
    };
    let json = serde_json::to_string_pretty(&saved).context("Failed to serialise simulation result")?;
    std::fs::write(&path, &json)
        .with_context(|| format!("Failed to write result to {}", path.display()))?;

    info!(path = %path.display(), club = %req.club, mode = %req.mode, "Result saved");
    Ok(path)
}

/// Load a saved result. Returns None if the file doesn't exist.
pub fn load_result(
    dir: Option<&Path>,
    club: &str,
    season: u16,
    mode: StrategyMode,
) -> Result<Option<SavedResult>> {
    let path = result_path(dir, club, season, mode);

    if !path.exists() {
        debug!(path = %path.display(), "No saved result found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read result from {}", path.display()))?;
    let saved: SavedResult = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse result from {}", path.display()))?;

    debug!(
        path = %path.display(),
        saved_at = %saved.saved_at,
        sold = saved.result.sold.len(),
        bought = saved.result.bought.len(),
        "Result loaded"
    );
    Ok(Some(saved))
}

/// Delete a saved result (no-op if absent).
pub fn delete_result(dir: Option<&Path>, club: &str, season: u16, mode: StrategyMode) -> Result<()> {
    let path = result_path(dir, club, season, mode);
    if path.exists() {
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to delete result file {}", path.display()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
