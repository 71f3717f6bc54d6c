// src/output.rs
//! Optional JSON snapshot of one cycle's matches.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::model::SearchResult;

#[derive(Serialize)]
struct Snapshot<'a> {
    last_updated: String,
    total_results: usize,
    results: &'a [SearchResult],
}

/// Overwrite `path` with `{last_updated, total_results, results}`. The parent
/// directory must already exist.
pub async fn write_results(path: &Path, results: &[SearchResult]) -> Result<()> {
    let doc = Snapshot {
        last_updated: Utc::now().to_rfc3339(),
        total_results: results.len(),
        results,
    };
    let body = serde_json::to_string_pretty(&doc).context("serializing results")?;
    tokio::fs::write(path, body)
        .await
        .with_context(|| format!("writing results to {}", path.display()))?;
    tracing::info!(target: "output", path = %path.display(), total = results.len(), "results written");
    Ok(())
}
