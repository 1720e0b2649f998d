//! Apparel reference dataset used to enrich advisor prompts.
//!
//! The CSV is read at most once per catalogue, on first access, and held
//! read-only afterwards. A missing or unreadable file yields an empty
//! catalogue, which simply disables the reference context.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::dto::AdvisorRequest;

pub const DEFAULT_MAX_EXAMPLES: usize = 7;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApparelRecord {
    #[serde(rename = "articleType", default)]
    pub article_type: String,
    #[serde(rename = "subCategory", default)]
    pub sub_category: String,
    #[serde(rename = "baseColour", default)]
    pub base_colour: String,
    #[serde(default)]
    pub season: String,
    #[serde(default)]
    pub usage: String,
    #[serde(rename = "productDisplayName", default)]
    pub display_name: String,
}

pub struct ApparelCatalog {
    source: Option<PathBuf>,
    row_limit: usize,
    rows: OnceCell<Vec<ApparelRecord>>,
}

impl ApparelCatalog {
    /// Lazily backed by a CSV file; `row_limit == 0` reads every row.
    pub fn from_csv(path: impl Into<PathBuf>, row_limit: usize) -> Self {
        Self {
            source: Some(path.into()),
            row_limit,
            rows: OnceCell::new(),
        }
    }

    pub fn from_records(records: Vec<ApparelRecord>) -> Self {
        Self {
            source: None,
            row_limit: 0,
            rows: OnceCell::with_value(records),
        }
    }

    pub fn empty() -> Self {
        Self::from_records(Vec::new())
    }

    pub fn records(&self) -> &[ApparelRecord] {
        self.rows.get_or_init(|| match &self.source {
            Some(path) => load_or_empty(path, self.row_limit),
            None => Vec::new(),
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.rows.get().is_some()
    }

    /// Reads the CSV on the blocking pool so async workers never do file IO
    /// or wait on another thread's load. Returns the row count.
    pub async fn preload(self: Arc<Self>) -> usize {
        if let Some(rows) = self.rows.get() {
            return rows.len();
        }
        match tokio::task::spawn_blocking(move || self.records().len()).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "apparel loading task failed");
                0
            }
        }
    }

    pub fn build_context(&self, request: &AdvisorRequest, max_examples: usize) -> Option<String> {
        build_context(self.records(), request, max_examples)
    }
}

fn load_or_empty(path: &Path, limit: usize) -> Vec<ApparelRecord> {
    if !path.exists() {
        info!(path = %path.display(), "apparel dataset not found; reference context disabled");
        return Vec::new();
    }
    match load_records(path, limit) {
        Ok(rows) => {
            info!(path = %path.display(), rows = rows.len(), "apparel dataset loaded");
            rows
        }
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to load apparel dataset");
            Vec::new()
        }
    }
}

fn load_records(path: &Path, limit: usize) -> anyhow::Result<Vec<ApparelRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;

    let take = if limit == 0 { usize::MAX } else { limit };
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for row in reader.deserialize::<ApparelRecord>().take(take) {
        match row {
            Ok(r) => rows.push(r),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(skipped, "skipped malformed apparel rows");
    }
    Ok(rows)
}

/// One-line summary of the reference rows that resemble the request.
pub fn build_context(
    rows: &[ApparelRecord],
    request: &AdvisorRequest,
    max_examples: usize,
) -> Option<String> {
    if rows.is_empty() {
        return None;
    }

    let mut matched: Vec<&ApparelRecord> = Vec::new();

    let query = request
        .outfit_type
        .as_deref()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());
    if let Some(q) = &query {
        matched.extend(rows.iter().filter(|r| {
            r.article_type.to_lowercase().contains(q.as_str())
                || r.sub_category.to_lowercase().contains(q.as_str())
        }));
    }

    if matched.is_empty() {
        let season = request
            .outfit_season
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        if let Some(season) = season {
            matched.extend(
                rows.iter()
                    .filter(|r| r.season.trim().to_lowercase() == season),
            );
        }
    }

    if matched.is_empty() {
        let colors = top_values(rows.iter().map(|r| r.base_colour.as_str()), 3);
        let types = top_values(rows.iter().map(|r| r.article_type.as_str()), 3);
        return Some(format!(
            "Dataset summary — {} items; common colors: {}; common types: {}.",
            rows.len(),
            colors.join(", "),
            types.join(", ")
        ));
    }

    let colors = top_values(matched.iter().map(|r| r.base_colour.as_str()), 4);
    let seasons = top_values(matched.iter().map(|r| r.season.as_str()), 3);
    let usages = top_values(matched.iter().map(|r| r.usage.as_str()), 3);
    let examples: Vec<&str> = matched
        .iter()
        .take(max_examples)
        .map(|r| r.display_name.as_str())
        .filter(|n| !n.is_empty())
        .collect();

    let mut parts = Vec::new();
    if !colors.is_empty() {
        parts.push(format!("colors: {}", colors.join(", ")));
    }
    if !seasons.is_empty() {
        parts.push(format!("seasons: {}", seasons.join(", ")));
    }
    if !usages.is_empty() {
        parts.push(format!("usage: {}", usages.join(", ")));
    }
    if !examples.is_empty() {
        parts.push(format!("examples: {}", examples.join("; ")));
    }
    if parts.is_empty() {
        return None;
    }

    let label = request
        .outfit_type
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or("N/A");
    Some(format!("Items similar to '{}' — {}", label, parts.join("; ")))
}

/// Most frequent title-cased values, ties kept in first-seen order.
fn top_values<'a>(values: impl Iterator<Item = &'a str>, n: usize) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for raw in values {
        let v = title_case(raw.trim());
        if v.is_empty() {
            continue;
        }
        match index.get(&v) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(v.clone(), counts.len());
                counts.push((v, 1));
            }
        }
    }
    // stable sort keeps encounter order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(n).map(|(v, _)| v).collect()
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if prev_alpha {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_alpha = c.is_alphabetic();
    }
    out
}
