//! Ranking snapshot entries and the derived per-category leaderboard.
//!
//! Keywords carry their category as a bracketed tag, e.g. `[Fashion] winter gloves`.
//! The tag format is shared with the external worker and is matched byte-exact.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Maximum number of entries in a per-category view.
pub const CATEGORY_VIEW_LIMIT: usize = 10;

/// One row of a ranking snapshot. Serialised as `{ "rank", "keyword", "searchRatio" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: i32,
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub search_ratio: i64,
}

/// Check an incoming ranking batch before it replaces the stored snapshot.
///
/// Input order is kept as-is; rank contiguity is a read-time concern and is not
/// checked here.
///
/// # Errors
///
/// - [`ValidationError::EmptyRankingBatch`] for a `null` or empty batch.
/// - [`ValidationError::InvalidRank`] when an entry's rank is below 1.
/// - [`ValidationError::Negative`] when an entry's `searchRatio` is negative.
pub fn validate_ranking_batch(
    batch: Option<Vec<RankingEntry>>,
) -> Result<Vec<RankingEntry>, ValidationError> {
    let entries = batch
        .filter(|b| !b.is_empty())
        .ok_or(ValidationError::EmptyRankingBatch)?;

    for (index, entry) in entries.iter().enumerate() {
        if entry.rank < 1 {
            return Err(ValidationError::InvalidRank {
                index,
                rank: entry.rank,
            });
        }
        if entry.search_ratio < 0 {
            return Err(ValidationError::Negative {
                field: "searchRatio",
                value: entry.search_ratio,
            });
        }
    }

    Ok(entries)
}

/// Build the `"[Label]"` prefix for a category filter.
///
/// Returns `None` when the label is absent or blank, meaning "no filter".
#[must_use]
pub fn category_prefix(label: Option<&str>) -> Option<String> {
    label
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| format!("[{l}]"))
}

/// In-memory view over the current ranking snapshot.
///
/// Entries are held in ascending rank order, with an index from each
/// keyword's leading bracket tag to its positions. Per-category views are
/// recomputed from this on every read.
#[derive(Debug, Clone, Default)]
pub struct RankingSnapshot {
    entries: Vec<RankingEntry>,
    by_tag: HashMap<String, Vec<usize>>,
}

impl RankingSnapshot {
    #[must_use]
    pub fn new(mut entries: Vec<RankingEntry>) -> Self {
        // Stable: ties keep their stored order.
        entries.sort_by_key(|e| e.rank);

        let mut by_tag: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, entry) in entries.iter().enumerate() {
            if let Some(tag) = bracket_tag(&entry.keyword) {
                by_tag.entry(tag.to_owned()).or_default().push(pos);
            }
        }

        Self { entries, by_tag }
    }

    #[must_use]
    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<RankingEntry> {
        self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-category leaderboard for `label`.
    ///
    /// A blank or absent label yields the whole snapshot with its stored ranks.
    /// Otherwise keeps entries whose keyword starts with `"[" + trim(label) + "]"`
    /// (case-sensitive), takes the first [`CATEGORY_VIEW_LIMIT`] by original
    /// rank, and renumbers them 1..N.
    #[must_use]
    pub fn category_view(&self, label: Option<&str>) -> Vec<RankingEntry> {
        let Some(prefix) = category_prefix(label) else {
            return self.entries.clone();
        };

        let inner = &prefix[1..prefix.len() - 1];
        let matching: Vec<&RankingEntry> = if inner.contains(']') {
            // The tag index splits on the first `]`, so it cannot answer this prefix.
            self.entries
                .iter()
                .filter(|e| e.keyword.starts_with(&prefix))
                .collect()
        } else {
            self.by_tag
                .get(&prefix)
                .map(|positions| positions.iter().map(|&i| &self.entries[i]).collect())
                .unwrap_or_default()
        };

        (1..)
            .zip(matching.into_iter().take(CATEGORY_VIEW_LIMIT))
            .map(|(rank, entry)| RankingEntry {
                rank,
                keyword: entry.keyword.clone(),
                search_ratio: entry.search_ratio,
            })
            .collect()
    }
}

/// Leading `[...]` tag of a keyword, brackets included.
fn bracket_tag(keyword: &str) -> Option<&str> {
    if !keyword.starts_with('[') {
        return None;
    }
    keyword.find(']').map(|end| &keyword[..=end])
}
