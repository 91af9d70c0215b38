//! Engine tunables.
//!
//! One `EngineConfig` is shared by every session controller. Defaults match
//! the behavior of the note editor this engine was extracted from: at most 8
//! rendered suggestions, a 2-character minimum query, and a 1-character
//! minimum for the medication table (its candidate pool is small enough to
//! query on the first keystroke).

use serde::Deserialize;

use crate::candidate::DatasetKind;

/// Well-known dataset names as delivered by the dataset provider.
pub const DATASET_SNIPPETS: &str = "snippets";
pub const DATASET_DIAGNOSES: &str = "diagnoses";
pub const DATASET_MEDICATIONS: &str = "medications";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Maximum number of suggestions handed to the render surface.
    pub max_results: usize,
    /// Minimum query length before a session opens (snippets, diagnoses).
    pub min_query_len: usize,
    /// Minimum query length for the medication table.
    pub med_min_query_len: usize,
    /// Debounce delay for free-text snippet fields, in milliseconds.
    /// Zero disables debouncing and re-ranks on every keystroke.
    pub snippet_debounce_ms: u64,
    /// Grace delay between input blur and session close, so a pointer-down
    /// commit on the suggestion list can land first.
    pub blur_grace_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_results: 8,
            min_query_len: 2,
            med_min_query_len: 1,
            snippet_debounce_ms: 120,
            blur_grace_ms: 120,
        }
    }
}

impl EngineConfig {
    /// Minimum query length that opens a session for a dataset kind.
    pub fn min_query_len_for(&self, kind: DatasetKind) -> usize {
        match kind {
            DatasetKind::Medication => self.med_min_query_len,
            _ => self.min_query_len,
        }
    }
}
