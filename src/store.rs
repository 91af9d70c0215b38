//! Candidate store — named datasets of normalized candidates.
//!
//! Loading is idempotent: a successful load replaces any prior dataset with
//! the same name, a failed one leaves it untouched, so the engine degrades
//! to "previous data" rather than "no data" when the provider misbehaves.
//! Beyond an optional direct-lookup map by primary identifier there are no
//! indices; prefiltering is a linear scan recomputed per query, which keeps
//! results correct across dataset reloads.

use std::collections::HashMap;

use serde_json::Value;

use crate::candidate::{Candidate, DatasetKind};
use crate::error::LoadError;

/// Counts from one dataset load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Records that passed validation and entered the store.
    pub loaded: usize,
    /// Records dropped for failing the identifying-field invariant.
    pub dropped: usize,
}

struct Dataset {
    kind: DatasetKind,
    candidates: Vec<Candidate>,
    by_id: HashMap<String, usize>,
}

/// Holds every named dataset the engine can query.
#[derive(Default)]
pub struct CandidateStore {
    datasets: HashMap<String, Dataset>,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load raw records into the named dataset, replacing its previous
    /// contents on success.
    ///
    /// The payload may be a bare array or an object wrapping the array under
    /// `data` or `rows` (the shapes the sheet-backed provider emits). Any
    /// other shape is a [`LoadError::NotAnArray`] and the previous dataset
    /// stays usable.
    pub fn load(
        &mut self,
        name: &str,
        kind: DatasetKind,
        payload: &Value,
    ) -> Result<LoadReport, LoadError> {
        let Some(rows) = payload_rows(payload) else {
            tracing::warn!(dataset = name, "load failed: payload is not a record array");
            return Err(LoadError::NotAnArray {
                dataset: name.to_string(),
            });
        };

        let mut candidates = Vec::with_capacity(rows.len());
        let mut dropped = 0usize;
        for row in rows {
            match Candidate::from_raw(kind, row) {
                Some(c) => candidates.push(c),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::warn!(
                dataset = name,
                dropped,
                "dropped records missing identifying fields"
            );
        }

        let by_id = build_id_index(kind, &candidates);
        let loaded = candidates.len();
        self.datasets.insert(
            name.to_string(),
            Dataset {
                kind,
                candidates,
                by_id,
            },
        );
        tracing::debug!(dataset = name, loaded, dropped, "dataset loaded");

        Ok(LoadReport { loaded, dropped })
    }

    /// [`load`](Self::load) from a raw JSON string.
    pub fn load_str(
        &mut self,
        name: &str,
        kind: DatasetKind,
        payload: &str,
    ) -> Result<LoadReport, LoadError> {
        let value: Value = serde_json::from_str(payload).inspect_err(|e| {
            tracing::warn!(dataset = name, error = %e, "load failed: payload is not JSON");
        })?;
        self.load(name, kind, &value)
    }

    /// Dataset kind, if the dataset has been loaded.
    pub fn kind(&self, name: &str) -> Option<DatasetKind> {
        self.datasets.get(name).map(|d| d.kind)
    }

    /// All candidates of a dataset; empty when it was never loaded.
    pub fn candidates(&self, name: &str) -> &[Candidate] {
        self.datasets
            .get(name)
            .map(|d| d.candidates.as_slice())
            .unwrap_or(&[])
    }

    /// Linear-scan prefilter over a dataset. Returns owned clones so an open
    /// session keeps its list intact across a concurrent reload.
    pub fn prefilter<F>(&self, name: &str, predicate: F) -> Vec<Candidate>
    where
        F: Fn(&Candidate) -> bool,
    {
        self.candidates(name)
            .iter()
            .filter(|c| predicate(c))
            .cloned()
            .collect()
    }

    /// Direct lookup by normalized primary identifier (uppercased ICD-10
    /// code or record id for diagnoses, lowercased key/name otherwise).
    /// Used by downstream consumers, not by ranking.
    pub fn get_by_id(&self, name: &str, id: &str) -> Option<&Candidate> {
        let dataset = self.datasets.get(name)?;
        let key = normalize_id(dataset.kind, id);
        dataset
            .by_id
            .get(&key)
            .and_then(|&i| dataset.candidates.get(i))
    }
}

fn payload_rows(payload: &Value) -> Option<&Vec<Value>> {
    match payload {
        Value::Array(rows) => Some(rows),
        Value::Object(obj) => obj
            .get("data")
            .or_else(|| obj.get("rows"))
            .and_then(Value::as_array),
        _ => None,
    }
}

fn normalize_id(kind: DatasetKind, id: &str) -> String {
    match kind {
        DatasetKind::Diagnosis => id.trim().to_uppercase(),
        _ => id.trim().to_lowercase(),
    }
}

fn build_id_index(kind: DatasetKind, candidates: &[Candidate]) -> HashMap<String, usize> {
    let mut by_id = HashMap::new();
    for (i, c) in candidates.iter().enumerate() {
        let primary = normalize_id(kind, c.primary_id());
        if !primary.is_empty() {
            by_id.insert(primary, i);
        }
        // diagnoses are addressable by record id as well as by code
        if let Candidate::Diagnosis(d) = c {
            if !d.id.is_empty() {
                by_id.insert(normalize_id(kind, &d.id), i);
            }
        }
    }
    by_id
}
