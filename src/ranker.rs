//! Multi-field weighted ranking.
//!
//! Every candidate is scored against the query across its searchable fields.
//! Each field matches in one of three tiers (exact, prefix, contains) and
//! belongs to one of three weight classes (primary, secondary, tertiary) —
//! which fields occupy which class is defined per dataset kind on
//! [`Candidate`]. The historical implementations drifted on the literal
//! point values; only their ordering is contractual here:
//!
//! exact-primary > prefix-primary > contains-primary > exact-secondary >
//! prefix-secondary > contains-secondary > tertiary matches > 0.
//!
//! A fractional conciseness bonus (always < 1.0, smaller than any weight
//! gap) breaks ties toward candidates with shorter identifiers and shorter
//! auxiliary text, so it can reorder candidates only within a weight level.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;

// ═══════════════════════════════════════════════════════════
// Weights
// ═══════════════════════════════════════════════════════════

/// Points per match tier within one weight class.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TierWeights {
    pub exact: f64,
    pub prefix: f64,
    pub contains: f64,
}

/// Points per weight class. The default table satisfies the ordering
/// invariant above; hosts may override it (e.g. from configuration) as long
/// as they keep the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub primary: TierWeights,
    pub secondary: TierWeights,
    pub tertiary: TierWeights,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            primary: TierWeights {
                exact: 1000.0,
                prefix: 500.0,
                contains: 200.0,
            },
            secondary: TierWeights {
                exact: 120.0,
                prefix: 80.0,
                contains: 50.0,
            },
            tertiary: TierWeights {
                exact: 30.0,
                prefix: 20.0,
                contains: 10.0,
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Results
// ═══════════════════════════════════════════════════════════

/// Highest weight class that contributed to a match, for UI badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchedField {
    Primary,
    Secondary,
    Tertiary,
}

/// One ranked match. Owns a clone of the candidate so a rendered list stays
/// valid across dataset reloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub candidate: Candidate,
    pub score: f64,
    pub matched_field: MatchedField,
}

// ═══════════════════════════════════════════════════════════
// Ranking
// ═══════════════════════════════════════════════════════════

/// Case-fold and collapse whitespace before comparison.
pub fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Score, sort, and cap candidates for a query.
///
/// Candidates with zero aggregate score are excluded even when the cap is
/// not reached. Ordering is deterministic: score descending, ties broken by
/// shorter primary identifier, then original dataset order.
pub fn rank(
    query: &str,
    candidates: &[Candidate],
    weights: &FieldWeights,
    cap: usize,
) -> Vec<MatchResult> {
    let query = normalize(query);
    if query.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<Scored> = Vec::new();
    for (index, candidate) in candidates.iter().enumerate() {
        if let Some((score, matched_field)) = score_candidate(&query, candidate, weights) {
            scored.push(Scored {
                index,
                primary_len: candidate.primary_id().chars().count(),
                score,
                matched_field,
            });
        }
    }

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.primary_len.cmp(&b.primary_len))
            .then_with(|| a.index.cmp(&b.index))
    });
    scored.truncate(cap);

    scored
        .into_iter()
        .map(|s| MatchResult {
            candidate: candidates[s.index].clone(),
            score: s.score,
            matched_field: s.matched_field,
        })
        .collect()
}

struct Scored {
    index: usize,
    primary_len: usize,
    score: f64,
    matched_field: MatchedField,
}

/// Aggregate score and highest contributing class, or `None` when the
/// candidate is matched by nothing.
fn score_candidate(
    query: &str,
    candidate: &Candidate,
    weights: &FieldWeights,
) -> Option<(f64, MatchedField)> {
    let classes = [
        (MatchedField::Primary, candidate.primary_fields(), weights.primary),
        (MatchedField::Secondary, candidate.secondary_fields(), weights.secondary),
        (MatchedField::Tertiary, candidate.tertiary_fields(), weights.tertiary),
    ];

    let mut score = 0.0;
    let mut matched_field = None;
    for (class, fields, tier) in classes {
        let mut class_score = 0.0;
        for field in fields {
            class_score += tier_weight(&normalize(field), query, tier);
        }
        if class_score > 0.0 {
            score += class_score;
            // classes iterate best-first, so the first hit is the badge
            if matched_field.is_none() {
                matched_field = Some(class);
            }
        }
    }

    let matched_field = matched_field?;
    score += conciseness_bonus(candidate);
    Some((score, matched_field))
}

fn tier_weight(field: &str, query: &str, w: TierWeights) -> f64 {
    if field.is_empty() {
        0.0
    } else if field == query {
        w.exact
    } else if field.starts_with(query) {
        w.prefix
    } else if field.contains(query) {
        w.contains
    } else {
        0.0
    }
}

/// Strictly below 1.0, monotonically larger for shorter primary identifiers
/// and shorter auxiliary free text.
fn conciseness_bonus(candidate: &Candidate) -> f64 {
    let primary_len = candidate.primary_id().chars().count() as f64;
    let aux_len = candidate.aux_text_len() as f64;
    0.5 / (1.0 + primary_len) + 0.25 / (1.0 + aux_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::DatasetKind;
    use serde_json::json;

    fn snippet(key: &str, text: &str, tags: &[&str]) -> Candidate {
        Candidate::from_raw(
            DatasetKind::Snippet,
            &json!({"key": key, "text": text, "tags": tags}),
        )
        .unwrap()
    }

    fn diagnosis(icd10: &str, en: &str, synonyms: &[&str]) -> Candidate {
        Candidate::from_raw(
            DatasetKind::Diagnosis,
            &json!({"icd10": icd10, "en": en, "synonyms": synonyms}),
        )
        .unwrap()
    }

    #[test]
    fn exact_primary_outranks_contains_tertiary() {
        let exact = snippet("sob", "shortness of breath", &[]);
        let tertiary_only = snippet("resp", "patient reports sob at night", &[]);
        let results = rank("sob", &[tertiary_only, exact], &FieldWeights::default(), 8);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].candidate.primary_id(), "sob");
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].matched_field, MatchedField::Primary);
        assert_eq!(results[1].matched_field, MatchedField::Tertiary);
    }

    #[test]
    fn weight_class_ordering_holds_for_defaults() {
        let w = FieldWeights::default();
        let ladder = [
            w.primary.exact,
            w.primary.prefix,
            w.primary.contains,
            w.secondary.exact,
            w.secondary.prefix,
            w.secondary.contains,
            w.tertiary.exact,
            w.tertiary.prefix,
            w.tertiary.contains,
        ];
        for pair in ladder.windows(2) {
            assert!(pair[0] > pair[1]);
        }
        assert!(*ladder.last().unwrap() > 0.0);
    }

    #[test]
    fn zero_score_candidates_never_appear() {
        let pool = [
            snippet("sob", "shortness of breath", &[]),
            snippet("ga", "good appetite", &[]),
        ];
        let results = rank("sob", &pool, &FieldWeights::default(), 8);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn results_are_capped() {
        let pool: Vec<Candidate> = (0..20)
            .map(|i| snippet(&format!("sob{i}"), "text", &[]))
            .collect();
        let results = rank("sob", &pool, &FieldWeights::default(), 8);
        assert_eq!(results.len(), 8);
    }

    #[test]
    fn ranking_is_deterministic() {
        let pool = [
            diagnosis("J00", "Common cold", &[]),
            diagnosis("J06.9", "Acute URI", &["common cold"]),
            snippet("cold", "feels cold", &[]),
        ];
        let a = rank("cold", &pool, &FieldWeights::default(), 8);
        let b = rank("cold", &pool, &FieldWeights::default(), 8);
        assert_eq!(a, b);
    }

    #[test]
    fn ties_break_toward_shorter_primary_then_dataset_order() {
        // identical fields except key length
        let pool = [
            snippet("abdpain", "abdominal pain", &[]),
            snippet("abd", "abdominal pain", &[]),
        ];
        let results = rank("ab", &pool, &FieldWeights::default(), 8);
        assert_eq!(results[0].candidate.primary_id(), "abd");

        // fully identical candidates keep dataset order
        let pool = [
            snippet("abd", "abdominal pain", &[]),
            snippet("abd", "abdominal pain", &[]),
        ];
        let results = rank("abd", &pool, &FieldWeights::default(), 8);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn icd10_code_query_is_exact_primary() {
        let pool = [
            diagnosis("J00", "Common cold", &[]),
            diagnosis("J06.9", "Acute URI", &[]),
        ];
        let results = rank("j00", &pool, &FieldWeights::default(), 8);
        assert_eq!(results[0].candidate.primary_id(), "J00");
        assert_eq!(results[0].matched_field, MatchedField::Primary);
    }

    #[test]
    fn synonym_match_gets_secondary_badge() {
        let pool = [diagnosis("J06.9", "Acute URI", &["common cold"])];
        let results = rank("common cold", &pool, &FieldWeights::default(), 8);
        assert_eq!(results[0].matched_field, MatchedField::Secondary);
    }

    #[test]
    fn normalization_folds_case_and_whitespace() {
        assert_eq!(normalize("  Common   Cold "), "common cold");
        let pool = [diagnosis("J00", "Common cold", &[])];
        let results = rank("  COMMON   COLD ", &pool, &FieldWeights::default(), 8);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matched_field, MatchedField::Primary);
    }

    #[test]
    fn empty_query_matches_nothing() {
        let pool = [snippet("sob", "shortness of breath", &[])];
        assert!(rank("   ", &pool, &FieldWeights::default(), 8).is_empty());
    }

    #[test]
    fn conciseness_bonus_stays_fractional() {
        let c = snippet("a", "b", &[]);
        assert!(conciseness_bonus(&c) < 1.0);
        let long = snippet("verylongsnippetkey", "a very long body of auxiliary text", &[]);
        assert!(conciseness_bonus(&c) > conciseness_bonus(&long));
    }
}
