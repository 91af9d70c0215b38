//! Candidate model — one normalized entry per lookup dataset.
//!
//! The dataset provider delivers loosely shaped JSON rows (spreadsheet
//! exports with drifting column names: `key`/`Key`, `en`/`englishName`,
//! list cells that are JSON arrays, JSON-array strings, or comma strings).
//! Everything is normalized into the tagged [`Candidate`] shape exactly once
//! at load time, so ranking and commit logic never probe ad hoc shapes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Which lookup dataset a candidate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Snippet,
    Diagnosis,
    Medication,
}

/// One normalized entry from a lookup dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Candidate {
    Snippet(SnippetCandidate),
    Diagnosis(DiagnosisCandidate),
    Medication(MedicationCandidate),
}

/// Inline text snippet: typing its key in a free-text field offers the full
/// text body as a replacement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnippetCandidate {
    pub key: String,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// ICD-10 diagnosis entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisCandidate {
    pub icd10: String,
    #[serde(default)]
    pub english_name: String,
    #[serde(default)]
    pub thai_name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_data: Option<CertificateData>,
}

/// Medical-certificate strings attached to a diagnosis. Consumed by the
/// print layer, carried through untouched here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thai_short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit_note: Option<String>,
}

/// Medication entry with its default prescription signature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationCandidate {
    pub name: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub routes: Vec<String>,
    #[serde(default)]
    pub forms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drug_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sig: Option<DefaultSig>,
}

/// Default signature parts used to pre-fill a medication row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultSig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

// ═══════════════════════════════════════════════════════════
// Normalization from raw records
// ═══════════════════════════════════════════════════════════

impl Candidate {
    /// Normalize one raw record into a candidate of the given kind.
    ///
    /// Returns `None` when the record fails the identifying-field invariant
    /// (snippet without a key or text, diagnosis with neither a code nor a
    /// name, medication without a name). Such records never enter the store.
    pub fn from_raw(kind: DatasetKind, raw: &Value) -> Option<Candidate> {
        let obj = raw.as_object()?;
        match kind {
            DatasetKind::Snippet => {
                let key = field_str(obj, &["key", "Key"]).to_lowercase();
                let text = field_str(obj, &["text", "Text"]);
                if key.is_empty() || text.is_empty() {
                    return None;
                }
                let tags = field_list(obj, &["tags", "Tags"])
                    .into_iter()
                    .map(|t| t.to_lowercase())
                    .collect();
                Some(Candidate::Snippet(SnippetCandidate { key, text, tags }))
            }
            DatasetKind::Diagnosis => {
                let icd10 = field_str(obj, &["icd10", "ICD10", "Icd10"]);
                let english_name = field_str(obj, &["englishName", "en", "En", "EN"]);
                let thai_name = field_str(obj, &["thaiName", "th", "Th", "TH"]);
                if icd10.is_empty() && english_name.is_empty() && thai_name.is_empty() {
                    return None;
                }
                Some(Candidate::Diagnosis(DiagnosisCandidate {
                    icd10,
                    english_name,
                    thai_name,
                    synonyms: field_list(obj, &["synonyms", "Synonyms"]),
                    id: field_str(obj, &["id", "ID", "Id"]),
                    certificate_data: certificate_data(obj),
                }))
            }
            DatasetKind::Medication => {
                let name = field_str(obj, &["name", "drug", "label", "Name"]);
                if name.is_empty() {
                    return None;
                }
                Some(Candidate::Medication(MedicationCandidate {
                    name,
                    strengths: field_list(obj, &["strengths", "dose", "Dose"]),
                    routes: field_list(obj, &["routes", "route", "Route"]),
                    forms: field_list(obj, &["forms", "form", "Form"]),
                    drug_class: opt(field_str(obj, &["drugClass", "class", "Class"])),
                    default_sig: default_sig(obj),
                }))
            }
        }
    }

    pub fn kind(&self) -> DatasetKind {
        match self {
            Candidate::Snippet(_) => DatasetKind::Snippet,
            Candidate::Diagnosis(_) => DatasetKind::Diagnosis,
            Candidate::Medication(_) => DatasetKind::Medication,
        }
    }

    /// The normalized primary identifier (snippet key, ICD-10 code or
    /// record id, drug name). Never empty for a stored candidate.
    pub fn primary_id(&self) -> &str {
        match self {
            Candidate::Snippet(s) => &s.key,
            Candidate::Diagnosis(d) => {
                if d.icd10.is_empty() {
                    &d.id
                } else {
                    &d.icd10
                }
            }
            Candidate::Medication(m) => &m.name,
        }
    }

    /// Fields in the *primary* weight class for ranking.
    pub fn primary_fields(&self) -> Vec<&str> {
        match self {
            Candidate::Snippet(s) => vec![s.key.as_str()],
            Candidate::Diagnosis(d) => [&d.icd10, &d.english_name, &d.thai_name]
                .into_iter()
                .filter(|f| !f.is_empty())
                .map(String::as_str)
                .collect(),
            Candidate::Medication(m) => vec![m.name.as_str()],
        }
    }

    /// Fields in the *secondary* weight class.
    pub fn secondary_fields(&self) -> Vec<&str> {
        match self {
            Candidate::Snippet(s) => s.tags.iter().map(String::as_str).collect(),
            Candidate::Diagnosis(d) => d.synonyms.iter().map(String::as_str).collect(),
            Candidate::Medication(m) => {
                m.drug_class.iter().map(String::as_str).collect()
            }
        }
    }

    /// Fields in the *tertiary* weight class.
    pub fn tertiary_fields(&self) -> Vec<&str> {
        match self {
            Candidate::Snippet(s) => vec![s.text.as_str()],
            _ => Vec::new(),
        }
    }

    /// Char length of the auxiliary free text, used by the conciseness
    /// bonus. Zero for kinds without one.
    pub fn aux_text_len(&self) -> usize {
        match self {
            Candidate::Snippet(s) => s.text.chars().count(),
            _ => 0,
        }
    }

    /// Cheap prefilter: does any searchable field contain `query`?
    /// `query` must already be normalized (see [`crate::ranker::normalize`]).
    pub fn matches_substring(&self, query: &str) -> bool {
        let fields = self
            .primary_fields()
            .into_iter()
            .chain(self.secondary_fields())
            .chain(self.tertiary_fields());
        for f in fields {
            if crate::ranker::normalize(f).contains(query) {
                return true;
            }
        }
        false
    }

    /// One-line label for the rendered suggestion list.
    pub fn display_label(&self) -> String {
        match self {
            Candidate::Snippet(s) => format!("{} — {}", s.key, s.text),
            Candidate::Diagnosis(d) => {
                let latin = [d.icd10.as_str(), d.english_name.as_str()]
                    .into_iter()
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if d.thai_name.is_empty() {
                    latin
                } else if latin.is_empty() {
                    d.thai_name.clone()
                } else {
                    format!("{} / {}", latin, d.thai_name)
                }
            }
            Candidate::Medication(m) => {
                let mut parts = vec![m.name.clone()];
                if !m.strengths.is_empty() {
                    parts.push(m.strengths.join(", "));
                }
                if !m.routes.is_empty() {
                    parts.push(m.routes.join(", "));
                }
                parts.join(" — ")
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Raw-field helpers
// ═══════════════════════════════════════════════════════════

/// First present key wins; strings are trimmed, numbers stringified.
fn field_str(obj: &Map<String, Value>, keys: &[&str]) -> String {
    for key in keys {
        match obj.get(*key) {
            Some(Value::String(s)) => {
                let t = s.trim();
                if !t.is_empty() {
                    return t.to_string();
                }
            }
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    String::new()
}

/// List cell tolerant of three spreadsheet shapes: a real JSON array, a
/// JSON-array-in-a-string, or a comma-separated string.
fn field_list(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    for key in keys {
        let Some(value) = obj.get(*key) else { continue };
        match value {
            Value::Array(items) => return scalar_items(items),
            Value::String(s) => {
                let t = s.trim();
                if t.is_empty() {
                    return Vec::new();
                }
                if t.starts_with('[') && t.ends_with(']') {
                    return match serde_json::from_str::<Value>(t) {
                        Ok(Value::Array(items)) => scalar_items(&items),
                        _ => Vec::new(),
                    };
                }
                return t
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ => {}
        }
    }
    Vec::new()
}

fn scalar_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

fn opt(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn certificate_data(obj: &Map<String, Value>) -> Option<CertificateData> {
    let cert = obj
        .get("certificateData")
        .or_else(|| obj.get("mc"))?
        .as_object()?;
    let data = CertificateData {
        thai_short_name: opt(field_str(cert, &["thaiShortName", "th_short"])),
        fit_note: opt(field_str(cert, &["fitNote", "fit_note"])),
    };
    if data.thai_short_name.is_none() && data.fit_note.is_none() {
        None
    } else {
        Some(data)
    }
}

fn default_sig(obj: &Map<String, Value>) -> Option<DefaultSig> {
    let sig = obj.get("defaultSig").or_else(|| obj.get("sig"))?.as_object()?;
    Some(DefaultSig {
        dose: opt(field_str(sig, &["dose"])),
        freq: opt(field_str(sig, &["freq"])),
        duration: opt(field_str(sig, &["duration"])),
        instruction: opt(field_str(sig, &["instruction"])),
    })
}
