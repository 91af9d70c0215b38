//! Commit logic — writing a chosen candidate into its target.
//!
//! Two strategies, selected by dataset kind: token replacement for snippets
//! in free text, structured fill for diagnosis and medication rows. The
//! medication path additionally runs the redundancy check over the other
//! rows of the table; its findings are advisory messages, never errors.

use regex::Regex;

use crate::candidate::{DiagnosisCandidate, MedicationCandidate, SnippetCandidate};
use crate::ports::{DiagnosisTarget, MedRowFill, MedicationTarget, RowBinding, TextTarget};
use crate::tokenizer;

/// Replace the trailing token under the caret with the snippet's full text.
pub fn apply_snippet(candidate: &SnippetCandidate, target: &mut dyn TextTarget) {
    let replaced = tokenizer::replace_token(&target.text(), target.cursor(), &candidate.text);
    target.set_text(&replaced.text, replaced.cursor);
}

/// Write the diagnosis into its row: English name into the text field (Thai
/// name when no English one exists), normalized code and record id into the
/// row binding.
pub fn apply_diagnosis(candidate: &DiagnosisCandidate, target: &mut dyn DiagnosisTarget) {
    let text = if candidate.english_name.is_empty() {
        &candidate.thai_name
    } else {
        &candidate.english_name
    };
    target.set_text(text);
    target.bind(
        &candidate.icd10.trim().to_uppercase(),
        &candidate.id.trim().to_uppercase(),
    );
}

/// Fill a medication row from the candidate's defaults, bind its normalized
/// name and class, and return any redundancy messages for the table.
pub fn apply_medication(
    candidate: &MedicationCandidate,
    target: &mut dyn MedicationTarget,
) -> Vec<String> {
    let warnings = check_redundancy(candidate, &target.sibling_bindings());
    target.fill(&build_fill(candidate));
    target.bind(
        &candidate.name.trim().to_lowercase(),
        &candidate
            .drug_class
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_lowercase(),
    );
    warnings
}

/// Row values computed from the candidate: name, first strength, first
/// route uppercased, composed frequency, default duration and instruction.
pub fn build_fill(candidate: &MedicationCandidate) -> MedRowFill {
    let sig = candidate.default_sig.clone().unwrap_or_default();
    let first = |v: &[String]| v.first().cloned().unwrap_or_default();

    MedRowFill {
        drug: candidate.name.clone(),
        dose: first(&candidate.strengths),
        route: first(&candidate.routes).to_uppercase(),
        freq: compose_frequency(
            sig.dose.as_deref().unwrap_or(""),
            &first(&candidate.forms),
            sig.freq.as_deref().unwrap_or(""),
        ),
        duration: sig.duration.unwrap_or_default(),
        instruction: sig.instruction.unwrap_or_default(),
    }
}

/// Compose "1 Tab tid pc" from signature dose, dose form, and frequency.
///
/// When the signature dose already names the form ("1 Tab") the joined
/// string would repeat it ("1 Tab Tab tid"); adjacent duplicated form words
/// are collapsed, case-insensitively.
pub fn compose_frequency(sig_dose: &str, form: &str, sig_freq: &str) -> String {
    let joined = [sig_dose.trim(), form.trim(), sig_freq.trim()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let dup = Regex::new(r"(?i)\b(Tab|Cap|Syr)\s+(Tab|Cap|Syr)\b").unwrap();
    dup.replace_all(&joined, |caps: &regex::Captures<'_>| {
        if caps[1].eq_ignore_ascii_case(&caps[2]) {
            caps[1].to_string()
        } else {
            caps[0].to_string()
        }
    })
    .into_owned()
}

/// Scan the sibling rows for the same normalized drug class or the same
/// normalized drug name. One message per finding.
pub fn check_redundancy(candidate: &MedicationCandidate, siblings: &[RowBinding]) -> Vec<String> {
    let new_name = candidate.name.trim().to_lowercase();
    let new_class = candidate
        .drug_class
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    let mut warnings = Vec::new();
    for row in siblings {
        let old_name = if row.name.is_empty() {
            row.drug_text.trim().to_lowercase()
        } else {
            row.name.trim().to_lowercase()
        };
        let old_class = row.drug_class.trim().to_lowercase();

        if !new_class.is_empty() && new_class == old_class {
            warnings.push(format!(
                "Same drug class ({})",
                candidate.drug_class.as_deref().unwrap_or("")
            ));
        }
        if !new_name.is_empty() && new_name == old_name {
            warnings.push(format!("Duplicate drug: {}", candidate.name));
        }
    }
    warnings
}
