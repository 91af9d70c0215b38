//! Typeahead suggestion engine for a bilingual (Thai/English) clinical
//! note editor.
//!
//! Three surfaces share one pipeline: inline text snippets in free-text
//! fields, ICD-10 diagnosis lookup, and medication lookup with default
//! prescription signatures. The pipeline is tokenize → prefilter → rank →
//! navigate → commit:
//!
//! - [`tokenizer`] extracts the trailing token under the caret (char
//!   offsets, so Thai text is safe).
//! - [`store`] holds named datasets of [`candidate`]s normalized once at
//!   load time from loosely shaped spreadsheet rows.
//! - [`ranker`] scores candidates across weighted field classes and three
//!   match tiers, capped and deterministically ordered.
//! - [`session`] runs the per-input interaction state machine: debounce,
//!   keyboard navigation, blur grace, pointer commits.
//! - [`applicator`] writes a committed candidate into its target and runs
//!   the medication redundancy check.
//!
//! The engine is UI-framework agnostic: hosts implement the traits in
//! [`ports`] and forward input, key, pointer, blur, and timer events to a
//! [`SessionController`] per suggestible input.

pub mod applicator;
pub mod candidate;
pub mod config;
pub mod error;
pub mod ports;
pub mod ranker;
pub mod session;
pub mod store;
pub mod tokenizer;

pub use candidate::{
    Candidate, CertificateData, DatasetKind, DefaultSig, DiagnosisCandidate, MedicationCandidate,
    SnippetCandidate,
};
pub use config::{EngineConfig, DATASET_DIAGNOSES, DATASET_MEDICATIONS, DATASET_SNIPPETS};
pub use error::LoadError;
pub use ports::{
    DiagnosisTarget, EventSink, MedRowFill, MedicationTarget, RenderPort, RowBinding, Scheduler,
    TargetMut, TaskId, TaskKind, TextTarget,
};
pub use ranker::{rank, FieldWeights, MatchResult, MatchedField, TierWeights};
pub use session::{KeyCommand, KeyOutcome, QueryMode, Session, SessionController};
pub use store::{CandidateStore, LoadReport};
pub use tokenizer::{extract_token, replace_token, TokenReplacement};
