//! Collaborator interfaces.
//!
//! The engine is UI-framework agnostic: everything it needs from the
//! surrounding editor — field access, list rendering, event delivery,
//! timers — comes in through these traits. The host wires them to its DOM,
//! TUI, or test fixtures; the engine never learns which.

use crate::candidate::{Candidate, DatasetKind};
use crate::ranker::MatchResult;

// ─── Target fields ───────────────────────────────────────────────────────────

/// A free-text field (HPI, physical exam, …) with caret access.
/// Offsets are char offsets, consistent with the tokenizer.
pub trait TextTarget {
    fn text(&self) -> String;
    fn cursor(&self) -> usize;
    fn set_text(&mut self, text: &str, cursor: usize);
}

/// The text input of one diagnosis row, plus its key-binding slot.
pub trait DiagnosisTarget {
    fn text(&self) -> String;
    fn set_text(&mut self, value: &str);
    /// Attach the normalized ICD-10 code and record id to the row for
    /// downstream cross-referencing.
    fn bind(&mut self, icd10: &str, id: &str);
}

/// Values written into one medication row on commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedRowFill {
    pub drug: String,
    pub dose: String,
    pub route: String,
    pub freq: String,
    pub duration: String,
    pub instruction: String,
}

/// What the redundancy check sees of a sibling medication row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowBinding {
    /// Drug text as typed, fallback identity when nothing was ever bound.
    pub drug_text: String,
    /// Normalized drug name attached at the row's last commit, if any.
    pub name: String,
    /// Normalized drug class attached at the row's last commit, if any.
    pub drug_class: String,
}

/// One medication row inside the medication table.
pub trait MedicationTarget {
    /// Current value of the drug-name column (the queried column).
    fn drug_text(&self) -> String;
    fn fill(&mut self, fill: &MedRowFill);
    /// Attach the normalized drug name and class to the row.
    fn bind(&mut self, name: &str, drug_class: &str);
    /// Bindings of every *other* row in the same table.
    fn sibling_bindings(&self) -> Vec<RowBinding>;
}

/// The focused input a session operates on, borrowed per event call.
pub enum TargetMut<'a> {
    Snippet(&'a mut dyn TextTarget),
    Diagnosis(&'a mut dyn DiagnosisTarget),
    Medication(&'a mut dyn MedicationTarget),
}

impl TargetMut<'_> {
    pub fn kind(&self) -> DatasetKind {
        match self {
            TargetMut::Snippet(_) => DatasetKind::Snippet,
            TargetMut::Diagnosis(_) => DatasetKind::Diagnosis,
            TargetMut::Medication(_) => DatasetKind::Medication,
        }
    }
}

// ─── Rendering ───────────────────────────────────────────────────────────────

/// Renders the ranked list near an input. The engine always hands over the
/// complete list (clear-and-rebuild); positioning and styling are the
/// host's concern.
pub trait RenderPort {
    fn show(&mut self, input: &str, items: &[MatchResult], active_index: usize);
    fn hide(&mut self, input: &str);
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Side effects the surrounding application reacts to (preview refresh,
/// draft save, warning badges).
pub trait EventSink {
    /// A candidate was committed into its target.
    fn committed(&mut self, kind: DatasetKind, candidate: &Candidate);
    /// Advisory medication redundancy messages for the committed row.
    /// Never blocks the commit.
    fn redundancy_warning(&mut self, input: &str, messages: &[String]);
}

// ─── Scheduling ──────────────────────────────────────────────────────────────

/// Opaque handle for a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

/// What the controller wants to happen when the task fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Debounced re-query after a quiet period.
    Requery,
    /// Close the session after the blur grace delay.
    BlurClose,
}

/// Cancellable one-shot timers. The host owns the clock (browser timers,
/// async tasks, a test harness stepping manually) and calls
/// [`SessionController::task_fired`](crate::session::SessionController::task_fired)
/// when a scheduled task elapses. Cancelled tasks must never fire.
pub trait Scheduler {
    fn schedule(&mut self, delay_ms: u64, task: TaskKind) -> TaskId;
    fn cancel(&mut self, id: TaskId);
}
