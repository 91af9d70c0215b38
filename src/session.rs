//! Session controller — the typeahead interaction state machine.
//!
//! One controller owns the (at most one) live session of one focused input.
//! Input events re-tokenize and re-rank, keyboard and pointer commands move
//! the highlight or commit, and Escape / blur / outside pointer-down tear
//! the session down. The controller never touches a timer directly: debounce
//! and the blur grace period go through the host's [`Scheduler`], so pointer
//! commits are ordered before blur-driven closes by explicit transitions
//! instead of timing luck.
//!
//! States: `Idle → Suggesting → (Navigating)* → {Committed | Closed}`.
//! `Idle` is `session == None`; navigation only moves `active_index` and
//! never re-ranks.

use crate::applicator;
use crate::candidate::{Candidate, DatasetKind};
use crate::config::EngineConfig;
use crate::ports::{EventSink, RenderPort, Scheduler, TargetMut, TaskId, TaskKind};
use crate::ranker::{self, FieldWeights, MatchResult};
use crate::store::CandidateStore;
use crate::tokenizer;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// How the query is read from (and the commit written into) the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Free text: query is the trailing token under the caret, commit
    /// replaces that token.
    InsertToken,
    /// Structured field: query is the whole field value, commit is a
    /// whole-row fill.
    ReplaceField,
}

impl QueryMode {
    pub fn for_kind(kind: DatasetKind) -> Self {
        match kind {
            DatasetKind::Snippet => QueryMode::InsertToken,
            DatasetKind::Diagnosis | DatasetKind::Medication => QueryMode::ReplaceField,
        }
    }
}

/// Keyboard commands the host forwards while a list may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    ArrowUp,
    ArrowDown,
    Tab,
    ShiftTab,
    Enter,
    Escape,
}

/// Whether the engine consumed a key (host should suppress its default
/// behavior) or ignored it (no session open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Consumed,
    Ignored,
}

/// Live interaction state for one focused input while suggestions are open.
#[derive(Debug, Clone)]
pub struct Session {
    pub input: String,
    pub mode: QueryMode,
    pub dataset: String,
    pub query: String,
    pub matches: Vec<MatchResult>,
    pub active_index: usize,
}

// ═══════════════════════════════════════════════════════════
// Controller
// ═══════════════════════════════════════════════════════════

/// State machine instance for one input. Create one per suggestible input
/// and route that input's events here; the shared document-level
/// pointer-down listener should call
/// [`handle_pointer_down_outside`](Self::handle_pointer_down_outside) only
/// on the controller that owns the event's input.
pub struct SessionController {
    input: String,
    dataset: String,
    kind: DatasetKind,
    config: EngineConfig,
    weights: FieldWeights,
    session: Option<Session>,
    pending_requery: Option<TaskId>,
    pending_blur: Option<TaskId>,
}

impl SessionController {
    pub fn new(
        input: impl Into<String>,
        dataset: impl Into<String>,
        kind: DatasetKind,
        config: EngineConfig,
    ) -> Self {
        Self {
            input: input.into(),
            dataset: dataset.into(),
            kind,
            config,
            weights: FieldWeights::default(),
            session: None,
            pending_requery: None,
            pending_blur: None,
        }
    }

    /// Override the default scoring weights.
    pub fn with_weights(mut self, weights: FieldWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    // ─── Input events ────────────────────────────────────────────────────

    /// An input (keystroke, paste, …) changed the target's value.
    ///
    /// Re-tokenizes and either re-ranks synchronously or, for debounced
    /// snippet fields, restarts the quiet-period timer. A query below the
    /// minimum length closes any visible list.
    pub fn handle_input(
        &mut self,
        store: &CandidateStore,
        target: &mut TargetMut<'_>,
        render: &mut dyn RenderPort,
        sched: &mut dyn Scheduler,
    ) {
        // typing means the input has focus again
        if let Some(id) = self.pending_blur.take() {
            sched.cancel(id);
        }
        // restart the debounce window; no two ranker runs may overlap
        if let Some(id) = self.pending_requery.take() {
            sched.cancel(id);
        }

        let Some(query) = self.current_query(target) else {
            return;
        };

        if query.chars().count() < self.config.min_query_len_for(self.kind) {
            self.close_list(render);
            return;
        }

        if self.kind == DatasetKind::Snippet && self.config.snippet_debounce_ms > 0 {
            self.pending_requery =
                Some(sched.schedule(self.config.snippet_debounce_ms, TaskKind::Requery));
            return;
        }

        self.run_query(&query, store, render);
    }

    /// A scheduled task elapsed. The host must not deliver cancelled tasks.
    pub fn task_fired(
        &mut self,
        id: TaskId,
        store: &CandidateStore,
        target: &mut TargetMut<'_>,
        render: &mut dyn RenderPort,
        sched: &mut dyn Scheduler,
    ) {
        if self.pending_blur == Some(id) {
            self.pending_blur = None;
            self.close(render, sched);
            return;
        }
        if self.pending_requery == Some(id) {
            self.pending_requery = None;
            let Some(query) = self.current_query(target) else {
                return;
            };
            if query.chars().count() < self.config.min_query_len_for(self.kind) {
                self.close_list(render);
            } else {
                self.run_query(&query, store, render);
            }
        }
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Route a keyboard command. Keys are ignored while no session is open
    /// so the host lets them through to the input.
    pub fn handle_key(
        &mut self,
        key: KeyCommand,
        target: &mut TargetMut<'_>,
        render: &mut dyn RenderPort,
        events: &mut dyn EventSink,
        sched: &mut dyn Scheduler,
    ) -> KeyOutcome {
        if self.session.is_none() {
            return KeyOutcome::Ignored;
        }

        match key {
            KeyCommand::Escape => {
                self.close(render, sched);
                KeyOutcome::Consumed
            }
            KeyCommand::Enter => {
                let Some(active) = self.session.as_ref().map(|s| s.active_index) else {
                    return KeyOutcome::Ignored;
                };
                self.commit(active, target, render, events, sched);
                KeyOutcome::Consumed
            }
            KeyCommand::ArrowUp | KeyCommand::ArrowDown | KeyCommand::Tab | KeyCommand::ShiftTab => {
                let Some(session) = self.session.as_mut() else {
                    return KeyOutcome::Ignored;
                };
                let len = session.matches.len();
                session.active_index = match key {
                    // arrows clamp at the list bounds
                    KeyCommand::ArrowDown => (session.active_index + 1).min(len - 1),
                    KeyCommand::ArrowUp => session.active_index.saturating_sub(1),
                    // tab cycles with wraparound
                    KeyCommand::Tab => (session.active_index + 1) % len,
                    KeyCommand::ShiftTab => (session.active_index + len - 1) % len,
                    _ => session.active_index,
                };
                render.show(&self.input, &session.matches, session.active_index);
                KeyOutcome::Consumed
            }
        }
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    /// Pointer-down on a rendered item. Bound to pointer-down (never click)
    /// so the commit runs before the source input's blur can close the
    /// session.
    pub fn handle_item_pointer_down(
        &mut self,
        index: usize,
        target: &mut TargetMut<'_>,
        render: &mut dyn RenderPort,
        events: &mut dyn EventSink,
        sched: &mut dyn Scheduler,
    ) {
        if self.session.is_some() {
            self.commit(index, target, render, events, sched);
        }
    }

    /// Pointer-down outside both the input and the rendered list.
    pub fn handle_pointer_down_outside(
        &mut self,
        render: &mut dyn RenderPort,
        sched: &mut dyn Scheduler,
    ) {
        self.close(render, sched);
    }

    /// The input lost focus. The session closes only after a short grace
    /// delay, so a pointer-driven commit already in flight lands first.
    pub fn handle_blur(&mut self, sched: &mut dyn Scheduler) {
        if self.session.is_some() && self.pending_blur.is_none() {
            self.pending_blur = Some(sched.schedule(self.config.blur_grace_ms, TaskKind::BlurClose));
        }
    }

    // ─── Internals ───────────────────────────────────────────────────────

    /// Current query per mode: trailing token for free text, whole value
    /// for structured fields. `None` on a kind/target mismatch.
    fn current_query(&self, target: &TargetMut<'_>) -> Option<String> {
        let raw = match (self.kind, target) {
            (DatasetKind::Snippet, TargetMut::Snippet(t)) => {
                tokenizer::extract_token(&t.text(), t.cursor())
            }
            (DatasetKind::Diagnosis, TargetMut::Diagnosis(t)) => t.text(),
            (DatasetKind::Medication, TargetMut::Medication(t)) => t.drug_text(),
            _ => {
                tracing::warn!(
                    input = %self.input,
                    kind = ?self.kind,
                    "target does not match controller kind; event dropped"
                );
                return None;
            }
        };
        Some(raw.trim().to_string())
    }

    /// Prefilter + rank, then open (or replace) the session. Starting a new
    /// query discards the prior session's matches without side effects.
    fn run_query(&mut self, query: &str, store: &CandidateStore, render: &mut dyn RenderPort) {
        let normalized = ranker::normalize(query);
        let pool = store.prefilter(&self.dataset, |c| c.matches_substring(&normalized));
        let matches = ranker::rank(query, &pool, &self.weights, self.config.max_results);

        if matches.is_empty() {
            // no match is not an error, just an empty/closed list
            self.close_list(render);
            return;
        }

        tracing::debug!(
            input = %self.input,
            query,
            matches = matches.len(),
            "suggesting"
        );
        self.session = Some(Session {
            input: self.input.clone(),
            mode: QueryMode::for_kind(self.kind),
            dataset: self.dataset.clone(),
            query: query.to_string(),
            matches,
            active_index: 0,
        });
        if let Some(session) = self.session.as_ref() {
            render.show(&self.input, &session.matches, session.active_index);
        }
    }

    /// Apply the match at `index` to the target, emit events, close.
    fn commit(
        &mut self,
        index: usize,
        target: &mut TargetMut<'_>,
        render: &mut dyn RenderPort,
        events: &mut dyn EventSink,
        sched: &mut dyn Scheduler,
    ) {
        self.cancel_pending(sched);
        let Some(session) = self.session.take() else {
            return;
        };
        let Some(result) = session.matches.get(index) else {
            render.hide(&self.input);
            return;
        };

        let warnings = match (&result.candidate, &mut *target) {
            (Candidate::Snippet(c), TargetMut::Snippet(t)) => {
                applicator::apply_snippet(c, &mut **t);
                Vec::new()
            }
            (Candidate::Diagnosis(c), TargetMut::Diagnosis(t)) => {
                applicator::apply_diagnosis(c, &mut **t);
                Vec::new()
            }
            (Candidate::Medication(c), TargetMut::Medication(t)) => {
                applicator::apply_medication(c, &mut **t)
            }
            _ => {
                tracing::warn!(
                    input = %self.input,
                    "candidate kind does not match target; commit dropped"
                );
                render.hide(&self.input);
                return;
            }
        };

        tracing::debug!(
            input = %self.input,
            candidate = result.candidate.primary_id(),
            "committed"
        );
        events.committed(self.kind, &result.candidate);
        if !warnings.is_empty() {
            events.redundancy_warning(&self.input, &warnings);
        }
        render.hide(&self.input);
    }

    /// Tear the session down. Never mutates the target field.
    fn close(&mut self, render: &mut dyn RenderPort, sched: &mut dyn Scheduler) {
        self.cancel_pending(sched);
        self.close_list(render);
    }

    fn close_list(&mut self, render: &mut dyn RenderPort) {
        if self.session.take().is_some() {
            tracing::debug!(input = %self.input, "session closed");
        }
        render.hide(&self.input);
    }

    fn cancel_pending(&mut self, sched: &mut dyn Scheduler) {
        if let Some(id) = self.pending_requery.take() {
            sched.cancel(id);
        }
        if let Some(id) = self.pending_blur.take() {
            sched.cancel(id);
        }
    }
}
