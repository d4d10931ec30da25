use std::collections::{BTreeMap, VecDeque};

use crate::view_model::{AppViewModel, FormField, OutcomeView, SlotView};
use crate::{
    DraftField, FieldError, JobDescriptor, JobDraft, JobEvent, JobId, Outcome, RunState, Screen,
    Settings, SettingsError, Severity, Slot,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Sequence number of the event that carried the line.
    pub seq: u64,
    pub severity: Severity,
    pub text: String,
}

/// Bounded log history. Oldest lines fall off the front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogBuffer {
    lines: VecDeque<LogLine>,
    capacity: usize,
    dropped: u64,
}

impl LogBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub(crate) fn push(&mut self, line: LogLine) {
        self.lines.push_back(line);
        self.trim();
    }

    pub(crate) fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.trim();
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
        self.dropped = 0;
    }

    pub(crate) fn tail(&self, count: usize) -> Vec<LogLine> {
        let skip = self.lines.len().saturating_sub(count);
        self.lines.iter().skip(skip).cloned().collect()
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }

    fn trim(&mut self) {
        while self.lines.len() > self.capacity {
            self.lines.pop_front();
            self.dropped += 1;
        }
    }
}

/// Why a submission was turned away without validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    SlotBusy { job_id: JobId },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SlotState {
    pub(crate) run_state: RunState,
    pub(crate) draft: JobDraft,
    pub(crate) active_job: Option<JobId>,
    pub(crate) last_job: Option<JobId>,
    pub(crate) descriptor: Option<JobDescriptor>,
    pub(crate) last_seq: Option<u64>,
    pub(crate) progress: Option<u8>,
    pub(crate) step: Option<String>,
    pub(crate) log: LogBuffer,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) validation_errors: Vec<FieldError>,
    pub(crate) rejection: Option<SubmitRejection>,
    pub(crate) cancel_requested: bool,
}

impl SlotState {
    fn new(settings: &Settings) -> Self {
        Self {
            run_state: RunState::Idle,
            draft: JobDraft::from_settings(settings),
            active_job: None,
            last_job: None,
            descriptor: None,
            last_seq: None,
            progress: None,
            step: None,
            log: LogBuffer::new(settings.console_max_lines),
            outcome: None,
            validation_errors: Vec::new(),
            rejection: None,
            cancel_requested: false,
        }
    }

    fn view(&self, slot: Slot, display_lines: usize) -> SlotView {
        SlotView {
            slot,
            run_state: self.run_state,
            job_id: self.active_job.or(self.last_job),
            progress: self.progress,
            step: self.step.clone(),
            log_tail: self.log.tail(display_lines),
            dropped_log_lines: self.log.dropped(),
            outcome: self.outcome.as_ref().map(OutcomeView::from),
            validation_errors: self.validation_errors.clone(),
            rejection: self.rejection,
            cancel_requested: self.cancel_requested,
            can_submit: !self.run_state.is_active(),
            can_cancel: self.run_state == RunState::Running && !self.cancel_requested,
            form: self.form(slot),
        }
    }

    fn form(&self, slot: Slot) -> Vec<FormField> {
        DraftField::ALL
            .into_iter()
            .filter(|field| field.applies_to(slot))
            .map(|field| FormField {
                field,
                value: self.draft.display_value(field),
                error: self
                    .draft
                    .pending_errors()
                    .find(|err| err.field() == field)
                    .map(ToString::to_string),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    screen: Screen,
    settings: Settings,
    settings_error: Option<SettingsError>,
    slots: BTreeMap<Slot, SlotState>,
    next_job_id: JobId,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_settings(Settings::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        let slots = Slot::ALL
            .into_iter()
            .map(|slot| (slot, SlotState::new(&settings)))
            .collect();
        Self {
            screen: Screen::default(),
            settings,
            settings_error: None,
            slots,
            next_job_id: 1,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        let display = self.settings.display_log_lines;
        AppViewModel {
            screen: self.screen,
            slots: self
                .slots
                .iter()
                .map(|(slot, state)| state.view(*slot, display))
                .collect(),
            settings: self.settings.clone(),
            settings_error: self.settings_error.as_ref().map(ToString::to_string),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn run_state(&self, slot: Slot) -> RunState {
        self.slot(slot).run_state
    }

    pub fn draft(&self, slot: Slot) -> &JobDraft {
        &self.slot(slot).draft
    }

    pub fn active_job(&self, slot: Slot) -> Option<JobId> {
        self.slot(slot).active_job
    }

    /// Descriptor of the current or most recent run in `slot`.
    pub fn descriptor(&self, slot: Slot) -> Option<&JobDescriptor> {
        self.slot(slot).descriptor.as_ref()
    }

    /// True when no slot has an active job.
    pub fn is_settled(&self) -> bool {
        self.slots.values().all(|s| !s.run_state.is_active())
    }

    fn slot(&self, slot: Slot) -> &SlotState {
        // Every slot is inserted in `with_settings` and never removed.
        &self.slots[&slot]
    }

    pub(crate) fn slot_mut(&mut self, slot: Slot) -> &mut SlotState {
        let settings = &self.settings;
        self.slots
            .entry(slot)
            .or_insert_with(|| SlotState::new(settings))
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn select_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.mark_dirty();
        }
    }

    pub(crate) fn allocate_job_id(&mut self) -> JobId {
        let id = self.next_job_id;
        self.next_job_id += 1;
        id
    }

    /// Resets the per-run view state and marks the slot Running.
    pub(crate) fn begin_run(&mut self, slot: Slot, job_id: JobId, descriptor: JobDescriptor) {
        let state = self.slot_mut(slot);
        state.run_state = RunState::Running;
        state.active_job = Some(job_id);
        state.last_job = Some(job_id);
        state.descriptor = Some(descriptor);
        state.last_seq = None;
        state.progress = None;
        state.step = None;
        state.log.clear();
        state.outcome = None;
        state.validation_errors.clear();
        state.rejection = None;
        state.cancel_requested = false;
        self.mark_dirty();
    }

    pub(crate) fn slot_for_job(&self, job_id: JobId) -> Option<Slot> {
        self.slots
            .iter()
            .find(|(_, state)| state.active_job == Some(job_id))
            .map(|(slot, _)| *slot)
    }

    /// Applies one in-order event to the slot running it.
    pub(crate) fn apply_event(&mut self, slot: Slot, seq: u64, event: JobEvent) {
        let state = self.slot_mut(slot);
        state.last_seq = Some(seq);
        match event {
            JobEvent::Progress { percent, step } => {
                if let Some(percent) = percent {
                    state.progress = Some(percent.min(100));
                }
                if step.is_some() {
                    state.step = step;
                }
            }
            JobEvent::Log { severity, text } => {
                state.log.push(LogLine {
                    seq,
                    severity,
                    text,
                });
            }
            JobEvent::Finished(outcome) => {
                state.run_state = match &outcome {
                    Outcome::Succeeded(_) => RunState::Succeeded,
                    Outcome::Failed { .. } => RunState::Failed,
                    Outcome::Cancelled => RunState::Cancelled,
                };
                if matches!(outcome, Outcome::Succeeded(_)) {
                    state.progress = Some(100);
                }
                state.outcome = Some(outcome);
                state.active_job = None;
                state.cancel_requested = false;
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub(crate) fn set_settings_error(&mut self, error: Option<SettingsError>) {
        self.settings_error = error;
        self.mark_dirty();
    }

    /// Replaces the settings wholesale. Idle slots get fresh forms built
    /// from the new defaults.
    pub(crate) fn restore_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.settings_error = None;
        self.sync_log_capacity();
        let settings = &self.settings;
        for state in self.slots.values_mut() {
            if state.run_state == RunState::Idle {
                state.draft = JobDraft::from_settings(settings);
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn sync_log_capacity(&mut self) {
        let capacity = self.settings.console_max_lines;
        for state in self.slots.values_mut() {
            state.log.set_capacity(capacity);
        }
    }
}
