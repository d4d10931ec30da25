use std::path::PathBuf;

use crate::state::{LogLine, SubmitRejection};
use crate::{Artifact, DraftField, FieldError, JobId, Outcome, RunState, Screen, Settings, Slot};

#[derive(Debug, Clone, PartialEq)]
pub struct AppViewModel {
    pub screen: Screen,
    pub slots: Vec<SlotView>,
    pub settings: Settings,
    pub settings_error: Option<String>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn slot(&self, slot: Slot) -> Option<&SlotView> {
        self.slots.iter().find(|view| view.slot == slot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub slot: Slot,
    pub run_state: RunState,
    /// Current job, or the last one if the slot is no longer running.
    pub job_id: Option<JobId>,
    pub progress: Option<u8>,
    pub step: Option<String>,
    pub log_tail: Vec<LogLine>,
    pub dropped_log_lines: u64,
    pub outcome: Option<OutcomeView>,
    pub validation_errors: Vec<FieldError>,
    pub rejection: Option<SubmitRejection>,
    pub cancel_requested: bool,
    pub can_submit: bool,
    pub can_cancel: bool,
    /// The editable form, one entry per field that applies to the slot.
    pub form: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub field: DraftField,
    pub value: String,
    /// Set when the last edit of this field could not be parsed.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeView {
    Result {
        output_dir: PathBuf,
        artifacts: Vec<Artifact>,
        summary: Option<String>,
    },
    Error {
        description: String,
    },
    Cancelled,
}

impl From<&Outcome> for OutcomeView {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Succeeded(handle) => OutcomeView::Result {
                output_dir: handle.output_dir.clone(),
                artifacts: handle.artifacts.clone(),
                summary: handle.summary.clone(),
            },
            Outcome::Failed { description } => OutcomeView::Error {
                description: description.clone(),
            },
            Outcome::Cancelled => OutcomeView::Cancelled,
        }
    }
}
