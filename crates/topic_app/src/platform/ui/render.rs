//! Incremental console rendering.
//!
//! The renderer remembers what it last printed for each slot and turns a
//! fresh view model into only the lines that are new since then.

use std::collections::BTreeMap;

use topic_core::{AppViewModel, FieldError, JobId, RunState, Screen, Slot, SlotView, SubmitRejection};

use super::layout;

#[derive(Debug, Default, Clone)]
struct Printed {
    job_id: Option<JobId>,
    run_state: RunState,
    progress: Option<u8>,
    step: Option<String>,
    last_log_seq: Option<u64>,
    validation_errors: Vec<FieldError>,
    rejection: Option<SubmitRejection>,
    cancel_requested: bool,
}

#[derive(Debug, Default)]
pub struct Renderer {
    screen: Option<Screen>,
    settings_error: Option<String>,
    slots: BTreeMap<Slot, Printed>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `view` as fully shown, e.g. after printing a full frame.
    pub fn mark_shown(&mut self, view: &AppViewModel) {
        let _ = self.render(view);
    }

    pub fn render(&mut self, view: &AppViewModel) -> Vec<String> {
        let mut out = Vec::new();

        if self.screen != Some(view.screen) {
            self.screen = Some(view.screen);
            out.push(layout::tab_bar(view.screen));
        }
        if self.settings_error != view.settings_error {
            if let Some(error) = &view.settings_error {
                out.push(format!("[settings] rejected: {error}"));
            }
            self.settings_error = view.settings_error.clone();
        }
        for slot in &view.slots {
            let printed = self.slots.entry(slot.slot).or_default();
            render_slot(printed, slot, &mut out);
        }
        out
    }
}

fn render_slot(printed: &mut Printed, slot: &SlotView, out: &mut Vec<String>) {
    let tag = format!("[{}]", slot.slot);
    let new_job = slot.job_id != printed.job_id;
    if new_job {
        printed.progress = None;
        printed.step = None;
        printed.last_log_seq = None;
        printed.cancel_requested = false;
    }

    if slot.rejection != printed.rejection {
        if let Some(SubmitRejection::SlotBusy { job_id }) = slot.rejection {
            out.push(format!("{tag} busy: job #{job_id} is still running"));
        }
    }
    if slot.validation_errors != printed.validation_errors && !slot.validation_errors.is_empty() {
        out.push(format!("{tag} cannot submit:"));
        out.extend(slot.validation_errors.iter().map(|err| format!("{tag}   - {err}")));
    }

    let state_changed = new_job || slot.run_state != printed.run_state;
    if state_changed && slot.run_state == RunState::Running {
        if let Some(job_id) = slot.job_id {
            out.push(format!("{tag} job #{job_id} started"));
        }
    }

    if slot.run_state == RunState::Running
        && (slot.progress != printed.progress || slot.step != printed.step)
    {
        let mut line = tag.clone();
        if let Some(percent) = slot.progress {
            line.push(' ');
            line.push_str(&layout::progress_bar(percent));
        }
        if let Some(step) = &slot.step {
            line.push(' ');
            line.push_str(step);
        }
        out.push(line);
    }

    for line in &slot.log_tail {
        if printed.last_log_seq.map_or(true, |seen| line.seq > seen) {
            out.push(format!("{tag} {:<5} {}", line.severity.label(), line.text));
            printed.last_log_seq = Some(line.seq);
        }
    }

    if slot.cancel_requested && !printed.cancel_requested {
        if let Some(job_id) = slot.job_id {
            out.push(format!("{tag} cancelling job #{job_id}"));
        }
    }

    if state_changed && slot.run_state.is_terminal() {
        out.extend(layout::outcome_lines(slot));
    }

    printed.job_id = slot.job_id;
    printed.run_state = slot.run_state;
    printed.progress = slot.progress;
    printed.step = slot.step.clone();
    printed.validation_errors = slot.validation_errors.clone();
    printed.rejection = slot.rejection;
    printed.cancel_requested = slot.cancel_requested;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use topic_core::{
        update, AppState, DraftField, Effect, FileStatus, InputFile, JobEvent, Msg, Outcome,
        ResultHandle, Severity,
    };

    fn apply(state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
        update(state, msg)
    }

    fn started(slot: Slot) -> (AppState, JobId) {
        let (state, _) = apply(
            AppState::new(),
            Msg::InputSelected {
                slot,
                input: InputFile::new("comments.csv", FileStatus::Present),
            },
        );
        let (state, _) = apply(
            state,
            Msg::DraftEdited {
                slot,
                field: DraftField::TextColumn,
                value: "content".to_string(),
            },
        );
        let (state, effects) = apply(state, Msg::SubmitRequested(slot));
        let job_id = match effects.as_slice() {
            [Effect::StartJob { job_id, .. }] => *job_id,
            other => panic!("expected one StartJob, got {other:?}"),
        };
        (state, job_id)
    }

    fn event(state: AppState, job_id: JobId, seq: u64, event: JobEvent) -> AppState {
        apply(state, Msg::JobEvent { job_id, seq, event }).0
    }

    fn log(text: &str) -> JobEvent {
        JobEvent::Log {
            severity: Severity::Info,
            text: text.to_string(),
        }
    }

    #[test]
    fn first_render_shows_the_tab_bar_only() {
        let mut renderer = Renderer::new();
        let view = AppState::new().view();

        assert_eq!(renderer.render(&view), vec![layout::tab_bar(Screen::Preprocess)]);
        assert_eq!(renderer.render(&view), Vec::<String>::new());
    }

    #[test]
    fn job_lifecycle_prints_each_change_once() {
        let mut renderer = Renderer::new();
        let (state, job_id) = started(Slot::Preprocess);
        renderer.render(&state.view());

        let state = event(
            state,
            job_id,
            0,
            JobEvent::Progress {
                percent: Some(40),
                step: Some("Cleaning".to_string()),
            },
        );
        let state = event(state, job_id, 1, log("read 120 rows"));
        let lines = renderer.render(&state.view());
        assert_eq!(
            lines,
            vec![
                format!("[preprocess] {} Cleaning", layout::progress_bar(40)),
                "[preprocess] INFO  read 120 rows".to_string(),
            ]
        );
        assert!(renderer.render(&state.view()).is_empty());

        let state = event(state, job_id, 2, log("wrote cleaned.csv"));
        let state = event(
            state,
            job_id,
            3,
            JobEvent::Finished(Outcome::Succeeded(ResultHandle {
                output_dir: "output/job-0001".into(),
                ..ResultHandle::default()
            })),
        );
        let lines = renderer.render(&state.view());
        assert_eq!(
            lines,
            vec![
                "[preprocess] INFO  wrote cleaned.csv".to_string(),
                format!("[preprocess] job #{job_id} succeeded, output in output/job-0001"),
            ]
        );
    }

    #[test]
    fn submission_start_and_rejection_are_reported() {
        let mut renderer = Renderer::new();
        renderer.mark_shown(&AppState::new().view());

        let (state, job_id) = started(Slot::Modeling);
        assert_eq!(
            renderer.render(&state.view()),
            vec![format!("[modeling] job #{job_id} started")]
        );

        let (state, effects) = apply(state, Msg::SubmitRequested(Slot::Modeling));
        assert!(effects.is_empty());
        assert_eq!(
            renderer.render(&state.view()),
            vec![format!("[modeling] busy: job #{job_id} is still running")]
        );
    }

    #[test]
    fn validation_errors_are_listed() {
        let mut renderer = Renderer::new();
        renderer.mark_shown(&AppState::new().view());

        let (state, effects) = apply(AppState::new(), Msg::SubmitRequested(Slot::Modeling));
        assert!(effects.is_empty());
        let lines = renderer.render(&state.view());

        assert_eq!(lines.first().map(String::as_str), Some("[modeling] cannot submit:"));
        assert!(lines.iter().any(|line| line.contains("input is required")));
    }

    #[test]
    fn cancellation_is_announced_then_resolved() {
        let mut renderer = Renderer::new();
        let (state, job_id) = started(Slot::Visualization);
        renderer.mark_shown(&state.view());

        let (state, _) = apply(state, Msg::CancelRequested(Slot::Visualization));
        assert_eq!(
            renderer.render(&state.view()),
            vec![format!("[visualization] cancelling job #{job_id}")]
        );

        let state = event(state, job_id, 0, JobEvent::Finished(Outcome::Cancelled));
        assert_eq!(
            renderer.render(&state.view()),
            vec![format!("[visualization] job #{job_id} cancelled")]
        );
    }
}
