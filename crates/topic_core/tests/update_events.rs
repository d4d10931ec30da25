use std::path::PathBuf;

use pretty_assertions::assert_eq;
use topic_core::{
    update, AppState, Artifact, DraftField, Effect, FileStatus, InputFile, JobEvent, JobId, Msg,
    Outcome, OutcomeView, ResultHandle, RunState, Settings, Severity, Slot,
};

fn start(state: AppState, slot: Slot) -> (AppState, JobId) {
    let (state, _) = update(
        state,
        Msg::InputSelected {
            slot,
            input: InputFile::new("data/reviews.xlsx", FileStatus::Present),
        },
    );
    let (state, _) = update(
        state,
        Msg::DraftEdited {
            slot,
            field: DraftField::TextColumn,
            value: "review".to_string(),
        },
    );
    let (state, effects) = update(state, Msg::SubmitRequested(slot));
    let job_id = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::StartJob { job_id, .. } => Some(*job_id),
            _ => None,
        })
        .expect("start effect");
    (state, job_id)
}

fn deliver(state: AppState, job_id: JobId, events: Vec<JobEvent>, first_seq: u64) -> AppState {
    events
        .into_iter()
        .enumerate()
        .fold(state, |state, (offset, event)| {
            update(
                state,
                Msg::JobEvent {
                    job_id,
                    seq: first_seq + offset as u64,
                    event,
                },
            )
            .0
        })
}

fn log(text: &str) -> JobEvent {
    JobEvent::Log {
        severity: Severity::Info,
        text: text.to_string(),
    }
}

fn progress(percent: u8, step: &str) -> JobEvent {
    JobEvent::Progress {
        percent: Some(percent),
        step: Some(step.to_string()),
    }
}

#[test]
fn progress_then_success_shows_result() {
    let (state, job_id) = start(AppState::new(), Slot::Visualization);
    let handle = ResultHandle {
        output_dir: PathBuf::from("output/job-0001"),
        artifacts: vec![Artifact {
            name: "topics".to_string(),
            path: PathBuf::from("output/job-0001/topics.html"),
        }],
        summary: Some("12 topics".to_string()),
    };

    let mut seen = Vec::new();
    let mut state = state;
    for (seq, percent) in [0u8, 25, 50, 75, 100].into_iter().enumerate() {
        state = deliver(state, job_id, vec![progress(percent, "working")], seq as u64);
        seen.push(state.view().slot(Slot::Visualization).unwrap().progress);
    }
    let state = deliver(
        state,
        job_id,
        vec![JobEvent::Finished(Outcome::Succeeded(handle.clone()))],
        5,
    );

    assert_eq!(
        seen,
        vec![Some(0), Some(25), Some(50), Some(75), Some(100)]
    );
    assert_eq!(state.run_state(Slot::Visualization), RunState::Succeeded);
    let view = state.view();
    let slot = view.slot(Slot::Visualization).unwrap();
    assert_eq!(
        slot.outcome,
        Some(OutcomeView::Result {
            output_dir: handle.output_dir,
            artifacts: handle.artifacts,
            summary: handle.summary,
        })
    );
    assert!(slot.can_submit);
    assert!(!slot.can_cancel);
}

#[test]
fn log_lines_keep_emission_order() {
    let (state, job_id) = start(AppState::new(), Slot::Modeling);
    let state = deliver(
        state,
        job_id,
        vec![log("loading"), progress(10, "embedding"), log("reducing"), log("clustering")],
        0,
    );

    let view = state.view();
    let texts: Vec<_> = view
        .slot(Slot::Modeling)
        .unwrap()
        .log_tail
        .iter()
        .map(|line| (line.seq, line.text.as_str()))
        .collect();
    assert_eq!(texts, vec![(0, "loading"), (2, "reducing"), (3, "clustering")]);
}

#[test]
fn log_buffer_is_bounded_and_view_shows_tail() {
    let settings = Settings {
        console_max_lines: 4,
        display_log_lines: 2,
        ..Settings::default()
    };
    let (state, _) = update(AppState::new(), Msg::RestoreSettings(settings));
    let (state, job_id) = start(state, Slot::Preprocess);

    let lines = (0..6).map(|i| log(&format!("line {i}"))).collect();
    let state = deliver(state, job_id, lines, 0);

    let view = state.view();
    let slot = view.slot(Slot::Preprocess).unwrap();
    let texts: Vec<_> = slot.log_tail.iter().map(|l| l.text.clone()).collect();
    assert_eq!(texts, vec!["line 4".to_string(), "line 5".to_string()]);
    assert_eq!(slot.dropped_log_lines, 2);
}

#[test]
fn events_from_an_earlier_job_are_ignored() {
    let (state, first) = start(AppState::new(), Slot::Modeling);
    let state = deliver(
        state,
        first,
        vec![log("first"), JobEvent::Finished(Outcome::Cancelled)],
        0,
    );
    let (state, _) = update(state, Msg::SubmitRequested(Slot::Modeling));

    // A late line from the first job must not leak into the second run.
    let (mut state, effects) = update(
        state,
        Msg::JobEvent {
            job_id: first,
            seq: 2,
            event: log("late"),
        },
    );

    assert!(effects.is_empty());
    assert!(state.consume_dirty());
    let view = state.view();
    let slot = view.slot(Slot::Modeling).unwrap();
    assert_eq!(slot.run_state, RunState::Running);
    assert!(slot.log_tail.is_empty());
}

#[test]
fn stale_event_does_not_mark_state_dirty() {
    let (mut state, _job_id) = start(AppState::new(), Slot::Modeling);
    assert!(state.consume_dirty());

    let (mut state, _) = update(
        state,
        Msg::JobEvent {
            job_id: 99,
            seq: 0,
            event: log("nobody"),
        },
    );

    assert!(!state.consume_dirty());
}

#[test]
fn replayed_sequence_numbers_are_dropped() {
    let (state, job_id) = start(AppState::new(), Slot::Modeling);
    let state = deliver(state, job_id, vec![log("a"), log("b")], 0);
    let state = deliver(state, job_id, vec![log("b again")], 1);

    let view = state.view();
    let texts: Vec<_> = view
        .slot(Slot::Modeling)
        .unwrap()
        .log_tail
        .iter()
        .map(|l| l.text.clone())
        .collect();
    assert_eq!(texts, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn events_after_terminal_outcome_are_ignored() {
    let (state, job_id) = start(AppState::new(), Slot::Modeling);
    let state = deliver(
        state,
        job_id,
        vec![
            JobEvent::Finished(Outcome::Failed {
                description: "out of memory".to_string(),
            }),
            JobEvent::Finished(Outcome::Succeeded(ResultHandle::default())),
            log("after the end"),
        ],
        0,
    );

    assert_eq!(state.run_state(Slot::Modeling), RunState::Failed);
    let view = state.view();
    let slot = view.slot(Slot::Modeling).unwrap();
    assert_eq!(
        slot.outcome,
        Some(OutcomeView::Error {
            description: "out of memory".to_string()
        })
    );
    assert!(slot.log_tail.is_empty());
}

#[test]
fn progress_is_clamped_and_step_only_updates_keep_percent() {
    let (state, job_id) = start(AppState::new(), Slot::Modeling);
    let state = deliver(
        state,
        job_id,
        vec![
            progress(250, "too far"),
            JobEvent::Progress {
                percent: None,
                step: Some("Extracting keywords".to_string()),
            },
        ],
        0,
    );

    let view = state.view();
    let slot = view.slot(Slot::Modeling).unwrap();
    assert_eq!(slot.progress, Some(100));
    assert_eq!(slot.step.as_deref(), Some("Extracting keywords"));
}
