use std::sync::Once;

use pretty_assertions::assert_eq;
use topic_core::{
    update, AppState, DraftField, Effect, FieldError, FileStatus, InputFile, JobEvent, JobId,
    Msg, Outcome, ResultHandle, RunState, Screen, Slot, SubmitRejection,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn edit(state: AppState, slot: Slot, field: DraftField, value: &str) -> AppState {
    let (state, _) = update(
        state,
        Msg::DraftEdited {
            slot,
            field,
            value: value.to_string(),
        },
    );
    state
}

fn ready(state: AppState, slot: Slot) -> AppState {
    let (state, _) = update(
        state,
        Msg::InputSelected {
            slot,
            input: InputFile::new("data/comments.csv", FileStatus::Present),
        },
    );
    edit(state, slot, DraftField::TextColumn, "content")
}

fn started_job(effects: &[Effect]) -> Option<JobId> {
    effects.iter().find_map(|effect| match effect {
        Effect::StartJob { job_id, .. } => Some(*job_id),
        _ => None,
    })
}

fn finish(state: AppState, job_id: JobId, seq: u64, outcome: Outcome) -> AppState {
    let (state, _) = update(
        state,
        Msg::JobEvent {
            job_id,
            seq,
            event: JobEvent::Finished(outcome),
        },
    );
    state
}

#[test]
fn missing_text_column_is_rejected_and_slot_stays_idle() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::InputSelected {
            slot: Slot::Modeling,
            input: InputFile::new("data/comments.csv", FileStatus::Present),
        },
    );

    let (mut state, effects) = update(state, Msg::SubmitRequested(Slot::Modeling));

    assert!(effects.is_empty());
    assert_eq!(state.run_state(Slot::Modeling), RunState::Idle);
    assert!(state.consume_dirty());
    let view = state.view();
    let slot = view.slot(Slot::Modeling).unwrap();
    assert_eq!(
        slot.validation_errors,
        vec![FieldError::Missing {
            field: DraftField::TextColumn
        }]
    );
    assert_eq!(slot.job_id, None);
}

#[test]
fn valid_submit_starts_exactly_one_job() {
    init_logging();
    let state = ready(AppState::new(), Slot::Modeling);

    let (state, effects) = update(state, Msg::SubmitRequested(Slot::Modeling));

    assert_eq!(effects.len(), 1);
    match &effects[0] {
        Effect::StartJob { job_id, descriptor } => {
            assert_eq!(*job_id, 1);
            assert_eq!(descriptor.slot(), Slot::Modeling);
            assert_eq!(descriptor.columns().text, "content");
            assert!(descriptor.params().is_some());
        }
        other => panic!("unexpected effect {other:?}"),
    }
    assert_eq!(state.run_state(Slot::Modeling), RunState::Running);
    assert_eq!(state.active_job(Slot::Modeling), Some(1));
}

#[test]
fn second_submit_while_running_is_rejected() {
    init_logging();
    let state = ready(AppState::new(), Slot::Modeling);
    let (state, _) = update(state, Msg::SubmitRequested(Slot::Modeling));

    let (state, effects) = update(state, Msg::SubmitRequested(Slot::Modeling));

    assert!(effects.is_empty());
    assert_eq!(state.run_state(Slot::Modeling), RunState::Running);
    assert_eq!(state.active_job(Slot::Modeling), Some(1));
    let view = state.view();
    assert_eq!(
        view.slot(Slot::Modeling).unwrap().rejection,
        Some(SubmitRejection::SlotBusy { job_id: 1 })
    );
}

#[test]
fn slots_run_independently() {
    init_logging();
    let state = ready(AppState::new(), Slot::Modeling);
    let state = ready(state, Slot::Preprocess);
    let (state, first) = update(state, Msg::SubmitRequested(Slot::Modeling));
    let (state, second) = update(state, Msg::SubmitRequested(Slot::Preprocess));

    assert_eq!(started_job(&first), Some(1));
    assert_eq!(started_job(&second), Some(2));
    assert_eq!(state.run_state(Slot::Modeling), RunState::Running);
    assert_eq!(state.run_state(Slot::Preprocess), RunState::Running);
    assert_eq!(state.run_state(Slot::Visualization), RunState::Idle);
    assert!(!state.is_settled());
}

#[test]
fn resubmitting_after_completion_starts_a_fresh_run() {
    init_logging();
    let state = ready(AppState::new(), Slot::Modeling);
    let (state, effects) = update(state, Msg::SubmitRequested(Slot::Modeling));
    let first = started_job(&effects).unwrap();
    let (state, _) = update(
        state,
        Msg::JobEvent {
            job_id: first,
            seq: 0,
            event: JobEvent::Log {
                severity: topic_core::Severity::Info,
                text: "first run".to_string(),
            },
        },
    );
    let state = finish(state, first, 1, Outcome::Succeeded(ResultHandle::default()));
    assert_eq!(state.run_state(Slot::Modeling), RunState::Succeeded);

    let (state, effects) = update(state, Msg::SubmitRequested(Slot::Modeling));
    let second = started_job(&effects).unwrap();

    assert_ne!(first, second);
    assert_eq!(state.run_state(Slot::Modeling), RunState::Running);
    let view = state.view();
    let slot = view.slot(Slot::Modeling).unwrap();
    assert!(slot.log_tail.is_empty());
    assert_eq!(slot.outcome, None);
    assert_eq!(slot.progress, None);
}

#[test]
fn failed_slot_accepts_a_new_submission() {
    init_logging();
    let state = ready(AppState::new(), Slot::Preprocess);
    let (state, effects) = update(state, Msg::SubmitRequested(Slot::Preprocess));
    let job_id = started_job(&effects).unwrap();
    let state = finish(
        state,
        job_id,
        0,
        Outcome::Failed {
            description: "worker exited with status 1".to_string(),
        },
    );
    assert_eq!(state.run_state(Slot::Preprocess), RunState::Failed);

    let (state, effects) = update(state, Msg::SubmitRequested(Slot::Preprocess));

    assert!(started_job(&effects).is_some());
    assert_eq!(state.run_state(Slot::Preprocess), RunState::Running);
}

#[test]
fn validation_failure_after_a_run_keeps_previous_state() {
    init_logging();
    let state = ready(AppState::new(), Slot::Modeling);
    let (state, effects) = update(state, Msg::SubmitRequested(Slot::Modeling));
    let job_id = started_job(&effects).unwrap();
    let state = finish(state, job_id, 0, Outcome::Cancelled);
    let state = edit(state, Slot::Modeling, DraftField::UmapNeighbors, "1");

    let (state, effects) = update(state, Msg::SubmitRequested(Slot::Modeling));

    assert!(effects.is_empty());
    assert_eq!(state.run_state(Slot::Modeling), RunState::Cancelled);
    let view = state.view();
    let errors = &view.slot(Slot::Modeling).unwrap().validation_errors;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field(), DraftField::UmapNeighbors);
}

#[test]
fn editing_the_form_does_not_touch_the_running_descriptor() {
    init_logging();
    let state = ready(AppState::new(), Slot::Modeling);
    let (state, effects) = update(state, Msg::SubmitRequested(Slot::Modeling));
    let submitted = match &effects[0] {
        Effect::StartJob { descriptor, .. } => descriptor.clone(),
        other => panic!("unexpected effect {other:?}"),
    };

    let state = edit(state, Slot::Modeling, DraftField::TextColumn, "title");
    let state = edit(state, Slot::Modeling, DraftField::TopNWords, "20");

    assert_eq!(state.descriptor(Slot::Modeling), Some(&submitted));
    assert_eq!(state.draft(Slot::Modeling).text_column, "title");
    assert_eq!(state.draft(Slot::Modeling).params.top_n_words, 20);
}

#[test]
fn switching_screens_while_running_is_immediate() {
    init_logging();
    let state = ready(AppState::new(), Slot::Modeling);
    let (state, effects) = update(state, Msg::SubmitRequested(Slot::Modeling));
    let job_id = started_job(&effects).unwrap();

    let (state, effects) = update(state, Msg::ScreenSelected(Screen::Settings));
    assert!(effects.is_empty());
    assert_eq!(state.screen(), Screen::Settings);
    assert_eq!(state.run_state(Slot::Modeling), RunState::Running);

    let (state, _) = update(
        state,
        Msg::JobEvent {
            job_id,
            seq: 0,
            event: JobEvent::Progress {
                percent: Some(30),
                step: Some("Embedding documents".to_string()),
            },
        },
    );
    let view = state.view();
    assert_eq!(view.screen, Screen::Settings);
    assert_eq!(view.slot(Slot::Modeling).unwrap().progress, Some(30));
}

#[test]
fn cancel_emits_effect_once_and_waits_for_acknowledgement() {
    init_logging();
    let state = ready(AppState::new(), Slot::Modeling);
    let (state, effects) = update(state, Msg::SubmitRequested(Slot::Modeling));
    let job_id = started_job(&effects).unwrap();

    let (state, effects) = update(state, Msg::CancelRequested(Slot::Modeling));
    assert_eq!(effects, vec![Effect::CancelJob { job_id }]);
    assert_eq!(state.run_state(Slot::Modeling), RunState::Running);

    let (state, effects) = update(state, Msg::CancelRequested(Slot::Modeling));
    assert!(effects.is_empty());

    let state = finish(state, job_id, 0, Outcome::Cancelled);
    assert_eq!(state.run_state(Slot::Modeling), RunState::Cancelled);
    assert_eq!(state.active_job(Slot::Modeling), None);
}

#[test]
fn cancel_on_idle_slot_is_ignored() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::CancelRequested(Slot::Visualization));

    assert!(effects.is_empty());
    assert_eq!(state.run_state(Slot::Visualization), RunState::Idle);
}
