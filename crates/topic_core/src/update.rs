use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::state::SubmitRejection;
use crate::{AppState, Effect, JobEvent, JobId, Msg, RunState, SettingsEdit, Slot};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ScreenSelected(screen) => {
            // Navigation is never gated on run state.
            state.select_screen(screen);
            Vec::new()
        }
        Msg::DraftEdited { slot, field, value } => {
            let slot_state = state.slot_mut(slot);
            if let Err(err) = slot_state.draft.set_field(field, &value) {
                engine_debug!("Draft edit rejected for {}: {}", slot, err);
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::InputSelected { slot, input } => {
            state.slot_mut(slot).draft.set_input(input);
            state.mark_dirty();
            Vec::new()
        }
        Msg::FileSelected { slot, field, file } => {
            if let Err(err) = state.slot_mut(slot).draft.set_file(field, file) {
                engine_debug!("File selection rejected for {}: {}", slot, err);
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::SubmitRequested(slot) => submit(&mut state, slot),
        Msg::CancelRequested(slot) => {
            let slot_state = state.slot_mut(slot);
            match (slot_state.run_state, slot_state.active_job) {
                (RunState::Running, Some(job_id)) if !slot_state.cancel_requested => {
                    slot_state.cancel_requested = true;
                    state.mark_dirty();
                    engine_info!("Cancellation requested for {} job #{}", slot, job_id);
                    vec![Effect::CancelJob { job_id }]
                }
                _ => Vec::new(),
            }
        }
        Msg::SettingsEdited(edit) => apply_settings_edit(&mut state, edit),
        Msg::RestoreSettings(settings) => {
            state.restore_settings(settings);
            Vec::new()
        }
        Msg::JobEvent { job_id, seq, event } => {
            relay_event(&mut state, job_id, seq, event);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut AppState, slot: Slot) -> Vec<Effect> {
    let hardware = state.settings().hardware;
    let slot_state = state.slot_mut(slot);

    if slot_state.run_state.is_active() {
        if let Some(job_id) = slot_state.active_job {
            slot_state.rejection = Some(SubmitRejection::SlotBusy { job_id });
        }
        state.mark_dirty();
        engine_debug!("Submit ignored: {} slot is busy", slot);
        return Vec::new();
    }

    let previous = slot_state.run_state;
    slot_state.run_state = RunState::Validating;
    match slot_state.draft.validate(slot, hardware) {
        Ok(descriptor) => {
            let job_id = state.allocate_job_id();
            state.begin_run(slot, job_id, descriptor.clone());
            engine_info!("Submitted {} job #{}", slot, job_id);
            vec![Effect::StartJob { job_id, descriptor }]
        }
        Err(errors) => {
            slot_state.run_state = previous;
            slot_state.rejection = None;
            engine_info!("Submit for {} failed validation: {}", slot, errors);
            slot_state.validation_errors = errors.into_inner();
            state.mark_dirty();
            Vec::new()
        }
    }
}

fn relay_event(state: &mut AppState, job_id: JobId, seq: u64, event: JobEvent) {
    let Some(slot) = state.slot_for_job(job_id) else {
        engine_warn!(
            "Dropping event seq={} for job #{} with no active slot",
            seq,
            job_id
        );
        return;
    };

    let last_seq = state.slot_mut(slot).last_seq;
    if last_seq.is_some_and(|last| seq <= last) {
        engine_warn!(
            "Dropping out-of-order event seq={} for job #{} (last seq {:?})",
            seq,
            job_id,
            last_seq
        );
        return;
    }

    if event.is_terminal() {
        engine_info!("Job #{} in {} finished", job_id, slot);
    }
    state.apply_event(slot, seq, event);
}

fn apply_settings_edit(state: &mut AppState, edit: SettingsEdit) -> Vec<Effect> {
    match state.settings_mut().apply(edit) {
        Ok(()) => {
            state.sync_log_capacity();
            state.set_settings_error(None);
            vec![Effect::PersistSettings(state.settings().clone())]
        }
        Err(err) => {
            engine_warn!("Settings edit rejected: {}", err);
            state.set_settings_error(Some(err));
            Vec::new()
        }
    }
}
