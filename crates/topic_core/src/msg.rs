#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User switched to another screen.
    ScreenSelected(crate::Screen),
    /// User edited one field of a slot's form.
    DraftEdited {
        slot: crate::Slot,
        field: crate::DraftField,
        value: String,
    },
    /// User picked an input file; the platform has already checked it on disk.
    InputSelected {
        slot: crate::Slot,
        input: crate::InputFile,
    },
    /// User picked a cleaning file (stopwords, dictionary); already checked on disk.
    FileSelected {
        slot: crate::Slot,
        field: crate::DraftField,
        file: crate::InputFile,
    },
    /// User asked to run the slot's current form.
    SubmitRequested(crate::Slot),
    /// User asked to stop the slot's running job.
    CancelRequested(crate::Slot),
    /// User changed a setting.
    SettingsEdited(crate::SettingsEdit),
    /// Settings loaded from disk at startup.
    RestoreSettings(crate::Settings),
    /// Event relayed from the runner for a job.
    JobEvent {
        job_id: crate::JobId,
        seq: u64,
        event: crate::JobEvent,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
