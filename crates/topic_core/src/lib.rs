//! Topic workbench core: pure job-slot state machine and view-model helpers.
mod descriptor;
mod effect;
mod event;
mod job;
mod msg;
mod params;
mod settings;
mod state;
mod update;
mod view_model;

pub use descriptor::{
    has_supported_extension, ColumnRoles, DraftField, FieldError, FileStatus, InputFile,
    JobDescriptor, JobDraft, ValidationErrors, SUPPORTED_INPUT_EXTENSIONS,
};
pub use effect::Effect;
pub use event::{Artifact, JobEvent, Outcome, ResultHandle, Severity};
pub use job::{JobId, RunState, Screen, Slot};
pub use msg::Msg;
pub use params::{
    ChartKind, CleaningOptions, DistanceMetric, HdbscanParams, ModelParams, UmapParams,
    DEFAULT_EMBEDDING_MODEL,
};
pub use settings::{
    Device, HardwarePreference, LlmProvider, LlmSettings, ProviderCredentials, Settings,
    SettingsEdit, SettingsError, WorkerSettings, DEFAULT_CONSOLE_MAX_LINES,
    DEFAULT_DISPLAY_LOG_LINES, TOKENIZER_PROCESS_CHOICES,
};
pub use state::{AppState, LogLine, SubmitRejection};
pub use update::update;
pub use view_model::{AppViewModel, FormField, OutcomeView, SlotView};
