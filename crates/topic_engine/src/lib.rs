//! Topic workbench engine: background job runner and its backends.
mod backend;
mod command;
mod context;
mod engine;
mod inspect;
mod manifest;
mod persist;
mod simulate;
mod types;

pub use backend::ComputeBackend;
pub use command::{
    CommandBackend, CommandSettings, ENV_JOB_ID, ENV_JOB_OUTPUT_DIR, ENV_JOB_TASK,
};
pub use context::{ChannelEventSink, EventSink, JobContext};
pub use engine::{EngineEvents, EngineHandle, EngineSettings};
pub use inspect::{inspect_path, InputStatus};
pub use manifest::{write_manifest, MANIFEST_FILENAME};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use simulate::SimulatedBackend;
pub use types::{
    ArtifactFile, EngineError, EngineEvent, EventKind, FailureKind, JobArtifacts, JobFailure,
    JobId, JobRequest, LogLevel,
};
