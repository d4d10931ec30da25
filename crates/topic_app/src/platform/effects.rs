use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use engine_logging::{engine_debug, engine_error, engine_info, engine_job_error};
use topic_core::{
    Artifact, Effect, JobDescriptor, JobEvent, JobId, Msg, Outcome, ResultHandle, Settings,
    Severity,
};
use topic_engine::{
    CommandBackend, CommandSettings, ComputeBackend, EngineError, EngineEvent, EngineEvents,
    EngineHandle, EngineSettings, EventKind, FailureKind, JobRequest, LogLevel, SimulatedBackend,
};

use super::app::Inbound;
use super::persistence;
use super::BackendChoice;

pub const ENV_LLM_PROVIDER: &str = "TOPIC_LLM_PROVIDER";
pub const ENV_LLM_API_KEY: &str = "TOPIC_LLM_API_KEY";
pub const ENV_LLM_BASE_URL: &str = "TOPIC_LLM_BASE_URL";
pub const ENV_LLM_MODEL: &str = "TOPIC_LLM_MODEL";

/// Executes effects returned by `update` against the engine and the settings file.
pub struct EffectRunner {
    engine: EngineHandle,
    inbound: mpsc::Sender<Inbound>,
    settings_path: PathBuf,
}

impl EffectRunner {
    /// Starts the engine with the chosen backend and a relay thread that
    /// forwards engine events to `inbound`.
    pub fn new(
        inbound: mpsc::Sender<Inbound>,
        backend: BackendChoice,
        settings: &Settings,
        settings_path: PathBuf,
    ) -> Result<Self, EngineError> {
        let backend: Arc<dyn ComputeBackend> = match backend {
            BackendChoice::Simulated => Arc::new(SimulatedBackend::default()),
            BackendChoice::Worker => Arc::new(CommandBackend::new(CommandSettings {
                program: settings.worker.program.clone(),
                args: settings.worker.args.clone(),
            })),
        };
        let (engine, events) = EngineHandle::spawn(backend, EngineSettings::default())?;
        spawn_relay(events, inbound.clone())?;
        Ok(Self {
            engine,
            inbound,
            settings_path,
        })
    }

    pub fn run(&self, effects: Vec<Effect>, settings: &Settings) {
        for effect in effects {
            match effect {
                Effect::StartJob { job_id, descriptor } => {
                    let request = build_request(job_id, &descriptor, settings);
                    let started = request
                        .map_err(|err| err.to_string())
                        .and_then(|request| self.engine.start(request).map_err(|e| e.to_string()));
                    if let Err(reason) = started {
                        engine_job_error!(job_id, "Could not start job: {}", reason);
                        self.fail_locally(job_id, reason);
                    }
                }
                Effect::CancelJob { job_id } => {
                    if let Err(err) = self.engine.cancel(job_id) {
                        engine_job_error!(job_id, "Could not cancel job: {}", err);
                    }
                }
                Effect::PersistSettings(settings) => {
                    match persistence::save_settings(&self.settings_path, &settings) {
                        Ok(path) => engine_debug!("Saved settings to {}", path.display()),
                        Err(err) => engine_error!("Failed to save settings: {}", err),
                    }
                }
            }
        }
    }

    /// Delivers a failure for a job the engine never accepted, so the slot
    /// does not stay Running.
    fn fail_locally(&self, job_id: JobId, description: String) {
        let _ = self.inbound.send(Inbound::Msg(Msg::JobEvent {
            job_id,
            seq: 0,
            event: JobEvent::Finished(Outcome::Failed { description }),
        }));
    }
}

fn build_request(
    job_id: JobId,
    descriptor: &JobDescriptor,
    settings: &Settings,
) -> Result<JobRequest, serde_json::Error> {
    let payload = serde_json::to_value(descriptor)?;
    let mut request = JobRequest::new(job_id, descriptor.task(), payload, &settings.output_dir);
    if let Some(active) = settings.llm.active() {
        request = request
            .with_env(ENV_LLM_PROVIDER, settings.llm.provider.name())
            .with_env(ENV_LLM_API_KEY, active.api_key)
            .with_env(ENV_LLM_BASE_URL, active.base_url)
            .with_env(ENV_LLM_MODEL, active.model);
    }
    Ok(request)
}

fn spawn_relay(events: EngineEvents, inbound: mpsc::Sender<Inbound>) -> Result<(), EngineError> {
    thread::Builder::new()
        .name("topic-event-relay".to_string())
        .spawn(move || {
            while let Some(event) = events.recv() {
                if inbound.send(Inbound::Msg(map_event(event))).is_err() {
                    break;
                }
            }
            engine_info!("Event relay stopped");
        })
        .map(|_| ())
        .map_err(EngineError::Thread)
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    let EngineEvent { job_id, seq, kind } = event;
    let event = match kind {
        EventKind::Progress { percent, step } => JobEvent::Progress { percent, step },
        EventKind::Log { level, text } => JobEvent::Log {
            severity: map_level(level),
            text,
        },
        EventKind::Completed(Ok(artifacts)) => JobEvent::Finished(Outcome::Succeeded(ResultHandle {
            output_dir: artifacts.output_dir,
            artifacts: artifacts
                .artifacts
                .into_iter()
                .map(|file| Artifact {
                    name: file.name,
                    path: file.path,
                })
                .collect(),
            summary: artifacts.summary,
        })),
        EventKind::Completed(Err(failure)) if failure.kind == FailureKind::Cancelled => {
            JobEvent::Finished(Outcome::Cancelled)
        }
        EventKind::Completed(Err(failure)) => JobEvent::Finished(Outcome::Failed {
            description: failure.to_string(),
        }),
    };
    Msg::JobEvent { job_id, seq, event }
}

fn map_level(level: LogLevel) -> Severity {
    match level {
        LogLevel::Debug => Severity::Debug,
        LogLevel::Info => Severity::Info,
        LogLevel::Warn => Severity::Warning,
        LogLevel::Error => Severity::Error,
    }
}
