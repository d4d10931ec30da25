//! External worker backend.
//!
//! Each job launches the configured program once. The request is written to
//! the child's stdin as a single JSON document; the child answers with JSON
//! lines on stdout:
//!
//! ```text
//! {"type":"progress","percent":40,"step":"Reducing dimensions"}
//! {"type":"log","level":"info","text":"Loaded 1200 documents"}
//! {"type":"artifact","name":"topics","path":"topics.html"}
//! {"type":"summary","text":"12 topics"}
//! {"type":"error","message":"column 'content' not found"}
//! ```
//!
//! Lines that are not protocol messages are forwarded as info logs and
//! stderr lines as warnings.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use engine_logging::{engine_job_debug, engine_job_warn};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

use crate::{
    ArtifactFile, ComputeBackend, FailureKind, JobArtifacts, JobContext, JobFailure, JobId,
    JobRequest, LogLevel,
};

pub const ENV_JOB_ID: &str = "TOPIC_JOB_ID";
pub const ENV_JOB_TASK: &str = "TOPIC_JOB_TASK";
pub const ENV_JOB_OUTPUT_DIR: &str = "TOPIC_JOB_OUTPUT_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSettings {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CommandBackend {
    settings: CommandSettings,
}

impl CommandBackend {
    pub fn new(settings: CommandSettings) -> Self {
        Self { settings }
    }

    fn command(&self, request: &JobRequest, output_dir: &Path) -> Command {
        let mut command = Command::new(&self.settings.program);
        command
            .args(&self.settings.args)
            .envs(&request.env)
            .env(ENV_JOB_ID, request.job_id.to_string())
            .env(ENV_JOB_TASK, &request.task)
            .env(ENV_JOB_OUTPUT_DIR, output_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[derive(Serialize)]
struct WorkerRequest<'a> {
    job_id: JobId,
    task: &'a str,
    output_dir: &'a Path,
    payload: &'a serde_json::Value,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WorkerLine {
    Progress {
        #[serde(default)]
        percent: Option<f64>,
        #[serde(default)]
        step: Option<String>,
    },
    Log {
        #[serde(default)]
        level: Option<String>,
        text: String,
    },
    Artifact {
        name: String,
        path: PathBuf,
    },
    Summary {
        text: String,
    },
    Error {
        message: String,
    },
}

#[derive(Default)]
struct Collected {
    artifacts: Vec<ArtifactFile>,
    summary: Option<String>,
    error: Option<String>,
}

impl Collected {
    fn handle_stdout(&mut self, line: &str, ctx: &JobContext) {
        let line = line.trim_end();
        if line.trim().is_empty() {
            return;
        }
        let Ok(message) = serde_json::from_str::<WorkerLine>(line) else {
            ctx.info(line);
            return;
        };
        match message {
            WorkerLine::Progress { percent, step } => match percent {
                Some(percent) => ctx.progress(
                    percent.clamp(0.0, 100.0).round() as u8,
                    step.unwrap_or_default(),
                ),
                None => {
                    if let Some(step) = step {
                        ctx.step(step);
                    }
                }
            },
            WorkerLine::Log { level, text } => {
                let level = level.as_deref().map_or(LogLevel::Info, LogLevel::from_worker);
                ctx.log(level, text);
            }
            WorkerLine::Artifact { name, path } => {
                let path = if path.is_relative() {
                    ctx.output_dir().join(path)
                } else {
                    path
                };
                engine_job_debug!(ctx.job_id(), "Artifact {} at {}", name, path.display());
                self.artifacts.push(ArtifactFile { name, path });
            }
            WorkerLine::Summary { text } => self.summary = Some(text),
            WorkerLine::Error { message } => {
                ctx.log(LogLevel::Error, message.clone());
                self.error.get_or_insert(message);
            }
        }
    }
}

#[async_trait::async_trait]
impl ComputeBackend for CommandBackend {
    async fn run(
        &self,
        request: &JobRequest,
        ctx: &JobContext,
    ) -> Result<JobArtifacts, JobFailure> {
        let job_id = request.job_id;
        let mut child = self.command(request, ctx.output_dir()).spawn().map_err(|err| {
            JobFailure::new(
                FailureKind::Spawn,
                format!("failed to launch '{}': {err}", self.settings.program),
            )
        })?;

        let body = serde_json::to_vec(&WorkerRequest {
            job_id,
            task: &request.task,
            output_dir: ctx.output_dir(),
            payload: &request.payload,
        })
        .map_err(|err| JobFailure::new(FailureKind::Protocol, err.to_string()))?;
        if let Some(mut stdin) = child.stdin.take() {
            let write = async {
                stdin.write_all(&body).await?;
                stdin.shutdown().await
            };
            // A worker that never reads its request is allowed to close stdin early.
            tokio::select! {
                _ = ctx.cancelled() => return Err(kill(job_id, &mut child).await),
                written = write => {
                    if let Err(err) = written {
                        engine_job_warn!(job_id, "Could not write request to worker: {}", err);
                    }
                }
            }
        }

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(JobFailure::new(
                FailureKind::Protocol,
                "worker output was not captured",
            ));
        };
        let mut stdout = BufReader::new(stdout).lines();
        let mut stderr = BufReader::new(stderr).lines();
        let mut collected = Collected::default();
        let mut stdout_open = true;
        let mut stderr_open = true;

        while stdout_open || stderr_open {
            tokio::select! {
                _ = ctx.cancelled() => return Err(kill(job_id, &mut child).await),
                line = stdout.next_line(), if stdout_open => match line {
                    Ok(Some(line)) => collected.handle_stdout(&line, ctx),
                    Ok(None) => stdout_open = false,
                    Err(err) => {
                        engine_job_warn!(job_id, "Reading worker stdout failed: {}", err);
                        stdout_open = false;
                    }
                },
                line = stderr.next_line(), if stderr_open => match line {
                    Ok(Some(line)) if !line.trim().is_empty() => ctx.warn(line),
                    Ok(Some(_)) => {}
                    Ok(None) | Err(_) => stderr_open = false,
                },
            }
        }

        let waited = tokio::select! {
            _ = ctx.cancelled() => None,
            status = child.wait() => Some(status),
        };
        let Some(status) = waited else {
            return Err(kill(job_id, &mut child).await);
        };
        let status = status.map_err(|err| JobFailure::new(FailureKind::Io, err.to_string()))?;
        finish(status, collected, ctx.output_dir())
    }
}

async fn kill(job_id: JobId, child: &mut Child) -> JobFailure {
    if let Err(err) = child.kill().await {
        engine_job_warn!(job_id, "Failed to stop worker: {}", err);
    }
    JobFailure::cancelled()
}

fn finish(
    status: ExitStatus,
    collected: Collected,
    output_dir: &Path,
) -> Result<JobArtifacts, JobFailure> {
    if let Some(message) = collected.error {
        return Err(JobFailure::computation(message));
    }
    if !status.success() {
        return Err(JobFailure::new(
            FailureKind::ExitStatus(status.code()),
            format!("worker exited with {status}"),
        ));
    }
    Ok(JobArtifacts {
        output_dir: output_dir.to_path_buf(),
        artifacts: collected.artifacts,
        summary: collected.summary,
    })
}

#[cfg(test)]
mod tests {
    use super::WorkerLine;

    #[test]
    fn parses_protocol_lines() {
        let line: WorkerLine =
            serde_json::from_str(r#"{"type":"progress","percent":40,"step":"Reducing"}"#).unwrap();
        assert_eq!(
            line,
            WorkerLine::Progress {
                percent: Some(40.0),
                step: Some("Reducing".to_string())
            }
        );

        let line: WorkerLine = serde_json::from_str(r#"{"type":"log","text":"hello"}"#).unwrap();
        assert_eq!(
            line,
            WorkerLine::Log {
                level: None,
                text: "hello".to_string()
            }
        );
    }

    #[test]
    fn unknown_type_is_not_a_protocol_line() {
        assert!(serde_json::from_str::<WorkerLine>(r#"{"type":"chart","id":1}"#).is_err());
        assert!(serde_json::from_str::<WorkerLine>("Epoch 1/3").is_err());
    }
}
