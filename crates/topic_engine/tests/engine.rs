use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use topic_engine::{
    ComputeBackend, EngineEvent, EngineEvents, EngineHandle, EngineSettings, EventKind,
    FailureKind, JobArtifacts, JobContext, JobFailure, JobId, JobRequest, LogLevel,
    SimulatedBackend, MANIFEST_FILENAME,
};

const WAIT: Duration = Duration::from_secs(10);

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn spawn(backend: impl ComputeBackend + 'static) -> (EngineHandle, EngineEvents) {
    EngineHandle::spawn(Arc::new(backend), EngineSettings::default()).expect("engine starts")
}

fn steps(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Collects events until every listed job has delivered its terminal event.
fn drain(events: &EngineEvents, jobs: &[JobId]) -> BTreeMap<JobId, Vec<EngineEvent>> {
    let mut by_job: BTreeMap<JobId, Vec<EngineEvent>> = BTreeMap::new();
    let finished = |by_job: &BTreeMap<JobId, Vec<EngineEvent>>| {
        jobs.iter().all(|job| {
            by_job
                .get(job)
                .is_some_and(|events| events.iter().any(|e| e.kind.is_terminal()))
        })
    };
    while !finished(&by_job) {
        let event = events.recv_timeout(WAIT).expect("event before timeout");
        by_job.entry(event.job_id).or_default().push(event);
    }
    // Give a misbehaving runner a moment to emit anything extra.
    while let Some(event) = events.recv_timeout(Duration::from_millis(100)) {
        by_job.entry(event.job_id).or_default().push(event);
    }
    by_job
}

fn terminal(events: &[EngineEvent]) -> &Result<JobArtifacts, JobFailure> {
    let terminals: Vec<_> = events
        .iter()
        .filter_map(|event| match &event.kind {
            EventKind::Completed(result) => Some(result),
            _ => None,
        })
        .collect();
    assert_eq!(terminals.len(), 1, "exactly one terminal event");
    assert!(events.last().unwrap().kind.is_terminal(), "terminal event is last");
    terminals[0]
}

fn seqs(events: &[EngineEvent]) -> Vec<u64> {
    events.iter().map(|event| event.seq).collect()
}

#[test]
fn events_arrive_in_order_with_one_terminal() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let (engine, events) = spawn(SimulatedBackend::new(
        steps(&["Loading data", "Embedding documents", "Clustering"]),
        Duration::ZERO,
    ));

    engine
        .start(JobRequest::new(1, "modeling", json!({}), temp.path()))
        .unwrap();
    let by_job = drain(&events, &[1]);
    let job = &by_job[&1];

    assert_eq!(seqs(job), (0..job.len() as u64).collect::<Vec<_>>());
    let percents: Vec<u8> = job
        .iter()
        .filter_map(|event| match &event.kind {
            EventKind::Progress {
                percent: Some(percent),
                ..
            } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents, vec![0, 33, 66, 100]);
    let artifacts = terminal(job).as_ref().expect("success");
    assert_eq!(artifacts.output_dir, temp.path().join("job-0001"));
    assert!(artifacts.output_dir.is_dir());
}

#[test]
fn failing_backend_reports_failure() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let (engine, events) = spawn(
        SimulatedBackend::new(steps(&["Loading data", "Clustering"]), Duration::ZERO).failing_at(1),
    );

    engine
        .start(JobRequest::new(3, "modeling", json!({}), temp.path()))
        .unwrap();
    let by_job = drain(&events, &[3]);

    let failure = terminal(&by_job[&3]).as_ref().unwrap_err();
    assert_eq!(failure.kind, FailureKind::Computation);
    assert!(failure.message.contains("Clustering"));
}

/// Reports one step and then panics.
struct PanickingBackend;

#[async_trait::async_trait]
impl ComputeBackend for PanickingBackend {
    async fn run(
        &self,
        _request: &JobRequest,
        ctx: &JobContext,
    ) -> Result<JobArtifacts, JobFailure> {
        ctx.progress(0, "Loading data");
        panic!("backend panic during Loading data");
    }
}

#[test]
fn panicking_backend_yields_one_failure_and_engine_survives() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let (engine, events) = spawn(PanickingBackend);

    engine
        .start(JobRequest::new(1, "preprocess", json!({}), temp.path()))
        .unwrap();
    engine
        .start(JobRequest::new(2, "preprocess", json!({}), temp.path()))
        .unwrap();
    let by_job = drain(&events, &[1, 2]);

    for job in [1, 2] {
        let failure = terminal(&by_job[&job]).as_ref().unwrap_err();
        assert_eq!(failure.kind, FailureKind::Panicked);
        assert!(failure.message.contains("backend panic"), "{}", failure.message);
    }
}

#[test]
fn cancellation_yields_one_cancelled_event() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let (engine, events) = spawn(SimulatedBackend::new(
        steps(&["Embedding documents", "Clustering"]),
        Duration::from_secs(30),
    ));

    engine
        .start(JobRequest::new(5, "modeling", json!({}), temp.path()))
        .unwrap();
    let first = events.recv_timeout(WAIT).expect("first event");
    assert_eq!(first.seq, 0);
    engine.cancel(5).unwrap();

    let mut job = vec![first];
    job.extend(drain(&events, &[5]).remove(&5).unwrap_or_default());

    let failure = terminal(&job).as_ref().unwrap_err();
    assert_eq!(failure.kind, FailureKind::Cancelled);
    assert_eq!(seqs(&job), (0..job.len() as u64).collect::<Vec<_>>());
}

#[test]
fn cancel_of_unknown_job_is_ignored() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let (engine, events) = spawn(SimulatedBackend::new(steps(&["Loading data"]), Duration::ZERO));

    engine.cancel(42).unwrap();
    engine
        .start(JobRequest::new(1, "preprocess", json!({}), temp.path()))
        .unwrap();

    let by_job = drain(&events, &[1]);
    assert_eq!(by_job.keys().copied().collect::<Vec<_>>(), vec![1]);
    assert!(terminal(&by_job[&1]).is_ok());
}

#[test]
fn concurrent_jobs_keep_separate_sequences() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let (engine, events) = spawn(SimulatedBackend::new(
        steps(&["a", "b", "c", "d"]),
        Duration::from_millis(5),
    ));

    for job_id in 1..=3 {
        engine
            .start(JobRequest::new(job_id, "modeling", json!({}), temp.path()))
            .unwrap();
    }
    let by_job = drain(&events, &[1, 2, 3]);

    for (job_id, job) in &by_job {
        assert_eq!(seqs(job), (0..job.len() as u64).collect::<Vec<_>>(), "job {job_id}");
        assert!(terminal(job).is_ok());
    }
}

#[test]
fn visualization_artifacts_get_a_manifest() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let (engine, events) = spawn(SimulatedBackend::new(steps(&["Rendering"]), Duration::ZERO));

    engine
        .start(JobRequest::new(
            7,
            "visualization",
            json!({ "charts": ["topics", "barchart"] }),
            temp.path(),
        ))
        .unwrap();
    let by_job = drain(&events, &[7]);
    let artifacts = terminal(&by_job[&7]).as_ref().expect("success");

    let names: Vec<_> = artifacts.artifacts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["topics", "barchart"]);
    assert!(artifacts.artifacts.iter().all(|a| a.path.is_file()));

    let manifest: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(artifacts.output_dir.join(MANIFEST_FILENAME)).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest["job_id"], json!(7));
    assert_eq!(manifest["artifacts"][1]["path"], json!("barchart.html"));
}

struct ChattyBackend;

#[async_trait::async_trait]
impl ComputeBackend for ChattyBackend {
    async fn run(
        &self,
        _request: &JobRequest,
        ctx: &JobContext,
    ) -> Result<JobArtifacts, JobFailure> {
        ctx.step("Starting");
        ctx.progress(250, "Overshoot");
        ctx.log(LogLevel::Warn, "low memory");
        Ok(JobArtifacts {
            output_dir: ctx.output_dir().to_path_buf(),
            ..JobArtifacts::default()
        })
    }
}

#[test]
fn context_clamps_progress_and_keeps_step_only_updates() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let (engine, events) = spawn(ChattyBackend);

    engine
        .start(JobRequest::new(9, "modeling", json!({}), temp.path()))
        .unwrap();
    let by_job = drain(&events, &[9]);
    let kinds: Vec<_> = by_job[&9].iter().map(|event| event.kind.clone()).collect();

    assert_eq!(
        &kinds[..3],
        &[
            EventKind::Progress {
                percent: None,
                step: Some("Starting".to_string())
            },
            EventKind::Progress {
                percent: Some(100),
                step: Some("Overshoot".to_string())
            },
            EventKind::Log {
                level: LogLevel::Warn,
                text: "low memory".to_string()
            },
        ]
    );
    assert!(!temp.path().join("job-0009").join(MANIFEST_FILENAME).exists());
}
