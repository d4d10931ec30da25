use std::time::Duration;

use crate::persist::AtomicFileWriter;
use crate::{
    ArtifactFile, ComputeBackend, FailureKind, JobArtifacts, JobContext, JobFailure, JobRequest,
};

const DEFAULT_STEPS: [&str; 6] = [
    "Loading data",
    "Cleaning text",
    "Embedding documents",
    "Reducing dimensions",
    "Clustering",
    "Extracting keywords",
];

/// Stand-in backend that walks through named steps with a pause between them.
///
/// Visualization requests write one placeholder HTML file per chart listed in
/// `payload.charts`, so the manifest and result paths behave like a real run.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    steps: Vec<String>,
    delay: Duration,
    fail_at: Option<usize>,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new(
            DEFAULT_STEPS.iter().map(|s| s.to_string()).collect(),
            Duration::from_millis(400),
        )
    }
}

impl SimulatedBackend {
    pub fn new(steps: Vec<String>, delay: Duration) -> Self {
        Self {
            steps,
            delay,
            fail_at: None,
        }
    }

    /// Fails with a computation error when step `index` is reached.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    fn write_charts(
        &self,
        request: &JobRequest,
        ctx: &JobContext,
    ) -> Result<Vec<ArtifactFile>, JobFailure> {
        let charts: Vec<&str> = request
            .payload
            .get("charts")
            .and_then(|charts| charts.as_array())
            .map(|charts| charts.iter().filter_map(|c| c.as_str()).collect())
            .unwrap_or_default();
        let writer = AtomicFileWriter::new(ctx.output_dir());
        charts
            .into_iter()
            .map(|chart| {
                let html = format!(
                    "<!doctype html>\n<title>{chart}</title>\n<p>Simulated {chart} chart for job {}</p>\n",
                    request.job_id
                );
                writer
                    .write(&format!("{chart}.html"), &html)
                    .map(|path| ArtifactFile {
                        name: chart.to_string(),
                        path,
                    })
                    .map_err(|err| JobFailure::new(FailureKind::Io, err.to_string()))
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ComputeBackend for SimulatedBackend {
    async fn run(
        &self,
        request: &JobRequest,
        ctx: &JobContext,
    ) -> Result<JobArtifacts, JobFailure> {
        let total = self.steps.len().max(1);
        for (index, step) in self.steps.iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(JobFailure::cancelled());
            }
            let percent = (index * 100 / total) as u8;
            ctx.progress(percent, step.clone());
            ctx.info(format!("{step}..."));
            if self.fail_at == Some(index) {
                return Err(JobFailure::computation(format!(
                    "simulated failure during {step}"
                )));
            }
            tokio::select! {
                _ = ctx.cancelled() => return Err(JobFailure::cancelled()),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        let artifacts = if request.task == "visualization" {
            self.write_charts(request, ctx)?
        } else {
            Vec::new()
        };
        ctx.progress(100, "Done");
        Ok(JobArtifacts {
            output_dir: ctx.output_dir().to_path_buf(),
            summary: Some(format!(
                "Simulated {} run finished {} step(s)",
                request.task,
                self.steps.len()
            )),
            artifacts,
        })
    }
}
