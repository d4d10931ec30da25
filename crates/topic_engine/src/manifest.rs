use std::path::{Path, PathBuf};

use serde_json::json;

use crate::persist::{AtomicFileWriter, PersistError};
use crate::{JobArtifacts, JobId};

pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Writes `manifest.json` listing the exported files of a finished job.
/// Artifact paths inside the output directory are stored relative to it.
pub fn write_manifest(
    job_id: JobId,
    task: &str,
    artifacts: &JobArtifacts,
) -> Result<PathBuf, PersistError> {
    let output_dir = artifacts.output_dir.as_path();
    let manifest = json!({
        "job_id": job_id,
        "task": task,
        "summary": artifacts.summary,
        "artifacts": artifacts
            .artifacts
            .iter()
            .map(|artifact| {
                json!({
                    "name": artifact.name,
                    "path": relative_to(output_dir, &artifact.path),
                })
            })
            .collect::<Vec<_>>(),
    });
    AtomicFileWriter::new(output_dir).write(MANIFEST_FILENAME, &format!("{manifest:#}\n"))
}

fn relative_to(dir: &Path, path: &Path) -> String {
    path.strip_prefix(dir)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
