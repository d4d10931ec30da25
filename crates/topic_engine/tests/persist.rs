use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use topic_engine::{
    ensure_output_dir, inspect_path, write_manifest, ArtifactFile, AtomicFileWriter,
    InputStatus, JobArtifacts, PersistError, MANIFEST_FILENAME,
};

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("output").join("job-0001");

    ensure_output_dir(&nested).unwrap();

    assert!(nested.is_dir());
}

#[test]
fn output_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("output");
    fs::write(&file, "x").unwrap();

    let err = ensure_output_dir(&file).unwrap_err();

    assert!(matches!(err, PersistError::NotADirectory(path) if path == file));
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path());

    let first = writer.write("topic_settings.ron", "(a: 1)").unwrap();
    let second = writer.write("topic_settings.ron", "(a: 2)").unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "(a: 2)");
    let entries = fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(entries, 1, "no temp files left behind");
}

#[test]
fn failed_write_leaves_nothing_behind() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    let result = AtomicFileWriter::new(&blocker).write("manifest.json", "{}");

    assert!(result.is_err());
    assert!(!temp.path().join("manifest.json").exists());
}

#[test]
fn manifest_lists_artifacts_relative_to_output_dir() {
    let temp = TempDir::new().unwrap();
    let output_dir = temp.path().join("job-0003");
    let artifacts = JobArtifacts {
        output_dir: output_dir.clone(),
        artifacts: vec![
            ArtifactFile {
                name: "topics".to_string(),
                path: output_dir.join("topics.html"),
            },
            ArtifactFile {
                name: "shared".to_string(),
                path: PathBuf::from("/srv/charts/shared.html"),
            },
        ],
        summary: Some("8 topics".to_string()),
    };

    let path = write_manifest(3, "visualization", &artifacts).unwrap();

    assert_eq!(path, output_dir.join(MANIFEST_FILENAME));
    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        manifest,
        json!({
            "job_id": 3,
            "task": "visualization",
            "summary": "8 topics",
            "artifacts": [
                { "name": "topics", "path": "topics.html" },
                { "name": "shared", "path": "/srv/charts/shared.html" },
            ],
        })
    );
}

#[test]
fn inspection_distinguishes_files_directories_and_missing_paths() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("comments.csv");
    fs::write(&file, "content\nhello\n").unwrap();
    let empty = temp.path().join("stopwords.txt");
    fs::write(&empty, "").unwrap();

    assert_eq!(inspect_path(&file), InputStatus::Present);
    assert_eq!(inspect_path(&empty), InputStatus::Empty);
    assert_eq!(inspect_path(temp.path()), InputStatus::NotAFile);
    assert_eq!(inspect_path(&temp.path().join("gone.csv")), InputStatus::Missing);
}
