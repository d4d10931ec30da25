use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use engine_logging::{engine_info, engine_warn};
use thiserror::Error;
use topic_core::Settings;
use topic_engine::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub(crate) enum SettingsFileError {
    #[error("settings path has no file name: {}", .0.display())]
    NoFileName(PathBuf),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Reads the settings file. A missing or unreadable file yields defaults so
/// the workbench always starts.
pub(crate) fn load_settings(path: &Path) -> Settings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            engine_info!("No settings at {}; using defaults", path.display());
            return Settings::default();
        }
        Err(err) => {
            engine_warn!("Failed to read settings from {}: {}", path.display(), err);
            return Settings::default();
        }
    };

    match ron::from_str::<Settings>(&content) {
        Ok(settings) => {
            engine_info!("Loaded settings from {}", path.display());
            settings
        }
        Err(err) => {
            engine_warn!("Failed to parse settings from {}: {}", path.display(), err);
            Settings::default()
        }
    }
}

pub(crate) fn save_settings(path: &Path, settings: &Settings) -> Result<PathBuf, SettingsFileError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| SettingsFileError::NoFileName(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let content = ron::ser::to_string_pretty(settings, ron::ser::PrettyConfig::new())?;
    Ok(AtomicFileWriter::new(dir).write(filename, &content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use topic_core::{Device, LlmProvider, SettingsEdit};

    #[test]
    fn settings_round_trip_through_ron() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("topic_settings.ron");
        let mut settings = Settings::default();
        settings.apply(SettingsEdit::Device(Device::Cpu)).unwrap();
        settings
            .apply(SettingsEdit::LlmProvider(LlmProvider::Ollama))
            .unwrap();
        settings
            .apply(SettingsEdit::LlmModel("mistral".to_string()))
            .unwrap();
        settings
            .apply(SettingsEdit::LlmProvider(LlmProvider::OpenAi))
            .unwrap();
        settings
            .apply(SettingsEdit::LlmApiKey("sk-stored".to_string()))
            .unwrap();
        settings.defaults.nr_topics = Some(12);

        save_settings(&path, &settings).unwrap();

        assert_eq!(load_settings(&path), settings);
    }

    #[test]
    fn openai_provider_is_stored_under_its_display_name() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("topic_settings.ron");
        let mut settings = Settings::default();
        settings
            .apply(SettingsEdit::LlmProvider(LlmProvider::OpenAi))
            .unwrap();

        save_settings(&path, &settings).unwrap();
        let content = fs::read_to_string(&path).unwrap();

        assert!(content.contains("provider: openai"), "{content}");
        assert!(!content.contains("open_ai"), "{content}");

        fs::write(&path, "(llm: (provider: openai))").unwrap();
        assert_eq!(load_settings(&path).llm.provider, LlmProvider::OpenAi);
    }

    #[test]
    fn missing_or_corrupt_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("topic_settings.ron");
        assert_eq!(load_settings(&path), Settings::default());

        fs::write(&path, "(not valid ron").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("topic_settings.ron");
        fs::write(&path, "(console_max_lines: 200)").unwrap();

        let settings = load_settings(&path);

        assert_eq!(settings.console_max_lines, 200);
        assert_eq!(settings.display_log_lines, Settings::default().display_log_lines);
    }
}
