//! Explicit configuration object.
//!
//! Loaded once at startup through `Msg::RestoreSettings` and written back by
//! the platform whenever an edit is accepted (`Effect::PersistSettings`).

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::{CleaningOptions, ModelParams};

pub const DEFAULT_CONSOLE_MAX_LINES: usize = 1000;
pub const DEFAULT_DISPLAY_LOG_LINES: usize = 50;
pub const TOKENIZER_PROCESS_CHOICES: [u8; 4] = [1, 2, 4, 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl Device {
    pub fn name(self) -> &'static str {
        match self {
            Device::Auto => "auto",
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }
}

impl FromStr for Device {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Device::Auto),
            "cpu" => Ok(Device::Cpu),
            "cuda" | "gpu" => Ok(Device::Cuda),
            _ => Err(()),
        }
    }
}

/// Hardware preference snapshotted into every job descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwarePreference {
    pub device: Device,
    pub tokenizer_processes: u8,
}

impl Default for HardwarePreference {
    fn default() -> Self {
        Self {
            device: Device::Auto,
            tokenizer_processes: 4,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[default]
    None,
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
    Zhipu,
}

impl LlmProvider {
    pub fn name(self) -> &'static str {
        match self {
            LlmProvider::None => "none",
            LlmProvider::OpenAi => "openai",
            LlmProvider::Ollama => "ollama",
            LlmProvider::Zhipu => "zhipu",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            LlmProvider::None | LlmProvider::OpenAi => "https://api.openai.com/v1",
            LlmProvider::Ollama => "http://localhost:11434",
            LlmProvider::Zhipu => "https://open.bigmodel.cn/api/paas/v4/",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::None | LlmProvider::OpenAi => "gpt-3.5-turbo",
            LlmProvider::Ollama => "llama2",
            LlmProvider::Zhipu => "glm-4",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(LlmProvider::None),
            "openai" => Ok(LlmProvider::OpenAi),
            "ollama" => Ok(LlmProvider::Ollama),
            "zhipu" => Ok(LlmProvider::Zhipu),
            _ => Err(()),
        }
    }
}

/// Key, endpoint and model of one provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl ProviderCredentials {
    pub fn defaults_for(provider: LlmProvider) -> Self {
        Self {
            api_key: String::new(),
            base_url: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
        }
    }

    pub fn masked_key(&self) -> String {
        if self.api_key.is_empty() {
            return String::from("(unset)");
        }
        let tail: String = self
            .api_key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{tail}")
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &self.masked_key())
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Credentials for the summarization collaborator, one entry per provider.
/// Handed to the worker environment; never serialized into a job descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    credentials: BTreeMap<LlmProvider, ProviderCredentials>,
}

impl LlmSettings {
    /// Credentials stored for `provider`, or its defaults when none were set.
    pub fn credentials(&self, provider: LlmProvider) -> ProviderCredentials {
        self.credentials
            .get(&provider)
            .cloned()
            .unwrap_or_else(|| ProviderCredentials::defaults_for(provider))
    }

    /// Credentials of the selected provider; `None` when no provider is selected.
    pub fn active(&self) -> Option<ProviderCredentials> {
        (self.provider != LlmProvider::None).then(|| self.credentials(self.provider))
    }

    fn active_mut(
        &mut self,
        key: &'static str,
        value: &str,
    ) -> Result<&mut ProviderCredentials, SettingsError> {
        let provider = self.provider;
        if provider == LlmProvider::None {
            return Err(SettingsError::invalid(key, value, "select an llm.provider first"));
        }
        Ok(self
            .credentials
            .entry(provider)
            .or_insert_with(|| ProviderCredentials::defaults_for(provider)))
    }
}

/// Command line of the external worker that performs the computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSettings {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["-m".to_string(), "topic_worker".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub defaults: ModelParams,
    pub cleaning: CleaningOptions,
    pub hardware: HardwarePreference,
    pub llm: LlmSettings,
    pub worker: WorkerSettings,
    pub output_dir: PathBuf,
    /// Log lines kept per slot.
    pub console_max_lines: usize,
    /// Log lines shown per slot.
    pub display_log_lines: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            defaults: ModelParams::default(),
            cleaning: CleaningOptions::default(),
            hardware: HardwarePreference::default(),
            llm: LlmSettings::default(),
            worker: WorkerSettings::default(),
            output_dir: PathBuf::from("output"),
            console_max_lines: DEFAULT_CONSOLE_MAX_LINES,
            display_log_lines: DEFAULT_DISPLAY_LOG_LINES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsEdit {
    Device(Device),
    TokenizerProcesses(u8),
    LlmProvider(LlmProvider),
    LlmApiKey(String),
    LlmBaseUrl(String),
    LlmModel(String),
    WorkerProgram(String),
    WorkerArgs(Vec<String>),
    OutputDir(PathBuf),
    ConsoleMaxLines(usize),
    DisplayLogLines(usize),
    ResetToDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("unknown setting '{0}'")]
    UnknownKey(String),
    #[error("invalid value {value:?} for '{key}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl SettingsError {
    fn invalid(key: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        SettingsError::InvalidValue {
            key,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl SettingsEdit {
    /// Builds a typed edit from a `key value` pair typed by the user.
    pub fn parse(key: &str, value: &str) -> Result<Self, SettingsError> {
        let value = value.trim();
        let edit = match key.trim() {
            "device" => SettingsEdit::Device(value.parse().map_err(|_| {
                SettingsError::invalid("device", value, "expected auto, cpu or cuda")
            })?),
            "tokenizer_processes" => SettingsEdit::TokenizerProcesses(value.parse().map_err(
                |_| SettingsError::invalid("tokenizer_processes", value, "expected a number"),
            )?),
            "llm.provider" => SettingsEdit::LlmProvider(value.parse().map_err(|_| {
                SettingsError::invalid(
                    "llm.provider",
                    value,
                    "expected none, openai, ollama or zhipu",
                )
            })?),
            "llm.api_key" => SettingsEdit::LlmApiKey(value.to_string()),
            "llm.base_url" => SettingsEdit::LlmBaseUrl(value.to_string()),
            "llm.model" => SettingsEdit::LlmModel(value.to_string()),
            "worker.program" => SettingsEdit::WorkerProgram(value.to_string()),
            "worker.args" => {
                SettingsEdit::WorkerArgs(value.split_whitespace().map(str::to_string).collect())
            }
            "output_dir" => SettingsEdit::OutputDir(PathBuf::from(value)),
            "console_max_lines" => SettingsEdit::ConsoleMaxLines(value.parse().map_err(|_| {
                SettingsError::invalid("console_max_lines", value, "expected a number")
            })?),
            "display_log_lines" => SettingsEdit::DisplayLogLines(value.parse().map_err(|_| {
                SettingsError::invalid("display_log_lines", value, "expected a number")
            })?),
            "reset" => SettingsEdit::ResetToDefaults,
            other => return Err(SettingsError::UnknownKey(other.to_string())),
        };
        Ok(edit)
    }
}

impl Settings {
    /// Validates and applies one edit. On error the settings are unchanged.
    pub fn apply(&mut self, edit: SettingsEdit) -> Result<(), SettingsError> {
        match edit {
            SettingsEdit::Device(device) => self.hardware.device = device,
            SettingsEdit::TokenizerProcesses(count) => {
                if !TOKENIZER_PROCESS_CHOICES.contains(&count) {
                    return Err(SettingsError::invalid(
                        "tokenizer_processes",
                        count.to_string(),
                        "expected 1, 2, 4 or 8",
                    ));
                }
                self.hardware.tokenizer_processes = count;
            }
            SettingsEdit::LlmProvider(provider) => self.llm.provider = provider,
            SettingsEdit::LlmApiKey(key) => {
                let active = self.llm.active_mut("llm.api_key", "****")?;
                active.api_key = key;
            }
            SettingsEdit::LlmBaseUrl(raw) => {
                let parsed = url::Url::parse(&raw)
                    .map_err(|err| SettingsError::invalid("llm.base_url", &raw, err.to_string()))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(SettingsError::invalid(
                        "llm.base_url",
                        raw,
                        "expected an http or https url",
                    ));
                }
                let active = self.llm.active_mut("llm.base_url", &raw)?;
                active.base_url = raw;
            }
            SettingsEdit::LlmModel(model) => {
                if model.trim().is_empty() {
                    return Err(SettingsError::invalid("llm.model", model, "must not be empty"));
                }
                let active = self.llm.active_mut("llm.model", &model)?;
                active.model = model;
            }
            SettingsEdit::WorkerProgram(program) => {
                if program.trim().is_empty() {
                    return Err(SettingsError::invalid(
                        "worker.program",
                        program,
                        "must not be empty",
                    ));
                }
                self.worker.program = program;
            }
            SettingsEdit::WorkerArgs(args) => self.worker.args = args,
            SettingsEdit::OutputDir(dir) => {
                if dir.as_os_str().is_empty() {
                    return Err(SettingsError::invalid("output_dir", "", "must not be empty"));
                }
                self.output_dir = dir;
            }
            SettingsEdit::ConsoleMaxLines(lines) => {
                if lines == 0 {
                    return Err(SettingsError::invalid(
                        "console_max_lines",
                        "0",
                        "must be at least 1",
                    ));
                }
                self.console_max_lines = lines;
                self.display_log_lines = self.display_log_lines.min(lines);
            }
            SettingsEdit::DisplayLogLines(lines) => {
                if lines == 0 || lines > self.console_max_lines {
                    return Err(SettingsError::invalid(
                        "display_log_lines",
                        lines.to_string(),
                        format!("must be between 1 and {}", self.console_max_lines),
                    ));
                }
                self.display_log_lines = lines;
            }
            SettingsEdit::ResetToDefaults => *self = Settings::default(),
        }
        Ok(())
    }
}
