//! Editable job forms and the immutable descriptors validated from them.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::params::{ChartKind, CleaningOptions, DistanceMetric, ModelParams};
use crate::settings::{HardwarePreference, Settings};
use crate::Slot;

/// Input formats the external parser understands.
pub const SUPPORTED_INPUT_EXTENSIONS: [&str; 4] = ["csv", "xlsx", "xls", "txt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Present,
    /// A regular file of length zero.
    Empty,
    Missing,
    NotAFile,
}

/// A user-chosen path together with what the filesystem said about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub status: FileStatus,
}

impl InputFile {
    pub fn new(path: impl Into<PathBuf>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRoles {
    pub text: String,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DraftField {
    Input,
    TextColumn,
    TimestampColumn,
    EmbeddingModel,
    UmapNeighbors,
    UmapComponents,
    UmapMinDist,
    UmapMetric,
    HdbscanMinClusterSize,
    HdbscanMinSamples,
    HdbscanMetric,
    TopNWords,
    MinTopicSize,
    NrTopics,
    NgramRange,
    CalculateProbabilities,
    MinTextLength,
    RemoveUrls,
    RemoveEmails,
    RemovePunctuation,
    Lowercase,
    Segment,
    RemoveStopwords,
    StopwordsPath,
    CustomDictPath,
    Charts,
}

impl DraftField {
    pub const ALL: [DraftField; 26] = [
        DraftField::Input,
        DraftField::TextColumn,
        DraftField::TimestampColumn,
        DraftField::EmbeddingModel,
        DraftField::UmapNeighbors,
        DraftField::UmapComponents,
        DraftField::UmapMinDist,
        DraftField::UmapMetric,
        DraftField::HdbscanMinClusterSize,
        DraftField::HdbscanMinSamples,
        DraftField::HdbscanMetric,
        DraftField::TopNWords,
        DraftField::MinTopicSize,
        DraftField::NrTopics,
        DraftField::NgramRange,
        DraftField::CalculateProbabilities,
        DraftField::MinTextLength,
        DraftField::RemoveUrls,
        DraftField::RemoveEmails,
        DraftField::RemovePunctuation,
        DraftField::Lowercase,
        DraftField::Segment,
        DraftField::RemoveStopwords,
        DraftField::StopwordsPath,
        DraftField::CustomDictPath,
        DraftField::Charts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DraftField::Input => "input",
            DraftField::TextColumn => "text_column",
            DraftField::TimestampColumn => "timestamp_column",
            DraftField::EmbeddingModel => "embedding_model",
            DraftField::UmapNeighbors => "umap.n_neighbors",
            DraftField::UmapComponents => "umap.n_components",
            DraftField::UmapMinDist => "umap.min_dist",
            DraftField::UmapMetric => "umap.metric",
            DraftField::HdbscanMinClusterSize => "hdbscan.min_cluster_size",
            DraftField::HdbscanMinSamples => "hdbscan.min_samples",
            DraftField::HdbscanMetric => "hdbscan.metric",
            DraftField::TopNWords => "top_n_words",
            DraftField::MinTopicSize => "min_topic_size",
            DraftField::NrTopics => "nr_topics",
            DraftField::NgramRange => "ngram_range",
            DraftField::CalculateProbabilities => "calculate_probabilities",
            DraftField::MinTextLength => "cleaning.min_text_length",
            DraftField::RemoveUrls => "cleaning.remove_urls",
            DraftField::RemoveEmails => "cleaning.remove_emails",
            DraftField::RemovePunctuation => "cleaning.remove_punctuation",
            DraftField::Lowercase => "cleaning.lowercase",
            DraftField::Segment => "cleaning.segment",
            DraftField::RemoveStopwords => "cleaning.remove_stopwords",
            DraftField::StopwordsPath => "cleaning.stopwords_path",
            DraftField::CustomDictPath => "cleaning.custom_dict_path",
            DraftField::Charts => "charts",
        }
    }

    /// Fields holding a path that the platform checks on disk before use.
    pub fn is_file_path(self) -> bool {
        matches!(self, DraftField::StopwordsPath | DraftField::CustomDictPath)
    }

    /// Whether the field belongs to the form of `slot`.
    pub fn applies_to(self, slot: Slot) -> bool {
        match self {
            DraftField::Charts => slot == Slot::Visualization,
            DraftField::Segment
            | DraftField::RemoveStopwords
            | DraftField::StopwordsPath
            | DraftField::CustomDictPath => slot == Slot::Preprocess,
            DraftField::EmbeddingModel
            | DraftField::UmapNeighbors
            | DraftField::UmapComponents
            | DraftField::UmapMinDist
            | DraftField::UmapMetric
            | DraftField::HdbscanMinClusterSize
            | DraftField::HdbscanMinSamples
            | DraftField::HdbscanMetric
            | DraftField::TopNWords
            | DraftField::MinTopicSize
            | DraftField::NrTopics
            | DraftField::NgramRange
            | DraftField::CalculateProbabilities => slot.needs_model(),
            _ => true,
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DraftField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.name() == wanted)
            .ok_or_else(|| format!("unknown field '{}'", s.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field} is required")]
    Missing { field: DraftField },
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: DraftField,
        value: String,
        min: String,
        max: String,
    },
    #[error("{field}: cannot parse {value:?}")]
    Unparseable { field: DraftField, value: String },
    #[error("{field}: {reason}")]
    Invalid { field: DraftField, reason: String },
}

impl FieldError {
    pub fn field(&self) -> DraftField {
        match self {
            FieldError::Missing { field }
            | FieldError::OutOfRange { field, .. }
            | FieldError::Unparseable { field, .. }
            | FieldError::Invalid { field, .. } => *field,
        }
    }

    fn invalid(field: DraftField, reason: impl Into<String>) -> Self {
        FieldError::Invalid {
            field,
            reason: reason.into(),
        }
    }

    fn unparseable(field: DraftField, value: &str) -> Self {
        FieldError::Unparseable {
            field,
            value: value.to_string(),
        }
    }
}

/// Every problem found in a draft. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn fields(&self) -> Vec<DraftField> {
        self.0.iter().map(FieldError::field).collect()
    }

    pub fn contains(&self, field: DraftField) -> bool {
        self.0.iter().any(|err| err.field() == field)
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid field(s)", self.0.len())?;
        for (idx, err) in self.0.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { "; " };
            write!(f, "{sep}{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// The editable form of one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDraft {
    pub input: Option<InputFile>,
    pub text_column: String,
    pub timestamp_column: Option<String>,
    pub params: ModelParams,
    pub cleaning: CleaningOptions,
    pub charts: Vec<ChartKind>,
    parse_errors: BTreeMap<DraftField, FieldError>,
    /// What the filesystem said about each set cleaning path.
    file_status: BTreeMap<DraftField, FileStatus>,
}

impl JobDraft {
    /// A fresh form pre-filled with the configured defaults.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            input: None,
            text_column: String::new(),
            timestamp_column: None,
            params: settings.defaults.clone(),
            cleaning: settings.cleaning.clone(),
            charts: ChartKind::default_selection(),
            parse_errors: BTreeMap::new(),
            file_status: BTreeMap::new(),
        }
    }

    pub fn set_input(&mut self, input: InputFile) {
        self.input = Some(input);
    }

    /// Sets a cleaning path field to a file the platform has already checked.
    /// An unusable file is kept and reported like a failed edit.
    pub fn set_file(&mut self, field: DraftField, file: InputFile) -> Result<(), FieldError> {
        let slot = self
            .path_slot(field)
            .ok_or_else(|| FieldError::invalid(field, "does not take a file"))?;
        *slot = Some(file.path);
        self.file_status.insert(field, file.status);
        match self.file_error(field) {
            Some(err) => {
                self.parse_errors.insert(field, err.clone());
                Err(err)
            }
            None => {
                self.parse_errors.remove(&field);
                Ok(())
            }
        }
    }

    fn path_slot(&mut self, field: DraftField) -> Option<&mut Option<PathBuf>> {
        match field {
            DraftField::StopwordsPath => Some(&mut self.cleaning.stopwords_path),
            DraftField::CustomDictPath => Some(&mut self.cleaning.custom_dict_path),
            _ => None,
        }
    }

    /// Errors left behind by edits that could not be parsed.
    pub fn pending_errors(&self) -> impl Iterator<Item = &FieldError> {
        self.parse_errors.values()
    }

    /// Current value of `field`, written the way `set_field` accepts it.
    pub fn display_value(&self, field: DraftField) -> String {
        let flag = |value: bool| if value { "yes" } else { "no" }.to_string();
        match field {
            DraftField::Input => self
                .input
                .as_ref()
                .map(|input| input.path.display().to_string())
                .unwrap_or_default(),
            DraftField::TextColumn => self.text_column.clone(),
            DraftField::TimestampColumn => self.timestamp_column.clone().unwrap_or_default(),
            DraftField::EmbeddingModel => self.params.embedding_model.clone(),
            DraftField::UmapNeighbors => self.params.umap.n_neighbors.to_string(),
            DraftField::UmapComponents => self.params.umap.n_components.to_string(),
            DraftField::UmapMinDist => self.params.umap.min_dist.to_string(),
            DraftField::UmapMetric => self.params.umap.metric.to_string(),
            DraftField::HdbscanMinClusterSize => self.params.hdbscan.min_cluster_size.to_string(),
            DraftField::HdbscanMinSamples => self.params.hdbscan.min_samples.to_string(),
            DraftField::HdbscanMetric => self.params.hdbscan.metric.to_string(),
            DraftField::TopNWords => self.params.top_n_words.to_string(),
            DraftField::MinTopicSize => self.params.min_topic_size.to_string(),
            DraftField::NrTopics => self
                .params
                .nr_topics
                .map_or_else(|| "auto".to_string(), |n| n.to_string()),
            DraftField::NgramRange => {
                let (low, high) = self.params.ngram_range;
                format!("{low}-{high}")
            }
            DraftField::CalculateProbabilities => flag(self.params.calculate_probabilities),
            DraftField::MinTextLength => self.cleaning.min_text_length.to_string(),
            DraftField::RemoveUrls => flag(self.cleaning.remove_urls),
            DraftField::RemoveEmails => flag(self.cleaning.remove_emails),
            DraftField::RemovePunctuation => flag(self.cleaning.remove_punctuation),
            DraftField::Lowercase => flag(self.cleaning.lowercase),
            DraftField::Segment => flag(self.cleaning.segment),
            DraftField::RemoveStopwords => flag(self.cleaning.remove_stopwords),
            DraftField::StopwordsPath => display_path(self.cleaning.stopwords_path.as_deref()),
            DraftField::CustomDictPath => display_path(self.cleaning.custom_dict_path.as_deref()),
            DraftField::Charts => self
                .charts
                .iter()
                .map(|chart| chart.id())
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Parses `raw` into `field`. A failed parse leaves the previous value in
    /// place and is remembered until the field is edited successfully.
    pub fn set_field(&mut self, field: DraftField, raw: &str) -> Result<(), FieldError> {
        match self.apply_field(field, raw) {
            Ok(()) => {
                self.parse_errors.remove(&field);
                Ok(())
            }
            Err(err) => {
                self.parse_errors.insert(field, err.clone());
                Err(err)
            }
        }
    }

    fn apply_field(&mut self, field: DraftField, raw: &str) -> Result<(), FieldError> {
        let value = raw.trim();
        match field {
            DraftField::Input => {
                return Err(FieldError::invalid(
                    field,
                    "choose the input file with the input command",
                ))
            }
            DraftField::TextColumn => self.text_column = value.to_string(),
            DraftField::TimestampColumn => {
                self.timestamp_column = match value {
                    "" | "none" => None,
                    column => Some(column.to_string()),
                }
            }
            DraftField::EmbeddingModel => self.params.embedding_model = value.to_string(),
            DraftField::UmapNeighbors => self.params.umap.n_neighbors = parse_number(field, value)?,
            DraftField::UmapComponents => {
                self.params.umap.n_components = parse_number(field, value)?
            }
            DraftField::UmapMinDist => {
                let dist: f64 = parse_number(field, value)?;
                if !dist.is_finite() {
                    return Err(FieldError::unparseable(field, value));
                }
                self.params.umap.min_dist = dist;
            }
            DraftField::UmapMetric => self.params.umap.metric = parse_metric(field, value)?,
            DraftField::HdbscanMinClusterSize => {
                self.params.hdbscan.min_cluster_size = parse_number(field, value)?
            }
            DraftField::HdbscanMinSamples => {
                self.params.hdbscan.min_samples = parse_number(field, value)?
            }
            DraftField::HdbscanMetric => self.params.hdbscan.metric = parse_metric(field, value)?,
            DraftField::TopNWords => self.params.top_n_words = parse_number(field, value)?,
            DraftField::MinTopicSize => self.params.min_topic_size = parse_number(field, value)?,
            DraftField::NrTopics => {
                self.params.nr_topics = match value {
                    "" | "auto" | "0" => None,
                    other => Some(parse_number(field, other)?),
                }
            }
            DraftField::NgramRange => self.params.ngram_range = parse_ngram(field, value)?,
            DraftField::CalculateProbabilities => {
                self.params.calculate_probabilities = parse_flag(field, value)?
            }
            DraftField::MinTextLength => {
                self.cleaning.min_text_length = parse_number(field, value)?
            }
            DraftField::RemoveUrls => self.cleaning.remove_urls = parse_flag(field, value)?,
            DraftField::RemoveEmails => self.cleaning.remove_emails = parse_flag(field, value)?,
            DraftField::RemovePunctuation => {
                self.cleaning.remove_punctuation = parse_flag(field, value)?
            }
            DraftField::Lowercase => self.cleaning.lowercase = parse_flag(field, value)?,
            DraftField::Segment => self.cleaning.segment = parse_flag(field, value)?,
            DraftField::RemoveStopwords => {
                self.cleaning.remove_stopwords = parse_flag(field, value)?
            }
            DraftField::StopwordsPath | DraftField::CustomDictPath => {
                let path = match value {
                    "" | "none" => None,
                    path => Some(PathBuf::from(path)),
                };
                // Unchecked until the platform reports the file's status.
                self.file_status.remove(&field);
                if let Some(slot) = self.path_slot(field) {
                    *slot = path;
                }
            }
            DraftField::Charts => self.charts = parse_charts(field, value)?,
        }
        Ok(())
    }

    /// Checks every field relevant to `slot` and, if all pass, snapshots the
    /// form into an immutable descriptor.
    pub fn validate(
        &self,
        slot: Slot,
        hardware: HardwarePreference,
    ) -> Result<JobDescriptor, ValidationErrors> {
        let mut errors: Vec<FieldError> = self.parse_errors.values().cloned().collect();

        let input = self.check_input(&mut errors);

        let text = self.text_column.trim();
        if text.is_empty() {
            errors.push(FieldError::Missing {
                field: DraftField::TextColumn,
            });
        }
        let timestamp = self
            .timestamp_column
            .as_deref()
            .map(str::trim)
            .filter(|column| !column.is_empty());
        if let Some(column) = timestamp {
            if !text.is_empty() && column == text {
                errors.push(FieldError::invalid(
                    DraftField::TimestampColumn,
                    "must differ from the text column",
                ));
            }
        }

        check_range(
            &mut errors,
            DraftField::MinTextLength,
            self.cleaning.min_text_length,
            1,
            10_000,
        );

        if slot == Slot::Preprocess {
            for field in [DraftField::StopwordsPath, DraftField::CustomDictPath] {
                if !self.parse_errors.contains_key(&field) {
                    errors.extend(self.file_error(field));
                }
            }
        }

        if slot.needs_model() {
            check_params(&self.params, &mut errors);
        }

        let charts = if slot == Slot::Visualization {
            if self.charts.is_empty() {
                errors.push(FieldError::Missing {
                    field: DraftField::Charts,
                });
            }
            if timestamp.is_none() {
                if let Some(chart) = self.charts.iter().find(|c| c.requires_timestamps()) {
                    errors.push(FieldError::invalid(
                        DraftField::Charts,
                        format!("{chart} needs a timestamp column"),
                    ));
                }
            }
            self.charts.clone()
        } else {
            Vec::new()
        };

        match input {
            Some(input) if errors.is_empty() => Ok(JobDescriptor {
                slot,
                input,
                columns: ColumnRoles {
                    text: text.to_string(),
                    timestamp: timestamp.map(str::to_string),
                },
                params: slot.needs_model().then(|| self.params.clone()),
                cleaning: self.cleaning.clone(),
                charts,
                hardware,
            }),
            _ => Err(ValidationErrors(errors)),
        }
    }

    fn check_input(&self, errors: &mut Vec<FieldError>) -> Option<PathBuf> {
        let field = DraftField::Input;
        let Some(file) = &self.input else {
            errors.push(FieldError::Missing { field });
            return None;
        };
        match file.status {
            FileStatus::Missing => {
                errors.push(FieldError::invalid(
                    field,
                    format!("file does not exist: {}", file.path.display()),
                ));
                None
            }
            FileStatus::NotAFile => {
                errors.push(FieldError::invalid(
                    field,
                    format!("path is not a file: {}", file.path.display()),
                ));
                None
            }
            FileStatus::Present | FileStatus::Empty if !has_supported_extension(&file.path) => {
                errors.push(FieldError::invalid(
                    field,
                    format!(
                        "unsupported file format, expected one of: {}",
                        SUPPORTED_INPUT_EXTENSIONS.join(", ")
                    ),
                ));
                None
            }
            FileStatus::Present | FileStatus::Empty => Some(file.path.clone()),
        }
    }

    /// An optional cleaning file must, once set, be an existing non-empty file.
    fn file_error(&self, field: DraftField) -> Option<FieldError> {
        let path = match field {
            DraftField::StopwordsPath => self.cleaning.stopwords_path.as_deref(),
            DraftField::CustomDictPath => self.cleaning.custom_dict_path.as_deref(),
            _ => None,
        }?;
        let reason = match self.file_status.get(&field) {
            Some(FileStatus::Present) => return None,
            Some(FileStatus::Empty) => format!("file is empty: {}", path.display()),
            Some(FileStatus::Missing) => format!("file does not exist: {}", path.display()),
            Some(FileStatus::NotAFile) => format!("path is not a file: {}", path.display()),
            None => format!("file has not been checked: {}", path.display()),
        };
        Some(FieldError::invalid(field, reason))
    }
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|path| path.display().to_string()).unwrap_or_default()
}

pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_INPUT_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn check_params(params: &ModelParams, errors: &mut Vec<FieldError>) {
    if params.embedding_model.trim().is_empty() {
        errors.push(FieldError::Missing {
            field: DraftField::EmbeddingModel,
        });
    }
    check_range(errors, DraftField::UmapNeighbors, params.umap.n_neighbors, 2, 200);
    check_range(errors, DraftField::UmapComponents, params.umap.n_components, 2, 100);
    check_range(errors, DraftField::UmapMinDist, params.umap.min_dist, 0.0, 1.0);
    check_range(
        errors,
        DraftField::HdbscanMinClusterSize,
        params.hdbscan.min_cluster_size,
        2,
        500,
    );
    check_range(
        errors,
        DraftField::HdbscanMinSamples,
        params.hdbscan.min_samples,
        1,
        100,
    );
    check_range(errors, DraftField::TopNWords, params.top_n_words, 5, 50);
    check_range(errors, DraftField::MinTopicSize, params.min_topic_size, 2, 100);
    if let Some(topics) = params.nr_topics {
        check_range(errors, DraftField::NrTopics, topics, 2, 1000);
    }
    let (low, high) = params.ngram_range;
    if low < 1 || low > high || high > 3 {
        errors.push(FieldError::invalid(
            DraftField::NgramRange,
            format!("expected 1 <= low <= high <= 3, got {low}-{high}"),
        ));
    }
}

fn check_range<T>(errors: &mut Vec<FieldError>, field: DraftField, value: T, min: T, max: T)
where
    T: PartialOrd + fmt::Display,
{
    if value < min || value > max {
        errors.push(FieldError::OutOfRange {
            field,
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }
}

fn parse_number<T: FromStr>(field: DraftField, value: &str) -> Result<T, FieldError> {
    value
        .parse()
        .map_err(|_| FieldError::unparseable(field, value))
}

fn parse_metric(field: DraftField, value: &str) -> Result<DistanceMetric, FieldError> {
    value
        .parse()
        .map_err(|_| FieldError::unparseable(field, value))
}

fn parse_flag(field: DraftField, value: &str) -> Result<bool, FieldError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(FieldError::unparseable(field, value)),
    }
}

fn parse_ngram(field: DraftField, value: &str) -> Result<(u32, u32), FieldError> {
    let (low, high) = value
        .split_once("..")
        .or_else(|| value.split_once('-'))
        .or_else(|| value.split_once(','))
        .ok_or_else(|| FieldError::unparseable(field, value))?;
    Ok((
        parse_number(field, low.trim())?,
        parse_number(field, high.trim())?,
    ))
}

fn parse_charts(field: DraftField, value: &str) -> Result<Vec<ChartKind>, FieldError> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(ChartKind::ALL.to_vec());
    }
    let mut charts = Vec::new();
    for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let chart: ChartKind = name
            .parse()
            .map_err(|_| FieldError::unparseable(field, name))?;
        if !charts.contains(&chart) {
            charts.push(chart);
        }
    }
    Ok(charts)
}

/// Validated, immutable input bundle for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDescriptor {
    slot: Slot,
    input: PathBuf,
    columns: ColumnRoles,
    params: Option<ModelParams>,
    cleaning: CleaningOptions,
    charts: Vec<ChartKind>,
    hardware: HardwarePreference,
}

impl JobDescriptor {
    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn columns(&self) -> &ColumnRoles {
        &self.columns
    }

    /// Model parameters; absent for preprocessing jobs.
    pub fn params(&self) -> Option<&ModelParams> {
        self.params.as_ref()
    }

    pub fn cleaning(&self) -> &CleaningOptions {
        &self.cleaning
    }

    pub fn charts(&self) -> &[ChartKind] {
        &self.charts
    }

    pub fn hardware(&self) -> HardwarePreference {
        self.hardware
    }

    /// Task name understood by the worker.
    pub fn task(&self) -> &'static str {
        self.slot.name()
    }
}
