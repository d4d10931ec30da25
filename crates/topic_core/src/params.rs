use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_EMBEDDING_MODEL: &str =
    "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    Cosine,
    Euclidean,
    Manhattan,
}

impl DistanceMetric {
    pub fn name(self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Manhattan => "manhattan",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceMetric {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" => Ok(DistanceMetric::Euclidean),
            "manhattan" => Ok(DistanceMetric::Manhattan),
            _ => Err(()),
        }
    }
}

/// Dimensionality reduction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UmapParams {
    pub n_neighbors: u32,
    pub n_components: u32,
    pub min_dist: f64,
    pub metric: DistanceMetric,
}

impl Default for UmapParams {
    fn default() -> Self {
        Self {
            n_neighbors: 15,
            n_components: 5,
            min_dist: 0.0,
            metric: DistanceMetric::Cosine,
        }
    }
}

/// Clustering parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdbscanParams {
    pub min_cluster_size: u32,
    pub min_samples: u32,
    pub metric: DistanceMetric,
}

impl Default for HdbscanParams {
    fn default() -> Self {
        Self {
            min_cluster_size: 10,
            min_samples: 10,
            metric: DistanceMetric::Euclidean,
        }
    }
}

/// Algorithm parameters handed to the topic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub embedding_model: String,
    pub umap: UmapParams,
    pub hdbscan: HdbscanParams,
    pub top_n_words: u32,
    pub min_topic_size: u32,
    /// `None` lets the model pick the number of topics.
    pub nr_topics: Option<u32>,
    pub ngram_range: (u32, u32),
    pub calculate_probabilities: bool,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            umap: UmapParams::default(),
            hdbscan: HdbscanParams::default(),
            top_n_words: 10,
            min_topic_size: 10,
            nr_topics: None,
            ngram_range: (1, 2),
            calculate_probabilities: false,
        }
    }
}

/// Text cleaning switches used by the preprocessing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningOptions {
    pub remove_urls: bool,
    pub remove_emails: bool,
    pub remove_punctuation: bool,
    pub lowercase: bool,
    pub min_text_length: u32,
    /// Word segmentation before stopword removal.
    pub segment: bool,
    pub remove_stopwords: bool,
    /// One stopword per line; the worker's built-in list when unset.
    pub stopwords_path: Option<PathBuf>,
    /// Extra dictionary for the segmenter.
    pub custom_dict_path: Option<PathBuf>,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            remove_urls: true,
            remove_emails: true,
            remove_punctuation: true,
            lowercase: true,
            min_text_length: 10,
            segment: true,
            remove_stopwords: true,
            stopwords_path: None,
            custom_dict_path: None,
        }
    }
}

/// Chart types a visualization job can export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Topics,
    Hierarchy,
    Barchart,
    Documents,
    Heatmap,
    TermRank,
    TopicsOverTime,
}

impl ChartKind {
    pub const ALL: [ChartKind; 7] = [
        ChartKind::Topics,
        ChartKind::Hierarchy,
        ChartKind::Barchart,
        ChartKind::Documents,
        ChartKind::Heatmap,
        ChartKind::TermRank,
        ChartKind::TopicsOverTime,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ChartKind::Topics => "topics",
            ChartKind::Hierarchy => "hierarchy",
            ChartKind::Barchart => "barchart",
            ChartKind::Documents => "documents",
            ChartKind::Heatmap => "heatmap",
            ChartKind::TermRank => "term_rank",
            ChartKind::TopicsOverTime => "topics_over_time",
        }
    }

    pub fn requires_timestamps(self) -> bool {
        matches!(self, ChartKind::TopicsOverTime)
    }

    /// Charts selected on a fresh form: everything that works without timestamps.
    pub fn default_selection() -> Vec<ChartKind> {
        Self::ALL
            .into_iter()
            .filter(|chart| !chart.requires_timestamps())
            .collect()
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ChartKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|chart| chart.id() == wanted)
            .ok_or(())
    }
}
