use serde::{Deserialize, Serialize};

use crate::bias::{BiasAnalysis, Event, SourceBiasResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub filename: String,
    pub source: String,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub source_count: usize,
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestPaths {
    pub data_dir: String,
    pub manifest_dir: String,
    pub inventory_manifest_path: String,
    pub db_path: String,
    pub topic_info_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestCounts {
    pub source_count: usize,
    pub lines_read: usize,
    pub lines_undecodable: usize,
    pub rows_missing_fields: usize,
    pub rows_invalid_date: usize,
    pub rows_duplicate_body: usize,
    pub rows_short_body: usize,
    pub articles_stored: usize,
    pub topics_stored: usize,
    pub noise_topic_articles: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub paths: IngestPaths,
    pub counts: IngestCounts,
    pub source_hashes: Vec<SourceEntry>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSettings {
    pub penalty: f64,
    pub min_segment_size: usize,
    pub jump: usize,
    pub min_weeks: usize,
    pub fill_policy: String,
    pub event_window_days: i64,
    pub event_catalog: String,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedSource {
    pub source: String,
    pub reason: String,
}

/// JSON form of a bias analysis run, ranked the same way as the text report.
#[derive(Debug, Clone, Serialize)]
pub struct BiasAnalysisReport<'a> {
    pub manifest_version: u32,
    pub run_id: String,
    pub generated_at: String,
    pub settings: AnalysisSettings,
    pub article_count: usize,
    pub dropped_without_baseline: usize,
    pub ranked_sources: Vec<&'a SourceBiasResult>,
    pub skipped_sources: Vec<SkippedSource>,
}

impl<'a> BiasAnalysisReport<'a> {
    pub fn new(
        run_id: String,
        generated_at: String,
        settings: AnalysisSettings,
        article_count: usize,
        analysis: &'a BiasAnalysis,
    ) -> Self {
        Self {
            manifest_version: 1,
            run_id,
            generated_at,
            settings,
            article_count,
            dropped_without_baseline: analysis.dropped_without_baseline,
            ranked_sources: analysis.ranked(),
            skipped_sources: analysis
                .skipped
                .iter()
                .map(|(source, reason)| SkippedSource {
                    source: source.clone(),
                    reason: reason.describe(),
                })
                .collect(),
        }
    }
}
