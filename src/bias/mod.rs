//! Bias scoring and event correlation over the annotated article table.
//!
//! The flow is strictly downstream: baselines per (region, topic, month),
//! bias per article, a weekly bias series per source, changepoints on that
//! series and finally an event attribution per changepoint.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

mod analysis;
mod baseline;
mod changepoint;
mod events;
mod weekly;

pub use analysis::{AnalysisConfig, analyze_bias};
pub use baseline::{assign_baselines, score_bias};
pub use changepoint::{PeltConfig, detect};
pub use events::{Event, EventCatalog};
pub use weekly::{FillPolicy, WeeklyPoint, resample_weekly};

/// One row of the annotated article table as the analysis consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub source: String,
    pub region: String,
    pub topic: i64,
    pub sentiment: f64,
    pub date_published: NaiveDate,
}

#[derive(Debug, Error, PartialEq)]
pub enum ArticleError {
    #[error("article row {row} is missing required field `{field}`")]
    MissingField { row: usize, field: &'static str },
    #[error("article row {row} has an unparseable date_published: {value}")]
    InvalidDate { row: usize, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BiasRecord {
    pub source: String,
    pub date_published: NaiveDate,
    pub sentiment: f64,
    pub baseline: f64,
    pub bias: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Changepoint {
    pub date: NaiveDate,
    pub correlated_event: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceBiasResult {
    pub source: String,
    pub overall_bias_score: f64,
    pub weeks: usize,
    pub weekly_bias: Vec<WeeklyPoint>,
    pub changepoints: Vec<Changepoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientData { weeks: usize, required: usize },
    AlgorithmFailure { message: String },
}

impl SkipReason {
    pub fn describe(&self) -> String {
        match self {
            Self::InsufficientData { weeks, required } => format!(
                "insufficient data ({weeks} weekly points, at least {required} required)"
            ),
            Self::AlgorithmFailure { message } => {
                format!("changepoint detection failed: {message}")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BiasAnalysis {
    pub results: std::collections::BTreeMap<String, SourceBiasResult>,
    pub skipped: std::collections::BTreeMap<String, SkipReason>,
    pub dropped_without_baseline: usize,
}

impl BiasAnalysis {
    /// Results ordered from most positively to most negatively biased.
    pub fn ranked(&self) -> Vec<&SourceBiasResult> {
        let mut ranked = self.results.values().collect::<Vec<&SourceBiasResult>>();
        ranked.sort_by(|left, right| {
            right
                .overall_bias_score
                .total_cmp(&left.overall_bias_score)
                .then_with(|| left.source.cmp(&right.source))
        });
        ranked
    }
}
