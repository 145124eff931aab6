use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{info, warn};

use super::{
    Article, BiasAnalysis, BiasRecord, Changepoint, EventCatalog, FillPolicy, PeltConfig,
    SkipReason, SourceBiasResult, assign_baselines, detect, resample_weekly, score_bias,
};

pub const DEFAULT_MIN_WEEKS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub pelt: PeltConfig,
    pub min_weeks: usize,
    pub fill: FillPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pelt: PeltConfig::default(),
            min_weeks: DEFAULT_MIN_WEEKS,
            fill: FillPolicy::default(),
        }
    }
}

/// Runs the full bias pipeline over `articles`.
///
/// Sources are analysed independently; a source that is too sparse or whose
/// series cannot be segmented lands in `skipped` and never affects the rest.
pub fn analyze_bias(
    articles: &[Article],
    catalog: &EventCatalog,
    config: &AnalysisConfig,
) -> BiasAnalysis {
    let baselines = assign_baselines(articles);
    let (records, dropped_without_baseline) = score_bias(articles, &baselines);
    if dropped_without_baseline > 0 {
        warn!(
            dropped = dropped_without_baseline,
            "dropped articles without a computable baseline"
        );
    }
    info!(
        articles = articles.len(),
        scored = records.len(),
        "computed bias scores"
    );

    let mut by_source = BTreeMap::<&str, Vec<&BiasRecord>>::new();
    for record in &records {
        by_source
            .entry(record.source.as_str())
            .or_default()
            .push(record);
    }

    let outcomes = by_source
        .into_par_iter()
        .map(|(source, source_records)| {
            let outcome = analyze_source(source, &source_records, catalog, config);
            (source.to_string(), outcome)
        })
        .collect::<Vec<(String, Result<SourceBiasResult, SkipReason>)>>();

    let mut analysis = BiasAnalysis {
        dropped_without_baseline,
        ..BiasAnalysis::default()
    };
    for (source, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                info!(
                    source = %source,
                    overall_bias = result.overall_bias_score,
                    weeks = result.weeks,
                    changepoints = result.changepoints.len(),
                    "analysed source"
                );
                analysis.results.insert(source, result);
            }
            Err(reason) => {
                warn!(source = %source, reason = %reason.describe(), "skipped source");
                analysis.skipped.insert(source, reason);
            }
        }
    }

    analysis
}

pub(super) fn analyze_source(
    source: &str,
    records: &[&BiasRecord],
    catalog: &EventCatalog,
    config: &AnalysisConfig,
) -> Result<SourceBiasResult, SkipReason> {
    let series = resample_weekly(records, config.fill);
    if series.len() < config.min_weeks {
        return Err(SkipReason::InsufficientData {
            weeks: series.len(),
            required: config.min_weeks,
        });
    }

    let breakpoints =
        detect(&series.values(), &config.pelt).map_err(|err| SkipReason::AlgorithmFailure {
            message: err.to_string(),
        })?;

    let interior = breakpoints.split_last().map(|(_, rest)| rest).unwrap_or(&[]);
    let mut changepoints = Vec::with_capacity(interior.len());
    for &index in interior {
        let Some(date) = series.week_start_at(index) else {
            return Err(SkipReason::AlgorithmFailure {
                message: format!("breakpoint {index} is outside the weekly series"),
            });
        };
        changepoints.push(Changepoint {
            date,
            correlated_event: catalog.correlate(date).map(|event| event.name.clone()),
        });
    }

    let overall_bias_score =
        records.iter().map(|record| record.bias).sum::<f64>() / records.len() as f64;

    Ok(SourceBiasResult {
        source: source.to_string(),
        overall_bias_score,
        weeks: series.len(),
        weekly_bias: series.points,
        changepoints,
    })
}
