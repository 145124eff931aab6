use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::info;

use super::aggregate::{aggregate, top_topics_per_source};
use super::report::{write_bias_report, write_top_topics_report};
use crate::bias::{AnalysisConfig, EventCatalog, PeltConfig, analyze_bias};
use crate::cli::AnalyzeArgs;
use crate::model::{AnalysisSettings, BiasAnalysisReport};
use crate::store;
use crate::topics::TopicNames;
use crate::util::{create_text_file, now_utc_string, utc_compact_string, write_json_pretty};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    validate_args(&args)?;

    let run_id = format!("analyze-{}", utc_compact_string(Utc::now()));
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("articles.sqlite"));
    let reports_dir = args
        .reports_dir
        .clone()
        .unwrap_or_else(|| args.cache_root.join("reports"));

    if !db_path.exists() {
        bail!(
            "article store not found at {}; run `climate-bias ingest` first",
            db_path.display()
        );
    }

    info!(db_path = %db_path.display(), run_id = %run_id, "starting analysis");

    let connection = store::open_read_only(&db_path)?;
    let articles = store::load_articles(&connection)
        .with_context(|| format!("failed to load articles from {}", db_path.display()))?;
    let topic_info = store::load_topics(&connection)?;
    if articles.is_empty() {
        bail!("article store {} holds no articles", db_path.display());
    }
    let names = TopicNames::from_info(&topic_info);
    info!(
        articles = articles.len(),
        topics = topic_info.len(),
        "loaded article store"
    );

    let aggregates = aggregate(&articles, &names);
    let aggregates_path = reports_dir.join("aggregates.json");
    write_json_pretty(&aggregates_path, &aggregates)?;
    info!(path = %aggregates_path.display(), "wrote aggregates");

    let top_topics = top_topics_per_source(&articles, &names, args.top_topics);
    let top_topics_path = reports_dir.join("top_topics_per_source.txt");
    let mut output = create_text_file(&top_topics_path)?;
    write_top_topics_report(&mut output, &top_topics, args.top_topics)?;
    output
        .flush()
        .with_context(|| format!("failed to flush {}", top_topics_path.display()))?;
    info!(
        path = %top_topics_path.display(),
        sources = top_topics.len(),
        "wrote top topics report"
    );

    let (catalog, catalog_label) = match &args.events_path {
        Some(path) => (EventCatalog::load(path)?, path.display().to_string()),
        None => (EventCatalog::builtin(), "builtin".to_string()),
    };
    let catalog = catalog.with_window_days(args.event_window_days);
    info!(
        catalog = %catalog_label,
        events = catalog.len(),
        window_days = catalog.window_days(),
        "loaded event catalog"
    );

    let config = AnalysisConfig {
        pelt: PeltConfig {
            penalty: args.penalty,
            min_size: args.min_segment_size,
            jump: args.jump,
        },
        min_weeks: args.min_weeks,
        fill: args.fill_policy,
    };
    let analysis = analyze_bias(&articles, &catalog, &config);

    let report_path = reports_dir.join("bias_report.txt");
    let mut output = create_text_file(&report_path)?;
    write_bias_report(&mut output, &analysis)?;
    output
        .flush()
        .with_context(|| format!("failed to flush {}", report_path.display()))?;
    info!(path = %report_path.display(), "wrote bias report");

    let settings = AnalysisSettings {
        penalty: args.penalty,
        min_segment_size: args.min_segment_size,
        jump: args.jump,
        min_weeks: args.min_weeks,
        fill_policy: args.fill_policy.as_str().to_string(),
        event_window_days: args.event_window_days,
        event_catalog: catalog_label,
        events: catalog.events().to_vec(),
    };
    let report = BiasAnalysisReport::new(
        run_id,
        now_utc_string(),
        settings,
        articles.len(),
        &analysis,
    );
    let json_path = reports_dir.join("bias_analysis.json");
    write_json_pretty(&json_path, &report)?;
    info!(path = %json_path.display(), "wrote bias analysis");

    info!(
        analysed = analysis.results.len(),
        skipped = analysis.skipped.len(),
        dropped_without_baseline = analysis.dropped_without_baseline,
        "analysis completed"
    );

    Ok(())
}

fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if !args.penalty.is_finite() || args.penalty < 0.0 {
        bail!("--penalty must be a finite, non-negative number");
    }
    if args.jump == 0 {
        bail!("--jump must be at least 1");
    }
    if args.min_segment_size == 0 {
        bail!("--min-segment-size must be at least 1");
    }
    if args.event_window_days < 0 {
        bail!("--event-window-days must not be negative");
    }
    Ok(())
}
