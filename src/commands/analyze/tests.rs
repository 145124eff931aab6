use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDate};

use super::aggregate::{aggregate, top_topics_per_source};
use super::report::{write_bias_report, write_top_topics_report};
use super::run;
use crate::bias::{Article, BiasAnalysis, Changepoint, FillPolicy, SkipReason, SourceBiasResult};
use crate::cli::AnalyzeArgs;
use crate::store::{self, StoredArticle};
use crate::topics::{TopicInfo, TopicName, TopicNames};

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid test date")
}

fn article(source: &str, region: &str, topic: i64, sentiment: f64, published: &str) -> Article {
    Article {
        source: source.to_string(),
        region: region.to_string(),
        topic,
        sentiment,
        date_published: date(published),
    }
}

fn sample_articles() -> Vec<Article> {
    vec![
        article("bbc", "Europe", 1, 0.5, "2015-01-05"),
        article("bbc", "Europe", 1, -0.25, "2015-01-20"),
        article("cnn", "North America", 2, 0.25, "2015-02-03"),
        article("cnn", "North America", -1, 0.75, "2015-02-10"),
    ]
}

fn sample_names() -> TopicNames {
    TopicNames::from_info(&[TopicInfo {
        topic: 1,
        name: "1_disasters_extreme_weather".to_string(),
        count: 2,
    }])
}

fn render<F>(write: F) -> String
where
    F: FnOnce(&mut Vec<u8>) -> anyhow::Result<()>,
{
    let mut buffer = Vec::<u8>::new();
    write(&mut buffer).expect("report renders");
    String::from_utf8(buffer).expect("utf-8 report")
}

#[test]
fn aggregate_groups_by_month_region_and_source() {
    let aggregates = aggregate(&sample_articles(), &sample_names());

    let months = aggregates
        .sentiment_by_month
        .iter()
        .map(|row| (row.month.as_str(), row.articles))
        .collect::<Vec<(&str, usize)>>();
    assert_eq!(months, vec![("2015-01", 2), ("2015-02", 2)]);
    assert!((aggregates.sentiment_by_month[0].mean_sentiment - 0.125).abs() < 1e-9);
    assert!((aggregates.sentiment_by_month[1].mean_sentiment - 0.5).abs() < 1e-9);

    assert_eq!(aggregates.sentiment_by_region[0].key, "Europe");
    assert_eq!(aggregates.sentiment_by_region[1].key, "North America");

    let sources = aggregates
        .sentiment_by_source
        .iter()
        .map(|row| row.key.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(sources, vec!["cnn", "bbc"]);

    let region_topics = aggregates
        .topics_by_region
        .iter()
        .map(|row| (row.region.as_str(), row.topic_name.as_str(), row.articles))
        .collect::<Vec<(&str, &str, usize)>>();
    assert_eq!(
        region_topics,
        vec![
            ("Europe", "1_disasters_extreme_weather", 2),
            ("North America", "Topic -1", 1),
            ("North America", "Topic 2", 1),
        ]
    );
}

#[test]
fn top_topics_fall_back_to_unnamed_topics_and_respect_limit() {
    let top = top_topics_per_source(&sample_articles(), &sample_names(), 1);

    assert_eq!(top.keys().collect::<Vec<&String>>(), vec!["bbc", "cnn"]);
    assert_eq!(
        top["bbc"],
        vec![(
            TopicName::Named("1_disasters_extreme_weather".to_string()),
            2
        )]
    );
    assert_eq!(top["cnn"], vec![(TopicName::Unnamed(-1), 1)]);

    let text = render(|buffer| write_top_topics_report(buffer, &top, 1));
    assert!(text.starts_with("Top 1 Most Frequent Topics per News Source"));
    assert!(text.contains("--- CNN ---"));
    assert!(text.contains(" 1. Topic -1 (1 articles)"));
}

fn sample_analysis() -> BiasAnalysis {
    let mut results = BTreeMap::new();
    results.insert(
        "alpha".to_string(),
        SourceBiasResult {
            source: "alpha".to_string(),
            overall_bias_score: -0.05,
            weeks: 20,
            weekly_bias: Vec::new(),
            changepoints: Vec::new(),
        },
    );
    results.insert(
        "zeta".to_string(),
        SourceBiasResult {
            source: "zeta".to_string(),
            overall_bias_score: 0.10,
            weeks: 30,
            weekly_bias: Vec::new(),
            changepoints: vec![
                Changepoint {
                    date: date("2015-11-30"),
                    correlated_event: Some("Paris Bataclan Attacks".to_string()),
                },
                Changepoint {
                    date: date("2016-06-06"),
                    correlated_event: None,
                },
            ],
        },
    );

    let mut skipped = BTreeMap::new();
    skipped.insert(
        "gamma".to_string(),
        SkipReason::InsufficientData {
            weeks: 3,
            required: 10,
        },
    );

    BiasAnalysis {
        results,
        skipped,
        dropped_without_baseline: 2,
    }
}

#[test]
fn bias_report_ranks_sources_and_lists_skips() {
    let text = render(|buffer| write_bias_report(buffer, &sample_analysis()));

    let zeta = text.find("- ZETA: 0.1000").expect("zeta ranked");
    let alpha = text.find("- ALPHA: -0.0500").expect("alpha ranked");
    assert!(zeta < alpha);

    let zeta_section = text.find("### SOURCE: ZETA ###").expect("zeta section");
    let alpha_section = text.find("### SOURCE: ALPHA ###").expect("alpha section");
    assert!(zeta_section < alpha_section);
    assert!(text.contains("  - On/Around 2015-11-30:"));
    assert!(text.contains("shortly after the 'Paris Bataclan Attacks' event."));
    assert!(text.contains("No major predefined event was found to correlate with this shift."));
    assert!(text.contains(
        "No significant shifts in sentiment bias detected during the analyzed period."
    ));

    assert!(text.contains("--- Sources Not Analyzed ---"));
    assert!(text.contains("- GAMMA: insufficient data (3 weekly points, at least 10 required)"));
    assert!(text.contains("Note: 2 articles were excluded"));
}

#[test]
fn bias_report_omits_skip_section_when_everything_ran() {
    let mut analysis = sample_analysis();
    analysis.skipped.clear();
    analysis.dropped_without_baseline = 0;

    let text = render(|buffer| write_bias_report(buffer, &analysis));
    assert!(!text.contains("Sources Not Analyzed"));
    assert!(!text.contains("Note:"));
}

fn analyze_args(cache_root: &Path) -> AnalyzeArgs {
    AnalyzeArgs {
        cache_root: cache_root.to_path_buf(),
        db_path: None,
        reports_dir: None,
        penalty: 3.0,
        min_weeks: 10,
        jump: 5,
        min_segment_size: 2,
        event_window_days: 90,
        fill_policy: FillPolicy::Zero,
        events_path: None,
        top_topics: 50,
    }
}

fn stored(id: usize, source: &str, published: NaiveDate, sentiment: f64) -> StoredArticle {
    StoredArticle {
        article_id: format!("{source}-{id}"),
        source: source.to_string(),
        country: "UK".to_string(),
        region: "Europe".to_string(),
        headline: format!("headline {id}"),
        cleaned_body: format!("body {source} {id}"),
        date_published: published,
        sentiment,
        topic: 1,
    }
}

#[test]
fn run_writes_every_report() {
    let cache = tempfile::tempdir().expect("cache dir");
    let first_monday = date("2015-01-05");

    let mut articles = (0..12)
        .map(|week| {
            let sentiment = if week < 6 { -0.5 } else { 0.5 };
            stored(
                week,
                "guardian",
                first_monday + Duration::days(7 * week as i64),
                sentiment,
            )
        })
        .collect::<Vec<StoredArticle>>();
    articles.push(stored(0, "tiny", first_monday, 0.25));

    let mut connection =
        store::open_read_write(&cache.path().join("articles.sqlite")).expect("open store");
    store::replace_corpus(
        &mut connection,
        &articles,
        &[TopicInfo {
            topic: 1,
            name: "1_disasters_extreme_weather".to_string(),
            count: articles.len(),
        }],
    )
    .expect("store corpus");
    drop(connection);

    run(analyze_args(cache.path())).expect("analysis runs");

    let reports = cache.path().join("reports");
    let report = fs::read_to_string(reports.join("bias_report.txt")).expect("bias report");
    assert!(report.contains("### SOURCE: GUARDIAN ###"));
    assert!(report.contains("- TINY: insufficient data"));

    let top_topics =
        fs::read_to_string(reports.join("top_topics_per_source.txt")).expect("top topics");
    assert!(top_topics.contains("--- GUARDIAN ---"));
    assert!(top_topics.contains("1_disasters_extreme_weather (12 articles)"));

    let json: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(reports.join("bias_analysis.json")).expect("bias json"),
    )
    .expect("valid json");
    assert_eq!(json["article_count"], 13);
    assert_eq!(json["settings"]["fill_policy"], "zero");
    assert_eq!(json["settings"]["event_catalog"], "builtin");
    assert_eq!(json["settings"]["events"].as_array().map(Vec::len), Some(19));
    assert_eq!(
        json["ranked_sources"][0]["weekly_bias"]
            .as_array()
            .map(Vec::len),
        Some(12)
    );
    assert_eq!(json["ranked_sources"][0]["source"], "guardian");
    assert_eq!(json["skipped_sources"][0]["source"], "tiny");

    assert!(reports.join("aggregates.json").exists());
}

#[test]
fn run_requires_an_ingested_store() {
    let cache = tempfile::tempdir().expect("cache dir");
    let err = run(analyze_args(cache.path())).expect_err("missing store must fail");
    assert!(err.to_string().contains("run `climate-bias ingest` first"));
}

#[test]
fn run_rejects_zero_jump() {
    let cache = tempfile::tempdir().expect("cache dir");
    let mut args = analyze_args(cache.path());
    args.jump = 0;
    assert!(run(args).is_err());
}
