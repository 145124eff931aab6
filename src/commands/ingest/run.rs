use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use super::preprocess::{RawArticle, annotate, preprocess, read_source_file};
use crate::cli::IngestArgs;
use crate::commands::inventory;
use crate::model::{IngestCounts, IngestPaths, IngestRunManifest, SourceInventoryManifest};
use crate::reference::RegionTable;
use crate::sentiment::LexiconSentiment;
use crate::store::{self, DB_SCHEMA_VERSION};
use crate::text::TextCleaner;
use crate::topics::{KeywordTopicModel, summarize_topics};
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| inventory::default_manifest_path(&cache_root));
    let ingest_manifest_path = args.ingest_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "ingest_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| cache_root.join("articles.sqlite"));
    let topic_info_path = cache_root.join("reports").join("topic_info.json");

    info!(data_dir = %args.data_dir.display(), run_id = %run_id, "starting ingest");

    let inventory = load_or_refresh_inventory(
        &args.data_dir,
        &inventory_manifest_path,
        args.refresh_inventory,
    )?;

    let regions = match &args.regions_path {
        Some(path) => RegionTable::load(path)?,
        None => RegionTable::default(),
    };

    let mut counts = IngestCounts {
        source_count: inventory.source_count,
        ..IngestCounts::default()
    };
    let mut warnings = Vec::<String>::new();
    let mut raw = Vec::<RawArticle>::new();

    for entry in &inventory.sources {
        let path = args.data_dir.join(&entry.filename);
        let read = read_source_file(&path, &entry.source)?;
        if read.lines_undecodable > 0 {
            warn!(
                source = %entry.source,
                undecodable = read.lines_undecodable,
                "skipped lines that are not JSON objects"
            );
            warnings.push(format!(
                "{}: skipped {} undecodable lines",
                entry.filename, read.lines_undecodable
            ));
        }
        counts.lines_read += read.lines_read;
        counts.lines_undecodable += read.lines_undecodable;
        raw.extend(read.articles);
    }

    if raw.is_empty() {
        bail!(
            "no articles were loaded from {}; check the data directory and file format",
            args.data_dir.display()
        );
    }
    info!(articles = raw.len(), "ingested raw articles");

    let cleaner = TextCleaner::new()?;
    let cleaned = preprocess(raw, &cleaner, &regions, args.min_body_chars, &mut counts);
    info!(
        remaining = cleaned.len(),
        missing_fields = counts.rows_missing_fields,
        invalid_dates = counts.rows_invalid_date,
        duplicates = counts.rows_duplicate_body,
        short_bodies = counts.rows_short_body,
        "preprocessing complete"
    );

    let scorer = LexiconSentiment::default();
    let topic_model = KeywordTopicModel::default();
    let articles = annotate(cleaned, &scorer, &topic_model, &mut counts);
    let assignments = articles
        .iter()
        .map(|article| article.topic)
        .collect::<Vec<i64>>();
    let topic_info = summarize_topics(&topic_model, &assignments);
    info!(
        articles = articles.len(),
        topics = topic_info.len(),
        noise = counts.noise_topic_articles,
        "scored sentiment and assigned topics"
    );

    let mut connection = store::open_read_write(&db_path)?;
    store::replace_corpus(&mut connection, &articles, &topic_info)?;
    store::set_metadata(&connection, "last_ingest_run_id", &run_id)?;
    counts.articles_stored = articles.len();
    counts.topics_stored = topic_info.len();

    write_json_pretty(&topic_info_path, &topic_info)?;
    info!(path = %topic_info_path.display(), "wrote topic info");

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_ingest_command(&args),
        paths: IngestPaths {
            data_dir: args.data_dir.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            db_path: db_path.display().to_string(),
            topic_info_path: topic_info_path.display().to_string(),
        },
        counts,
        source_hashes: inventory.sources,
        warnings,
    };

    write_json_pretty(&ingest_manifest_path, &manifest)?;

    info!(path = %ingest_manifest_path.display(), "wrote ingest run manifest");
    info!(
        articles = manifest.counts.articles_stored,
        topics = manifest.counts.topics_stored,
        "ingest completed"
    );

    Ok(())
}

fn load_or_refresh_inventory(
    data_dir: &Path,
    inventory_manifest_path: &Path,
    refresh_inventory: bool,
) -> Result<SourceInventoryManifest> {
    if refresh_inventory || !inventory_manifest_path.exists() {
        let manifest = inventory::build_manifest(data_dir)?;
        write_json_pretty(inventory_manifest_path, &manifest)?;
        info!(
            path = %inventory_manifest_path.display(),
            source_count = manifest.source_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let raw = fs::read(inventory_manifest_path)
        .with_context(|| format!("failed to read {}", inventory_manifest_path.display()))?;
    let manifest: SourceInventoryManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", inventory_manifest_path.display()))?;

    info!(
        path = %inventory_manifest_path.display(),
        source_count = manifest.source_count,
        "loaded existing inventory manifest"
    );

    Ok(manifest)
}

fn render_ingest_command(args: &IngestArgs) -> String {
    let mut command = format!(
        "climate-bias ingest --cache-root {} --data-dir {} --min-body-chars {}",
        args.cache_root.display(),
        args.data_dir.display(),
        args.min_body_chars
    );
    if let Some(path) = &args.db_path {
        command.push_str(&format!(" --db-path {}", path.display()));
    }
    if let Some(path) = &args.regions_path {
        command.push_str(&format!(" --regions-path {}", path.display()));
    }
    if args.refresh_inventory {
        command.push_str(" --refresh-inventory");
    }
    command
}
