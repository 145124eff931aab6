use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::inventory;
use crate::model::{IngestRunManifest, SourceInventoryManifest};
use crate::store;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let inventory_path = inventory::default_manifest_path(&args.cache_root);
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("articles.sqlite"));
    let report_path = args.cache_root.join("reports").join("bias_report.txt");

    info!(cache_root = %args.cache_root.display(), "status requested");

    if inventory_path.exists() {
        let raw = fs::read(&inventory_path)
            .with_context(|| format!("failed to read {}", inventory_path.display()))?;
        let inventory: SourceInventoryManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", inventory_path.display()))?;

        info!(
            generated_at = %inventory.generated_at,
            source_count = inventory.source_count,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    match latest_ingest_manifest(&manifest_dir)? {
        Some(path) => {
            let raw =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let manifest: IngestRunManifest = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;

            info!(
                run_id = %manifest.run_id,
                status = %manifest.status,
                updated_at = %manifest.updated_at,
                articles = manifest.counts.articles_stored,
                topics = manifest.counts.topics_stored,
                duplicates = manifest.counts.rows_duplicate_body,
                warnings = manifest.warnings.len(),
                "loaded latest ingest manifest"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no ingest run manifest found"),
    }

    if db_path.exists() {
        let connection = store::open_read_only(&db_path)?;
        let articles = store::count_rows(&connection, "SELECT COUNT(*) FROM articles").unwrap_or(0);
        let sources =
            store::count_rows(&connection, "SELECT COUNT(DISTINCT source) FROM articles")
                .unwrap_or(0);
        let topics = store::count_rows(&connection, "SELECT COUNT(*) FROM topics").unwrap_or(0);
        let last_run = store::get_metadata(&connection, "last_ingest_run_id")?;
        let schema_version = store::get_metadata(&connection, "db_schema_version")?;

        info!(
            path = %db_path.display(),
            articles,
            sources,
            topics,
            last_ingest_run_id = %last_run.unwrap_or_default(),
            db_schema_version = %schema_version.unwrap_or_default(),
            "article store status"
        );
    } else {
        warn!(path = %db_path.display(), "article store missing");
    }

    if report_path.exists() {
        info!(path = %report_path.display(), "bias report present");
    } else {
        warn!(path = %report_path.display(), "bias report missing; run analyze");
    }

    Ok(())
}

/// Ingest manifests carry a compact UTC timestamp, so the lexically greatest
/// name is the most recent run.
fn latest_ingest_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let mut latest = None::<PathBuf>;
    for entry in fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to list {}", manifest_dir.display()))?
    {
        let path = entry?.path();
        let is_ingest_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("ingest_run_") && name.ends_with(".json"));
        if is_ingest_manifest && latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_ingest_manifest_picks_newest_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in [
            "ingest_run_20240101T000000Z.json",
            "ingest_run_20240301T120000Z.json",
            "source_inventory.json",
        ] {
            fs::write(dir.path().join(name), "{}").expect("write manifest");
        }

        let latest = latest_ingest_manifest(dir.path()).expect("listing works");
        assert_eq!(
            latest,
            Some(dir.path().join("ingest_run_20240301T120000Z.json"))
        );
    }

    #[test]
    fn latest_ingest_manifest_handles_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(
            latest_ingest_manifest(&dir.path().join("absent")).expect("missing is fine"),
            None
        );
    }
}
