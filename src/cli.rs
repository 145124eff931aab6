use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::bias::FillPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "climate-bias",
    version,
    about = "Climate news sentiment, topic and media bias analysis"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Ingest(IngestArgs),
    Analyze(AnalyzeArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".cache/climate-bias")]
    pub cache_root: PathBuf,

    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = ".cache/climate-bias")]
    pub cache_root: PathBuf,

    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub inventory_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub ingest_manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub refresh_inventory: bool,

    #[arg(long)]
    pub regions_path: Option<PathBuf>,

    #[arg(long, default_value_t = 100)]
    pub min_body_chars: usize,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(long, default_value = ".cache/climate-bias")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub reports_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 3.0)]
    pub penalty: f64,

    #[arg(long, default_value_t = 10)]
    pub min_weeks: usize,

    #[arg(long, default_value_t = 5)]
    pub jump: usize,

    #[arg(long, default_value_t = 2)]
    pub min_segment_size: usize,

    #[arg(long, default_value_t = 90)]
    pub event_window_days: i64,

    #[arg(long, value_enum, default_value_t = FillPolicy::Zero)]
    pub fill_policy: FillPolicy,

    #[arg(long)]
    pub events_path: Option<PathBuf>,

    #[arg(long, default_value_t = 50)]
    pub top_topics: usize,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/climate-bias")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
