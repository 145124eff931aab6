pub mod analyze;
pub mod ingest;
pub mod inventory;
pub mod status;
