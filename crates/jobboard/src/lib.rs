pub mod backfill;
pub mod config;
pub mod db;
pub mod harvest;
pub mod ingest;
pub mod listings;
pub mod telemetry;
