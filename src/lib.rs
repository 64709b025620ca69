//! Air-quality report for the krasecology.ru monitoring posts.
//!
//! The run is a three-stage pipeline:
//! - `directory` — discover which sensors each station has
//! - `collect` — fetch every sensor's readings for a day or a week
//! - `report` — lay the readings out in an xlsx workbook, one sheet per station
//!
//! Per-station and per-sensor fetch failures are logged and turned into
//! empty results; only writing the workbook can fail the run.

pub mod cli;
pub mod collect;
pub mod config;
pub mod directory;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod report;
pub mod sanitize;
pub mod stations;
