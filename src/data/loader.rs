//! CSV Data Loader Module
//! Reads the raw missions CSV with Polars and hands it to the normalizer.

use super::normalizer;
use super::table::MissionTable;
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const RAW_COMPANY: &str = "Company Name";
pub const RAW_LOCATION: &str = "Location";
pub const RAW_DATUM: &str = "Datum";
pub const RAW_DETAIL: &str = "Detail";
pub const RAW_ROCKET_STATUS: &str = "Status Rocket";
/// The cost header carries a leading space in the source export.
pub const RAW_COST: &str = " Rocket";
pub const RAW_STATUS_MISSION: &str = "Status Mission";

pub const REQUIRED_COLUMNS: [&str; 7] = [
    RAW_COMPANY,
    RAW_LOCATION,
    RAW_DATUM,
    RAW_DETAIL,
    RAW_ROCKET_STATUS,
    RAW_COST,
    RAW_STATUS_MISSION,
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Source unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },
    #[error("Schema error: missing column '{0}'")]
    SchemaError(String),
    #[error("Parse error at row {row}, column '{column}': {message}")]
    ParseError {
        row: usize,
        column: String,
        message: String,
    },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Read the CSV with every column kept as text.
    pub fn read_raw(path: &Path) -> Result<DataFrame, LoaderError> {
        let unavailable = |reason: String| LoaderError::SourceUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| unavailable(e.to_string()))?;

        // Zero inference rows: all columns come back as String
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| unavailable(e.to_string()))
    }

    /// Read and normalize a missions CSV.
    pub fn load(path: &Path) -> Result<MissionTable, LoaderError> {
        let raw = Self::read_raw(path)?;
        info!(
            "Read {} rows, {} columns from {}",
            raw.height(),
            raw.width(),
            path.display()
        );

        let table = normalizer::normalize(raw)?;
        info!("Normalized {} missions", table.len());
        Ok(table)
    }
}
