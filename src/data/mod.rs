//! Data module - CSV loading, normalization and the mission table

mod cache;
mod loader;
mod normalizer;
mod table;

pub use cache::{load_cached, DatasetCache, SourceKey};
pub use loader::{DataLoader, LoaderError};
pub use normalizer::{normalize, COUNTRY_SUBSTITUTIONS, WEEKDAYS};
pub use table::{
    MissionRecord, MissionStatus, MissionTable, TableError, COMPANY, COUNT, COUNTRY, DATE, KNOWN,
    MEAN, MISSION_COST, MISSION_STATUS, RATIO, ROCKET_STATUS, WEEKDAY, YEAR,
};

#[cfg(test)]
pub(crate) use loader::tests as fixtures;
