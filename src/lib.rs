//! Space Missions - normalization and exploratory views over the 1957-2020
//! space launch dataset.
//!
//! The core is the loader/normalizer in [`data`], which turns the raw CSV into
//! an immutable [`data::MissionTable`]. [`stats`] derives the chart views,
//! [`charts`] draws them and [`report`] writes everything to disk.

pub mod charts;
pub mod config;
pub mod data;
pub mod report;
pub mod stats;
