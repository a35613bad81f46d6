//! Statistics Calculator Module
//! Descriptive statistics over mission costs and launch-year extremes.

use crate::data::{MissionTable, TableError, COUNT, YEAR};
use polars::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Descriptive statistics for the known mission costs.
///
/// Absent costs never enter any of the figures; `missing` reports how many
/// rows were skipped.
#[derive(Debug, Clone, Serialize)]
pub struct CostSummary {
    pub known: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub p05: Option<f64>,
    pub p95: Option<f64>,
}

/// Busiest and quietest launch years, ties resolved to the earliest year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearExtremes {
    pub busiest_year: i32,
    pub busiest_count: u32,
    pub quietest_year: i32,
    pub quietest_count: u32,
}

pub struct StatsCalculator;

impl StatsCalculator {
    pub fn cost_summary(table: &MissionTable) -> Result<CostSummary, TableError> {
        let costs = table.known_costs()?;
        let missing = table.len() - costs.len();
        Ok(Self::describe(&costs, missing))
    }

    /// Compute descriptive statistics for an array of values.
    pub fn describe(values: &[f64], missing: usize) -> CostSummary {
        let n = values.len();
        if n == 0 {
            return CostSummary {
                known: 0,
                missing,
                mean: None,
                median: None,
                std: None,
                min: None,
                max: None,
                p05: None,
                p95: None,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        // Sample standard deviation, zero for a single value
        let std = if n > 1 { values.std_dev() } else { 0.0 };

        CostSummary {
            known: n,
            missing,
            mean: Some(values.mean()),
            median: Some(median),
            std: Some(std),
            min: sorted.first().copied(),
            max: sorted.last().copied(),
            p05: Some(Self::percentile(&sorted, 5.0)),
            p95: Some(Self::percentile(&sorted, 95.0)),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// `None` for an empty table.
    pub fn year_extremes(table: &MissionTable) -> Result<Option<YearExtremes>, TableError> {
        let per_year = table.count_by_year()?;
        let years = per_year.column(YEAR)?.cast(&DataType::Int32)?;
        let counts = per_year.column(COUNT)?.cast(&DataType::UInt32)?;

        let pairs: Vec<(i32, u32)> = years
            .i32()?
            .into_iter()
            .zip(counts.u32()?.into_iter())
            .filter_map(|(year, count)| Some((year?, count?)))
            .collect();

        // Rows are in year order, so strict comparisons keep the earliest year on ties
        let mut iter = pairs.iter().copied();
        let Some(first) = iter.next() else {
            return Ok(None);
        };
        let (busiest, quietest) = iter.fold((first, first), |(hi, lo), cur| {
            (
                if cur.1 > hi.1 { cur } else { hi },
                if cur.1 < lo.1 { cur } else { lo },
            )
        });

        Ok(Some(YearExtremes {
            busiest_year: busiest.0,
            busiest_count: busiest.1,
            quietest_year: quietest.0,
            quietest_count: quietest.1,
        }))
    }
}
