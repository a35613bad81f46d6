//! Mission Table Module
//! Immutable, queryable view over the normalized missions.

use super::normalizer::EPOCH_DAYS_FROM_CE;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const COMPANY: &str = "company";
pub const LOCATION: &str = "location";
pub const COUNTRY: &str = "country";
pub const WEEKDAY: &str = "weekday";
pub const DATE: &str = "date";
pub const MISSION_STATUS: &str = "mission_status";
pub const MISSION_COST: &str = "mission_cost";
pub const ROCKET_STATUS: &str = "rocket_status";
pub const DETAIL: &str = "detail";

/// Aggregate output columns
pub const COUNT: &str = "count";
pub const MEAN: &str = "mean";
pub const KNOWN: &str = "known";
pub const RATIO: &str = "ratio";
pub const YEAR: &str = "year";

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
    #[error("Invalid value in column '{column}' at row {row}")]
    InvalidValue { column: String, row: usize },
}

/// Mission outcome collapsed to two buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionStatus {
    Success,
    Failure,
}

impl MissionStatus {
    /// Only the exact `Success` label counts as a success.
    pub fn from_label(label: &str) -> Self {
        if label == "Success" {
            MissionStatus::Success
        } else {
            MissionStatus::Failure
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::Success => "Success",
            MissionStatus::Failure => "Failure",
        }
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized launch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionRecord {
    pub company: String,
    pub location: String,
    pub country: String,
    pub weekday: String,
    pub date: NaiveDate,
    pub mission_status: MissionStatus,
    pub mission_cost: Option<f64>,
    pub rocket_status: String,
    pub detail: String,
}

/// The normalized mission table. Never mutated after construction; every
/// query returns a new frame or table.
#[derive(Debug, Clone)]
pub struct MissionTable {
    df: DataFrame,
}

impl MissionTable {
    pub(crate) fn new(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn require(&self, column: &str) -> Result<(), TableError> {
        if self.column_names().iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(TableError::UnknownColumn(column.to_string()))
        }
    }

    /// Rows whose `column`, rendered as text, equals `value`.
    pub fn filter_eq(&self, column: &str, value: &str) -> Result<MissionTable, TableError> {
        self.require(column)?;
        let df = self
            .df
            .clone()
            .lazy()
            .filter(col(column).cast(DataType::String).eq(lit(value)))
            .collect()?;
        Ok(MissionTable::new(df))
    }

    pub fn sort_by(&self, column: &str, descending: bool) -> Result<MissionTable, TableError> {
        self.require(column)?;
        let df = self.df.sort(
            [column],
            SortMultipleOptions::default()
                .with_order_descending(descending)
                .with_maintain_order(true),
        )?;
        Ok(MissionTable::new(df))
    }

    /// Output columns: [key, "count"], most frequent first.
    pub fn count_by(&self, key: &str) -> Result<DataFrame, TableError> {
        self.require(key)?;
        let df = self
            .df
            .clone()
            .lazy()
            .group_by([col(key)])
            .agg([len().alias(COUNT)])
            .sort(
                [COUNT, key],
                SortMultipleOptions::default().with_order_descending_multi([true, false]),
            )
            .collect()?;
        Ok(df)
    }

    /// Output columns: ["year", "count"], oldest year first.
    pub fn count_by_year(&self) -> Result<DataFrame, TableError> {
        let df = self
            .df
            .clone()
            .lazy()
            .group_by([col(DATE).dt().year().alias(YEAR)])
            .agg([len().alias(COUNT)])
            .sort([YEAR], SortMultipleOptions::default())
            .collect()?;
        Ok(df)
    }

    /// Output columns: ["year", "mean", "known"], oldest year first.
    ///
    /// Same null handling as `mean_by`: a year with no known value has a null mean.
    pub fn mean_by_year(&self, value: &str) -> Result<DataFrame, TableError> {
        self.require(value)?;
        let df = self
            .df
            .clone()
            .lazy()
            .group_by([col(DATE).dt().year().alias(YEAR)])
            .agg([
                col(value).cast(DataType::Float64).mean().alias(MEAN),
                col(value).count().alias(KNOWN),
            ])
            .sort([YEAR], SortMultipleOptions::default())
            .collect()?;
        Ok(df)
    }

    /// Output columns: [key, "mean", "known"].
    ///
    /// Nulls are left out of both the sum and the divisor; `known` is the
    /// number of non-null values each mean was taken over.
    pub fn mean_by(&self, key: &str, value: &str) -> Result<DataFrame, TableError> {
        self.require(key)?;
        self.require(value)?;
        let df = self
            .df
            .clone()
            .lazy()
            .group_by([col(key)])
            .agg([
                col(value).cast(DataType::Float64).mean().alias(MEAN),
                col(value).count().alias(KNOWN),
            ])
            .sort([key], SortMultipleOptions::default())
            .collect()?;
        Ok(df)
    }

    /// Output columns: [key, "ratio", "count"], where ratio is the share of
    /// rows in the group whose `column` equals `value`.
    pub fn ratio_by(&self, key: &str, column: &str, value: &str) -> Result<DataFrame, TableError> {
        self.require(key)?;
        self.require(column)?;
        let df = self
            .df
            .clone()
            .lazy()
            .group_by([col(key)])
            .agg([
                col(column)
                    .cast(DataType::String)
                    .eq(lit(value))
                    .cast(DataType::Float64)
                    .mean()
                    .alias(RATIO),
                len().alias(COUNT),
            ])
            .sort(
                [COUNT, key],
                SortMultipleOptions::default().with_order_descending_multi([true, false]),
            )
            .collect()?;
        Ok(df)
    }

    /// Known mission costs, absent ones skipped.
    pub fn known_costs(&self) -> Result<Vec<f64>, TableError> {
        Ok(self.df.column(MISSION_COST)?.f64()?.into_iter().flatten().collect())
    }

    pub fn date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>, TableError> {
        let days = self.df.column(DATE)?.cast(&DataType::Int32)?;
        let days = days.i32()?;
        let range = match (days.min(), days.max()) {
            (Some(min), Some(max)) => days_to_date(min).zip(days_to_date(max)),
            _ => None,
        };
        Ok(range)
    }

    /// Materialize the table as typed records, in table order.
    pub fn records(&self) -> Result<Vec<MissionRecord>, TableError> {
        let company = self.df.column(COMPANY)?.str()?;
        let location = self.df.column(LOCATION)?.str()?;
        let country = self.df.column(COUNTRY)?.str()?;
        let weekday = self.df.column(WEEKDAY)?.str()?;
        let status = self.df.column(MISSION_STATUS)?.str()?;
        let cost = self.df.column(MISSION_COST)?.f64()?;
        let rocket = self.df.column(ROCKET_STATUS)?.str()?;
        let detail = self.df.column(DETAIL)?.str()?;
        let days = self.df.column(DATE)?.cast(&DataType::Int32)?;
        let days = days.i32()?;

        let text = |ca: &StringChunked, column: &str, row: usize| {
            ca.get(row)
                .map(|s| s.to_string())
                .ok_or_else(|| TableError::InvalidValue {
                    column: column.to_string(),
                    row,
                })
        };

        (0..self.df.height())
            .map(|row| {
                let date = days
                    .get(row)
                    .and_then(days_to_date)
                    .ok_or_else(|| TableError::InvalidValue {
                        column: DATE.to_string(),
                        row,
                    })?;
                Ok(MissionRecord {
                    company: text(company, COMPANY, row)?,
                    location: text(location, LOCATION, row)?,
                    country: text(country, COUNTRY, row)?,
                    weekday: text(weekday, WEEKDAY, row)?,
                    date,
                    mission_status: MissionStatus::from_label(&text(
                        status,
                        MISSION_STATUS,
                        row,
                    )?),
                    mission_cost: cost.get(row),
                    rocket_status: text(rocket, ROCKET_STATUS, row)?,
                    detail: text(detail, DETAIL, row)?,
                })
            })
            .collect()
    }
}

fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> MissionTable {
        let days: Vec<i32> = ["1961-04-12", "1961-05-05", "2020-08-07", "2020-08-04"]
            .iter()
            .map(|d| {
                let date = NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap();
                (date - NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()).num_days() as i32
            })
            .collect();
        let dates = Series::new(DATE.into(), days).cast(&DataType::Date).unwrap();

        MissionTable::new(
            DataFrame::new(vec![
                Column::new(COMPANY.into(), ["RVSN USSR", "NASA", "SpaceX", "SpaceX"]),
                Column::new(
                    LOCATION.into(),
                    [
                        "Baikonur Cosmodrome, Kazakhstan",
                        "Cape Canaveral, Florida, USA",
                        "Cape Canaveral, Florida, USA",
                        "Boca Chica, Texas, USA",
                    ],
                ),
                Column::new(COUNTRY.into(), ["Kazakhstan", "USA", "USA", "USA"]),
                Column::new(WEEKDAY.into(), ["Wed", "Fri", "Fri", "Tue"]),
                dates.into(),
                Column::new(
                    MISSION_STATUS.into(),
                    ["Success", "Success", "Success", "Failure"],
                ),
                Column::new(MISSION_COST.into(), [None, None, Some(50.0), Some(70.0)]),
                Column::new(ROCKET_STATUS.into(), ["Retired", "Retired", "Active", "Active"]),
                Column::new(
                    DETAIL.into(),
                    ["Vostok | Vostok 1", "Redstone | MR-3", "Falcon 9", "Starship"],
                ),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_filter_eq() {
        let table = sample_table();
        let usa = table.filter_eq(COUNTRY, "USA").unwrap();
        assert_eq!(usa.len(), 3);

        let none = table.filter_eq(COUNTRY, "Mars").unwrap();
        assert!(none.is_empty());

        assert!(matches!(
            table.filter_eq("nope", "x"),
            Err(TableError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_count_by_orders_by_count() {
        let counts = sample_table().count_by(COUNTRY).unwrap();
        let keys: Vec<&str> = counts
            .column(COUNTRY)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(keys, vec!["USA", "Kazakhstan"]);

        let n = counts.column(COUNT).unwrap().cast(&DataType::UInt64).unwrap();
        let n: Vec<u64> = n.u64().unwrap().into_iter().flatten().collect();
        assert_eq!(n, vec![3, 1]);
    }

    #[test]
    fn test_mean_by_skips_missing_costs() {
        let means = sample_table().mean_by(COMPANY, MISSION_COST).unwrap();
        let spacex = means
            .clone()
            .lazy()
            .filter(col(COMPANY).eq(lit("SpaceX")))
            .collect()
            .unwrap();
        let mean = spacex.column(MEAN).unwrap().f64().unwrap().get(0);
        assert_eq!(mean, Some(60.0));

        // NASA has no known cost at all
        let nasa = means
            .lazy()
            .filter(col(COMPANY).eq(lit("NASA")))
            .collect()
            .unwrap();
        assert_eq!(nasa.column(MEAN).unwrap().f64().unwrap().get(0), None);
    }

    #[test]
    fn test_mean_excludes_absent_not_zero() {
        // Two known values (50, 70) and two absent: mean is 60, not 30
        let table = sample_table();
        let costs = table.known_costs().unwrap();
        assert_eq!(costs.len(), 2);

        let means = table.mean_by(ROCKET_STATUS, MISSION_COST).unwrap();
        let active = means
            .lazy()
            .filter(col(ROCKET_STATUS).eq(lit("Active")))
            .collect()
            .unwrap();
        assert_eq!(active.column(MEAN).unwrap().f64().unwrap().get(0), Some(60.0));
    }

    #[test]
    fn test_ratio_by() {
        let ratios = sample_table()
            .ratio_by(COUNTRY, MISSION_STATUS, "Success")
            .unwrap();
        let usa = ratios
            .lazy()
            .filter(col(COUNTRY).eq(lit("USA")))
            .collect()
            .unwrap();
        let ratio = usa.column(RATIO).unwrap().f64().unwrap().get(0).unwrap();
        assert!((ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_count_by_year() {
        let years = sample_table().count_by_year().unwrap();
        let y = years.column(YEAR).unwrap().cast(&DataType::Int32).unwrap();
        let y: Vec<i32> = y.i32().unwrap().into_iter().flatten().collect();
        assert_eq!(y, vec![1961, 2020]);
    }

    #[test]
    fn test_mean_by_year() {
        let means = sample_table().mean_by_year(MISSION_COST).unwrap();
        let years = means.column(YEAR).unwrap().cast(&DataType::Int32).unwrap();
        let years: Vec<i32> = years.i32().unwrap().into_iter().flatten().collect();
        assert_eq!(years, vec![1961, 2020]);

        // 1961 has no known cost, 2020 averages 50 and 70
        let mean: Vec<Option<f64>> = means
            .column(MEAN)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(mean, vec![None, Some(60.0)]);
        let known = means.column(KNOWN).unwrap().cast(&DataType::UInt32).unwrap();
        let known: Vec<u32> = known.u32().unwrap().into_iter().flatten().collect();
        assert_eq!(known, vec![0, 2]);
    }

    #[test]
    fn test_sort_by_and_records() {
        let sorted = sample_table().sort_by(DATE, true).unwrap();
        let records = sorted.records().unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2020, 8, 7).unwrap());
        assert_eq!(records[0].mission_status, MissionStatus::Success);
        assert_eq!(records[3].company, "RVSN USSR");
        assert_eq!(records[3].mission_cost, None);
    }

    #[test]
    fn test_date_range() {
        let (first, last) = sample_table().date_range().unwrap().unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(1961, 4, 12).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2020, 8, 7).unwrap());
    }

    #[test]
    fn test_mission_status_labels() {
        assert_eq!(MissionStatus::from_label("Success"), MissionStatus::Success);
        assert_eq!(MissionStatus::from_label("Partial Failure"), MissionStatus::Failure);
        assert_eq!(MissionStatus::from_label("Prelaunch Failure"), MissionStatus::Failure);
        assert_eq!(MissionStatus::from_label("success"), MissionStatus::Failure);
    }
}
