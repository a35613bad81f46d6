//! Mission Normalizer Module
//! Turns the raw all-string CSV frame into the analysis-ready mission table.
//!
//! The pipeline is a fixed, order-sensitive list of stages. Each stage takes
//! the frame produced by the previous one and returns a new frame; the last
//! stage selects the normalized columns.

use super::loader::{
    LoaderError, RAW_COMPANY, RAW_COST, RAW_DATUM, RAW_DETAIL, RAW_LOCATION, RAW_ROCKET_STATUS,
    RAW_STATUS_MISSION, REQUIRED_COLUMNS,
};
use super::table::{
    MissionStatus, MissionTable, COMPANY, COUNTRY, DATE, DETAIL, LOCATION, MISSION_COST,
    MISSION_STATUS, ROCKET_STATUS, WEEKDAY,
};
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use polars::prelude::*;

/// Launch sites that are not countries, mapped to the operating country.
pub const COUNTRY_SUBSTITUTIONS: [(&str, &str); 6] = [
    ("Barents Sea", "Russia"),
    ("Gran Canaria", "Spain"),
    ("Shahrud Missile Test Site", "Iran"),
    ("Yellow Sea", "Russia"),
    ("Pacific Missile Range Facility", "USA"),
    ("Pacific Ocean", "USA"),
];

pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Only the first four tokens of the datum carry the weekday and the date.
const DATUM_TOKENS: usize = 4;

const DATE_FORMATS: [&str; 2] = ["%b %d, %Y", "%B %d, %Y"];

/// Days between 0001-01-01 and 1970-01-01, the epoch of polars `Date`.
pub(crate) const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Split a launch datum into (weekday, date text).
///
/// `"Wed Apr 12, 1961 09:07 UTC"` becomes `("Wed", "Apr 12, 1961")`.
pub fn split_datum(datum: &str) -> Option<(String, String)> {
    let tokens: Vec<&str> = datum.split_whitespace().take(DATUM_TOKENS).collect();
    let (weekday, date) = tokens.split_first()?;
    if date.is_empty() {
        return None;
    }
    Some((weekday.trim().to_string(), date.join(" ").trim().to_string()))
}

/// Parse month-day-year text such as `"Apr 12, 1961"`.
pub fn parse_launch_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Last comma-separated segment of the location, with the substitution table applied.
pub fn derive_country(location: &str) -> String {
    let place = location.rsplit(',').next().unwrap_or(location).trim();
    COUNTRY_SUBSTITUTIONS
        .iter()
        .find(|(site, _)| *site == place)
        .map(|(_, country)| *country)
        .unwrap_or(place)
        .to_string()
}

/// Keep digits and dots, then parse. Anything else means the cost is unknown.
pub fn parse_cost(raw: &str) -> Option<f64> {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

pub fn clean_rocket_status(raw: &str) -> String {
    raw.replace("Status", "")
}

/// A single normalization step over the whole frame.
pub type Stage = fn(DataFrame) -> Result<DataFrame, LoaderError>;

pub const PIPELINE: [(&str, Stage); 8] = [
    ("prune_index_columns", prune_index_columns),
    ("check_schema", check_schema),
    ("derive_country", derive_country_column),
    ("extract_weekday_and_date", extract_weekday_and_date),
    ("binarize_mission_status", binarize_mission_status),
    ("extract_mission_cost", extract_mission_cost),
    ("clean_rocket_status", clean_rocket_status_column),
    ("select_normalized", select_normalized),
];

/// Run every stage over the raw frame and wrap the result.
pub fn normalize(raw: DataFrame) -> Result<MissionTable, LoaderError> {
    let rows = raw.height();
    let df = PIPELINE.iter().try_fold(raw, |df, (name, stage)| {
        debug!("Normalizer stage '{}' on {} rows", name, df.height());
        stage(df)
    })?;
    debug_assert_eq!(df.height(), rows);
    Ok(MissionTable::new(df))
}

pub fn is_index_column(name: &str) -> bool {
    name.trim().is_empty() || name.starts_with("Unnamed:")
}

fn prune_index_columns(mut df: DataFrame) -> Result<DataFrame, LoaderError> {
    let index_cols: Vec<String> = df
        .get_column_names()
        .iter()
        .filter(|name| is_index_column(name.as_str()))
        .map(|name| name.to_string())
        .collect();

    for name in &index_cols {
        df.drop_in_place(name)?;
        debug!("Dropped index column '{}'", name);
    }
    Ok(df)
}

fn check_schema(df: DataFrame) -> Result<DataFrame, LoaderError> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    match REQUIRED_COLUMNS
        .iter()
        .find(|required| !names.iter().any(|name| name == *required))
    {
        Some(missing) => Err(LoaderError::SchemaError(missing.to_string())),
        None => Ok(df),
    }
}

/// Values of a required text column; a null anywhere fails the load.
fn required_strings<'a>(df: &'a DataFrame, column: &str) -> Result<Vec<&'a str>, LoaderError> {
    df.column(column)?
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| LoaderError::ParseError {
                row,
                column: column.to_string(),
                message: "missing value".to_string(),
            })
        })
        .collect()
}

fn derive_country_column(mut df: DataFrame) -> Result<DataFrame, LoaderError> {
    let countries: Vec<String> = required_strings(&df, RAW_LOCATION)?
        .into_iter()
        .map(derive_country)
        .collect();
    df.with_column(Column::new(COUNTRY.into(), countries))?;
    Ok(df)
}

fn extract_weekday_and_date(mut df: DataFrame) -> Result<DataFrame, LoaderError> {
    let datums = required_strings(&df, RAW_DATUM)?;
    let mut weekdays: Vec<String> = Vec::with_capacity(datums.len());
    let mut days: Vec<i32> = Vec::with_capacity(datums.len());

    for (row, datum) in datums.iter().enumerate() {
        let parse_error = |message: String| LoaderError::ParseError {
            row,
            column: RAW_DATUM.to_string(),
            message,
        };

        let (weekday, date_text) = split_datum(datum)
            .ok_or_else(|| parse_error(format!("cannot split weekday and date from '{datum}'")))?;
        if !WEEKDAYS.contains(&weekday.as_str()) {
            return Err(parse_error(format!("unknown weekday '{weekday}'")));
        }
        let date = parse_launch_date(&date_text)
            .ok_or_else(|| parse_error(format!("unrecognized date '{date_text}'")))?;

        let actual = date.format("%a").to_string();
        if actual != weekday {
            warn!(
                "Row {}: datum says {} but {} is a {}",
                row, weekday, date, actual
            );
        }

        weekdays.push(weekday);
        days.push(date.num_days_from_ce() - EPOCH_DAYS_FROM_CE);
    }

    let dates = Series::new(DATE.into(), days).cast(&DataType::Date)?;
    df.with_column(Column::new(WEEKDAY.into(), weekdays))?;
    df.with_column(dates)?;
    Ok(df)
}

fn binarize_mission_status(mut df: DataFrame) -> Result<DataFrame, LoaderError> {
    // A blank outcome is not a success, so it lands in Failure with the rest
    let statuses: Vec<&str> = df
        .column(RAW_STATUS_MISSION)?
        .str()?
        .into_iter()
        .map(|label| {
            label
                .map_or(MissionStatus::Failure, MissionStatus::from_label)
                .as_str()
        })
        .collect();
    df.with_column(Column::new(MISSION_STATUS.into(), statuses))?;
    Ok(df)
}

fn extract_mission_cost(mut df: DataFrame) -> Result<DataFrame, LoaderError> {
    let costs: Vec<Option<f64>> = df
        .column(RAW_COST)?
        .str()?
        .into_iter()
        .map(|raw| raw.and_then(parse_cost))
        .collect();
    let known = costs.iter().filter(|c| c.is_some()).count();
    debug!("Mission cost known for {} of {} rows", known, costs.len());

    df.drop_in_place(RAW_COST)?;
    df.with_column(Column::new(MISSION_COST.into(), costs))?;
    Ok(df)
}

fn clean_rocket_status_column(mut df: DataFrame) -> Result<DataFrame, LoaderError> {
    let statuses: Vec<String> = df
        .column(RAW_ROCKET_STATUS)?
        .str()?
        .into_iter()
        .map(|raw| raw.map(clean_rocket_status).unwrap_or_default())
        .collect();
    df.with_column(Column::new(ROCKET_STATUS.into(), statuses))?;
    Ok(df)
}

fn select_normalized(df: DataFrame) -> Result<DataFrame, LoaderError> {
    // Company and location are required even though they pass through.
    required_strings(&df, RAW_COMPANY)?;
    required_strings(&df, RAW_LOCATION)?;

    let renamed = |raw: &str, name: &str| -> Result<Column, LoaderError> {
        Ok(df.column(raw)?.clone().with_name(name.into()))
    };

    let detail = df
        .column(RAW_DETAIL)?
        .str()?
        .into_iter()
        .map(|value| value.unwrap_or_default().to_string())
        .collect::<Vec<String>>();

    let out = DataFrame::new(vec![
        renamed(RAW_COMPANY, COMPANY)?,
        renamed(RAW_LOCATION, LOCATION)?,
        df.column(COUNTRY)?.clone(),
        df.column(WEEKDAY)?.clone(),
        df.column(DATE)?.clone(),
        df.column(MISSION_STATUS)?.clone(),
        df.column(MISSION_COST)?.clone(),
        df.column(ROCKET_STATUS)?.clone(),
        Column::new(DETAIL.into(), detail),
    ])?;
    Ok(out)
}
