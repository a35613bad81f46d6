//! Aggregate Views Module
//! The fixed set of chart-ready summaries computed from the mission table.

use crate::data::{
    MissionStatus, MissionTable, TableError, COMPANY, COUNT, COUNTRY, MEAN, MISSION_COST,
    MISSION_STATUS, RATIO, ROCKET_STATUS, WEEKDAY, WEEKDAYS, YEAR,
};
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    MissionsByCountry,
    LaunchesByYear,
    MissionsByCompany,
    MissionStatusShare,
    SuccessRateByCountry,
    LaunchesByWeekday,
    RocketStatusShare,
    MeanCostByYear,
    MeanCostByCompany,
}

impl ViewKind {
    pub const ALL: [ViewKind; 9] = [
        ViewKind::MissionsByCountry,
        ViewKind::LaunchesByYear,
        ViewKind::MissionsByCompany,
        ViewKind::MissionStatusShare,
        ViewKind::SuccessRateByCountry,
        ViewKind::LaunchesByWeekday,
        ViewKind::RocketStatusShare,
        ViewKind::MeanCostByYear,
        ViewKind::MeanCostByCompany,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ViewKind::MissionsByCountry => "missions_by_country",
            ViewKind::LaunchesByYear => "launches_by_year",
            ViewKind::MissionsByCompany => "missions_by_company",
            ViewKind::MissionStatusShare => "mission_status_share",
            ViewKind::SuccessRateByCountry => "success_rate_by_country",
            ViewKind::LaunchesByWeekday => "launches_by_weekday",
            ViewKind::RocketStatusShare => "rocket_status_share",
            ViewKind::MeanCostByYear => "mean_cost_by_year",
            ViewKind::MeanCostByCompany => "mean_cost_by_company",
        }
    }

    pub fn chart(&self) -> ChartKind {
        match self {
            ViewKind::MissionStatusShare | ViewKind::RocketStatusShare => ChartKind::Pie,
            ViewKind::MeanCostByYear => ChartKind::Line,
            _ => ChartKind::Bar,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ViewKind::MissionsByCountry => "Missions by Country",
            ViewKind::LaunchesByYear => "Launches per Year",
            ViewKind::MissionsByCompany => "Missions by Company",
            ViewKind::MissionStatusShare => "Mission Outcome",
            ViewKind::SuccessRateByCountry => "Success Rate by Country",
            ViewKind::LaunchesByWeekday => "Launches by Weekday",
            ViewKind::RocketStatusShare => "Rocket Status",
            ViewKind::MeanCostByYear => "Mean Mission Cost per Year",
            ViewKind::MeanCostByCompany => "Mean Mission Cost by Company",
        }
    }

    fn axis_labels(&self) -> (&'static str, &'static str) {
        match self {
            ViewKind::MissionsByCountry => ("Country", "Missions"),
            ViewKind::LaunchesByYear => ("Year", "Launches"),
            ViewKind::MissionsByCompany => ("Company", "Missions"),
            ViewKind::MissionStatusShare => ("Outcome", "Missions"),
            ViewKind::SuccessRateByCountry => ("Country", "Success rate"),
            ViewKind::LaunchesByWeekday => ("Weekday", "Launches"),
            ViewKind::RocketStatusShare => ("Status", "Missions"),
            ViewKind::MeanCostByYear => ("Year", "Mean cost (M USD)"),
            ViewKind::MeanCostByCompany => ("Company", "Mean cost (M USD)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewPoint {
    pub label: String,
    pub value: f64,
}

/// One chart's worth of data.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateView {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ViewPoint>,
}

/// Pair up a key column and a numeric column, skipping rows whose value is null.
fn labeled_values(df: &DataFrame, key: &str, value: &str) -> Result<Vec<ViewPoint>, TableError> {
    let keys = df.column(key)?.cast(&DataType::String)?;
    let values = df.column(value)?.cast(&DataType::Float64)?;

    Ok(keys
        .str()?
        .into_iter()
        .zip(values.f64()?.into_iter())
        .filter_map(|(label, value)| {
            Some(ViewPoint {
                label: label.unwrap_or_default().to_string(),
                value: value?,
            })
        })
        .collect())
}

pub struct ViewCalculator;

impl ViewCalculator {
    /// Compute a single view. `top_n` caps the ranked company/country views.
    pub fn compute(
        table: &MissionTable,
        kind: ViewKind,
        top_n: usize,
    ) -> Result<AggregateView, TableError> {
        let points = match kind {
            ViewKind::MissionsByCountry => {
                labeled_values(&table.count_by(COUNTRY)?, COUNTRY, COUNT)?
            }
            ViewKind::LaunchesByYear => labeled_values(&table.count_by_year()?, YEAR, COUNT)?,
            ViewKind::MissionsByCompany => {
                let mut points = labeled_values(&table.count_by(COMPANY)?, COMPANY, COUNT)?;
                points.truncate(top_n);
                points
            }
            ViewKind::MissionStatusShare => {
                labeled_values(&table.count_by(MISSION_STATUS)?, MISSION_STATUS, COUNT)?
            }
            ViewKind::SuccessRateByCountry => {
                let ratios =
                    table.ratio_by(COUNTRY, MISSION_STATUS, MissionStatus::Success.as_str())?;
                let mut points = labeled_values(&ratios, COUNTRY, RATIO)?;
                points.truncate(top_n);
                points
            }
            ViewKind::LaunchesByWeekday => {
                let counts = labeled_values(&table.count_by(WEEKDAY)?, WEEKDAY, COUNT)?;
                WEEKDAYS
                    .iter()
                    .map(|day| ViewPoint {
                        label: day.to_string(),
                        value: counts
                            .iter()
                            .find(|p| p.label == *day)
                            .map(|p| p.value)
                            .unwrap_or(0.0),
                    })
                    .collect()
            }
            ViewKind::RocketStatusShare => {
                labeled_values(&table.count_by(ROCKET_STATUS)?, ROCKET_STATUS, COUNT)?
            }
            ViewKind::MeanCostByYear => {
                labeled_values(&table.mean_by_year(MISSION_COST)?, YEAR, MEAN)?
            }
            ViewKind::MeanCostByCompany => {
                let means = table.mean_by(COMPANY, MISSION_COST)?;
                let mut points = labeled_values(&means, COMPANY, MEAN)?;
                points.sort_by(|a, b| {
                    b.value
                        .partial_cmp(&a.value)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                points.truncate(top_n);
                points
            }
        };

        let (x_label, y_label) = kind.axis_labels();
        Ok(AggregateView {
            id: kind.id().to_string(),
            title: kind.title().to_string(),
            kind: kind.chart(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            points,
        })
    }

    /// Compute every view in parallel over the shared table.
    pub fn compute_all_parallel(
        table: &MissionTable,
        top_n: usize,
    ) -> Result<Vec<AggregateView>, TableError> {
        // Use rayon for parallel computation; collect keeps ViewKind::ALL order
        ViewKind::ALL
            .par_iter()
            .map(|kind| Self::compute(table, *kind, top_n))
            .collect()
    }
}
