//! Stats module - aggregate views and descriptive statistics

mod calculator;
mod views;

pub use calculator::{CostSummary, StatsCalculator, YearExtremes};
pub use views::{AggregateView, ChartKind, ViewCalculator, ViewKind, ViewPoint};
