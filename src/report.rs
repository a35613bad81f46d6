//! Report Generator Module
//! Writes the dataset summary, the aggregate views as JSON, and one chart
//! image per view into the output directory.

use crate::charts::StaticChartRenderer;
use crate::config::Settings;
use crate::data::{MissionStatus, MissionTable, MISSION_STATUS};
use crate::stats::{AggregateView, CostSummary, StatsCalculator, ViewCalculator, YearExtremes};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "summary.json";
pub const VIEWS_FILE: &str = "views.json";

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub source: PathBuf,
    pub missions: usize,
    pub successes: usize,
    pub failures: usize,
    pub first_launch: Option<NaiveDate>,
    pub last_launch: Option<NaiveDate>,
    pub years: Option<YearExtremes>,
    pub cost: CostSummary,
}

impl DatasetSummary {
    pub fn compute(table: &MissionTable, source: &Path) -> Result<Self> {
        let successes = table
            .filter_eq(MISSION_STATUS, MissionStatus::Success.as_str())?
            .len();
        let range = table.date_range()?;

        Ok(Self {
            source: source.to_path_buf(),
            missions: table.len(),
            successes,
            failures: table.len() - successes,
            first_launch: range.map(|(first, _)| first),
            last_launch: range.map(|(_, last)| last),
            years: StatsCalculator::year_extremes(table)?,
            cost: StatsCalculator::cost_summary(table)?,
        })
    }
}

pub struct Report {
    pub summary: DatasetSummary,
    pub views: Vec<AggregateView>,
}

impl Report {
    pub fn build(table: &MissionTable, source: &Path, settings: &Settings) -> Result<Self> {
        let summary = DatasetSummary::compute(table, source)?;
        let views = ViewCalculator::compute_all_parallel(table, settings.top_n)
            .context("computing aggregate views")?;
        Ok(Self { summary, views })
    }

    /// Write JSON files and, if enabled, chart images. Returns every file written.
    pub fn write(&self, settings: &Settings) -> Result<Vec<PathBuf>> {
        let dir = &settings.output_dir;
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;

        let mut written = vec![
            write_json(&dir.join(SUMMARY_FILE), &self.summary)?,
            write_json(&dir.join(VIEWS_FILE), &self.views)?,
        ];

        if settings.render_charts {
            let renderer = StaticChartRenderer::new(settings.chart_width, settings.chart_height);
            let charts = renderer
                .render_all(&self.views, dir)
                .context("rendering charts")?;
            info!("Rendered {} charts", charts.len());
            written.extend(charts);
        }

        Ok(written)
    }

    /// Human-readable overview for the terminal.
    pub fn summary_text(&self) -> String {
        let s = &self.summary;
        let mut lines = vec![
            format!("Source:      {}", s.source.display()),
            format!(
                "Missions:    {} ({} success, {} failure)",
                s.missions, s.successes, s.failures
            ),
        ];

        if let (Some(first), Some(last)) = (s.first_launch, s.last_launch) {
            lines.push(format!("Launches:    {} to {}", first, last));
        }
        if let Some(years) = s.years {
            lines.push(format!(
                "Busiest:     {} ({} launches)",
                years.busiest_year, years.busiest_count
            ));
            lines.push(format!(
                "Quietest:    {} ({} launches)",
                years.quietest_year, years.quietest_count
            ));
        }

        match s.cost.mean {
            Some(mean) => lines.push(format!(
                "Mean cost:   {:.2}M over {} missions with known cost ({} unknown)",
                mean, s.cost.known, s.cost.missing
            )),
            None => lines.push("Mean cost:   no known costs".to_string()),
        }

        lines.join("\n")
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{write_csv, SAMPLE_CSV};
    use crate::data::DataLoader;
    use tempfile::tempdir;

    #[test]
    fn test_build_and_write_without_charts() {
        let tmp = tempdir().unwrap();
        let path = write_csv(tmp.path(), "missions.csv", SAMPLE_CSV);
        let table = DataLoader::load(&path).unwrap();

        let settings = Settings {
            output_dir: tmp.path().join("out"),
            render_charts: false,
            ..Settings::default()
        };
        let report = Report::build(&table, &path, &settings).unwrap();
        assert_eq!(report.summary.missions, 7);
        assert_eq!(report.summary.successes, 5);
        assert_eq!(report.summary.failures, 2);
        assert_eq!(
            report.summary.first_launch,
            NaiveDate::from_ymd_opt(1961, 4, 12)
        );

        let written = report.write(&settings).unwrap();
        assert_eq!(written.len(), 2);

        let views: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(settings.output_dir.join(VIEWS_FILE)).unwrap())
                .unwrap();
        assert_eq!(views.as_array().unwrap().len(), 9);
        assert_eq!(views[0]["id"], "missions_by_country");
        assert_eq!(views[3]["kind"], "pie");

        let text = report.summary_text();
        assert!(text.contains("Missions:    7"));
        assert!(text.contains("Busiest:     2020"));
    }
}
