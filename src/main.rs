//! Space Missions - CSV normalization & exploratory chart report
//!
//! Loads the launch dataset, prints a summary and writes the aggregate views
//! as JSON and PNG charts.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use space_missions::config::Settings;
use space_missions::data::load_cached;
use space_missions::report::Report;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "space-missions",
    version,
    about = "Exploratory report over the 1957-2020 space missions dataset"
)]
struct Cli {
    /// Path to the missions CSV
    csv: PathBuf,

    /// JSON settings file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for JSON and chart files
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Number of entries kept in ranked views
    #[arg(long)]
    top: Option<usize>,

    /// Write JSON only, skip chart images
    #[arg(long)]
    no_charts: bool,

    /// Open the output directory when done
    #[arg(long)]
    open: bool,

    #[arg(long, short)]
    verbose: bool,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        if let Some(dir) = &self.output {
            settings.output_dir = dir.clone();
        }
        if let Some(top) = self.top {
            settings.top_n = top;
        }
        if self.no_charts {
            settings.render_charts = false;
        }
        if self.open {
            settings.open_output = true;
        }
        Ok(settings)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let settings = cli.settings()?;
    let table = load_cached(&cli.csv)
        .with_context(|| format!("loading {}", cli.csv.display()))?;

    let report = Report::build(&table, &cli.csv, &settings)?;
    println!("{}", report.summary_text());

    let written = report.write(&settings)?;
    info!(
        "Wrote {} files to {}",
        written.len(),
        settings.output_dir.display()
    );

    if settings.open_output {
        open::that(&settings.output_dir)
            .with_context(|| format!("opening {}", settings.output_dir.display()))?;
    }

    Ok(())
}
