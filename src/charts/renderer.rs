//! Static Chart Renderer
//! Draws aggregate views to PNG files with plotters.
//!
//! One image per view:
//! - Bar: categories along x, one bar each, labels rotated when crowded
//! - Line: numeric x (years), line plus point markers
//! - Pie: slice per category with percentage labels

use crate::stats::{AggregateView, ChartKind};
use log::{debug, warn};
use plotters::element::Pie;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BAR_COLOR: RGBColor = RGBColor(52, 152, 219); // Blue
const LINE_COLOR: RGBColor = RGBColor(231, 76, 60); // Red

pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

/// Above this many bars the x labels are drawn vertically
const ROTATE_LABELS_ABOVE: usize = 12;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("View '{0}' has no data to draw")]
    EmptyView(String),
    #[error("Failed to draw chart: {0}")]
    Drawing(String),
    #[error("Failed to create output directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn drawing<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Drawing(e.to_string())
}

pub struct StaticChartRenderer {
    width: u32,
    height: u32,
}

impl StaticChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Render one view to `path`, choosing the drawing by the view's chart kind.
    pub fn render(&self, view: &AggregateView, path: &Path) -> Result<(), RenderError> {
        if view.points.is_empty() {
            return Err(RenderError::EmptyView(view.id.clone()));
        }
        debug!("Rendering '{}' to {}", view.id, path.display());

        match view.kind {
            ChartKind::Bar => self.draw_bar(view, path),
            ChartKind::Line => self.draw_line(view, path),
            ChartKind::Pie => self.draw_pie(view, path),
        }
    }

    /// Render every non-empty view to `<dir>/<id>.png`.
    pub fn render_all(
        &self,
        views: &[AggregateView],
        dir: &Path,
    ) -> Result<Vec<PathBuf>, RenderError> {
        fs::create_dir_all(dir).map_err(|source| RenderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::new();
        for view in views {
            let path = dir.join(format!("{}.png", view.id));
            match self.render(view, &path) {
                Ok(()) => written.push(path),
                Err(RenderError::EmptyView(id)) => warn!("Skipping empty view '{}'", id),
                Err(e) => return Err(e),
            }
        }
        Ok(written)
    }

    fn draw_bar(&self, view: &AggregateView, path: &Path) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;

        let n = view.points.len();
        let labels: Vec<String> = view.points.iter().map(|p| p.label.clone()).collect();
        let label_style = if n > ROTATE_LABELS_ABOVE {
            ("sans-serif", 12).into_font().transform(FontTransform::Rotate90)
        } else {
            ("sans-serif", 14).into_font()
        };

        let mut chart = ChartBuilder::on(&root)
            .caption(&view.title, ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(if n > ROTATE_LABELS_ABOVE { 120 } else { 50 })
            .y_label_area_size(70)
            .build_cartesian_2d((0..n).into_segmented(), 0f64..y_upper(view))
            .map_err(drawing)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(view.x_label.as_str())
            .y_desc(view.y_label.as_str())
            .x_labels(n)
            .x_label_style(label_style)
            .x_label_formatter(&|v: &SegmentValue<usize>| segment_label(&labels, v))
            .draw()
            .map_err(drawing)?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(BAR_COLOR.filled())
                    .margin(4)
                    .data(view.points.iter().enumerate().map(|(i, p)| (i, p.value))),
            )
            .map_err(drawing)?;

        root.present().map_err(drawing)?;
        Ok(())
    }

    fn draw_line(&self, view: &AggregateView, path: &Path) -> Result<(), RenderError> {
        let series: Vec<(f64, f64)> = view
            .points
            .iter()
            .filter_map(|p| Some((p.label.parse::<f64>().ok()?, p.value)))
            .collect();
        if series.is_empty() {
            return Err(RenderError::EmptyView(view.id.clone()));
        }

        let (mut x_min, mut x_max) = series
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(x, _)| {
                (lo.min(x), hi.max(x))
            });
        if x_min == x_max {
            x_min -= 1.0;
            x_max += 1.0;
        }

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&view.title, ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, 0f64..y_upper(view))
            .map_err(drawing)?;

        chart
            .configure_mesh()
            .x_desc(view.x_label.as_str())
            .y_desc(view.y_label.as_str())
            .x_label_formatter(&|x: &f64| format!("{:.0}", x))
            .draw()
            .map_err(drawing)?;

        chart
            .draw_series(LineSeries::new(series.iter().copied(), &LINE_COLOR))
            .map_err(drawing)?;
        chart
            .draw_series(
                series
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, LINE_COLOR.filled())),
            )
            .map_err(drawing)?;

        root.present().map_err(drawing)?;
        Ok(())
    }

    fn draw_pie(&self, view: &AggregateView, path: &Path) -> Result<(), RenderError> {
        let sizes: Vec<f64> = view.points.iter().map(|p| p.value).collect();
        if sizes.iter().sum::<f64>() <= 0.0 {
            return Err(RenderError::EmptyView(view.id.clone()));
        }
        let labels: Vec<String> = view.points.iter().map(|p| p.label.clone()).collect();
        let colors: Vec<RGBColor> = (0..sizes.len())
            .map(|i| PALETTE[i % PALETTE.len()])
            .collect();

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;
        let area = root
            .titled(&view.title, ("sans-serif", 28))
            .map_err(drawing)?;

        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = w.min(h) as f64 * 0.35;

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
        pie.percentages(("sans-serif", radius * 0.08).into_font().color(&WHITE));
        area.draw(&pie).map_err(drawing)?;

        root.present().map_err(drawing)?;
        Ok(())
    }
}

/// Top of the value axis with some headroom above the largest value.
fn y_upper(view: &AggregateView) -> f64 {
    let max = view
        .points
        .iter()
        .map(|p| p.value)
        .fold(0.0_f64, f64::max);
    if max <= 0.0 {
        1.0
    } else {
        max * 1.1
    }
}

fn segment_label(labels: &[String], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            labels.get(*i).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::ViewPoint;
    use tempfile::tempdir;

    fn view(kind: ChartKind, points: &[(&str, f64)]) -> AggregateView {
        AggregateView {
            id: "test_view".to_string(),
            title: "Test".to_string(),
            kind,
            x_label: "x".to_string(),
            y_label: "y".to_string(),
            points: points
                .iter()
                .map(|(label, value)| ViewPoint {
                    label: label.to_string(),
                    value: *value,
                })
                .collect(),
        }
    }

    #[test]
    fn test_y_upper_headroom() {
        let v = view(ChartKind::Bar, &[("USA", 100.0), ("China", 40.0)]);
        assert!((y_upper(&v) - 110.0).abs() < 1e-9);

        let zero = view(ChartKind::Bar, &[("USA", 0.0)]);
        assert_eq!(y_upper(&zero), 1.0);
    }

    #[test]
    fn test_segment_label() {
        let labels = vec!["Mon".to_string(), "Tue".to_string()];
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(1)), "Tue");
        assert_eq!(segment_label(&labels, &SegmentValue::Exact(0)), "Mon");
        assert_eq!(segment_label(&labels, &SegmentValue::CenterOf(5)), "");
        assert_eq!(segment_label(&labels, &SegmentValue::Last), "");
    }

    #[test]
    fn test_empty_views_are_skipped() {
        let tmp = tempdir().unwrap();
        let renderer = StaticChartRenderer::new(400, 300);

        let empty = view(ChartKind::Bar, &[]);
        assert!(matches!(
            renderer.render(&empty, &tmp.path().join("empty.png")),
            Err(RenderError::EmptyView(_))
        ));

        let written = renderer
            .render_all(&[empty], &tmp.path().join("charts"))
            .unwrap();
        assert!(written.is_empty());
        assert!(tmp.path().join("charts").is_dir());
    }

    #[test]
    fn test_render_all_writes_each_chart_kind() {
        let tmp = tempdir().unwrap();
        let renderer = StaticChartRenderer::new(480, 320);

        let companies: Vec<(String, f64)> = (0..ROTATE_LABELS_ABOVE + 3)
            .map(|i| (format!("Company {i}"), (i + 1) as f64))
            .collect();
        let company_points: Vec<(&str, f64)> =
            companies.iter().map(|(l, v)| (l.as_str(), *v)).collect();

        let views = vec![
            AggregateView {
                id: "by_company".to_string(),
                ..view(ChartKind::Bar, &company_points)
            },
            AggregateView {
                id: "by_year".to_string(),
                ..view(ChartKind::Line, &[("2020", 4.0)])
            },
            AggregateView {
                id: "by_outcome".to_string(),
                ..view(ChartKind::Pie, &[("Success", 5.0), ("Failure", 2.0)])
            },
        ];

        let dir = tmp.path().join("charts");
        let written = renderer.render_all(&views, &dir).unwrap();
        assert_eq!(written.len(), 3);
        for id in ["by_company", "by_year", "by_outcome"] {
            let png = dir.join(format!("{id}.png"));
            assert!(written.contains(&png));
            assert!(fs::metadata(&png).unwrap().len() > 0);
        }
    }

    #[test]
    fn test_all_zero_pie_is_empty() {
        let tmp = tempdir().unwrap();
        let renderer = StaticChartRenderer::new(400, 300);

        let zero = view(ChartKind::Pie, &[("Success", 0.0), ("Failure", 0.0)]);
        assert!(matches!(
            renderer.render(&zero, &tmp.path().join("zero.png")),
            Err(RenderError::EmptyView(_))
        ));
    }
}
