//! Static Chart Renderer
//! Draws chart requests to PNG files with plotters.
//!
//! Scatter, bar and pair plots use plotters chart contexts. The heatmap is laid
//! out by hand in pixel space so every cell, label and annotation lines up with
//! the metric it belongs to.

use crate::charts::plotter::{
    coolwarm, finite_values, grouped_values, histogram, padded_range, palette_color,
    scatter_points, ChartRequest, FIRST_SERIES_COLOR, SECOND_SERIES_COLOR,
};
use crate::data::{DerivedTable, Metric};
use crate::stats::{CorrelationMatrix, StatsCalculator};
use log::{debug, info};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const FONT: &str = "sans-serif";
const HISTOGRAM_BINS: usize = 10;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Drawing failed: {0}")]
    Draw(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Draw(err.to_string())
    }
}

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Renders chart requests against a borrowed derived table.
pub struct StaticChartRenderer {
    dpi: u32,
}

impl StaticChartRenderer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }

    /// Render every request into `out_dir`, stopping at the first failure.
    pub fn render_all(
        &self,
        table: &DerivedTable,
        requests: &[ChartRequest],
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, RenderError> {
        fs::create_dir_all(out_dir).map_err(|source| RenderError::Io {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let written = requests
            .iter()
            .map(|request| self.render(table, request, out_dir))
            .collect::<Result<Vec<_>, _>>()?;

        info!("Rendered {} charts into {}", written.len(), out_dir.display());
        Ok(written)
    }

    /// Render one request to `out_dir/<request.file_name()>`.
    pub fn render(
        &self,
        table: &DerivedTable,
        request: &ChartRequest,
        out_dir: &Path,
    ) -> Result<PathBuf, RenderError> {
        let path = out_dir.join(request.file_name());
        let size = request.pixel_size(self.dpi);
        debug!("Rendering {} at {}x{}", path.display(), size.0, size.1);

        let root = BitMapBackend::new(&path, size).into_drawing_area();
        root.fill(&WHITE)?;
        let title = request.title();

        match request {
            ChartRequest::Scatter { x, y } => Self::draw_scatter(&root, table, &title, *x, *y)?,
            ChartRequest::CorrelationHeatmap { metrics } => {
                let matrix = StatsCalculator::correlation_matrix(table, metrics);
                Self::draw_heatmap(&root, &matrix, &title)?
            }
            ChartRequest::GraduationComparison => {
                Self::draw_graduation_comparison(&root, table, &title)?
            }
            ChartRequest::AdmissionVsVolume => Self::draw_admission_vs_volume(&root, table, &title)?,
            ChartRequest::PairPlot { metrics } => {
                Self::draw_pairplot(&root, table, &title, metrics)?
            }
        }

        root.present()?;
        drop(root);
        Ok(path)
    }

    fn draw_scatter(
        root: &Area<'_>,
        table: &DerivedTable,
        title: &str,
        x: Metric,
        y: Metric,
    ) -> Result<(), RenderError> {
        let points = scatter_points(table, x, y);
        let (x_min, x_max) = padded_range(points.iter().map(|p| p.x), 0.08);
        let (y_min, y_max) = padded_range(points.iter().map(|p| p.y), 0.08);

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 26))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_desc(x.label())
            .y_desc(y.label())
            .light_line_style(RGBColor(235, 235, 235))
            .draw()?;

        for point in &points {
            let color = palette_color(point.index);
            chart
                .draw_series(std::iter::once(Circle::new(
                    (point.x, point.y),
                    7,
                    color.filled(),
                )))?
                .label(point.label.clone())
                .legend(move |(lx, ly)| Circle::new((lx, ly), 5, color.filled()));
        }

        if !points.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.85))
                .border_style(BLACK)
                .label_font((FONT, 12))
                .draw()?;
        }
        Ok(())
    }

    fn draw_heatmap(
        root: &Area<'_>,
        matrix: &CorrelationMatrix,
        title: &str,
    ) -> Result<(), RenderError> {
        let (width, height) = root.dim_in_pixel();
        let k = matrix.metrics.len();

        let title_style = (FONT, 24).into_font().color(&BLACK).pos(Pos::new(HPos::Center, VPos::Top));
        root.draw(&Text::new(title.to_string(), (width as i32 / 2, 15), title_style))?;
        if k == 0 {
            return Ok(());
        }

        // Grid origin leaves room for row labels on the left, column labels
        // below and a color bar on the right.
        let left = 230i32;
        let top = 60i32;
        let bar_w = 90i32;
        let grid = (width as i32 - left - bar_w - 20)
            .min(height as i32 - top - 190)
            .max(k as i32);
        let cell = grid / k as i32;

        let label_style = (FONT, 15).into_font().color(&BLACK);
        let annot_size = (cell / 4).clamp(10, 22) as f64;

        for (i, row_metric) in matrix.metrics.iter().enumerate() {
            let y0 = top + i as i32 * cell;
            root.draw(&Text::new(
                row_metric.column_name(),
                (left - 8, y0 + cell / 2),
                label_style.pos(Pos::new(HPos::Right, VPos::Center)),
            ))?;

            for j in 0..k {
                let x0 = left + j as i32 * cell;
                let r = matrix.values[i][j];
                root.draw(&Rectangle::new(
                    [(x0, y0), (x0 + cell, y0 + cell)],
                    coolwarm(r).filled(),
                ))?;
                root.draw(&Rectangle::new([(x0, y0), (x0 + cell, y0 + cell)], WHITE))?;

                let text = if r.is_nan() { "nan".to_string() } else { format!("{r:.2}") };
                let ink = if r.abs() > 0.6 { WHITE } else { BLACK };
                root.draw(&Text::new(
                    text,
                    (x0 + cell / 2, y0 + cell / 2),
                    (FONT, annot_size)
                        .into_font()
                        .color(&ink)
                        .pos(Pos::new(HPos::Center, VPos::Center)),
                ))?;
            }
        }

        let bottom = top + k as i32 * cell;
        for (j, col_metric) in matrix.metrics.iter().enumerate() {
            let x = left + j as i32 * cell + cell / 2;
            root.draw(&Text::new(
                col_metric.column_name(),
                (x, bottom + 8),
                (FONT, 15)
                    .into_font()
                    .transform(FontTransform::Rotate90)
                    .color(&BLACK)
                    .pos(Pos::new(HPos::Left, VPos::Center)),
            ))?;
        }

        // Color bar from +1 (top) to -1 (bottom).
        let bar_x = left + k as i32 * cell + 25;
        let bar_h = k as i32 * cell;
        for step in 0..bar_h {
            let value = 1.0 - 2.0 * step as f64 / bar_h.max(1) as f64;
            root.draw(&Rectangle::new(
                [(bar_x, top + step), (bar_x + 20, top + step + 1)],
                coolwarm(value).filled(),
            ))?;
        }
        for (value, y) in [(1.0, top), (0.0, top + bar_h / 2), (-1.0, top + bar_h)] {
            root.draw(&Text::new(
                format!("{value:.1}"),
                (bar_x + 26, y),
                label_style.pos(Pos::new(HPos::Left, VPos::Center)),
            ))?;
        }
        Ok(())
    }

    fn draw_graduation_comparison(
        root: &Area<'_>,
        table: &DerivedTable,
        title: &str,
    ) -> Result<(), RenderError> {
        let rows = grouped_values(table, Metric::GraduateRate4yr, Metric::GraduateRate6yr);
        let n = rows.len().max(1);
        let x_max = rows
            .iter()
            .flat_map(|r| [r.first, r.second])
            .flatten()
            .fold(1.0f64, f64::max);

        let labels: Vec<String> = rows.iter().map(|r| r.label.clone()).collect();
        let y_formatter = |v: &f64| category_label(&labels, *v);

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 26))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(190)
            .build_cartesian_2d(0.0..x_max * 1.05, -0.5..(n as f64 - 0.5))?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .y_label_formatter(&y_formatter)
            .x_desc("Rate")
            .draw()?;

        let bar = |index: usize, value: f64, lower: f64, upper: f64, color: RGBColor| {
            let y = index as f64;
            Rectangle::new([(0.0, y + lower), (value, y + upper)], color.filled())
        };

        chart
            .draw_series(rows.iter().enumerate().filter_map(|(i, r)| {
                r.first.map(|v| bar(i, v, -0.4, 0.0, FIRST_SERIES_COLOR))
            }))?
            .label(Metric::GraduateRate4yr.column_name())
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 14, y + 5)], FIRST_SERIES_COLOR.filled()));

        chart
            .draw_series(rows.iter().enumerate().filter_map(|(i, r)| {
                r.second.map(|v| bar(i, v, 0.0, 0.4, SECOND_SERIES_COLOR))
            }))?
            .label(Metric::GraduateRate6yr.column_name())
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 14, y + 5)], SECOND_SERIES_COLOR.filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    }

    fn draw_admission_vs_volume(
        root: &Area<'_>,
        table: &DerivedTable,
        title: &str,
    ) -> Result<(), RenderError> {
        let rows = grouped_values(table, Metric::AdmissionRate, Metric::ApplicationVolume);
        let n = rows.len().max(1);
        let rate_max = rows.iter().filter_map(|r| r.first).fold(0.0f64, f64::max);
        let (_, volume_max) = padded_range(rows.iter().filter_map(|r| r.second), 0.1);

        let labels: Vec<String> = rows.iter().map(|r| r.label.clone()).collect();
        let x_formatter = |v: &f64| category_label(&labels, *v);
        let x_range = -0.5..(n as f64 - 0.5);

        let mut chart = ChartBuilder::on(root)
            .caption(title, (FONT, 26))
            .margin(20)
            .x_label_area_size(170)
            .y_label_area_size(70)
            .right_y_label_area_size(90)
            .build_cartesian_2d(x_range.clone(), 0.0..(rate_max * 1.1).max(0.1))?
            .set_secondary_coord(x_range, 0.0..volume_max.max(1.0));

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&x_formatter)
            .x_label_style(
                (FONT, 13)
                    .into_font()
                    .transform(FontTransform::Rotate90)
                    .color(&BLACK),
            )
            .y_desc("Admission Rate")
            .axis_desc_style((FONT, 15).into_font().color(&FIRST_SERIES_COLOR))
            .draw()?;

        chart
            .configure_secondary_axes()
            .y_desc("Application Volume")
            .axis_desc_style((FONT, 15).into_font().color(&SECOND_SERIES_COLOR))
            .draw()?;

        chart
            .draw_series(rows.iter().enumerate().filter_map(|(i, r)| {
                let x = i as f64;
                r.first.map(|rate| {
                    Rectangle::new([(x - 0.35, 0.0), (x + 0.35, rate)], FIRST_SERIES_COLOR.mix(0.7).filled())
                })
            }))?
            .label("Admission Rate")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 14, y + 5)], FIRST_SERIES_COLOR.filled()));

        let volume_points: Vec<(f64, f64)> = rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.second.map(|v| (i as f64, v)))
            .collect();

        chart
            .draw_secondary_series(LineSeries::new(
                volume_points.iter().copied(),
                SECOND_SERIES_COLOR.stroke_width(2),
            ))?
            .label("Application Volume")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 14, y)], SECOND_SERIES_COLOR.stroke_width(2)));

        chart.draw_secondary_series(
            volume_points
                .iter()
                .map(|&(x, v)| Circle::new((x, v), 5, SECOND_SERIES_COLOR.filled())),
        )?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    }

    fn draw_pairplot(
        root: &Area<'_>,
        table: &DerivedTable,
        title: &str,
        metrics: &[Metric],
    ) -> Result<(), RenderError> {
        let body = root.titled(title, (FONT, 30))?;
        let k = metrics.len();
        if k == 0 {
            return Ok(());
        }

        let panels = body.split_evenly((k, k));
        let ranges: Vec<(f64, f64)> = metrics
            .iter()
            .map(|&m| padded_range(finite_values(table, m), 0.05))
            .collect();

        for (idx, panel) in panels.iter().enumerate() {
            let (row, col) = (idx / k, idx % k);
            let (x_metric, y_metric) = (metrics[col], metrics[row]);
            let x_range = ranges[col].0..ranges[col].1;

            let mut builder = ChartBuilder::on(panel);
            builder
                .margin(4)
                .x_label_area_size(if row == k - 1 { 30 } else { 0 })
                .y_label_area_size(if col == 0 { 40 } else { 0 });

            if row == col {
                let bins = histogram(&finite_values(table, x_metric), HISTOGRAM_BINS);
                let top = bins.iter().map(|b| b.2).max().unwrap_or(1).max(1) as f64;
                let mut chart = builder.build_cartesian_2d(x_range, 0.0..top * 1.1)?;
                Self::pairplot_mesh(&mut chart, row == k - 1, col == 0, x_metric, y_metric)?;
                chart.draw_series(bins.into_iter().map(|(lo, hi, count)| {
                    Rectangle::new([(lo, 0.0), (hi, count as f64)], FIRST_SERIES_COLOR.mix(0.8).filled())
                }))?;
            } else {
                let y_range = ranges[row].0..ranges[row].1;
                let mut chart = builder.build_cartesian_2d(x_range, y_range)?;
                Self::pairplot_mesh(&mut chart, row == k - 1, col == 0, x_metric, y_metric)?;
                chart.draw_series(
                    scatter_points(table, x_metric, y_metric)
                        .into_iter()
                        .map(|p| Circle::new((p.x, p.y), 3, FIRST_SERIES_COLOR.filled())),
                )?;
            }
        }
        Ok(())
    }

    fn pairplot_mesh<'a, 'b>(
        chart: &mut ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
        bottom: bool,
        left: bool,
        x_metric: Metric,
        y_metric: Metric,
    ) -> Result<(), RenderError> {
        let mut mesh = chart.configure_mesh();
        mesh.disable_mesh()
            .x_labels(if bottom { 3 } else { 0 })
            .y_labels(if left { 3 } else { 0 })
            .label_style((FONT, 10));
        if bottom {
            mesh.x_desc(x_metric.column_name());
        }
        if left {
            mesh.y_desc(y_metric.column_name());
        }
        mesh.axis_desc_style((FONT, 11)).draw()?;
        Ok(())
    }
}

/// Label for an integer tick on a categorical axis, blank between categories.
fn category_label(labels: &[String], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}
