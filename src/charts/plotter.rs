//! Chart Plotter Module
//! Chart catalogue and the data preparation behind each chart.
//! Nothing here draws; it turns a `DerivedTable` into plain series.

use crate::data::{DerivedTable, Metric};
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// Point color cycle, one color per institution.
pub const PALETTE: [RGBColor; 12] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(255, 87, 34),   // Deep Orange
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
    RGBColor(205, 220, 57),  // Lime
];

pub const FIRST_SERIES_COLOR: RGBColor = RGBColor(91, 155, 213);
pub const SECOND_SERIES_COLOR: RGBColor = RGBColor(237, 125, 49);
pub const MISSING_COLOR: RGBColor = RGBColor(200, 200, 200);

/// Color for the `index`-th institution.
pub fn palette_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Diverging blue-white-red scale over [-1, 1]. NaN maps to grey.
pub fn coolwarm(value: f64) -> RGBColor {
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    if value.is_nan() {
        return MISSING_COLOR;
    }
    let t = value.clamp(-1.0, 1.0);
    let (from, to, frac) = if t < 0.0 {
        (COLD, MID, t + 1.0)
    } else {
        (MID, WARM, t)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * frac).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

// ---------------------------------------------------------------------------
// Chart requests
// ---------------------------------------------------------------------------

/// One image to produce. Each request maps to exactly one output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartRequest {
    /// One point per institution, colored by institution.
    Scatter { x: Metric, y: Metric },
    /// Annotated Pearson correlation heatmap.
    CorrelationHeatmap { metrics: Vec<Metric> },
    /// Horizontal grouped bars of 4-year and 6-year graduation rates.
    GraduationComparison,
    /// Admission rate bars with application volume on a secondary axis.
    AdmissionVsVolume,
    /// Scatter matrix with histograms on the diagonal.
    PairPlot { metrics: Vec<Metric> },
}

impl ChartRequest {
    pub fn scatter(x: Metric, y: Metric) -> Self {
        ChartRequest::Scatter { x, y }
    }

    /// The full set of charts produced by a default run.
    pub fn default_catalog() -> Vec<ChartRequest> {
        use Metric::*;
        vec![
            Self::scatter(AdmissionRate, GraduateRate6yr),
            Self::scatter(ApplicationVolume, AdmissionRate),
            Self::scatter(CohortSize, GraduateRate4yr),
            Self::scatter(CohortSize, GraduateRate6yr),
            Self::scatter(SelectivityScore, GraduateRate6yr),
            Self::scatter(TuitionCost, GraduateRate6yr),
            Self::scatter(TuitionCost, AvgGraduationRate),
            Self::scatter(SelectivityScore, AvgGraduationRate),
            ChartRequest::CorrelationHeatmap {
                metrics: Metric::ALL.to_vec(),
            },
            ChartRequest::CorrelationHeatmap {
                metrics: Metric::ENGINEERED.to_vec(),
            },
            ChartRequest::GraduationComparison,
            ChartRequest::AdmissionVsVolume,
            ChartRequest::PairPlot {
                metrics: Metric::ALL.to_vec(),
            },
        ]
    }

    /// Deterministic output file name.
    pub fn file_name(&self) -> String {
        let stem = match self {
            ChartRequest::Scatter { x, y } => format!("{x}_vs_{y}"),
            ChartRequest::CorrelationHeatmap { metrics } => {
                if metrics.as_slice() == Metric::ALL {
                    "correlation_heatmap".to_string()
                } else if metrics.as_slice() == Metric::ENGINEERED {
                    "engineered_correlation_heatmap".to_string()
                } else {
                    format!("correlation_heatmap_{}", join_metrics(metrics))
                }
            }
            ChartRequest::GraduationComparison => "graduation_rates_comparison".to_string(),
            ChartRequest::AdmissionVsVolume => "admission_rate_vs_application_volume".to_string(),
            ChartRequest::PairPlot { metrics } => {
                if metrics.as_slice() == Metric::ALL {
                    "pairplot_college_metrics".to_string()
                } else {
                    format!("pairplot_{}", join_metrics(metrics))
                }
            }
        };
        format!("{stem}.png")
    }

    pub fn title(&self) -> String {
        match self {
            ChartRequest::Scatter { x, y } => format!("{} vs {}", x.label(), y.label()),
            ChartRequest::CorrelationHeatmap { metrics } => {
                if metrics.as_slice() == Metric::ENGINEERED {
                    "Correlation between Engineered Features".to_string()
                } else {
                    "Correlation Heatmap of College Metrics".to_string()
                }
            }
            ChartRequest::GraduationComparison => {
                "4-Year vs 6-Year Graduation Rates by College".to_string()
            }
            ChartRequest::AdmissionVsVolume => {
                "Admission Rate vs Application Volume by College".to_string()
            }
            ChartRequest::PairPlot { .. } => "Pairplot of College Metrics".to_string(),
        }
    }

    /// Figure size in inches; pixels are this times the configured DPI.
    pub fn figsize(&self) -> (f64, f64) {
        match self {
            ChartRequest::Scatter { .. } => (8.0, 6.0),
            ChartRequest::CorrelationHeatmap { .. } => (10.0, 8.0),
            ChartRequest::GraduationComparison => (10.0, 6.0),
            ChartRequest::AdmissionVsVolume => (12.0, 6.0),
            ChartRequest::PairPlot { metrics } => {
                let side = (metrics.len().max(1) as f64 * 2.0).max(4.0);
                (side, side)
            }
        }
    }

    pub fn pixel_size(&self, dpi: u32) -> (u32, u32) {
        let (w, h) = self.figsize();
        ((w * dpi as f64).round() as u32, (h * dpi as f64).round() as u32)
    }
}

fn join_metrics(metrics: &[Metric]) -> String {
    metrics
        .iter()
        .map(|m| m.column_name())
        .collect::<Vec<_>>()
        .join("_")
}

// ---------------------------------------------------------------------------
// Data preparation
// ---------------------------------------------------------------------------

/// A scatter point labelled with its institution. `index` is the source row.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub index: usize,
    pub label: String,
    pub x: f64,
    pub y: f64,
}

/// Points for an x/y pair; rows with a null or NaN on either axis are omitted.
pub fn scatter_points(table: &DerivedTable, x: Metric, y: Metric) -> Vec<ScatterPoint> {
    table
        .records()
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let px = x.value(record).filter(|v| v.is_finite())?;
            let py = y.value(record).filter(|v| v.is_finite())?;
            Some(ScatterPoint {
                index,
                label: record.name().to_string(),
                x: px,
                y: py,
            })
        })
        .collect()
}

/// Two values per institution for grouped/dual-axis charts.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedValues {
    pub label: String,
    pub first: Option<f64>,
    pub second: Option<f64>,
}

/// Institutions with at least one of the two metrics present, in source order.
pub fn grouped_values(table: &DerivedTable, first: Metric, second: Metric) -> Vec<GroupedValues> {
    table
        .records()
        .iter()
        .filter_map(|record| {
            let a = first.value(record).filter(|v| v.is_finite());
            let b = second.value(record).filter(|v| v.is_finite());
            if a.is_none() && b.is_none() {
                return None;
            }
            Some(GroupedValues {
                label: record.name().to_string(),
                first: a,
                second: b,
            })
        })
        .collect()
}

/// Non-null finite values of one metric.
pub fn finite_values(table: &DerivedTable, metric: Metric) -> Vec<f64> {
    table
        .values(metric)
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect()
}

/// Equal-width histogram bins as `(low, high, count)`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo == hi {
        return vec![(lo - 0.5, hi + 0.5, values.len())];
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| (lo + i as f64 * width, lo + (i + 1) as f64 * width, count))
        .collect()
}

/// Axis range covering `values` with `pad` fractional padding on both ends.
pub fn padded_range(values: impl IntoIterator<Item = f64>, pad: f64) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo.is_infinite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        let half = if lo == 0.0 { 0.5 } else { lo.abs() * 0.1 };
        return (lo - half, hi + half);
    }
    let margin = (hi - lo) * pad;
    (lo - margin, hi + margin)
}
