//! Statistics Calculator Module
//! Descriptive statistics and Pearson correlation over derived college metrics.

use crate::data::{DerivedTable, Metric};
use serde::Serialize;
use statrs::statistics::Statistics;

/// Descriptive statistics for one metric column.
#[derive(Debug, Clone, Serialize)]
pub struct MetricSummary {
    pub metric: Metric,
    /// Non-null values.
    pub count: usize,
    /// Null values skipped.
    pub missing: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p05: f64,
    pub p95: f64,
}

impl MetricSummary {
    fn empty(metric: Metric, missing: usize) -> Self {
        Self {
            metric,
            count: 0,
            missing,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            p05: f64::NAN,
            p95: f64::NAN,
        }
    }
}

/// Pearson correlation matrix, row-major, `metrics.len()` squared.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub metrics: Vec<Metric>,
    pub values: Vec<Vec<f64>>,
    /// Rows used after dropping any row with a null in a requested metric.
    pub rows_used: usize,
}

impl CorrelationMatrix {
    pub fn get(&self, row: Metric, col: Metric) -> Option<f64> {
        let i = self.metrics.iter().position(|m| *m == row)?;
        let j = self.metrics.iter().position(|m| *m == col)?;
        Some(self.values[i][j])
    }
}

pub struct StatsCalculator;

impl StatsCalculator {
    /// Summaries for every numeric metric, in `Metric::ALL` order.
    pub fn describe(table: &DerivedTable) -> Vec<MetricSummary> {
        Metric::ALL
            .iter()
            .map(|&metric| Self::summarize(metric, &table.values(metric)))
            .collect()
    }

    /// Summary of one column. Nulls and NaNs are skipped and counted as missing.
    pub fn summarize(metric: Metric, column: &[Option<f64>]) -> MetricSummary {
        let values: Vec<f64> = column.iter().flatten().copied().filter(|v| !v.is_nan()).collect();
        let missing = column.len() - values.len();
        let n = values.len();
        if n == 0 {
            return MetricSummary::empty(metric, missing);
        }

        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        let std = if n > 1 { values.iter().std_dev() } else { 0.0 };

        MetricSummary {
            metric,
            count: n,
            missing,
            mean: values.iter().mean(),
            median,
            std,
            min: sorted[0],
            max: sorted[n - 1],
            p05: Self::percentile(&sorted, 5.0),
            p95: Self::percentile(&sorted, 95.0),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
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

    /// Pearson coefficient of two equally long samples. NaN when either side
    /// is constant or fewer than two pairs exist.
    pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
        if xs.len() != ys.len() || xs.len() < 2 {
            return f64::NAN;
        }
        let sx = xs.iter().std_dev();
        let sy = ys.iter().std_dev();
        if sx == 0.0 || sy == 0.0 || sx.is_nan() || sy.is_nan() {
            return f64::NAN;
        }
        let r = xs.iter().covariance(ys.iter()) / (sx * sy);
        r.clamp(-1.0, 1.0)
    }

    /// Correlation matrix over `metrics`, dropping rows with any null among them.
    pub fn correlation_matrix(table: &DerivedTable, metrics: &[Metric]) -> CorrelationMatrix {
        let rows: Vec<Vec<f64>> = table
            .records()
            .iter()
            .filter_map(|record| {
                metrics
                    .iter()
                    .map(|m| m.value(record).filter(|v| !v.is_nan()))
                    .collect::<Option<Vec<f64>>>()
            })
            .collect();

        let columns: Vec<Vec<f64>> = (0..metrics.len())
            .map(|j| rows.iter().map(|row| row[j]).collect())
            .collect();

        // Upper triangle only, mirrored, so the matrix is exactly symmetric.
        let k = metrics.len();
        let mut values = vec![vec![f64::NAN; k]; k];
        for i in 0..k {
            for j in i..k {
                let r = Self::pearson(&columns[i], &columns[j]);
                let r = if i == j && !r.is_nan() { 1.0 } else { r };
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        CorrelationMatrix {
            metrics: metrics.to_vec(),
            values,
            rows_used: rows.len(),
        }
    }
}
