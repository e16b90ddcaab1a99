//! Stats module - Descriptive statistics and correlation

mod calculator;

pub use calculator::{CorrelationMatrix, MetricSummary, StatsCalculator};
