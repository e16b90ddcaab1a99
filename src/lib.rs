//! College Metrics - feature engineering and static charts for college statistics
//!
//! Loads a college statistics CSV, derives average graduation rate, graduation
//! rate improvement, selectivity score and cohort size per institution, writes
//! the engineered dataset and renders exploratory charts.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod stats;

pub use config::PipelineConfig;
pub use pipeline::{run, PipelineReport, Stage};
