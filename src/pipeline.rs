//! Pipeline Runner
//! Load → derive → write → describe → render, halting at the first failing stage.

use crate::charts::StaticChartRenderer;
use crate::config::PipelineConfig;
use crate::data::{self, RangeIssue};
use crate::stats::{MetricSummary, StatsCalculator};
use anyhow::{Context, Result};
use log::{info, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Derive,
    Write,
    Summary,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Derive => "derive",
            Stage::Write => "write",
            Stage::Summary => "summary",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

/// What a successful run produced.
#[derive(Debug)]
pub struct PipelineReport {
    pub rows: usize,
    pub issues: Vec<RangeIssue>,
    pub output_path: PathBuf,
    pub summary: Vec<MetricSummary>,
    pub charts: Vec<PathBuf>,
}

pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    info!("Starting feature engineering on {}", config.input_path.display());

    let table = data::load(&config.input_path)
        .with_context(|| format!("{} stage failed ({})", Stage::Load, config.input_path.display()))?;

    let issues = data::audit(&table);
    for issue in &issues {
        warn!("{issue}");
    }

    let derived = data::FeatureDeriver::derive(&table)
        .with_context(|| format!("{} stage failed", Stage::Derive))?;

    data::write_csv(&derived, &config.output_path).with_context(|| {
        format!("{} stage failed ({})", Stage::Write, config.output_path.display())
    })?;
    info!("Feature engineering completed");

    let summary = StatsCalculator::describe(&derived);
    for s in &summary {
        info!(
            "{:<28} n={:<4} mean={:<12.4} std={:<12.4} min={:<12.4} max={:.4}",
            s.metric.column_name(),
            s.count,
            s.mean,
            s.std,
            s.min,
            s.max
        );
    }
    if let Some(path) = &config.summary_path {
        write_summary(&summary, path)
            .with_context(|| format!("{} stage failed ({})", Stage::Summary, path.display()))?;
    }

    let charts = if config.render_charts {
        info!("Starting visualizations");
        StaticChartRenderer::new(config.dpi)
            .render_all(&derived, &config.chart_requests(), &config.figures_dir)
            .with_context(|| format!("{} stage failed", Stage::Render))?
    } else {
        Vec::new()
    };

    Ok(PipelineReport {
        rows: derived.len(),
        issues,
        output_path: config.output_path.clone(),
        summary,
        charts,
    })
}

fn write_summary(summary: &[MetricSummary], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json)?;
    info!("Summary statistics saved to {}", path.display());
    Ok(())
}
