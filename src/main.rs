//! College Metrics - command line entry point
//!
//! Usage: `college-metrics [INPUT] [OUTPUT]`. Everything else comes from the
//! JSON config (see `PipelineConfig`). Set `RUST_LOG` to change verbosity.

use anyhow::Result;
use college_metrics::{run, PipelineConfig};
use log::info;
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = PipelineConfig::discover()?;

    let mut args = std::env::args_os().skip(1);
    if let Some(input) = args.next() {
        config.input_path = PathBuf::from(input);
    }
    if let Some(output) = args.next() {
        config.output_path = PathBuf::from(output);
    }
    config.validate()?;

    let report = run(&config)?;
    info!(
        "Done: {} rows, {} warnings, {} charts, dataset at {}",
        report.rows,
        report.issues.len(),
        report.charts.len(),
        report.output_path.display()
    );
    Ok(())
}
