use anyhow::{bail, Result};
use billing_service::{
    config::AppConfig,
    engine::BillingEngine,
    metrics_export,
    observability,
    pipeline::Pipeline,
    sinks::{self, CostCsvFileSink},
    sources::MeterReadingCsvFileSource,
};
use std::env;

/// Compute per-meter energy costs for one batch of readings.
///
/// Usage:
///   billing-service [input_csv] [output_csv]
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() > 3 {
        bail!("usage: billing-service [input_csv] [output_csv]");
    }

    // Load configuration (BILLING_CONFIG can point to a batch-specific file).
    let mut cfg = AppConfig::load()?;
    if let Some(path) = args.get(1) {
        cfg.input.path = path.into();
    }
    if let Some(path) = args.get(2) {
        cfg.output.path = path.into();
    }

    if cfg.metrics.is_some() {
        metrics_export::init()?;
    }

    let source = MeterReadingCsvFileSource::new(&cfg.input.path).with_delimiter(cfg.input_delimiter()?);
    let sink = CostCsvFileSink::new(&cfg.output.path);
    let engine = BillingEngine::new(cfg.cost_accumulator()?, cfg.engine.workers);

    tracing::info!(
        input = %cfg.input.path.display(),
        output = %cfg.output.path.display(),
        workers = cfg.engine.workers,
        "starting billing batch"
    );

    let pipeline = Pipeline { source, engine, sink };
    let report = pipeline.run().await?;
    report.log_summary();

    if let Some(path) = &cfg.output.report_path {
        sinks::write_report(path, &report)?;
    }
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_export::write_textfile(&metrics_cfg.textfile_path)?;
    }

    Ok(())
}
