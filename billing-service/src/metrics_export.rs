use std::{fs, path::Path};

use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Counters emitted before this call are lost.
pub fn init() -> anyhow::Result<()> {
    if PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus metrics recorder")?;

    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

/// Dump the current metrics in text exposition format, for a node-exporter
/// style textfile collector. A no-op when the recorder was never installed.
pub fn write_textfile(path: &Path) -> anyhow::Result<()> {
    let Some(handle) = PROM_HANDLE.get() else {
        return Ok(());
    };

    fs::write(path, handle.render()).with_context(|| format!("failed to write metrics to {}", path.display()))?;
    tracing::info!(path = %path.display(), "metrics textfile written");
    Ok(())
}
