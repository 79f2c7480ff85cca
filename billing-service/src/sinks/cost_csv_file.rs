use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use futures::StreamExt;

use crate::engine::MeterCost;
use crate::pipeline::{Envelope, PipelineError, Sink};

pub const COST_HEADER: [&str; 2] = ["id", "cost"];

/// Writes `id,cost` rows to a delimited file.
///
/// Rows go to a staging file next to the target, which is renamed into place
/// only after every row has been written and flushed. A failed run leaves no
/// output file behind.
pub struct CostCsvFileSink {
    path: PathBuf,
}

impl CostCsvFileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "output.csv".into());
        name.push(".partial");
        self.path.with_file_name(name)
    }

    async fn write_rows<S>(&self, staging: &Path, input: &mut S) -> Result<u64, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<MeterCost>, PipelineError>> + Send + Unpin,
    {
        let file = File::create(staging).map_err(|e| write_err(staging, e))?;
        let mut wtr = csv::Writer::from_writer(file);
        wtr.write_record(COST_HEADER).map_err(|e| write_err(staging, e))?;

        let mut written: u64 = 0;
        while let Some(item) = input.next().await {
            let env = item?;
            let row = [env.payload.meter_id.to_string(), format!("{:.2}", env.payload.cost)];
            wtr.write_record(&row).map_err(|e| write_err(staging, e))?;
            written += 1;
        }

        wtr.flush().map_err(|e| write_err(staging, e))?;
        Ok(written)
    }
}

fn write_err(path: &Path, e: impl std::fmt::Display) -> PipelineError {
    PipelineError::OutputWrite(format!("{}: {e}", path.display()))
}

#[async_trait::async_trait]
impl Sink<MeterCost> for CostCsvFileSink {
    async fn run<S>(&self, mut input: S) -> Result<(), PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<MeterCost>, PipelineError>> + Send + Unpin + 'static,
    {
        let staging = self.staging_path();

        let result = self.write_rows(&staging, &mut input).await;

        match result {
            Ok(written) => {
                fs::rename(&staging, &self.path).map_err(|e| write_err(&self.path, e))?;
                tracing::info!(path = %self.path.display(), rows = written, "cost report written");
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&staging);
                tracing::error!(error = %e, "cost report write failed");
                Err(e)
            }
        }
    }
}
