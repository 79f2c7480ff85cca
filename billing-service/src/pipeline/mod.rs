use std::pin::Pin;

use csv::StringRecord;
use futures::{stream, Stream, StreamExt};

use crate::engine::{BillingEngine, MeterCost, ReadingOrganizer};
use crate::report::BatchReport;

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    /// 1-based record index within the stream it came from.
    pub position: u64,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("input unavailable: {0}")]
    InputUnavailable(String),
    #[error("malformed row at record {position}: {reason}")]
    MalformedRow { position: u64, reason: String },
    #[error("engine error: {0}")]
    Engine(String),
    #[error("output write failed: {0}")]
    OutputWrite(String),
}

impl PipelineError {
    /// Data-quality errors are absorbed by the batch; everything else aborts it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MalformedRow { .. })
    }
}

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(
        &self,
    ) -> Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn run<S>(&self, input: S) -> Result<(), PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

/// One billing batch: raw rows in, per-meter costs out.
pub struct Pipeline<S, K> {
    pub source: S,
    pub engine: BillingEngine,
    pub sink: K,
}

impl<S, K> Pipeline<S, K>
where
    S: Source<StringRecord> + Send + Sync + 'static,
    K: Sink<MeterCost> + Send + Sync + 'static,
{
    pub async fn run(self) -> Result<BatchReport, PipelineError> {
        let mut input = self.source.stream().await;
        let mut organizer = ReadingOrganizer::new();

        while let Some(item) = input.next().await {
            match item {
                Ok(env) => {
                    organizer.push_row(env.position, &env.payload);
                }
                Err(PipelineError::MalformedRow { position, reason }) => {
                    organizer.record_malformed(position, reason);
                }
                Err(e) => {
                    tracing::error!(error = %e, "billing input failed, aborting batch");
                    return Err(e);
                }
            }
        }

        let batch = organizer.finish();
        let rows = batch.rows.clone();
        let (totals, pairs) = self.engine.run(batch).await?;

        metrics::counter!("billing_pairs_priced_total").increment(pairs.pairs_priced);
        metrics::counter!("billing_anomalous_deltas_total").increment(pairs.anomalous_deltas);
        metrics::counter!("billing_unknown_energy_type_total").increment(pairs.unknown_energy_type);
        metrics::gauge!("billing_meters_total").set(totals.len() as f64);

        let report = BatchReport {
            meters: totals.len(),
            rows,
            pairs,
        };

        let costs = totals
            .rounded()
            .into_iter()
            .enumerate()
            .map(|(idx, cost)| {
                Ok::<_, PipelineError>(Envelope {
                    payload: cost,
                    position: idx as u64 + 1,
                })
            });
        self.sink.run(stream::iter(costs)).await?;

        Ok(report)
    }
}
