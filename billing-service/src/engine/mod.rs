pub mod accumulator;
pub mod organizer;
pub mod rounding;
pub mod tariff;
pub mod totals;

use std::{
    hash::{Hash, Hasher},
    sync::Arc,
};

use energy_domain::MeterId;
use futures::StreamExt;

pub use accumulator::{CostAccumulator, PairOutcome, SeriesCost};
pub use organizer::{organize, MeterSeries, OrganizedBatch, ReadingOrganizer, RowError, RowOutcome, SeriesTable};
pub use tariff::TariffSchedule;
pub use totals::{MeterCost, TotalsTable};

use crate::pipeline::PipelineError;
use crate::report::PairSummary;

fn shard_index(meter_id: MeterId, workers: usize) -> usize {
    let mut h = std::collections::hash_map::DefaultHasher::new();
    meter_id.hash(&mut h);
    (h.finish() as usize) % workers.max(1)
}

/// Runs the cost accumulator over an organized batch, optionally spreading
/// meters across worker tasks.
///
/// Each meter's series is handled by exactly one worker, so totals do not
/// depend on the worker count.
#[derive(Debug, Clone)]
pub struct BillingEngine {
    accumulator: Arc<CostAccumulator>,
    workers: usize,
}

impl BillingEngine {
    pub fn new(accumulator: CostAccumulator, workers: usize) -> Self {
        Self {
            accumulator: Arc::new(accumulator),
            workers: workers.max(1),
        }
    }

    pub fn accumulator(&self) -> &CostAccumulator {
        &self.accumulator
    }

    pub async fn run(&self, batch: OrganizedBatch) -> Result<(TotalsTable, PairSummary), PipelineError> {
        let OrganizedBatch { series, mut totals, .. } = batch;

        if self.workers == 1 {
            let summary = self.accumulator.accumulate(&series, &mut totals);
            return Ok((totals, summary));
        }

        let mut txs = Vec::with_capacity(self.workers);
        let mut joins = Vec::with_capacity(self.workers);

        for _ in 0..self.workers {
            let (tx, rx) = tokio::sync::mpsc::channel::<(MeterId, MeterSeries)>(64);
            txs.push(tx);

            let acc = self.accumulator.clone();
            let mut input = tokio_stream::wrappers::ReceiverStream::new(rx);

            joins.push(tokio::spawn(async move {
                let mut costs: Vec<(MeterId, f64)> = Vec::new();
                let mut summary = PairSummary::default();
                while let Some((meter_id, s)) = input.next().await {
                    let cost = acc.accumulate_series(meter_id, &s);
                    costs.push((meter_id, cost.total));
                    summary.merge(cost.pairs);
                }
                (costs, summary)
            }));
        }

        for (meter_id, s) in series {
            let idx = shard_index(meter_id, self.workers);
            if txs[idx].send((meter_id, s)).await.is_err() {
                return Err(PipelineError::Engine("accumulator worker channel closed".to_string()));
            }
        }

        drop(txs);

        let mut summary = PairSummary::default();
        for j in joins {
            match j.await {
                Ok((costs, part)) => {
                    for (meter_id, cost) in costs {
                        totals.add(meter_id, cost);
                    }
                    summary.merge(part);
                }
                Err(e) => return Err(PipelineError::Engine(format!("accumulator worker join error: {e}"))),
            }
        }

        Ok((totals, summary))
    }
}
