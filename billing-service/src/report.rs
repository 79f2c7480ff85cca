use energy_domain::{MeterId, UnknownEnergyType};
use serde::Serialize;

use crate::engine::accumulator::PairOutcome;

/// Upper bound on individual issues kept per report section. Counters keep
/// counting past it.
pub const MAX_ISSUE_SAMPLES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    /// 1-based record index in the source, header included.
    pub position: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnergyTypeIssue {
    pub meter_id: MeterId,
    /// Index of the pair's first reading within the meter series.
    pub pair_index: usize,
    pub code: i64,
}

/// Outcome counts for the organization stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowSummary {
    pub rows_read: u64,
    pub readings_accepted: u64,
    pub malformed_rows: u64,
    pub samples: Vec<RowIssue>,
}

impl RowSummary {
    pub fn record_accepted(&mut self) {
        self.rows_read += 1;
        self.readings_accepted += 1;
    }

    pub fn record_header(&mut self) {
        self.rows_read += 1;
    }

    pub fn record_malformed(&mut self, position: u64, reason: impl Into<String>) {
        self.rows_read += 1;
        self.malformed_rows += 1;
        if self.samples.len() < MAX_ISSUE_SAMPLES {
            self.samples.push(RowIssue {
                position,
                reason: reason.into(),
            });
        }
    }
}

/// Outcome counts for the accumulation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PairSummary {
    pub pairs_priced: u64,
    pub anomalous_deltas: u64,
    pub unknown_energy_type: u64,
    pub samples: Vec<EnergyTypeIssue>,
}

impl PairSummary {
    pub fn record(&mut self, meter_id: MeterId, pair_index: usize, outcome: &PairOutcome) {
        match outcome {
            PairOutcome::Priced { .. } => self.pairs_priced += 1,
            PairOutcome::Anomalous { .. } => self.anomalous_deltas += 1,
            PairOutcome::UnknownEnergyType(UnknownEnergyType { code }) => {
                self.unknown_energy_type += 1;
                if self.samples.len() < MAX_ISSUE_SAMPLES {
                    self.samples.push(EnergyTypeIssue {
                        meter_id,
                        pair_index,
                        code: *code,
                    });
                }
            }
        }
    }

    /// Fold another shard's summary into this one. Samples are kept ordered by
    /// meter and pair so the result does not depend on shard completion order.
    pub fn merge(&mut self, other: PairSummary) {
        self.pairs_priced += other.pairs_priced;
        self.anomalous_deltas += other.anomalous_deltas;
        self.unknown_energy_type += other.unknown_energy_type;
        if other.samples.is_empty() {
            return;
        }
        self.samples.extend(other.samples);
        self.samples.sort_by_key(|s| (s.meter_id, s.pair_index));
        self.samples.truncate(MAX_ISSUE_SAMPLES);
    }
}

/// Everything a batch run learned about its input, besides the totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub meters: usize,
    pub rows: RowSummary,
    pub pairs: PairSummary,
}

impl BatchReport {
    pub fn has_data_quality_issues(&self) -> bool {
        self.rows.malformed_rows > 0 || self.pairs.unknown_energy_type > 0
    }

    pub fn log_summary(&self) {
        if self.has_data_quality_issues() {
            tracing::warn!(
                meters = self.meters,
                rows_read = self.rows.rows_read,
                malformed_rows = self.rows.malformed_rows,
                pairs_priced = self.pairs.pairs_priced,
                anomalous_deltas = self.pairs.anomalous_deltas,
                unknown_energy_type = self.pairs.unknown_energy_type,
                "billing batch finished with rejected input"
            );
        } else {
            tracing::info!(
                meters = self.meters,
                rows_read = self.rows.rows_read,
                pairs_priced = self.pairs.pairs_priced,
                anomalous_deltas = self.pairs.anomalous_deltas,
                "billing batch finished"
            );
        }
    }
}
