use std::collections::BTreeMap;

use energy_domain::MeterId;

use super::rounding::round_half_away_from_zero;

/// Decimal places used for reported costs.
pub const COST_DECIMALS: u32 = 2;

/// Running cost per meter. Ordered by meter id so output is stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TotalsTable {
    costs: BTreeMap<MeterId, f64>,
}

/// One output row: a meter and its rounded total cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterCost {
    pub meter_id: MeterId,
    pub cost: f64,
}

impl TotalsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure `meter_id` has an entry, starting at zero.
    pub fn register(&mut self, meter_id: MeterId) {
        self.costs.entry(meter_id).or_insert(0.0);
    }

    pub fn add(&mut self, meter_id: MeterId, cost: f64) {
        debug_assert!(cost >= 0.0, "totals only grow");
        *self.costs.entry(meter_id).or_insert(0.0) += cost;
    }

    pub fn get(&self, meter_id: MeterId) -> Option<f64> {
        self.costs.get(&meter_id).copied()
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeterId, f64)> + '_ {
        self.costs.iter().map(|(id, cost)| (*id, *cost))
    }

    /// Output rows with costs rounded for reporting. The table itself keeps
    /// full precision.
    pub fn rounded(&self) -> Vec<MeterCost> {
        self.iter()
            .map(|(meter_id, cost)| MeterCost {
                meter_id,
                cost: round_half_away_from_zero(cost, COST_DECIMALS),
            })
            .collect()
    }
}
