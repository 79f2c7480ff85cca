use energy_domain::{MeterId, MeterReading, UnknownEnergyType};

use super::organizer::{MeterSeries, SeriesTable};
use super::tariff::TariffSchedule;
use super::totals::TotalsTable;
use crate::report::PairSummary;

/// Largest consumption, in kWh-equivalent, accepted between two readings.
pub const MAX_DELTA_KWH: f64 = 100.0;

/// What happened to one adjacent pair of readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairOutcome {
    Priced {
        delta_kwh: f64,
        unit_price: f64,
        cost: f64,
    },
    /// Negative, oversized or non-finite consumption: counter reset, meter swap
    /// or corrupt data. Contributes nothing.
    Anomalous { delta_kwh: f64 },
    UnknownEnergyType(UnknownEnergyType),
}

impl PairOutcome {
    pub fn cost(&self) -> f64 {
        match self {
            Self::Priced { cost, .. } => *cost,
            _ => 0.0,
        }
    }
}

/// Cost and pair outcomes for a single meter series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesCost {
    pub total: f64,
    pub pairs: PairSummary,
}

/// Turns meter series into costs.
#[derive(Debug, Clone)]
pub struct CostAccumulator {
    tariff: TariffSchedule,
    max_delta_kwh: f64,
}

impl Default for CostAccumulator {
    fn default() -> Self {
        Self::new(TariffSchedule::default(), MAX_DELTA_KWH)
    }
}

impl CostAccumulator {
    pub fn new(tariff: TariffSchedule, max_delta_kwh: f64) -> Self {
        Self { tariff, max_delta_kwh }
    }

    pub fn tariff(&self) -> &TariffSchedule {
        &self.tariff
    }

    /// A delta counts only when it is finite, has a clear sign bit and does
    /// not exceed the ceiling. `-0.0` is rejected.
    pub fn is_acceptable_delta(&self, delta_kwh: f64) -> bool {
        delta_kwh.is_finite() && !delta_kwh.is_sign_negative() && delta_kwh <= self.max_delta_kwh
    }

    /// Price the consumption between `start` and the reading that follows it.
    ///
    /// The tariff is taken from `start` alone, even when the interval crosses
    /// a tariff boundary.
    pub fn price_pair(&self, start: &MeterReading, end: &MeterReading) -> PairOutcome {
        let from = match start.kwh_equivalent() {
            Ok(v) => v,
            Err(e) => return PairOutcome::UnknownEnergyType(e),
        };
        let to = match end.kwh_equivalent() {
            Ok(v) => v,
            Err(e) => return PairOutcome::UnknownEnergyType(e),
        };

        let delta_kwh = to - from;
        if !self.is_acceptable_delta(delta_kwh) {
            return PairOutcome::Anomalous { delta_kwh };
        }

        match self.tariff.price_for(start.energy_type, start.ts) {
            Ok(unit_price) => PairOutcome::Priced {
                delta_kwh,
                unit_price,
                cost: delta_kwh * unit_price,
            },
            Err(e) => PairOutcome::UnknownEnergyType(e),
        }
    }

    pub fn accumulate_series(&self, meter_id: MeterId, series: &MeterSeries) -> SeriesCost {
        let mut out = SeriesCost::default();
        for (idx, (start, end)) in series.pairs().enumerate() {
            let outcome = self.price_pair(start, end);
            if let PairOutcome::UnknownEnergyType(e) = &outcome {
                tracing::debug!(meter_id, pair_index = idx, error = %e, "pair skipped");
            }
            out.total += outcome.cost();
            out.pairs.record(meter_id, idx, &outcome);
        }
        out
    }

    /// Add every meter's series cost into `totals`.
    ///
    /// Meters are independent, so iteration order across meters does not
    /// affect the result.
    pub fn accumulate(&self, series: &SeriesTable, totals: &mut TotalsTable) -> PairSummary {
        let mut summary = PairSummary::default();
        for (meter_id, s) in series {
            let cost = self.accumulate_series(*meter_id, s);
            totals.add(*meter_id, cost.total);
            summary.merge(cost.pairs);
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::organizer::organize;
    use crate::engine::tariff::{DEFAULT_ELECTRICITY_PRICE, GAS_PRICE, WEEKDAY_PEAK_ELECTRICITY_PRICE};
    use csv::StringRecord;
    use energy_domain::EnergyType;
    use time::macros::datetime;
    use time::OffsetDateTime;

    fn reading(energy_type: EnergyType, counter: f64, ts: OffsetDateTime) -> MeterReading {
        MeterReading {
            meter_id: 1,
            energy_type,
            usage_counter: counter,
            ts,
        }
    }

    fn elec(counter: f64, ts: OffsetDateTime) -> MeterReading {
        reading(EnergyType::Electricity, counter, ts)
    }

    fn row(id: i64, code: i64, counter: f64, ts: OffsetDateTime) -> StringRecord {
        StringRecord::from(vec![
            id.to_string(),
            code.to_string(),
            counter.to_string(),
            ts.unix_timestamp().to_string(),
        ])
    }

    fn header() -> StringRecord {
        StringRecord::from(vec!["metering_point_id", "type", "reading", "created_at"])
    }

    fn run(rows: &[StringRecord]) -> TotalsTable {
        let batch = organize(rows);
        let mut totals = batch.totals;
        CostAccumulator::default().accumulate(&batch.series, &mut totals);
        totals
    }

    const MON_AFTERNOON: OffsetDateTime = datetime!(2024-01-08 14:00 UTC);
    const MON_LATER: OffsetDateTime = datetime!(2024-01-08 14:15 UTC);

    #[test]
    fn weekday_afternoon_kwh_costs_peak_price() {
        let acc = CostAccumulator::default();
        let out = acc.price_pair(&elec(1000.0, MON_AFTERNOON), &elec(2000.0, MON_LATER));
        assert_eq!(
            out,
            PairOutcome::Priced {
                delta_kwh: 1.0,
                unit_price: WEEKDAY_PEAK_ELECTRICITY_PRICE,
                cost: WEEKDAY_PEAK_ELECTRICITY_PRICE,
            }
        );
    }

    #[test]
    fn delta_of_exactly_the_ceiling_is_priced() {
        let acc = CostAccumulator::default();
        let out = acc.price_pair(&elec(0.0, MON_AFTERNOON), &elec(100_000.0, MON_LATER));
        assert_eq!(out.cost(), 100.0 * WEEKDAY_PEAK_ELECTRICITY_PRICE);
    }

    #[test]
    fn delta_just_over_the_ceiling_is_anomalous() {
        let acc = CostAccumulator::default();
        let out = acc.price_pair(&elec(0.0, MON_AFTERNOON), &elec(100_000.1, MON_LATER));
        assert!(matches!(out, PairOutcome::Anomalous { .. }));
        assert_eq!(out.cost(), 0.0);
    }

    #[test]
    fn negative_deltas_are_anomalous_at_any_magnitude() {
        let acc = CostAccumulator::default();
        for first in [0.001, 1.0, 50_000.0, 1e12] {
            let out = acc.price_pair(&elec(first, MON_AFTERNOON), &elec(0.0, MON_LATER));
            assert!(matches!(out, PairOutcome::Anomalous { .. }), "start counter {first}");
        }
        assert!(!acc.is_acceptable_delta(-0.0));
        assert!(acc.is_acceptable_delta(0.0));
        assert!(!acc.is_acceptable_delta(f64::NAN));
    }

    #[test]
    fn earlier_reading_decides_the_tariff() {
        let acc = CostAccumulator::default();
        // 22:59 is inside the peak window, 23:01 is not.
        let start = elec(0.0, datetime!(2024-01-08 22:59 UTC));
        let end = elec(1000.0, datetime!(2024-01-08 23:01 UTC));
        assert_eq!(acc.price_pair(&start, &end).cost(), WEEKDAY_PEAK_ELECTRICITY_PRICE);

        // Saturday morning start, priced at the default rate.
        let start = elec(0.0, datetime!(2024-01-06 10:00 UTC));
        let end = elec(1000.0, datetime!(2024-01-08 09:00 UTC));
        assert_eq!(acc.price_pair(&start, &end).cost(), DEFAULT_ELECTRICITY_PRICE);
    }

    #[test]
    fn gas_counters_are_converted_before_pricing() {
        let acc = CostAccumulator::default();
        let start = reading(EnergyType::Gas, 1.0, MON_AFTERNOON);
        let end = reading(EnergyType::Gas, 2.0, MON_LATER);
        match acc.price_pair(&start, &end) {
            PairOutcome::Priced { delta_kwh, unit_price, cost } => {
                assert!((delta_kwh - 9.769).abs() < 1e-9);
                assert_eq!(unit_price, GAS_PRICE);
                assert!((cost - 9.769 * GAS_PRICE).abs() < 1e-9);
            }
            other => panic!("expected priced pair, got {other:?}"),
        }
    }

    #[test]
    fn unknown_energy_type_is_reported_and_costs_nothing() {
        let acc = CostAccumulator::default();
        let unknown = reading(EnergyType::Unrecognized(0), 1000.0, MON_LATER);
        let out = acc.price_pair(&elec(0.0, MON_AFTERNOON), &unknown);
        assert_eq!(out, PairOutcome::UnknownEnergyType(UnknownEnergyType { code: 0 }));

        let series: MeterSeries = vec![
            elec(0.0, MON_AFTERNOON),
            unknown,
            elec(2000.0, datetime!(2024-01-08 14:30 UTC)),
            elec(3000.0, datetime!(2024-01-08 14:45 UTC)),
        ]
        .into_iter()
        .collect();
        let cost = acc.accumulate_series(1, &series);
        assert_eq!(cost.pairs.unknown_energy_type, 2);
        assert_eq!(cost.pairs.pairs_priced, 1);
        assert_eq!(cost.pairs.samples[0].pair_index, 0);
        assert_eq!(cost.pairs.samples[1].pair_index, 1);
        assert_eq!(cost.total, WEEKDAY_PEAK_ELECTRICITY_PRICE);
    }

    #[test]
    fn anomalies_do_not_abort_the_series() {
        let rows = vec![
            header(),
            row(1, 1, 5000.0, MON_AFTERNOON),
            row(1, 1, 0.0, MON_LATER), // counter reset
            row(1, 1, 1000.0, datetime!(2024-01-08 14:30 UTC)),
        ];
        let totals = run(&rows);
        assert_eq!(totals.get(1), Some(WEEKDAY_PEAK_ELECTRICITY_PRICE));
    }

    #[test]
    fn single_reading_meters_keep_a_zero_total() {
        let rows = vec![
            header(),
            row(1, 1, 0.0, MON_AFTERNOON),
            row(1, 1, 1000.0, MON_LATER),
            row(2, 2, 50.0, MON_AFTERNOON),
        ];
        let totals = run(&rows);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals.get(2), Some(0.0));
    }

    #[test]
    fn totals_are_idempotent_and_independent_of_meter_interleaving() {
        let a = vec![
            header(),
            row(1, 1, 0.0, MON_AFTERNOON),
            row(1, 1, 1500.0, MON_LATER),
            row(1, 1, 2750.0, datetime!(2024-01-08 23:30 UTC)),
            row(2, 2, 3.0, MON_AFTERNOON),
            row(2, 2, 4.5, MON_LATER),
            row(3, 1, 100.0, datetime!(2024-01-06 10:00 UTC)),
            row(3, 1, 900.0, datetime!(2024-01-06 11:00 UTC)),
        ];
        // Same per-meter order, different interleaving across meters.
        let b = vec![
            header(),
            a[4].clone(),
            a[1].clone(),
            a[6].clone(),
            a[2].clone(),
            a[5].clone(),
            a[7].clone(),
            a[3].clone(),
        ];

        let first = run(&a);
        assert_eq!(first, run(&a));
        assert_eq!(first, run(&b));
        assert!(first.iter().all(|(_, cost)| cost >= 0.0));
    }

    #[test]
    fn far_future_rows_are_rejected_before_pricing() {
        let rows = vec![
            header(),
            StringRecord::from(vec!["1", "1", "0", "253402300799"]),
            StringRecord::from(vec!["1", "1", "1000", "253402300799"]),
            row(2, 1, 0.0, MON_AFTERNOON),
            row(2, 1, 1000.0, MON_LATER),
        ];
        let batch = organize(&rows);
        assert_eq!(batch.rows.malformed_rows, 2);

        let cet = TariffSchedule::default().with_offset(time::macros::offset!(+1));
        let mut totals = batch.totals;
        let summary = CostAccumulator::new(cet, MAX_DELTA_KWH).accumulate(&batch.series, &mut totals);
        assert_eq!(summary.pairs_priced, 1);
        assert_eq!(totals.get(1), None);
        assert!((totals.get(2).unwrap() - WEEKDAY_PEAK_ELECTRICITY_PRICE).abs() < 1e-12);
    }
}
