use time::OffsetDateTime;

use super::energy_type::{EnergyType, UnknownEnergyType};

/// Identifier of a physical metering point.
pub type MeterId = i64;

/// A single cumulative register reading taken from a meter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterReading {
    pub meter_id: MeterId,
    pub energy_type: EnergyType,
    /// Cumulative counter in the native unit of `energy_type`.
    pub usage_counter: f64,
    pub ts: OffsetDateTime,
}

impl MeterReading {
    pub fn kwh_equivalent(&self) -> Result<f64, UnknownEnergyType> {
        self.energy_type.to_kwh_equivalent(self.usage_counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn reading_converts_through_its_energy_type() {
        let r = MeterReading {
            meter_id: 1,
            energy_type: EnergyType::Electricity,
            usage_counter: 1000.0,
            ts: datetime!(2024-01-08 14:00:00 UTC),
        };
        assert_eq!(r.kwh_equivalent(), Ok(1.0));

        let unknown = MeterReading {
            energy_type: EnergyType::Unrecognized(9),
            ..r
        };
        assert!(unknown.kwh_equivalent().is_err());
    }
}
