use energy_domain::{EnergyType, UnknownEnergyType};
use time::{OffsetDateTime, UtcOffset, Weekday};

pub const DEFAULT_ELECTRICITY_PRICE: f64 = 0.18;
pub const WEEKDAY_PEAK_ELECTRICITY_PRICE: f64 = 0.20;
pub const GAS_PRICE: f64 = 0.6;

/// Unit prices per kWh-equivalent, and the electricity peak window.
///
/// Electricity is billed at the peak price on Monday–Friday when the local hour
/// lies strictly between `peak_after_hour` and `peak_before_hour`; all other
/// electricity uses the default price. Gas has a single price.
#[derive(Debug, Clone, PartialEq)]
pub struct TariffSchedule {
    pub gas_price: f64,
    pub default_electricity_price: f64,
    pub weekday_peak_electricity_price: f64,
    pub peak_after_hour: u8,
    pub peak_before_hour: u8,
    /// Civil-time offset the peak window is evaluated in.
    pub offset: UtcOffset,
}

impl Default for TariffSchedule {
    fn default() -> Self {
        Self {
            gas_price: GAS_PRICE,
            default_electricity_price: DEFAULT_ELECTRICITY_PRICE,
            weekday_peak_electricity_price: WEEKDAY_PEAK_ELECTRICITY_PRICE,
            peak_after_hour: 7,
            peak_before_hour: 23,
            offset: UtcOffset::UTC,
        }
    }
}

impl TariffSchedule {
    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }

    /// False for timestamps that cannot be expressed in the schedule's offset.
    pub fn is_weekday_peak(&self, ts: OffsetDateTime) -> bool {
        let Some(local) = ts.checked_to_offset(self.offset) else {
            return false;
        };
        let weekday = !matches!(local.weekday(), Weekday::Saturday | Weekday::Sunday);
        let hour = local.hour();
        weekday && hour > self.peak_after_hour && hour < self.peak_before_hour
    }

    /// Unit price in force for a reading of `energy_type` taken at `ts`.
    pub fn price_for(&self, energy_type: EnergyType, ts: OffsetDateTime) -> Result<f64, UnknownEnergyType> {
        match energy_type {
            EnergyType::Gas => Ok(self.gas_price),
            EnergyType::Electricity if self.is_weekday_peak(ts) => Ok(self.weekday_peak_electricity_price),
            EnergyType::Electricity => Ok(self.default_electricity_price),
            EnergyType::Unrecognized(code) => Err(UnknownEnergyType { code }),
        }
    }
}
