/// Integer code used for electricity in meter reading feeds.
pub const ELECTRICITY_CODE: i64 = 1;
/// Integer code used for gas in meter reading feeds.
pub const GAS_CODE: i64 = 2;

/// kWh-equivalent of one raw gas register unit.
pub const GAS_KWH_EQUIVALENT_FACTOR: f64 = 9.769;

const WATT_HOURS_PER_KWH: f64 = 1000.0;

/// Energy carried by a meter.
///
/// Codes outside the recognized set are kept as `Unrecognized` so the reading
/// still holds its place in the meter's series; any attempt to convert or price
/// it fails with [`UnknownEnergyType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnergyType {
    Electricity,
    Gas,
    Unrecognized(i64),
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown energy type code {code}")]
pub struct UnknownEnergyType {
    pub code: i64,
}

impl EnergyType {
    pub fn from_code(code: i64) -> Self {
        match code {
            ELECTRICITY_CODE => Self::Electricity,
            GAS_CODE => Self::Gas,
            other => Self::Unrecognized(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Electricity => ELECTRICITY_CODE,
            Self::Gas => GAS_CODE,
            Self::Unrecognized(code) => code,
        }
    }

    pub fn is_recognized(self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Convert a cumulative register value in this type's native unit into
    /// kWh-equivalent.
    ///
    /// - Electricity counters are watt-hours.
    /// - Gas counters are raw gas units scaled by [`GAS_KWH_EQUIVALENT_FACTOR`].
    pub fn to_kwh_equivalent(self, counter: f64) -> Result<f64, UnknownEnergyType> {
        match self {
            Self::Electricity => Ok(counter / WATT_HOURS_PER_KWH),
            Self::Gas => Ok(counter * GAS_KWH_EQUIVALENT_FACTOR),
            Self::Unrecognized(code) => Err(UnknownEnergyType { code }),
        }
    }
}

impl std::fmt::Display for EnergyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Electricity => write!(f, "electricity"),
            Self::Gas => write!(f, "gas"),
            Self::Unrecognized(code) => write!(f, "unrecognized({code})"),
        }
    }
}
