pub mod domain;

pub use domain::energy_type::{ELECTRICITY_CODE, GAS_CODE, GAS_KWH_EQUIVALENT_FACTOR};
pub use domain::{EnergyType, MeterId, MeterReading, UnknownEnergyType};
