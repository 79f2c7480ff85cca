pub mod energy_type;
pub mod meter_reading;

pub use energy_type::{EnergyType, UnknownEnergyType};
pub use meter_reading::{MeterId, MeterReading};
