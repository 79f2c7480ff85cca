use std::io;

use energy_domain::{ELECTRICITY_CODE, GAS_CODE};

use crate::engine::organizer::READING_COLUMNS;

/// First timestamp written by [`write_readings`], in Unix seconds.
pub const START_TS: i64 = 1415963700;
/// Seconds between consecutive rows.
pub const STEP_SECS: i64 = 900;

/// Shape of a generated input file.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticInput {
    pub rows: usize,
    pub meters: usize,
}

impl Default for SyntheticInput {
    fn default() -> Self {
        Self {
            rows: 10_000_000,
            meters: 10,
        }
    }
}

/// Write a deterministic reading file: meters round-robin, even meters on
/// electricity (+500 Wh per reading), odd meters on gas (+1 unit).
pub fn write_readings<W: io::Write>(writer: W, input: SyntheticInput) -> csv::Result<()> {
    let meters = input.meters.max(1);
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(READING_COLUMNS)?;

    let mut counters = vec![0.0f64; meters];
    let mut ts = START_TS;
    for i in 0..input.rows {
        let meter = i % meters;
        let (code, step) = if meter % 2 == 0 {
            (ELECTRICITY_CODE, 500.0)
        } else {
            (GAS_CODE, 1.0)
        };

        wtr.write_record([
            meter.to_string(),
            code.to_string(),
            counters[meter].to_string(),
            ts.to_string(),
        ])?;

        counters[meter] += step;
        ts += STEP_SECS;
    }

    wtr.flush()?;
    Ok(())
}
