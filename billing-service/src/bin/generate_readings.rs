use anyhow::{bail, Context, Result};
use billing_service::{
    observability,
    synthetic::{self, SyntheticInput},
};
use std::{env, fs::File, io::BufWriter};

/// Write a synthetic meter reading file for load testing.
///
/// Usage:
///   generate_readings <output_path> [rows] [meters]
fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        bail!("usage: generate_readings <output_path> [rows] [meters]");
    }
    let path = &args[1];

    let mut input = SyntheticInput::default();
    if let Some(rows) = args.get(2) {
        input.rows = rows.parse().with_context(|| format!("invalid row count '{rows}'"))?;
    }
    if let Some(meters) = args.get(3) {
        input.meters = meters.parse().with_context(|| format!("invalid meter count '{meters}'"))?;
    }

    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
    synthetic::write_readings(BufWriter::new(file), input)?;

    tracing::info!(path = %path, rows = input.rows, meters = input.meters, "synthetic readings written");
    Ok(())
}
