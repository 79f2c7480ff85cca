use std::collections::HashMap;

use csv::StringRecord;
use energy_domain::{EnergyType, MeterId, MeterReading};
use time::{Duration, OffsetDateTime};

use super::totals::TotalsTable;
use crate::report::RowSummary;

/// Expected input columns, in order.
pub const READING_COLUMNS: [&str; 4] = ["metering_point_id", "type", "reading", "created_at"];

/// Every `UtcOffset` is strictly smaller than this, so a timestamp with this
/// much room on both sides can be shifted into any civil-time offset.
const OFFSET_HEADROOM: Duration = Duration::hours(26);

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("invalid {field} '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Readings of a single meter, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeterSeries {
    readings: Vec<MeterReading>,
}

impl MeterSeries {
    pub fn push(&mut self, reading: MeterReading) {
        debug_assert!(
            self.readings.first().map_or(true, |r| r.meter_id == reading.meter_id),
            "series must hold a single meter"
        );
        self.readings.push(reading);
    }

    pub fn readings(&self) -> &[MeterReading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Adjacent `(earlier, later)` pairs. A series of one reading yields nothing.
    pub fn pairs(&self) -> impl Iterator<Item = (&MeterReading, &MeterReading)> {
        self.readings.windows(2).map(|w| (&w[0], &w[1]))
    }
}

impl FromIterator<MeterReading> for MeterSeries {
    fn from_iter<I: IntoIterator<Item = MeterReading>>(iter: I) -> Self {
        Self {
            readings: iter.into_iter().collect(),
        }
    }
}

pub type SeriesTable = HashMap<MeterId, MeterSeries>;

/// Result of organizing a whole batch: the per-meter series, a zeroed totals
/// entry for every meter seen, and the per-row outcome counts.
#[derive(Debug, Clone, Default)]
pub struct OrganizedBatch {
    pub series: SeriesTable,
    pub totals: TotalsTable,
    pub rows: RowSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Header,
    Accepted(MeterId),
    Rejected(RowError),
}

fn field<'a>(row: &'a StringRecord, idx: usize) -> &'a str {
    row.get(idx).unwrap_or("").trim()
}

fn invalid(field: &'static str, value: &str, reason: impl ToString) -> RowError {
    RowError::InvalidField {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse one data row into a reading.
///
/// Fields are positional: meter id, energy type code, cumulative counter,
/// Unix timestamp in seconds. Columns past the fourth are ignored.
pub fn parse_row(row: &StringRecord) -> Result<MeterReading, RowError> {
    if row.len() < READING_COLUMNS.len() {
        return Err(RowError::FieldCount {
            expected: READING_COLUMNS.len(),
            found: row.len(),
        });
    }

    let id_str = field(row, 0);
    let meter_id: MeterId = id_str
        .parse()
        .map_err(|e| invalid(READING_COLUMNS[0], id_str, e))?;

    let type_str = field(row, 1);
    let code: i64 = type_str
        .parse()
        .map_err(|e| invalid(READING_COLUMNS[1], type_str, e))?;

    let counter_str = field(row, 2);
    let usage_counter: f64 = counter_str
        .parse()
        .map_err(|e| invalid(READING_COLUMNS[2], counter_str, e))?;
    if !usage_counter.is_finite() {
        return Err(invalid(READING_COLUMNS[2], counter_str, "counter must be finite"));
    }

    let ts_str = field(row, 3);
    let secs: i64 = ts_str
        .parse()
        .map_err(|e| invalid(READING_COLUMNS[3], ts_str, e))?;
    let ts = OffsetDateTime::from_unix_timestamp(secs)
        .map_err(|e| invalid(READING_COLUMNS[3], ts_str, e))?;
    if ts.checked_sub(OFFSET_HEADROOM).is_none() || ts.checked_add(OFFSET_HEADROOM).is_none() {
        return Err(invalid(
            READING_COLUMNS[3],
            ts_str,
            "timestamp too close to the supported date range",
        ));
    }

    Ok(MeterReading {
        meter_id,
        energy_type: EnergyType::from_code(code),
        usage_counter,
        ts,
    })
}

/// Incrementally groups raw rows into per-meter series.
///
/// The first row pushed is treated as the header and skipped whatever it holds.
#[derive(Debug, Default)]
pub struct ReadingOrganizer {
    series: SeriesTable,
    totals: TotalsTable,
    rows: RowSummary,
    header_seen: bool,
}

impl ReadingOrganizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_row(&mut self, position: u64, row: &StringRecord) -> RowOutcome {
        if !self.header_seen {
            self.header_seen = true;
            self.rows.record_header();
            return RowOutcome::Header;
        }

        match parse_row(row) {
            Ok(reading) => {
                let meter_id = reading.meter_id;
                self.totals.register(meter_id);
                self.series.entry(meter_id).or_default().push(reading);
                self.rows.record_accepted();
                RowOutcome::Accepted(meter_id)
            }
            Err(e) => {
                tracing::debug!(position, error = %e, "skipping malformed meter reading row");
                metrics::counter!("billing_rows_rejected_total").increment(1);
                self.rows.record_malformed(position, e.to_string());
                RowOutcome::Rejected(e)
            }
        }
    }

    /// Record a row the source could not even split into fields.
    pub fn record_malformed(&mut self, position: u64, reason: impl Into<String>) {
        if !self.header_seen {
            self.header_seen = true;
            self.rows.record_header();
            return;
        }

        let reason = reason.into();
        tracing::debug!(position, error = %reason, "skipping unreadable meter reading row");
        metrics::counter!("billing_rows_rejected_total").increment(1);
        self.rows.record_malformed(position, reason);
    }

    pub fn finish(self) -> OrganizedBatch {
        OrganizedBatch {
            series: self.series,
            totals: self.totals,
            rows: self.rows,
        }
    }
}

/// Organize a complete set of rows, header first.
pub fn organize<'a, I>(rows: I) -> OrganizedBatch
where
    I: IntoIterator<Item = &'a StringRecord>,
{
    let mut organizer = ReadingOrganizer::new();
    for (idx, row) in rows.into_iter().enumerate() {
        organizer.push_row(idx as u64 + 1, row);
    }
    organizer.finish()
}
