use std::{fs::File, path::PathBuf};

use csv::{StringRecord, Trim};
use futures::Stream;

use crate::pipeline::{Envelope, PipelineError, Source};

/// Delimited-text source of raw meter reading rows.
///
/// Every record is yielded as-is, header included, for the organizer to
/// interpret. Expected columns, by position:
/// - metering_point_id (integer)
/// - type (1 = electricity, 2 = gas)
/// - reading (cumulative counter)
/// - created_at (Unix seconds)
///
/// Records the reader cannot decode are yielded as
/// [`PipelineError::MalformedRow`] and the stream carries on; failing to open
/// or read the file ends the stream with [`PipelineError::InputUnavailable`].
pub struct MeterReadingCsvFileSource {
    path: PathBuf,
    delimiter: u8,
}

impl MeterReadingCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

#[async_trait::async_trait]
impl Source<StringRecord> for MeterReadingCsvFileSource {
    async fn stream(
        &self,
    ) -> std::pin::Pin<Box<dyn Stream<Item = Result<Envelope<StringRecord>, PipelineError>> + Send>> {
        // Blocking reader inside a single task; the batch is read once, front to back.
        let path = self.path.clone();
        let delimiter = self.delimiter;
        let s = async_stream::stream! {
            let file = match File::open(&path) {
                Ok(f) => f,
                Err(e) => {
                    yield Err(PipelineError::InputUnavailable(format!(
                        "failed to open {}: {e}",
                        path.display()
                    )));
                    return;
                }
            };

            let mut rdr = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .trim(Trim::All)
                .delimiter(delimiter)
                .from_reader(file);

            let mut position: u64 = 0;
            for result in rdr.records() {
                position += 1;
                match result {
                    Ok(record) => {
                        yield Ok(Envelope {
                            payload: record,
                            position,
                        });
                    }
                    Err(e) if e.is_io_error() => {
                        yield Err(PipelineError::InputUnavailable(format!(
                            "failed to read {}: {e}",
                            path.display()
                        )));
                        return;
                    }
                    Err(e) => {
                        metrics::counter!("meter_reading_csv_malformed_rows_total").increment(1);
                        yield Err(PipelineError::MalformedRow {
                            position,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        };

        Box::pin(s)
    }
}
