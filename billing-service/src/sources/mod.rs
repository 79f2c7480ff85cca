pub mod meter_reading_csv_file;

pub use meter_reading_csv_file::MeterReadingCsvFileSource;
