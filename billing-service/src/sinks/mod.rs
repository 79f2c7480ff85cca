pub mod cost_csv_file;
pub mod report_json_file;

pub use cost_csv_file::CostCsvFileSink;
pub use report_json_file::write_report;
