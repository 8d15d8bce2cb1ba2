/// JSON and CSV export.
pub mod export;
