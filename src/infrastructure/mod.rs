pub mod logging;
pub mod spreadsheet;
