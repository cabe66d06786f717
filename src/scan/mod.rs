pub mod row_scanner;

pub use row_scanner::RowScanner;
