pub mod config;
pub mod query;
pub mod row_mapper;

pub use config::ScanConfig;
pub use query::Querier;
pub use row_mapper::RowMapper;
