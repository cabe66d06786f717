pub mod api;
pub mod error;
mod macros;
pub mod record;
pub mod scan;
pub mod source;
pub mod value;

pub use crate::api::{Querier, RowMapper, ScanConfig};
pub use crate::error::{AssignError, BoxError, ScanError, ScanResult, not_found};
pub use crate::record::{Field, FieldDescriptor, Layout, LayoutCache, Record, RecordDescriptor};
pub use crate::scan::RowScanner;
pub use crate::source::{Dest, MemoryRows, RowSource, RowsAdapter};
pub use crate::value::{AsField, Assign, FromValue, Value};
