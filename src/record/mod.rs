pub mod descriptor;
pub mod layout;
pub mod layout_cache;
pub mod record;

pub use descriptor::{FieldDescriptor, FieldKind, RecordDescriptor};
pub use layout::{ColumnMapping, FieldPath, Layout, LayoutOptions};
pub use layout_cache::LayoutCache;
pub use record::{Field, Record};
