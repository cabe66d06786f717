pub mod assign;
pub mod value;

pub use assign::{AsField, Assign, FromValue};
pub use value::Value;
