pub mod memory;
pub mod normalizer;

pub use memory::MemoryRows;
pub use normalizer::{Normalizer, RowsAdapter};

use crate::error::BoxError;
use crate::value::{Assign, FromValue, Value};

/// The `RowSource` trait is the capability set the scanner needs from a
/// forward-only result cursor. Driver adapters implement it.
pub trait RowSource {
    /// Column names of the result, in column order. Fixed per result.
    fn columns(&self) -> Result<Vec<String>, BoxError>;

    /// Advances to the next row. `false` once the result is exhausted or
    /// iteration stopped on an error.
    fn next(&mut self) -> bool;

    /// Writes the current row into `dests`, one destination per column.
    /// Sources only ever see typed destinations.
    fn scan(&mut self, dests: &mut [&mut dyn Assign]) -> Result<(), BoxError>;

    /// Takes the error that ended iteration, if any.
    fn take_err(&mut self) -> Option<BoxError>;
}

impl<R: RowSource + ?Sized> RowSource for &mut R {
    fn columns(&self) -> Result<Vec<String>, BoxError> {
        (**self).columns()
    }

    fn next(&mut self) -> bool {
        (**self).next()
    }

    fn scan(&mut self, dests: &mut [&mut dyn Assign]) -> Result<(), BoxError> {
        (**self).scan(dests)
    }

    fn take_err(&mut self) -> Option<BoxError> {
        (**self).take_err()
    }
}

/// A caller-side destination for one column.
pub enum Dest<'a> {
    /// Typed address, handed to the source as is.
    Concrete(&'a mut dyn Assign),
    /// Any-typed address, filled through an intermediate buffer.
    Opaque(&'a mut Value),
}

impl<'a> Dest<'a> {
    /// A typed destination. `Value` is only accepted through [`Dest::any`]:
    ///
    /// ```compile_fail
    /// let mut extra = rowscan::Value::Null;
    /// let _ = rowscan::Dest::concrete(&mut extra);
    /// ```
    pub fn concrete<T: FromValue>(target: &'a mut T) -> Self {
        Dest::Concrete(target)
    }

    pub fn any(target: &'a mut Value) -> Self {
        Dest::Opaque(target)
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Dest::Opaque(_))
    }
}
