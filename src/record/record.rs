use crate::source::Dest;
use crate::value::{FromValue, Value};

use super::RecordDescriptor;

/// A type rows can be scanned into.
///
/// `descriptor` describes the declared fields once per type, `fields`
/// hands out live destinations for them, in the same order, for every
/// row. Single-value types describe themselves with
/// `RecordDescriptor::opaque` and are scanned through `as_dest`.
pub trait Record: 'static {
    fn descriptor() -> RecordDescriptor
    where
        Self: Sized;

    fn fields(&mut self) -> Vec<Field<'_>>;

    fn as_dest(&mut self) -> Option<Dest<'_>> {
        None
    }
}

/// Live handle on one declared field of a record.
pub enum Field<'a> {
    Value(Dest<'a>),
    Record(&'a mut dyn Record),
    /// Stands in for a field the descriptor marks as skipped.
    Skipped,
}

impl<'a> Field<'a> {
    /// A typed leaf. Any-typed `Value` fields go through [`Field::any`]
    /// instead:
    ///
    /// ```compile_fail
    /// let mut extra = rowscan::Value::Null;
    /// let _ = rowscan::Field::value(&mut extra);
    /// ```
    pub fn value<T: FromValue>(target: &'a mut T) -> Self {
        Field::Value(Dest::Concrete(target))
    }

    pub fn any(target: &'a mut Value) -> Self {
        Field::Value(Dest::Opaque(target))
    }

    pub fn record<R: Record>(target: &'a mut R) -> Self {
        Field::Record(target)
    }
}

macro_rules! opaque_record {
    ($($ty:ty),*) => {
        $(
            impl Record for $ty {
                fn descriptor() -> RecordDescriptor {
                    RecordDescriptor::opaque::<Self>()
                }

                fn fields(&mut self) -> Vec<Field<'_>> {
                    Vec::new()
                }

                fn as_dest(&mut self) -> Option<Dest<'_>> {
                    Some(Dest::Concrete(self))
                }
            }
        )*
    };
}

opaque_record!(String, bool, i16, i32, i64, u32, u64, f64, Vec<u8>);

impl<T: FromValue + 'static> Record for Option<T> {
    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::opaque::<Self>()
    }

    fn fields(&mut self) -> Vec<Field<'_>> {
        Vec::new()
    }

    fn as_dest(&mut self) -> Option<Dest<'_>> {
        Some(Dest::Concrete(self))
    }
}

impl Record for Value {
    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::opaque::<Self>()
    }

    fn fields(&mut self) -> Vec<Field<'_>> {
        Vec::new()
    }

    fn as_dest(&mut self) -> Option<Dest<'_>> {
        Some(Dest::Opaque(self))
    }
}
