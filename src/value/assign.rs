use crate::error::AssignError;
use crate::record::Field;
use crate::source::Dest;

use super::Value;

/// Conversion from a column value into a concrete Rust type.
///
/// Only exact kinds are accepted, plus checked integer narrowing and
/// `string -> Vec<u8>`. No other coercion happens here.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, AssignError>;
}

/// A typed destination a row source can write one column into.
pub trait Assign {
    fn assign(&mut self, value: Value) -> Result<(), AssignError>;

    fn target_type(&self) -> &'static str;
}

impl<T: FromValue> Assign for T {
    fn assign(&mut self, value: Value) -> Result<(), AssignError> {
        *self = T::from_value(value)?;
        Ok(())
    }

    fn target_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// `Value` accepts anything, it is the any-typed destination.
impl Assign for Value {
    fn assign(&mut self, value: Value) -> Result<(), AssignError> {
        *self = value;
        Ok(())
    }

    fn target_type(&self) -> &'static str {
        "Value"
    }
}

/// Picks the destination shape of a record field from its type:
/// `Value` fields are any-typed, everything else is concrete.
pub trait AsField {
    fn as_field(&mut self) -> Field<'_>;
}

impl<T: FromValue + 'static> AsField for T {
    fn as_field(&mut self) -> Field<'_> {
        Field::Value(Dest::Concrete(self))
    }
}

impl AsField for Value {
    fn as_field(&mut self) -> Field<'_> {
        Field::Value(Dest::Opaque(self))
    }
}

fn mismatch<T>(value: &Value) -> AssignError {
    match value {
        Value::Null => AssignError::Null {
            target: std::any::type_name::<T>(),
        },
        other => AssignError::Mismatch {
            found: other.kind(),
            target: std::any::type_name::<T>(),
        },
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, AssignError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, AssignError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, AssignError> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

macro_rules! narrow_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, AssignError> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).map_err(|_| AssignError::OutOfRange {
                            value: i,
                            target: stringify!($ty),
                        }),
                        other => Err(mismatch::<Self>(&other)),
                    }
                }
            }
        )*
    };
}

narrow_int!(i16, i32, u32, u64);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, AssignError> {
        match value {
            Value::Float(x) => Ok(x),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, AssignError> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::String(s) => Ok(s.into_bytes()),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, AssignError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
