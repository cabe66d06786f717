/// Implements `Record` for a struct whose fields all bind to one column
/// each. Fields of type `Value` become any-typed destinations. A column
/// can be renamed with `as`:
///
/// ```
/// #[derive(Default)]
/// struct User {
///     id: i64,
///     name: String,
///     extra: rowscan::Value,
/// }
///
/// rowscan::impl_record!(User { id as "user_id", name, extra });
/// ```
///
/// Nested, embedded and skipped fields need a hand-written `Record` impl.
#[macro_export]
macro_rules! impl_record {
    ($ty:ty { $($field:ident $(as $column:literal)?),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn descriptor() -> $crate::RecordDescriptor {
                $crate::RecordDescriptor::new::<Self>()
                    $(.field(
                        $crate::FieldDescriptor::new(stringify!($field)) $(.rename($column))?
                    ))*
            }

            fn fields(&mut self) -> ::std::vec::Vec<$crate::Field<'_>> {
                ::std::vec![$($crate::AsField::as_field(&mut self.$field)),*]
            }
        }
    };
}
