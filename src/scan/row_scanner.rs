use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::api::RowMapper;
use crate::error::{AssignError, BoxError, ScanError, ScanResult};
use crate::record::layout::fold;
use crate::record::{Layout, Record};
use crate::source::{Dest, RowSource, RowsAdapter};
use crate::value::{FromValue, Value};

/// Sink for result columns a non-strict scan does not map.
#[derive(Debug, Clone, Copy, Default)]
struct Ignored;

impl FromValue for Ignored {
    fn from_value(_value: Value) -> Result<Self, AssignError> {
        Ok(Ignored)
    }
}

/// Column-to-leaf assignment for one record type over one result.
struct Plan {
    type_id: TypeId,
    layout: Arc<Layout>,
    targets: Vec<Option<usize>>,
}

impl Plan {
    fn new(
        type_id: TypeId,
        layout: Arc<Layout>,
        columns: &[String],
        strict: bool,
    ) -> ScanResult<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in columns {
            if !seen.insert(column.as_str()) {
                return Err(ScanError::DuplicateColumn(column.clone()));
            }
        }

        if layout.is_opaque() {
            if columns.len() != 1 {
                return Err(ScanError::ColumnCount {
                    type_name: layout.type_name(),
                    got: columns.len(),
                });
            }
            return Ok(Plan {
                type_id,
                layout,
                targets: Vec::new(),
            });
        }

        let mut targets = Vec::with_capacity(columns.len());
        for column in columns {
            match layout.leaf(column) {
                Some(leaf) => targets.push(Some(leaf)),
                None if strict => {
                    return Err(ScanError::ColumnNotMapped {
                        column: column.clone(),
                        type_name: layout.type_name(),
                    });
                }
                None => {
                    debug!(
                        column = %column,
                        record = layout.type_name(),
                        "ignoring unmapped column"
                    );
                    targets.push(None);
                }
            }
        }

        Ok(Plan {
            type_id,
            layout,
            targets,
        })
    }
}

/// Scans rows of one source into records.
///
/// Bound to its source for its whole life. The source's column list is
/// read once, and the column plan is kept for the last record type
/// scanned. The caller advances the source between scans.
pub struct RowScanner<'m, R> {
    mapper: &'m RowMapper,
    rows: RowsAdapter<R>,
    columns: Option<Vec<String>>,
    plan: Option<Arc<Plan>>,
}

impl<'m, R: RowSource> RowScanner<'m, R> {
    pub fn new(mapper: &'m RowMapper, rows: R) -> Self {
        RowScanner {
            mapper,
            rows: RowsAdapter::new(rows),
            columns: None,
            plan: None,
        }
    }

    /// Resolves the layout for `T` without touching the source.
    pub fn layout<T: Record>(&self) -> ScanResult<Arc<Layout>> {
        self.mapper.cache().resolve::<T>(self.mapper.layout_options())
    }

    pub fn next(&mut self) -> bool {
        self.rows.next()
    }

    pub fn take_err(&mut self) -> Option<BoxError> {
        self.rows.take_err()
    }

    /// Scans the current row into `dst`. Either every column is bound or
    /// the row's error is returned.
    pub fn scan<T: Record>(&mut self, dst: &mut T) -> ScanResult<()> {
        let plan = self.prepare::<T>()?;
        let layout = &plan.layout;

        if layout.is_opaque() {
            let dest = dst.as_dest().ok_or_else(|| ScanError::UnmappableType {
                type_name: layout.type_name(),
                reason: "it has no mappable fields and is not a single value".to_string(),
            })?;
            return self.rows.scan(&mut [dest]);
        }

        let mut leaves = Vec::with_capacity(layout.columns().len());
        layout.shape().collect(dst, layout.type_name(), &mut leaves)?;

        let mut sinks = vec![Ignored; plan.targets.len()];
        let mut dests = Vec::with_capacity(plan.targets.len());
        for (target, sink) in plan.targets.iter().zip(sinks.iter_mut()) {
            let dest = match target {
                Some(leaf) => leaves.get_mut(*leaf).and_then(Option::take).ok_or_else(|| {
                    ScanError::UnmappableType {
                        type_name: layout.type_name(),
                        reason: format!("no destination for field #{leaf}"),
                    }
                })?,
                None => Dest::Concrete(sink),
            };
            dests.push(dest);
        }

        self.rows.scan(&mut dests)
    }

    pub fn into_inner(self) -> R {
        self.rows.into_inner()
    }

    fn prepare<T: Record>(&mut self) -> ScanResult<Arc<Plan>> {
        let type_id = TypeId::of::<T>();
        if let Some(plan) = &self.plan {
            if plan.type_id == type_id {
                return Ok(Arc::clone(plan));
            }
        }

        if self.columns.is_none() {
            let columns = self.rows.columns()?;
            self.columns = Some(columns.iter().map(|c| fold(c)).collect());
        }
        let columns = self.columns.as_deref().unwrap_or_default();

        let layout = self.layout::<T>()?;
        let strict = self.mapper.config().strict;
        let plan = Arc::new(Plan::new(type_id, layout, columns, strict)?);
        self.plan = Some(Arc::clone(&plan));
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ScanConfig;
    use crate::record::{Field, FieldDescriptor, RecordDescriptor};
    use crate::source::MemoryRows;

    #[derive(Debug, Default, PartialEq)]
    struct TestDst {
        foo: String,
        bar: String,
    }

    crate::impl_record!(TestDst { foo, bar });

    #[derive(Debug, Default, PartialEq)]
    struct Meta {
        version: i64,
    }

    crate::impl_record!(Meta { version });

    #[derive(Debug, Default, PartialEq)]
    struct Doc {
        meta: Meta,
        title: String,
        extra: Value,
    }

    impl Record for Doc {
        fn descriptor() -> RecordDescriptor {
            RecordDescriptor::new::<Self>()
                .field(FieldDescriptor::embedded::<Meta>("meta"))
                .field(FieldDescriptor::new("Title"))
                .field(FieldDescriptor::new("extra").rename("payload"))
        }

        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![
                Field::record(&mut self.meta),
                Field::value(&mut self.title),
                Field::any(&mut self.extra),
            ]
        }
    }

    #[derive(Default)]
    struct Empty;

    impl Record for Empty {
        fn descriptor() -> RecordDescriptor {
            RecordDescriptor::new::<Self>()
        }

        fn fields(&mut self) -> Vec<Field<'_>> {
            Vec::new()
        }
    }

    fn scan_first<T: Record + Default>(mapper: &RowMapper, rows: MemoryRows) -> ScanResult<T> {
        let mut scanner = mapper.row_scanner(rows);
        assert!(scanner.next());
        let mut dst = T::default();
        scanner.scan(&mut dst)?;
        Ok(dst)
    }

    #[test]
    fn test_scan_ignores_column_order() -> ScanResult<()> {
        let mapper = RowMapper::new();
        let rows = MemoryRows::new(["BAR", "Foo"]).row(["bar val", "foo val"]);
        let got: TestDst = scan_first(&mapper, rows)?;

        assert_eq!(
            got,
            TestDst {
                foo: "foo val".into(),
                bar: "bar val".into(),
            }
        );
        Ok(())
    }

    #[test]
    fn test_scan_embedded_and_any_fields() -> ScanResult<()> {
        let mapper = RowMapper::new();
        let rows = MemoryRows::new(["payload", "title", "version"])
            .row([Value::Float(1.5), Value::string("intro"), Value::Int(3)]);
        let got: Doc = scan_first(&mapper, rows)?;

        assert_eq!(got.meta.version, 3);
        assert_eq!(got.title, "intro");
        assert_eq!(got.extra, Value::Float(1.5));
        Ok(())
    }

    #[test]
    fn test_strict_rejects_unmapped_column() {
        let mapper = RowMapper::new();
        let rows = MemoryRows::new(["foo", "bar", "baz"]).row(["1", "2", "3"]);
        let result = scan_first::<TestDst>(&mapper, rows);

        match result {
            Err(ScanError::ColumnNotMapped { column, .. }) => assert_eq!(column, "baz"),
            other => panic!("expected unmapped column error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_strict_ignores_unmapped_column() -> ScanResult<()> {
        let mapper = RowMapper::with_config(ScanConfig::new().strict(false));
        let rows = MemoryRows::new(["foo", "baz", "bar"]).row(["1", "ignored", "3"]);
        let got: TestDst = scan_first(&mapper, rows)?;

        assert_eq!(
            got,
            TestDst {
                foo: "1".into(),
                bar: "3".into(),
            }
        );
        Ok(())
    }

    #[test]
    fn test_duplicate_columns_are_rejected() {
        let mapper = RowMapper::with_config(ScanConfig::new().strict(false));
        let rows = MemoryRows::new(["foo", "FOO"]).row(["1", "2"]);
        let result = scan_first::<TestDst>(&mapper, rows);
        assert!(matches!(result, Err(ScanError::DuplicateColumn(c)) if c == "foo"));
    }

    #[test]
    fn test_scan_opaque_values() -> ScanResult<()> {
        let mapper = RowMapper::new();

        let name: String = scan_first(&mapper, MemoryRows::new(["name"]).row(["ann"]))?;
        assert_eq!(name, "ann");

        let rows = MemoryRows::new(["count"]).row([Value::Null]);
        let count: Option<i64> = scan_first(&mapper, rows)?;
        assert_eq!(count, None);

        let any: Value = scan_first(&mapper, MemoryRows::new(["x"]).row([true]))?;
        assert_eq!(any, Value::Bool(true));
        Ok(())
    }

    #[test]
    fn test_opaque_needs_one_column() {
        let mapper = RowMapper::new();
        let result = scan_first::<String>(&mapper, MemoryRows::new(["a", "b"]).row(["1", "2"]));
        assert!(matches!(result, Err(ScanError::ColumnCount { got: 2, .. })));
    }

    #[test]
    fn test_empty_record_is_unmappable() {
        let mapper = RowMapper::new();
        let result = scan_first::<Empty>(&mapper, MemoryRows::new(["a"]).row(["1"]));
        assert!(matches!(result, Err(ScanError::UnmappableType { .. })));
    }

    #[test]
    fn test_binding_error_is_propagated() {
        let mapper = RowMapper::new();
        let rows = MemoryRows::new(["foo", "bar"]).row([Value::string("x"), Value::Int(2)]);
        let result = scan_first::<TestDst>(&mapper, rows);
        assert!(matches!(result, Err(ScanError::BindingFailure(_))));
    }

    #[test]
    fn test_scanner_replans_for_new_type() -> ScanResult<()> {
        let mapper = RowMapper::with_config(ScanConfig::new().strict(false));
        let rows = MemoryRows::new(["foo", "version"])
            .row([Value::string("a"), Value::Int(1)])
            .row([Value::string("b"), Value::Int(2)]);
        let mut scanner = mapper.row_scanner(rows);

        assert!(scanner.next());
        let mut first = TestDst::default();
        scanner.scan(&mut first)?;

        assert!(scanner.next());
        let mut second = Meta::default();
        scanner.scan(&mut second)?;

        assert_eq!(first.foo, "a");
        assert_eq!(second.version, 2);
        Ok(())
    }
}
