use std::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use crate::error::{ScanError, ScanResult};
use crate::source::Dest;

use super::descriptor::{FieldKind, RecordDescriptor};
use super::{Field, Record};

/// Options that change how column names are derived from fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutOptions {
    pub separator: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            separator: ".".to_string(),
        }
    }
}

/// Case folding applied to field names and to result column names.
pub fn fold(name: &str) -> String {
    name.to_lowercase()
}

/// Path from a record down to one of its leaf fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    indices: Vec<usize>,
    names: Vec<&'static str>,
}

impl FieldPath {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    fn push(&mut self, index: usize, name: &'static str) {
        self.indices.push(index);
        self.names.push(name);
    }

    fn pop(&mut self) {
        self.indices.pop();
        self.names.pop();
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names.join("."))
    }
}

#[derive(Debug, Clone)]
pub struct ColumnMapping {
    column: String,
    path: FieldPath,
}

impl ColumnMapping {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Skip,
    Leaf,
    Nested(Shape),
}

/// Mirror of a record's field tree, used to pull leaf destinations out of
/// a live record in the same depth-first order the columns were assigned.
#[derive(Debug, Clone, Default)]
pub(crate) struct Shape {
    slots: Vec<Slot>,
}

impl Shape {
    pub(crate) fn collect<'a>(
        &self,
        record: &'a mut dyn Record,
        type_name: &'static str,
        out: &mut Vec<Option<Dest<'a>>>,
    ) -> ScanResult<()> {
        let fields = record.fields();
        if fields.len() != self.slots.len() {
            return Err(ScanError::UnmappableType {
                type_name,
                reason: format!(
                    "fields() returned {} entries but the descriptor declares {}",
                    fields.len(),
                    self.slots.len()
                ),
            });
        }

        for (slot, field) in self.slots.iter().zip(fields) {
            match (slot, field) {
                (Slot::Skip, _) => {}
                (Slot::Leaf, Field::Value(dest)) => out.push(Some(dest)),
                (Slot::Nested(shape), Field::Record(inner)) => {
                    shape.collect(inner, type_name, out)?
                }
                _ => {
                    return Err(ScanError::UnmappableType {
                        type_name,
                        reason: "fields() does not match the descriptor".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Column-to-field table for one record type.
///
/// Columns are listed in depth-first field order; a column's position
/// is the index of its destination among the record's leaves. Layouts of
/// single-value types have no columns: the row's single column binds to
/// the value itself.
#[derive(Debug, Clone)]
pub struct Layout {
    type_name: &'static str,
    columns: Vec<ColumnMapping>,
    index: HashMap<String, usize>,
    shape: Shape,
}

impl Layout {
    pub fn build(desc: &RecordDescriptor, options: &LayoutOptions) -> ScanResult<Self> {
        let mut builder = Builder {
            options,
            root: desc.type_name(),
            columns: Vec::new(),
            index: HashMap::new(),
            path: FieldPath::default(),
            stack: Vec::new(),
        };
        let shape = builder.walk(desc, "")?;
        if builder.columns.is_empty() && !desc.is_opaque() {
            return Err(ScanError::UnmappableType {
                type_name: desc.type_name(),
                reason: "it has no mappable fields and is not a single value".to_string(),
            });
        }

        Ok(Layout {
            type_name: desc.type_name(),
            columns: builder.columns,
            index: builder.index,
            shape,
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_opaque(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ColumnMapping] {
        &self.columns
    }

    /// Leaf position for an already folded column name.
    pub fn leaf(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn field_path(&self, column: &str) -> Option<&FieldPath> {
        self.leaf(&fold(column)).map(|i| &self.columns[i].path)
    }

    pub(crate) fn shape(&self) -> &Shape {
        &self.shape
    }
}

struct Builder<'o> {
    options: &'o LayoutOptions,
    root: &'static str,
    columns: Vec<ColumnMapping>,
    index: HashMap<String, usize>,
    path: FieldPath,
    stack: Vec<TypeId>,
}

impl Builder<'_> {
    fn walk(&mut self, desc: &RecordDescriptor, prefix: &str) -> ScanResult<Shape> {
        if self.stack.contains(&desc.type_id()) {
            return Err(ScanError::UnmappableType {
                type_name: self.root,
                reason: format!("{} contains itself through {}", desc.type_name(), self.path),
            });
        }
        self.stack.push(desc.type_id());

        let mut slots = Vec::with_capacity(desc.fields().len());
        for (i, field) in desc.fields().iter().enumerate() {
            if field.is_skipped() {
                slots.push(Slot::Skip);
                continue;
            }

            self.path.push(i, field.name());
            let name = fold(field.rename_value().unwrap_or(field.name()));
            let slot = match field.kind() {
                FieldKind::Value => {
                    self.add_column(format!("{prefix}{name}"))?;
                    Slot::Leaf
                }
                FieldKind::Record { descriptor, embedded } => {
                    let sub = descriptor();
                    if sub.fields().is_empty() {
                        return Err(ScanError::UnmappableType {
                            type_name: self.root,
                            reason: format!(
                                "{} at {} has no fields to map",
                                sub.type_name(),
                                self.path
                            ),
                        });
                    }
                    let sub_prefix = if embedded && field.rename_value().is_none() {
                        prefix.to_string()
                    } else {
                        format!("{prefix}{name}{}", fold(&self.options.separator))
                    };
                    Slot::Nested(self.walk(&sub, &sub_prefix)?)
                }
            };
            self.path.pop();
            slots.push(slot);
        }

        self.stack.pop();
        Ok(Shape { slots })
    }

    fn add_column(&mut self, column: String) -> ScanResult<()> {
        match self.index.entry(column) {
            Entry::Occupied(e) => Err(ScanError::AmbiguousMapping {
                column: e.key().clone(),
                first: self.columns[*e.get()].path.to_string(),
                second: self.path.to_string(),
            }),
            Entry::Vacant(e) => {
                self.columns.push(ColumnMapping {
                    column: e.key().clone(),
                    path: self.path.clone(),
                });
                e.insert(self.columns.len() - 1);
                Ok(())
            }
        }
    }
}
