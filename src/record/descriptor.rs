use std::any::TypeId;

use super::Record;

/// How a declared field participates in column mapping.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// A leaf bound to exactly one column.
    Value,
    /// A sub-record. Embedded sub-records without a rename are flattened
    /// into the parent's namespace, all others get a column prefix.
    Record {
        descriptor: fn() -> RecordDescriptor,
        embedded: bool,
    },
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: &'static str,
    rename: Option<&'static str>,
    skip: bool,
    kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(name: &'static str) -> Self {
        FieldDescriptor {
            name,
            rename: None,
            skip: false,
            kind: FieldKind::Value,
        }
    }

    /// A nested record; its columns are named `<name><separator><column>`.
    pub fn record<R: Record>(name: &'static str) -> Self {
        FieldDescriptor {
            kind: FieldKind::Record {
                descriptor: R::descriptor,
                embedded: false,
            },
            ..Self::new(name)
        }
    }

    /// An embedded record whose columns merge into the parent's.
    pub fn embedded<R: Record>(name: &'static str) -> Self {
        FieldDescriptor {
            kind: FieldKind::Record {
                descriptor: R::descriptor,
                embedded: true,
            },
            ..Self::new(name)
        }
    }

    /// Overrides the column name. `"-"` excludes the field.
    pub fn rename(mut self, column: &'static str) -> Self {
        if column == "-" {
            self.skip = true;
        } else {
            self.rename = Some(column);
        }
        self
    }

    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn rename_value(&self) -> Option<&'static str> {
        self.rename
    }

    pub fn is_skipped(&self) -> bool {
        self.skip
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

/// Type descriptor of a record: its identity and declared fields, in
/// the same order `Record::fields` hands them out.
#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    opaque: bool,
}

impl RecordDescriptor {
    pub fn new<T: 'static>() -> Self {
        RecordDescriptor {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            fields: Vec::new(),
            opaque: false,
        }
    }

    /// Descriptor of a single-value type. It has no fields; a row's sole
    /// column binds to the value through `Record::as_dest`.
    pub fn opaque<T: 'static>() -> Self {
        RecordDescriptor {
            opaque: true,
            ..Self::new::<T>()
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn add_field(&mut self, field: FieldDescriptor) {
        self.fields.push(field);
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }
}
