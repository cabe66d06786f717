use thiserror::Error;

/// Error type row sources report. Wrapped unmodified by `ScanError`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot scan into {type_name}: {reason}")]
    UnmappableType {
        type_name: &'static str,
        reason: String,
    },

    #[error("column '{column}' is mapped by both {first} and {second}")]
    AmbiguousMapping {
        column: String,
        first: String,
        second: String,
    },

    #[error("column '{column}' has no corresponding field in {type_name}")]
    ColumnNotMapped {
        column: String,
        type_name: &'static str,
    },

    #[error("rows contain a duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("scanning into {type_name} needs exactly one column, got {got}")]
    ColumnCount {
        type_name: &'static str,
        got: usize,
    },

    #[error("row binding failed: {0}")]
    BindingFailure(#[source] BoxError),

    #[error("row source failed: {0}")]
    SourceExhaustion(#[source] BoxError),

    #[error("no rows in result set")]
    NotFound,

    #[error("query failed: {0}")]
    Query(#[source] BoxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl ScanError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScanError::NotFound)
    }
}

/// Reports whether `err` means a single-row scan found zero rows.
pub fn not_found(err: &ScanError) -> bool {
    err.is_not_found()
}

/// Failure of the value assignment primitive for one column.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssignError {
    #[error("cannot assign {found} value to {target}")]
    Mismatch {
        found: &'static str,
        target: &'static str,
    },

    #[error("value {value} is out of range for {target}")]
    OutOfRange {
        value: i64,
        target: &'static str,
    },

    #[error("cannot assign NULL to {target}")]
    Null { target: &'static str },
}

pub type ScanResult<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_predicate() {
        assert!(not_found(&ScanError::NotFound));
        assert!(!not_found(&ScanError::DuplicateColumn("foo".to_string())));
        let source_err = ScanError::SourceExhaustion("conn reset".into());
        assert!(!not_found(&source_err));
    }

    #[test]
    fn test_binding_failure_keeps_source() {
        let err = ScanError::BindingFailure(Box::new(AssignError::Null { target: "i64" }));
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "cannot assign NULL to i64");
    }
}
