use std::collections::VecDeque;

use serde::Deserialize;
use thiserror::Error;

use crate::error::{AssignError, BoxError, ScanResult};
use crate::value::{Assign, Value};

use super::RowSource;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryRowsError {
    #[error("scan called without a current row")]
    NoCurrentRow,

    #[error("row has {expected} columns, got {got} destinations")]
    DestinationCount {
        expected: usize,
        got: usize,
    },

    #[error("column {index}: {source}")]
    Assign {
        index: usize,
        #[source]
        source: AssignError,
    },

    #[error("connection lost after {0} rows")]
    ConnectionLost(usize),
}

/// Row source over rows held in memory.
///
/// Can be loaded from a JSON fixture of the form
/// `{"columns": ["foo", "bar"], "rows": [["a", 1], ["b", 2]]}` and told to
/// fail after a number of rows to stand in for a broken connection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryRows {
    columns: Vec<String>,
    #[serde(default)]
    rows: VecDeque<Vec<Value>>,
    #[serde(default)]
    fail_after: Option<usize>,
    #[serde(skip)]
    current: Option<Vec<Value>>,
    #[serde(skip)]
    delivered: usize,
    #[serde(skip)]
    err: Option<MemoryRowsError>,
}

impl MemoryRows {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MemoryRows {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> ScanResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn row<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_row(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn push_row(&mut self, values: Vec<Value>) {
        self.rows.push_back(values);
    }

    /// Makes iteration stop with an error once `rows` rows were delivered.
    pub fn fail_after(mut self, rows: usize) -> Self {
        self.fail_after = Some(rows);
        self
    }

    /// Rows not yet delivered.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowSource for MemoryRows {
    fn columns(&self) -> Result<Vec<String>, BoxError> {
        Ok(self.columns.clone())
    }

    fn next(&mut self) -> bool {
        self.current = None;
        if self.fail_after == Some(self.delivered) {
            self.err = Some(MemoryRowsError::ConnectionLost(self.delivered));
            self.rows.clear();
            return false;
        }

        match self.rows.pop_front() {
            Some(row) => {
                self.current = Some(row);
                self.delivered += 1;
                true
            }
            None => false,
        }
    }

    fn scan(&mut self, dests: &mut [&mut dyn Assign]) -> Result<(), BoxError> {
        let row = self.current.as_ref().ok_or(MemoryRowsError::NoCurrentRow)?;
        if dests.len() != row.len() {
            return Err(MemoryRowsError::DestinationCount {
                expected: row.len(),
                got: dests.len(),
            }
            .into());
        }

        for (index, (dest, value)) in dests.iter_mut().zip(row).enumerate() {
            dest.assign(value.clone())
                .map_err(|source| MemoryRowsError::Assign { index, source })?;
        }
        Ok(())
    }

    fn take_err(&mut self) -> Option<BoxError> {
        self.err.take().map(|e| Box::new(e) as BoxError)
    }
}
