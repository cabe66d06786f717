use crate::error::{BoxError, ScanError, ScanResult};
use crate::value::{Assign, Value};

use super::{Dest, RowSource};

/// Turns a mixed list of typed and any-typed destinations into the typed
/// list a `RowSource` accepts.
///
/// Every `Dest::Opaque` is swapped for a fresh `Value` buffer for the
/// duration of the bind; `finish` moves the buffers into the caller's
/// slots. Buffers are reused between rows.
#[derive(Debug, Default)]
pub struct Normalizer {
    buffers: Vec<Value>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize<'d>(&'d mut self, dests: &'d mut [Dest<'_>]) -> Vec<&'d mut dyn Assign> {
        let opaque = dests.iter().filter(|d| d.is_opaque()).count();
        self.buffers.clear();
        self.buffers.resize(opaque, Value::Null);

        let mut buffers = self.buffers.iter_mut();
        let mut bound: Vec<&'d mut dyn Assign> = Vec::with_capacity(dests.len());
        for dest in dests.iter_mut() {
            match dest {
                Dest::Concrete(target) => bound.push(&mut **target),
                Dest::Opaque(_) => {
                    if let Some(buffer) = buffers.next() {
                        bound.push(buffer);
                    }
                }
            }
        }
        bound
    }

    /// Copies buffered values into the caller's any-typed slots. Only
    /// valid after the source reported success for the whole row.
    pub fn finish(&mut self, dests: &mut [Dest<'_>]) {
        let mut filled = self.buffers.drain(..);
        for dest in dests.iter_mut() {
            if let Dest::Opaque(target) = dest {
                if let Some(value) = filled.next() {
                    **target = value;
                }
            }
        }
    }

    /// Binds the current row of `rows` into `dests`. On failure no
    /// any-typed slot is written.
    pub fn bind<R: RowSource + ?Sized>(
        &mut self,
        rows: &mut R,
        dests: &mut [Dest<'_>],
    ) -> ScanResult<()> {
        let result = {
            let mut bound = self.normalize(dests);
            rows.scan(&mut bound)
        };
        result.map_err(ScanError::BindingFailure)?;
        self.finish(dests);
        Ok(())
    }
}

/// Wraps a row source so callers can scan any mix of typed and
/// any-typed destinations.
pub struct RowsAdapter<R> {
    rows: R,
    normalizer: Normalizer,
}

impl<R: RowSource> RowsAdapter<R> {
    pub fn new(rows: R) -> Self {
        RowsAdapter {
            rows,
            normalizer: Normalizer::new(),
        }
    }

    pub fn columns(&self) -> ScanResult<Vec<String>> {
        self.rows.columns().map_err(ScanError::SourceExhaustion)
    }

    pub fn next(&mut self) -> bool {
        self.rows.next()
    }

    pub fn scan(&mut self, dests: &mut [Dest<'_>]) -> ScanResult<()> {
        self.normalizer.bind(&mut self.rows, dests)
    }

    pub fn take_err(&mut self) -> Option<BoxError> {
        self.rows.take_err()
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.rows
    }

    pub fn into_inner(self) -> R {
        self.rows
    }
}
