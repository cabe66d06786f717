use std::sync::Arc;

use tracing::{trace, warn};

use crate::error::{ScanError, ScanResult};
use crate::record::{LayoutCache, LayoutOptions, Record};
use crate::scan::RowScanner;
use crate::source::RowSource;
use crate::value::Value;

use super::{Querier, ScanConfig};

/// Entry point for scanning rows into records.
///
/// Owns the scan configuration and a handle on a layout cache. Create one
/// at startup and share it; mappers built with `with_cache` can share a
/// single cache.
pub struct RowMapper {
    config: ScanConfig,
    layout: LayoutOptions,
    cache: Arc<LayoutCache>,
}

impl Default for RowMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl RowMapper {
    pub fn new() -> Self {
        Self::with_config(ScanConfig::default())
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self::with_cache(config, Arc::new(LayoutCache::new()))
    }

    pub fn with_cache(config: ScanConfig, cache: Arc<LayoutCache>) -> Self {
        RowMapper {
            layout: config.layout_options(),
            config,
            cache,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn layout_options(&self) -> &LayoutOptions {
        &self.layout
    }

    pub fn cache(&self) -> &Arc<LayoutCache> {
        &self.cache
    }

    pub fn row_scanner<R: RowSource>(&self, rows: R) -> RowScanner<'_, R> {
        RowScanner::new(self, rows)
    }

    /// Scans every remaining row of `rows`, appending one record per row.
    /// An empty result leaves `dst` as it was and is not an error.
    pub fn scan_all<T, R>(&self, dst: &mut Vec<T>, rows: &mut R) -> ScanResult<()>
    where
        T: Record + Default,
        R: RowSource + ?Sized,
    {
        self.scan_each(rows, |record| dst.push(record))
    }

    /// Like `scan_all`, appending boxed records.
    pub fn scan_all_boxed<T, R>(&self, dst: &mut Vec<Box<T>>, rows: &mut R) -> ScanResult<()>
    where
        T: Record + Default,
        R: RowSource + ?Sized,
    {
        self.scan_each(rows, |record| dst.push(Box::new(record)))
    }

    /// Advances `rows` once and scans that row into `dst`. Zero rows is
    /// `ScanError::NotFound`; rows after the first are left unread.
    pub fn scan_one<T, R>(&self, dst: &mut T, rows: &mut R) -> ScanResult<()>
    where
        T: Record,
        R: RowSource + ?Sized,
    {
        let mut scanner = self.row_scanner(rows);
        scanner.layout::<T>()?;

        if !scanner.next() {
            if let Some(err) = scanner.take_err() {
                warn!(error = %err, "row source failed before the first row");
                return Err(ScanError::SourceExhaustion(err));
            }
            return Err(ScanError::NotFound);
        }
        scanner.scan(dst)
    }

    /// Scans the row `rows` is currently positioned on. Does not advance.
    pub fn scan_row<T, R>(&self, dst: &mut T, rows: &mut R) -> ScanResult<()>
    where
        T: Record,
        R: RowSource + ?Sized,
    {
        self.row_scanner(rows).scan(dst)
    }

    pub fn query_all<Q, T>(
        &self,
        querier: &Q,
        dst: &mut Vec<T>,
        sql: &str,
        args: &[Value],
    ) -> ScanResult<()>
    where
        Q: Querier + ?Sized,
        T: Record + Default,
    {
        let mut rows = querier.query(sql, args).map_err(ScanError::Query)?;
        self.scan_all(dst, &mut rows)
    }

    pub fn query_one<Q, T>(
        &self,
        querier: &Q,
        dst: &mut T,
        sql: &str,
        args: &[Value],
    ) -> ScanResult<()>
    where
        Q: Querier + ?Sized,
        T: Record,
    {
        let mut rows = querier.query(sql, args).map_err(ScanError::Query)?;
        self.scan_one(dst, &mut rows)
    }

    fn scan_each<T, R, F>(&self, rows: &mut R, mut push: F) -> ScanResult<()>
    where
        T: Record + Default,
        R: RowSource + ?Sized,
        F: FnMut(T),
    {
        let mut scanner = self.row_scanner(rows);
        scanner.layout::<T>()?;

        let mut count = 0usize;
        while scanner.next() {
            let mut record = T::default();
            scanner.scan(&mut record)?;
            push(record);
            count += 1;
        }

        if let Some(err) = scanner.take_err() {
            warn!(error = %err, rows = count, "row source failed mid-stream");
            return Err(ScanError::SourceExhaustion(err));
        }
        trace!(
            rows = count,
            record = std::any::type_name::<T>(),
            "scanned all rows"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryRows;

    #[test]
    fn test_scan_all_resolves_layout_before_reading() {
        struct Clash;

        impl Record for Clash {
            fn descriptor() -> crate::RecordDescriptor {
                crate::RecordDescriptor::new::<Self>()
                    .field(crate::FieldDescriptor::new("Foo"))
                    .field(crate::FieldDescriptor::new("foo"))
            }

            fn fields(&mut self) -> Vec<crate::Field<'_>> {
                vec![crate::Field::Skipped, crate::Field::Skipped]
            }
        }

        impl Default for Clash {
            fn default() -> Self {
                Clash
            }
        }

        let mapper = RowMapper::new();
        let mut rows = MemoryRows::new(["foo"]).row(["1"]);
        let mut dst: Vec<Clash> = Vec::new();
        let result = mapper.scan_all(&mut dst, &mut rows);

        assert!(matches!(result, Err(ScanError::AmbiguousMapping { .. })));
        assert_eq!(rows.remaining(), 1);
    }

    #[test]
    fn test_scan_one_rejects_unmappable_before_reading() {
        #[derive(Default)]
        struct Empty;

        impl Record for Empty {
            fn descriptor() -> crate::RecordDescriptor {
                crate::RecordDescriptor::new::<Self>()
            }

            fn fields(&mut self) -> Vec<crate::Field<'_>> {
                Vec::new()
            }
        }

        let mapper = RowMapper::new();
        let mut rows = MemoryRows::new(["a"]).row(["1"]).row(["2"]);
        let result = mapper.scan_one(&mut Empty, &mut rows);

        assert!(matches!(result, Err(ScanError::UnmappableType { .. })));
        assert_eq!(rows.remaining(), 2);
        assert!(mapper.cache().is_empty());
    }

    #[test]
    fn test_mappers_share_cache() -> ScanResult<()> {
        let cache = Arc::new(LayoutCache::new());
        let strict = RowMapper::with_cache(ScanConfig::new(), Arc::clone(&cache));
        let lenient =
            RowMapper::with_cache(ScanConfig::new().strict(false), Arc::clone(&cache));

        let mut a = Vec::<String>::new();
        strict.scan_all(&mut a, &mut MemoryRows::new(["x"]).row(["1"]))?;
        let mut b = Vec::<String>::new();
        lenient.scan_all(&mut b, &mut MemoryRows::new(["x"]).row(["2"]))?;

        assert_eq!(cache.len(), 1);
        assert_eq!((a[0].as_str(), b[0].as_str()), ("1", "2"));
        Ok(())
    }
}
