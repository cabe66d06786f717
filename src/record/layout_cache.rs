use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;

use crate::error::ScanResult;

use super::Record;
use super::layout::{Layout, LayoutOptions};

type Slot = Arc<Mutex<Option<Arc<Layout>>>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LayoutKey {
    type_id: TypeId,
    options: LayoutOptions,
}

/// Memoizes record layouts by type.
///
/// Thread safe and meant to be shared (`Arc<LayoutCache>`) between
/// mappers. Each type gets its own slot; the first caller builds the
/// layout while holding the slot lock, so concurrent callers for the same
/// type wait and then observe that one instance. Failed builds are not
/// stored.
#[derive(Default)]
pub struct LayoutCache {
    slots: RwLock<HashMap<LayoutKey, Slot>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve<T: Record>(&self, options: &LayoutOptions) -> ScanResult<Arc<Layout>> {
        let slot = self.slot(LayoutKey {
            type_id: TypeId::of::<T>(),
            options: options.clone(),
        });

        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(layout) = entry.as_ref() {
            return Ok(Arc::clone(layout));
        }

        let layout = Arc::new(Layout::build(&T::descriptor(), options)?);
        debug!(
            record = layout.type_name(),
            columns = layout.columns().len(),
            opaque = layout.is_opaque(),
            "built record layout"
        );
        *entry = Some(Arc::clone(&layout));
        Ok(layout)
    }

    /// Number of layouts built so far.
    pub fn len(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|slot| {
                slot.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some()
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: LayoutKey) -> Slot {
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(&key) {
                return Arc::clone(slot);
            }
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use crate::record::{Field, FieldDescriptor, RecordDescriptor};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    static SLOW_BUILDS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Slow {
        foo: String,
    }

    impl Record for Slow {
        fn descriptor() -> RecordDescriptor {
            SLOW_BUILDS.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            RecordDescriptor::new::<Self>().field(FieldDescriptor::new("foo"))
        }

        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![Field::value(&mut self.foo)]
        }
    }

    struct Broken;

    impl Record for Broken {
        fn descriptor() -> RecordDescriptor {
            RecordDescriptor::new::<Self>()
                .field(FieldDescriptor::new("foo"))
                .field(FieldDescriptor::new("FOO"))
        }

        fn fields(&mut self) -> Vec<Field<'_>> {
            vec![Field::Skipped, Field::Skipped]
        }
    }

    #[test]
    fn test_cache_returns_same_layout() -> ScanResult<()> {
        let cache = LayoutCache::new();
        let options = LayoutOptions::default();
        let first = cache.resolve::<String>(&options)?;
        let second = cache.resolve::<String>(&options)?;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[test]
    fn test_cache_keys_on_options() -> ScanResult<()> {
        let cache = LayoutCache::new();
        let dotted = cache.resolve::<String>(&LayoutOptions::default())?;
        let underscored = cache.resolve::<String>(&LayoutOptions {
            separator: "_".to_string(),
        })?;

        assert!(!Arc::ptr_eq(&dotted, &underscored));
        assert_eq!(cache.len(), 2);
        Ok(())
    }

    #[test]
    fn test_cache_single_flight() {
        let cache = Arc::new(LayoutCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    cache
                        .resolve::<Slow>(&LayoutOptions::default())
                        .unwrap()
                })
            })
            .collect();

        let layouts: Vec<Arc<Layout>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for layout in &layouts[1..] {
            assert!(Arc::ptr_eq(&layouts[0], layout));
        }
        assert_eq!(SLOW_BUILDS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_does_not_store_failures() {
        let cache = LayoutCache::new();
        for _ in 0..2 {
            let result = cache.resolve::<Broken>(&LayoutOptions::default());
            assert!(matches!(result, Err(ScanError::AmbiguousMapping { .. })));
        }
        assert!(cache.is_empty());
    }
}
