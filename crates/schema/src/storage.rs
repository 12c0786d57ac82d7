use std::any::Any;
use std::fmt;
use std::sync::Arc;

use basalt_primitives::TableId;

/// An opaque, cheaply cloned handle to the physical storage of a table.
///
/// Two handles are equal only if they point at the same storage object.
#[derive(Clone)]
pub struct StorageHandle {
    table_id: TableId,
    inner: Arc<dyn Any + Send + Sync>,
}

impl StorageHandle {
    pub fn new<T: Any + Send + Sync>(table_id: TableId, storage: T) -> Self {
        Self {
            table_id,
            inner: Arc::new(storage),
        }
    }

    /// A handle for a table that has no storage attached to it
    pub fn detached(table_id: TableId) -> Self {
        Self::new(table_id, ())
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Recover the concrete storage type this handle was created with
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl PartialEq for StorageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.table_id == other.table_id && Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for StorageHandle {}

impl fmt::Debug for StorageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageHandle")
            .field("table_id", &self.table_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Heap(Vec<u64>);

    #[test]
    fn handles_compare_by_identity() {
        let a = StorageHandle::detached(TableId(1));
        let b = StorageHandle::detached(TableId(1));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn downcast_to_concrete_storage() {
        let handle = StorageHandle::new(TableId(3), Heap(vec![1, 2]));
        assert_eq!(handle.downcast_ref::<Heap>(), Some(&Heap(vec![1, 2])));
        assert!(handle.downcast_ref::<String>().is_none());
        assert_eq!(handle.table_id(), TableId(3));
    }
}
