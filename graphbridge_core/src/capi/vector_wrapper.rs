//! Type-erased collections returned across the C boundary
//!
//! The host runtime cannot name engine types, so sequences of engine objects
//! are handed back as a [`VectorWrapper`]: an ordered list of opaque
//! pointers that owns every pointee.

use std::any::{type_name, Any, TypeId};
use std::ffi::c_void;
use std::fmt;
use std::mem::size_of;

use crate::bridge_internal;
use crate::error::{BridgeError, BridgeResult};

type Entry = Option<Box<dyn Any + Send>>;

/// Ordered, owning collection of type-erased objects
///
/// `None` entries are nulls and stay in place. Dropping the wrapper drops
/// each pointee once.
pub struct VectorWrapper {
    entries: Vec<Entry>,
    elem_type: TypeId,
    elem_name: &'static str,
}

fn alloc_entries(len: usize) -> BridgeResult<Vec<Entry>> {
    let mut entries = Vec::new();
    entries
        .try_reserve_exact(len)
        .map_err(|_| BridgeError::OutOfMemory {
            bytes: len.saturating_mul(size_of::<Entry>()),
        })?;
    Ok(entries)
}

fn erase<T: Any + Send>(value: Option<Box<T>>) -> Entry {
    value.map(|boxed| boxed as Box<dyn Any + Send>)
}

impl VectorWrapper {
    fn from_entries<T: Any>(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            elem_type: TypeId::of::<T>(),
            elem_name: type_name::<T>(),
        }
    }

    /// Take ownership of `values`, erasing their type
    pub fn wrap<T: Any + Send>(values: Vec<Option<Box<T>>>) -> BridgeResult<Self> {
        let mut entries = alloc_entries(values.len())?;
        entries.extend(values.into_iter().map(erase));
        log::debug!("wrapped {} {} entries", entries.len(), type_name::<T>());
        Ok(Self::from_entries::<T>(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the element type recorded at construction
    pub fn element_type_name(&self) -> &'static str {
        self.elem_name
    }

    pub fn holds<T: Any>(&self) -> bool {
        self.elem_type == TypeId::of::<T>()
    }

    /// Raw address of entry `index`; null for a null entry or past the end
    pub fn ptr(&self, index: usize) -> *mut c_void {
        match self.entries.get(index) {
            Some(Some(boxed)) => {
                let erased: *const (dyn Any + Send) = &**boxed;
                erased as *const c_void as *mut c_void
            }
            _ => std::ptr::null_mut(),
        }
    }

    fn check_type<T: Any>(&self) -> BridgeResult<()> {
        if self.holds::<T>() {
            Ok(())
        } else {
            Err(BridgeError::type_mismatch(type_name::<T>(), self.elem_name))
        }
    }

    fn check_index(&self, index: usize) -> BridgeResult<()> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(BridgeError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
        }
    }

    /// Borrow entry `index` as its original type
    pub fn get<T: Any>(&self, index: usize) -> BridgeResult<Option<&T>> {
        self.check_index(index)?;
        self.check_type::<T>()?;
        match &self.entries[index] {
            None => Ok(None),
            Some(boxed) => (**boxed)
                .downcast_ref::<T>()
                .map(Some)
                .ok_or_else(|| bridge_internal!("entry {} is not a {}", index, self.elem_name)),
        }
    }

    /// Move entry `index` out, leaving a null in its place
    pub fn take<T: Any>(&mut self, index: usize) -> BridgeResult<Option<Box<T>>> {
        self.check_index(index)?;
        self.check_type::<T>()?;
        match self.entries[index].take() {
            None => Ok(None),
            Some(boxed) => boxed
                .downcast::<T>()
                .map(Some)
                .map_err(|_| bridge_internal!("entry {} is not a {}", index, self.elem_name)),
        }
    }

    /// Reclaim the entries with their original type
    pub fn into_vec<T: Any>(self) -> BridgeResult<Vec<Option<Box<T>>>> {
        self.check_type::<T>()?;
        let elem_name = self.elem_name;
        self.entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| match entry {
                None => Ok(None),
                Some(boxed) => boxed
                    .downcast::<T>()
                    .map(Some)
                    .map_err(|_| bridge_internal!("entry {} is not a {}", index, elem_name)),
            })
            .collect()
    }
}

impl fmt::Debug for VectorWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorWrapper")
            .field("len", &self.entries.len())
            .field("element_type", &self.elem_name)
            .finish()
    }
}

/// Move a function's result vector into a heap-allocated [`VectorWrapper`]
///
/// `values` is left empty. On allocation failure it is left untouched.
pub fn wrap_vector_return<T: Any + Send>(
    values: &mut Vec<Option<Box<T>>>,
) -> BridgeResult<Box<VectorWrapper>> {
    let mut entries = alloc_entries(values.len())?;
    entries.extend(values.drain(..).map(erase));
    log::debug!("returning {} {} entries", entries.len(), type_name::<T>());
    Ok(Box::new(VectorWrapper::from_entries::<T>(entries)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, PartialEq)]
    struct Node {
        id: u64,
    }

    fn addr<T>(value: &Option<Box<T>>) -> usize {
        value.as_deref().map_or(0, |v| v as *const T as usize)
    }

    #[test]
    fn test_wrap_preserves_addresses_and_empties_source() {
        let mut values = vec![
            Some(Box::new(Node { id: 1 })),
            None,
            Some(Box::new(Node { id: 3 })),
        ];
        let addresses: Vec<usize> = values.iter().map(addr).collect();

        let wrapper = wrap_vector_return(&mut values).unwrap();
        assert!(values.is_empty());
        assert_eq!(wrapper.len(), 3);
        for (i, expected) in addresses.iter().enumerate() {
            assert_eq!(wrapper.ptr(i) as usize, *expected);
        }
        assert!(wrapper.ptr(3).is_null());
    }

    #[test]
    fn test_wrap_empty() {
        let mut values: Vec<Option<Box<Node>>> = Vec::new();
        let wrapper = wrap_vector_return(&mut values).unwrap();
        assert!(wrapper.is_empty());
        assert!(wrapper.ptr(0).is_null());
    }

    #[test]
    fn test_typed_access() {
        let wrapper = VectorWrapper::wrap(vec![Some(Box::new(Node { id: 7 })), None]).unwrap();
        assert!(wrapper.holds::<Node>());
        assert!(wrapper.element_type_name().ends_with("Node"));
        assert_eq!(wrapper.get::<Node>(0).unwrap(), Some(&Node { id: 7 }));
        assert_eq!(wrapper.get::<Node>(1).unwrap(), None);

        assert!(matches!(
            wrapper.get::<Node>(2),
            Err(BridgeError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(matches!(
            wrapper.get::<u64>(0),
            Err(BridgeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_take_and_into_vec() {
        let mut wrapper = VectorWrapper::wrap(vec![
            Some(Box::new(Node { id: 1 })),
            Some(Box::new(Node { id: 2 })),
        ])
        .unwrap();

        let first = wrapper.take::<Node>(0).unwrap().unwrap();
        assert_eq!(first.id, 1);
        assert!(wrapper.ptr(0).is_null());
        assert_eq!(wrapper.len(), 2);

        let rest = wrapper.into_vec::<Node>().unwrap();
        assert_eq!(rest, vec![None, Some(Box::new(Node { id: 2 }))]);
    }

    struct Tracked(Arc<AtomicUsize>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_drop_releases_each_entry_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut values = vec![
            Some(Box::new(Tracked(drops.clone()))),
            None,
            Some(Box::new(Tracked(drops.clone()))),
        ];
        let wrapper = wrap_vector_return(&mut values).unwrap();
        drop(values);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(wrapper);
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }
}
