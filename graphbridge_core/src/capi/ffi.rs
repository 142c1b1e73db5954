//! C ABI for handing wrapped vectors to the host runtime

use std::ffi::c_void;

use super::vector_wrapper::VectorWrapper;

/// Opaque handle to a heap-allocated [`VectorWrapper`]
pub type VectorWrapperHandle = *mut c_void;
/// Opaque handle to an engine graph object
pub type GraphHandle = *mut c_void;
/// Opaque handle to an engine communicator object
pub type CommunicatorHandle = *mut c_void;

impl VectorWrapper {
    /// Release ownership to the host; pair with [`gb_vector_wrapper_free`]
    pub fn into_handle(self: Box<Self>) -> VectorWrapperHandle {
        Box::into_raw(self) as VectorWrapperHandle
    }

    /// Reclaim ownership of a handle
    ///
    /// # Safety
    ///
    /// `handle` must be null or come from [`VectorWrapper::into_handle`] and
    /// not have been freed or reclaimed already.
    pub unsafe fn from_handle(handle: VectorWrapperHandle) -> Option<Box<Self>> {
        if handle.is_null() {
            None
        } else {
            Some(Box::from_raw(handle as *mut VectorWrapper))
        }
    }
}

unsafe fn wrapper_ref<'a>(handle: VectorWrapperHandle) -> Option<&'a VectorWrapper> {
    (handle as *const VectorWrapper).as_ref()
}

/// Number of entries; 0 for a null handle
///
/// # Safety
///
/// `handle` must be null or a live handle from [`VectorWrapper::into_handle`].
#[no_mangle]
pub unsafe extern "C" fn gb_vector_wrapper_size(handle: VectorWrapperHandle) -> usize {
    wrapper_ref(handle).map_or(0, VectorWrapper::len)
}

/// Entry `index`; null for a null handle, a null entry or an index past the end
///
/// The pointee stays owned by the wrapper.
///
/// # Safety
///
/// `handle` must be null or a live handle from [`VectorWrapper::into_handle`].
#[no_mangle]
pub unsafe extern "C" fn gb_vector_wrapper_get(
    handle: VectorWrapperHandle,
    index: usize,
) -> *mut c_void {
    wrapper_ref(handle).map_or(std::ptr::null_mut(), |wrapper| wrapper.ptr(index))
}

/// Free the wrapper and every entry; a null handle is a no-op
///
/// # Safety
///
/// `handle` must be null or a live handle from [`VectorWrapper::into_handle`],
/// and is invalid after this call.
#[no_mangle]
pub unsafe extern "C" fn gb_vector_wrapper_free(handle: VectorWrapperHandle) {
    if let Some(wrapper) = VectorWrapper::from_handle(handle) {
        log::trace!("freeing vector wrapper with {} entries", wrapper.len());
        drop(wrapper);
    }
}
