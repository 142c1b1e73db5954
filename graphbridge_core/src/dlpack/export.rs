//! DLPack export - hand array handles to a consumer
//!
//! The exported managed tensor keeps a handle clone alive, so the buffer
//! outlives the consumer's use until it calls the deleter.

use std::ffi::c_void;

use super::ffi::{DLManagedTensor, DLTensor};
use crate::array::NDArray;

/// Context stored in `DLManagedTensor::manager_ctx`
struct ExportContext {
    /// Keeps the storage alive
    _array: NDArray,
    /// Owned shape, pointed to by the DLTensor
    shape: Vec<i64>,
    /// Owned strides, pointed to by the DLTensor
    strides: Vec<i64>,
}

/// Deleter callback handed to the consumer
unsafe extern "C" fn export_deleter(managed: *mut DLManagedTensor) {
    if managed.is_null() {
        return;
    }

    // SAFETY: null check above; the pointer was created by `Box::into_raw`
    // in `to_dlpack`.
    let managed = Box::from_raw(managed);

    if !managed.manager_ctx.is_null() {
        // SAFETY: manager_ctx was created by `Box::into_raw(context)` in
        // `to_dlpack`; reconstructing the Box drops the handle clone.
        drop(Box::from_raw(managed.manager_ctx as *mut ExportContext));
    }
}

/// Export an array as a DLPack managed tensor
///
/// No data is copied. The caller passes the result to a consumer, which
/// must invoke its deleter exactly once.
pub fn to_dlpack(array: &NDArray) -> Box<DLManagedTensor> {
    let context = Box::new(ExportContext {
        _array: array.clone(),
        shape: array.shape().to_vec(),
        strides: array.strides().to_vec(),
    });

    // Pointers into the context's vectors stay valid: the context is boxed
    // and never touched again until the deleter runs.
    let shape_ptr = context.shape.as_ptr() as *mut i64;
    let strides_ptr = if context.strides.is_empty() {
        std::ptr::null_mut()
    } else {
        context.strides.as_ptr() as *mut i64
    };

    let dl_tensor = DLTensor {
        data: array.data_ptr(),
        device: array.device().into(),
        ndim: array.ndim() as i32,
        dtype: array.dtype().into(),
        shape: shape_ptr,
        strides: strides_ptr,
        byte_offset: 0,
    };

    log::debug!(
        "exporting {} array {:?} on {} via DLPack",
        array.dtype(),
        array.shape(),
        array.device()
    );

    Box::new(DLManagedTensor {
        dl_tensor,
        manager_ctx: Box::into_raw(context) as *mut c_void,
        deleter: Some(export_deleter),
    })
}

impl NDArray {
    /// Export this array as a DLPack managed tensor; see [`to_dlpack`]
    pub fn to_dlpack(&self) -> Box<DLManagedTensor> {
        to_dlpack(self)
    }
}
