//! DLPack import - take ownership of engine tensors
//!
//! Arrays produced by the engine arrive as DLPack managed tensors. Importing
//! one wraps it in an [`NDArray`] handle; the producer's deleter runs when
//! the last handle is dropped.

use std::ffi::c_void;

use super::ffi::DLManagedTensor;
use crate::array::{checked_numel, contiguous_strides, NDArray};
use crate::error::{BridgeError, BridgeResult};
use graphbridge_types::{DataType, DeviceContext};

/// Owner of an imported DLManagedTensor; calls the producer's deleter on drop
pub(crate) struct ExternalTensor {
    managed: *mut DLManagedTensor,
}

impl ExternalTensor {
    /// Address of the first element (`data + byte_offset`)
    pub(crate) fn data_ptr(&self) -> *mut c_void {
        // SAFETY: `managed` is non-null and stays valid until our Drop runs.
        let tensor = unsafe { &(*self.managed).dl_tensor };
        if tensor.data.is_null() {
            return std::ptr::null_mut();
        }
        (tensor.data as *mut u8).wrapping_add(tensor.byte_offset as usize) as *mut c_void
    }
}

impl Drop for ExternalTensor {
    fn drop(&mut self) {
        // SAFETY: `managed` was validated non-null on import and ownership was
        // transferred to us, so the deleter is called exactly once, here.
        unsafe {
            if let Some(deleter) = (*self.managed).deleter {
                deleter(self.managed);
            }
        }
    }
}

// Safety: DLPack producers must allow the managed tensor to be released from
// any thread; the bridge only reads the metadata.
unsafe impl Send for ExternalTensor {}
unsafe impl Sync for ExternalTensor {}

/// Import a DLPack managed tensor as an array handle, taking ownership
///
/// # Safety
///
/// `managed` must point to a valid DLManagedTensor whose shape (and strides,
/// if non-null) hold `ndim` elements. On success ownership moves into the
/// returned array and the caller must not call the deleter. On error
/// ownership stays with the caller.
pub unsafe fn from_dlpack(managed: *mut DLManagedTensor) -> BridgeResult<NDArray> {
    if managed.is_null() {
        return Err(BridgeError::NullPointer("DLManagedTensor"));
    }

    let tensor = &(*managed).dl_tensor;

    let ndim = usize::try_from(tensor.ndim).map_err(|_| {
        BridgeError::invalid_shape(&[], format!("negative ndim {}", tensor.ndim))
    })?;
    if ndim > 0 && tensor.shape.is_null() {
        return Err(BridgeError::NullPointer("DLTensor shape"));
    }

    let device = DeviceContext::try_from(tensor.device)?;
    let dtype = DataType::from(tensor.dtype);
    if dtype.bits == 0 || dtype.lanes == 0 {
        return Err(BridgeError::UnsupportedDtype {
            code: dtype.code,
            bits: dtype.bits,
            lanes: dtype.lanes,
        });
    }

    let shape: Vec<i64> = if ndim > 0 {
        std::slice::from_raw_parts(tensor.shape, ndim).to_vec()
    } else {
        vec![]
    };
    let numel = checked_numel(&shape)?;
    let nbytes = numel
        .checked_mul(dtype.size_bytes())
        .filter(|&bytes| isize::try_from(bytes).is_ok())
        .ok_or_else(|| BridgeError::invalid_shape(&shape, "byte size overflows"))?;

    if numel > 0 && tensor.data.is_null() {
        return Err(BridgeError::NullPointer("DLTensor data"));
    }

    let strides: Vec<i64> = if tensor.strides.is_null() {
        contiguous_strides(&shape)
    } else {
        std::slice::from_raw_parts(tensor.strides, ndim).to_vec()
    };

    if (*managed).deleter.is_none() {
        log::warn!(
            "imported DLPack tensor on {} has no deleter; its memory is not released by the bridge",
            device
        );
    }
    log::debug!("imported {} array {:?} on {} via DLPack", dtype, shape, device);

    Ok(NDArray::from_external(
        ExternalTensor { managed },
        device,
        dtype,
        shape,
        strides,
        nbytes,
    ))
}

impl NDArray {
    /// Import an engine tensor; see [`from_dlpack`]
    ///
    /// # Safety
    ///
    /// Same contract as [`from_dlpack`].
    pub unsafe fn from_dlpack(managed: *mut DLManagedTensor) -> BridgeResult<NDArray> {
        from_dlpack(managed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dlpack::ffi::{DLDataType, DLDevice, DLTensor};
    use crate::dlpack::to_dlpack;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dlpack_roundtrip_shares_buffer() {
        let array = NDArray::from_slice(&[1i64, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
        let managed = to_dlpack(&array);

        // SAFETY: managed comes from to_dlpack and ownership moves into imported.
        let imported = unsafe { NDArray::from_dlpack(Box::into_raw(managed)).unwrap() };

        assert_eq!(imported.shape(), &[2, 3]);
        assert_eq!(imported.strides(), &[3, 1]);
        assert_eq!(imported.dtype(), DataType::I64);
        assert_eq!(imported.device(), DeviceContext::cpu());
        assert_eq!(imported.nbytes(), 48);
        assert_eq!(imported.data_ptr(), array.data_ptr());
        assert_eq!(imported.to_vec::<i64>().unwrap(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(array.refcount(), 2);

        drop(imported);
        assert_eq!(array.refcount(), 1);
    }

    #[test]
    fn test_null_pointers_rejected() {
        // SAFETY: null is checked before any dereference.
        let err = unsafe { from_dlpack(std::ptr::null_mut()) }.unwrap_err();
        assert!(matches!(err, BridgeError::NullPointer(_)));

        let mut managed = DLManagedTensor {
            dl_tensor: DLTensor {
                device: DLDevice::from(DeviceContext::cpu()),
                ndim: 1,
                dtype: DLDataType::from(DataType::I64),
                ..Default::default()
            },
            ..Default::default()
        };
        // SAFETY: managed is a valid stack value; shape is null so nothing is read.
        let err = unsafe { from_dlpack(&mut managed) }.unwrap_err();
        assert!(matches!(err, BridgeError::NullPointer("DLTensor shape")));
    }

    #[test]
    fn test_unknown_device_rejected() {
        let mut shape = [4i64];
        let mut data = [0i64; 4];
        let mut managed = DLManagedTensor {
            dl_tensor: DLTensor {
                data: data.as_mut_ptr() as *mut c_void,
                device: DLDevice {
                    device_type: 99,
                    device_id: 0,
                },
                ndim: 1,
                dtype: DLDataType::from(DataType::I64),
                shape: shape.as_mut_ptr(),
                ..Default::default()
            },
            ..Default::default()
        };
        // SAFETY: managed and its shape/data outlive the call.
        let err = unsafe { from_dlpack(&mut managed) }.unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedDevice(_)));
    }

    fn import_host_u8(shape: &mut [i64]) -> BridgeResult<NDArray> {
        let mut data = [0u8; 8];
        let mut managed = DLManagedTensor {
            dl_tensor: DLTensor {
                data: data.as_mut_ptr() as *mut c_void,
                device: DLDevice::from(DeviceContext::cpu()),
                ndim: shape.len() as i32,
                dtype: DLDataType::from(DataType::U8),
                shape: shape.as_mut_ptr(),
                ..Default::default()
            },
            ..Default::default()
        };
        // SAFETY: managed, shape and data outlive the call; callers only
        // pass shapes that are rejected, so nothing keeps the pointer.
        unsafe { from_dlpack(&mut managed) }
    }

    #[test]
    fn test_shape_beyond_int64_rejected() {
        let err = import_host_u8(&mut [1 << 62, 3]).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidShape { .. }), "{err:?}");

        // A zero dim must not hide an overflowing extent
        let err = import_host_u8(&mut [0, 1 << 62, 1 << 62]).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidShape { .. }), "{err:?}");

        let err = import_host_u8(&mut [-1]).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidShape { .. }), "{err:?}");
    }

    #[test]
    fn test_empty_large_shape_is_usable() {
        let mut shape = [0i64, 1 << 40, 1 << 20];
        let mut data = [0u8; 1];
        let mut managed = DLManagedTensor {
            dl_tensor: DLTensor {
                data: data.as_mut_ptr() as *mut c_void,
                device: DLDevice::from(DeviceContext::cpu()),
                ndim: 3,
                dtype: DLDataType::from(DataType::U8),
                shape: shape.as_mut_ptr(),
                ..Default::default()
            },
            ..Default::default()
        };
        // SAFETY: managed, shape and data outlive the array, which has no
        // deleter and is dropped first.
        let array = unsafe { from_dlpack(&mut managed) }.unwrap();
        assert_eq!(array.numel(), 0);
        assert!(array.is_contiguous());
        assert!(array.as_slice::<u8>().unwrap().is_empty());
    }

    static FOREIGN_DELETES: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn foreign_deleter(managed: *mut DLManagedTensor) {
        FOREIGN_DELETES.fetch_add(1, Ordering::SeqCst);
        drop(Box::from_raw(managed));
    }

    #[test]
    fn test_deleter_runs_once_on_last_drop() {
        static SHAPE: [i64; 2] = [8, 2];
        let managed = Box::new(DLManagedTensor {
            dl_tensor: DLTensor {
                // Device memory is never dereferenced by the bridge
                data: 0x1000 as *mut c_void,
                device: DLDevice::from(DeviceContext::cuda(1)),
                ndim: 2,
                dtype: DLDataType::from(DataType::F32),
                shape: SHAPE.as_ptr() as *mut i64,
                ..Default::default()
            },
            deleter: Some(foreign_deleter),
            ..Default::default()
        });

        let before = FOREIGN_DELETES.load(Ordering::SeqCst);
        // SAFETY: managed is a valid boxed tensor; ownership moves into the array.
        let array = unsafe { from_dlpack(Box::into_raw(managed)).unwrap() };
        assert_eq!(array.device(), DeviceContext::cuda(1));
        assert_eq!(array.shape(), &[8, 2]);
        assert!(array.as_slice::<f32>().is_err());

        let alias = array.clone();
        drop(array);
        assert_eq!(FOREIGN_DELETES.load(Ordering::SeqCst), before);
        drop(alias);
        assert_eq!(FOREIGN_DELETES.load(Ordering::SeqCst), before + 1);
    }
}
