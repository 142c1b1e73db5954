//! DLPack FFI definitions
//!
//! These structs match the DLPack C header exactly for ABI compatibility.
//! See: <https://github.com/dmlc/dlpack/blob/main/include/dlpack/dlpack.h>

use std::ffi::c_void;
use std::os::raw::c_int;

use crate::error::BridgeError;
use graphbridge_types::{DataType, DeviceContext};

/// DLPack device specification
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DLDevice {
    /// Device type (kDLCPU=1, kDLCUDA=2, etc.)
    pub device_type: i32,
    /// Device index
    pub device_id: i32,
}

impl From<DeviceContext> for DLDevice {
    fn from(ctx: DeviceContext) -> Self {
        let (device_type, device_id) = ctx.to_dlpack();
        Self {
            device_type,
            device_id,
        }
    }
}

impl TryFrom<DLDevice> for DeviceContext {
    type Error = BridgeError;

    fn try_from(dev: DLDevice) -> Result<Self, Self::Error> {
        DeviceContext::from_dlpack(dev.device_type, dev.device_id).ok_or_else(|| {
            BridgeError::UnsupportedDevice(format!("DLPack device type {}", dev.device_type))
        })
    }
}

/// DLPack data type specification
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DLDataType {
    /// Type category (0=int, 1=uint, 2=float, 3=handle, 4=bfloat, 5=complex, 6=bool)
    pub code: u8,
    /// Number of bits per lane
    pub bits: u8,
    /// Number of lanes
    pub lanes: u16,
}

impl From<DataType> for DLDataType {
    fn from(dtype: DataType) -> Self {
        Self {
            code: dtype.code,
            bits: dtype.bits,
            lanes: dtype.lanes,
        }
    }
}

impl From<DLDataType> for DataType {
    fn from(dtype: DLDataType) -> Self {
        DataType::new(dtype.code, dtype.bits, dtype.lanes)
    }
}

/// DLPack tensor structure
///
/// Core tensor metadata without ownership semantics.
#[repr(C)]
#[derive(Debug)]
pub struct DLTensor {
    /// Pointer to the data (device pointer for accelerators)
    pub data: *mut c_void,

    /// Device where data resides
    pub device: DLDevice,

    /// Number of dimensions
    pub ndim: c_int,

    /// Data type of elements
    pub dtype: DLDataType,

    /// Shape, `ndim` elements
    pub shape: *mut i64,

    /// Strides in elements, `ndim` elements; NULL for compact row-major
    pub strides: *mut i64,

    /// Byte offset from data pointer
    pub byte_offset: u64,
}

impl Default for DLTensor {
    fn default() -> Self {
        Self {
            data: std::ptr::null_mut(),
            device: DLDevice::default(),
            ndim: 0,
            dtype: DLDataType::default(),
            shape: std::ptr::null_mut(),
            strides: std::ptr::null_mut(),
            byte_offset: 0,
        }
    }
}

/// Deleter function type for DLManagedTensor
pub type DLManagedTensorDeleter = unsafe extern "C" fn(*mut DLManagedTensor);

/// DLPack managed tensor with ownership
///
/// The consumer calls `deleter` exactly once when done with the tensor.
#[repr(C)]
pub struct DLManagedTensor {
    /// The tensor metadata
    pub dl_tensor: DLTensor,

    /// Opaque pointer to the producer's context
    pub manager_ctx: *mut c_void,

    /// Frees the producer's resources and the DLManagedTensor itself
    pub deleter: Option<DLManagedTensorDeleter>,
}

impl Default for DLManagedTensor {
    fn default() -> Self {
        Self {
            dl_tensor: DLTensor::default(),
            manager_ctx: std::ptr::null_mut(),
            deleter: None,
        }
    }
}

// Safety: DLManagedTensor can be sent between threads if the underlying
// data is thread-safe (which it is for engine tensors).
unsafe impl Send for DLManagedTensor {}

#[cfg(test)]
mod tests {
    use super::*;
    use graphbridge_types::DeviceKind;
    use std::mem;

    #[test]
    fn test_dldevice_size() {
        assert_eq!(mem::size_of::<DLDevice>(), 8);
    }

    #[test]
    fn test_dldatatype_size() {
        assert_eq!(mem::size_of::<DLDataType>(), 4);
    }

    #[test]
    fn test_device_conversion() {
        let dev = DLDevice::from(DeviceContext::cuda(3));
        assert_eq!(dev.device_type, 2);
        assert_eq!(dev.device_id, 3);
        assert_eq!(DeviceContext::try_from(dev).unwrap(), DeviceContext::cuda(3));

        let metal = DLDevice {
            device_type: 8,
            device_id: 0,
        };
        assert_eq!(
            DeviceContext::try_from(metal).unwrap().kind,
            DeviceKind::Metal
        );

        let bogus = DLDevice {
            device_type: 42,
            device_id: 0,
        };
        assert!(matches!(
            DeviceContext::try_from(bogus),
            Err(BridgeError::UnsupportedDevice(_))
        ));
    }

    #[test]
    fn test_dtype_conversion() {
        let dl = DLDataType::from(DataType::I64);
        assert_eq!((dl.code, dl.bits, dl.lanes), (0, 64, 1));
        assert_eq!(DataType::from(dl), DataType::I64);
    }

    #[test]
    fn test_default_tensor_is_null() {
        let tensor = DLTensor::default();
        assert!(tensor.data.is_null());
        assert!(tensor.shape.is_null());
        assert_eq!(tensor.ndim, 0);
    }
}
