//! Reference-counted array handles
//!
//! [`NDArray`] is the engine-side array value that crosses the boundary. A
//! handle is a cheap `Arc` clone: cloning never copies the buffer, and the
//! storage is released when the last handle is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use graphbridge_core::array::NDArray;
//! use graphbridge_types::{DataType, DeviceContext};
//!
//! let mut ids = NDArray::empty(&[4], DataType::I64, DeviceContext::cpu())?;
//! ids.as_mut_slice::<i64>()?.copy_from_slice(&[7, 8, 9, 10]);
//!
//! // Clone shares storage
//! let alias = ids.clone();
//! assert!(alias.shares_storage(&ids));
//! ```

pub mod id_array;

use crate::config::BridgeConfig;
use crate::dlpack::ExternalTensor;
use crate::error::{BridgeError, BridgeResult};
use bytemuck::Pod;
use graphbridge_types::{DataType, DeviceContext};
use std::ffi::c_void;
use std::fmt;
use std::sync::Arc;

pub use id_array::{
    copy_to_id_array, id_array_to_vec, is_valid_id_array, try_copy_to_id_array, IdArrayConverter,
    IdElement,
};

/// Rust element types with a fixed array dtype
pub trait Element: Pod + Send + Sync + 'static {
    const DTYPE: DataType;
}

macro_rules! impl_element {
    ($($t:ty => $dtype:expr),* $(,)?) => {
        $(impl Element for $t {
            const DTYPE: DataType = $dtype;
        })*
    };
}

impl_element! {
    i8 => DataType::I8,
    i16 => DataType::I16,
    i32 => DataType::I32,
    i64 => DataType::I64,
    u8 => DataType::U8,
    u16 => DataType::U16,
    u32 => DataType::U32,
    u64 => DataType::U64,
    f32 => DataType::F32,
    f64 => DataType::F64,
}

/// Backing memory of an array
enum Storage {
    /// Host buffer owned by this crate, kept in u64 words for 8-byte alignment
    Host(Vec<u64>),
    /// Buffer owned by the producing engine, released through its DLPack deleter
    External(ExternalTensor),
}

struct ArrayContainer {
    storage: Storage,
    device: DeviceContext,
    dtype: DataType,
    shape: Vec<i64>,
    /// Strides in elements
    strides: Vec<i64>,
    nbytes: usize,
}

/// Reference-counted handle to a typed, shaped, device-resident buffer
#[derive(Clone)]
pub struct NDArray {
    inner: Arc<ArrayContainer>,
}

/// Number of elements, rejecting negative dims and overflow
///
/// Zero-sized dims are counted as 1 when bounding the extent, so stride and
/// contiguity arithmetic on an accepted shape never overflows `i64`.
pub(crate) fn checked_numel(shape: &[i64]) -> BridgeResult<usize> {
    let mut numel = 1usize;
    let mut extent = 1i64;
    for &dim in shape {
        let n = usize::try_from(dim)
            .map_err(|_| BridgeError::invalid_shape(shape, "negative dimension"))?;
        numel = numel
            .checked_mul(n)
            .ok_or_else(|| BridgeError::invalid_shape(shape, "element count overflows"))?;
        extent = extent
            .checked_mul(dim.max(1))
            .ok_or_else(|| BridgeError::invalid_shape(shape, "element count overflows int64"))?;
    }
    Ok(numel)
}

/// Row-major strides in elements
pub(crate) fn contiguous_strides(shape: &[i64]) -> Vec<i64> {
    let ndim = shape.len();
    if ndim == 0 {
        return vec![];
    }

    let mut strides = vec![1i64; ndim];
    for i in (0..ndim - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Zeroed word buffer able to hold `nbytes`, or `OutOfMemory`
fn alloc_host_words(nbytes: usize) -> BridgeResult<Vec<u64>> {
    let words = nbytes.div_ceil(std::mem::size_of::<u64>());
    let mut buf: Vec<u64> = Vec::new();
    buf.try_reserve_exact(words)
        .map_err(|_| BridgeError::OutOfMemory { bytes: nbytes })?;
    buf.resize(words, 0);
    Ok(buf)
}

impl NDArray {
    /// Allocate a zero-filled, contiguous array
    ///
    /// Only host memory is allocated here. Accelerator buffers belong to the
    /// engine's runtime and enter through [`NDArray::from_dlpack`].
    pub fn empty(shape: &[i64], dtype: DataType, device: DeviceContext) -> BridgeResult<Self> {
        if !device.is_cpu() {
            return Err(BridgeError::UnsupportedDevice(format!(
                "cannot allocate on {}: only host arrays are allocated by the bridge",
                device
            )));
        }
        if dtype.lanes == 0 || dtype.bits == 0 {
            return Err(BridgeError::UnsupportedDtype {
                code: dtype.code,
                bits: dtype.bits,
                lanes: dtype.lanes,
            });
        }

        let numel = checked_numel(shape)?;
        let nbytes = numel
            .checked_mul(dtype.size_bytes())
            .ok_or_else(|| BridgeError::invalid_shape(shape, "byte size overflows"))?;
        let words = alloc_host_words(nbytes)?;

        log::trace!("allocated {} array {:?} on {}", dtype, shape, device);
        Ok(Self::from_parts(
            Storage::Host(words),
            device,
            dtype,
            shape.to_vec(),
            contiguous_strides(shape),
            nbytes,
        ))
    }

    /// Allocate on the configured default device
    pub fn empty_default(
        shape: &[i64],
        dtype: DataType,
        config: &BridgeConfig,
    ) -> BridgeResult<Self> {
        Self::empty(shape, dtype, config.default_device)
    }

    /// Copy a host slice into a new array of the given shape
    pub fn from_slice<T: Element>(values: &[T], shape: &[i64]) -> BridgeResult<Self> {
        let numel = checked_numel(shape)?;
        if numel != values.len() {
            return Err(BridgeError::invalid_shape(
                shape,
                format!("shape holds {} elements, got {}", numel, values.len()),
            ));
        }
        let mut array = Self::empty(shape, T::DTYPE, DeviceContext::cpu())?;
        array.as_mut_slice::<T>()?.copy_from_slice(values);
        Ok(array)
    }

    fn from_parts(
        storage: Storage,
        device: DeviceContext,
        dtype: DataType,
        shape: Vec<i64>,
        strides: Vec<i64>,
        nbytes: usize,
    ) -> Self {
        Self {
            inner: Arc::new(ArrayContainer {
                storage,
                device,
                dtype,
                shape,
                strides,
                nbytes,
            }),
        }
    }

    /// Wrap an imported engine tensor
    pub(crate) fn from_external(
        external: ExternalTensor,
        device: DeviceContext,
        dtype: DataType,
        shape: Vec<i64>,
        strides: Vec<i64>,
        nbytes: usize,
    ) -> Self {
        Self::from_parts(
            Storage::External(external),
            device,
            dtype,
            shape,
            strides,
            nbytes,
        )
    }

    /// Device the data resides on
    #[inline]
    pub fn device(&self) -> DeviceContext {
        self.inner.device
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DataType {
        self.inner.dtype
    }

    /// Shape in elements
    #[inline]
    pub fn shape(&self) -> &[i64] {
        &self.inner.shape
    }

    /// Strides in elements
    #[inline]
    pub fn strides(&self) -> &[i64] {
        &self.inner.strides
    }

    /// Rank
    #[inline]
    pub fn ndim(&self) -> usize {
        self.inner.shape.len()
    }

    /// Total number of elements
    pub fn numel(&self) -> usize {
        self.inner
            .shape
            .iter()
            .fold(1usize, |acc, &d| acc.saturating_mul(d as usize))
    }

    /// Size of the data in bytes
    #[inline]
    pub fn nbytes(&self) -> usize {
        self.inner.nbytes
    }

    /// Check if the layout is row-major contiguous
    pub fn is_contiguous(&self) -> bool {
        let mut expected = 1i64;
        for (&dim, &stride) in self.shape().iter().zip(self.strides()).rev() {
            if dim != 1 && stride != expected {
                return false;
            }
            expected = match expected.checked_mul(dim) {
                Some(next) => next,
                None => return false,
            };
        }
        true
    }

    /// Raw pointer to the first element
    ///
    /// Device pointer for accelerator arrays; never dereferenced by the bridge.
    pub fn data_ptr(&self) -> *mut c_void {
        match &self.inner.storage {
            Storage::Host(words) => words.as_ptr() as *mut c_void,
            Storage::External(ext) => ext.data_ptr(),
        }
    }

    /// Number of live handles sharing this storage
    pub fn refcount(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether two handles refer to the same storage
    pub fn shares_storage(&self, other: &NDArray) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn check_typed_access<T: Element>(&self) -> BridgeResult<()> {
        if self.dtype() != T::DTYPE {
            return Err(BridgeError::DtypeMismatch {
                array: self.dtype(),
                requested: T::DTYPE,
            });
        }
        if !self.device().is_cpu() {
            return Err(BridgeError::UnsupportedDevice(format!(
                "host access to data on {}",
                self.device()
            )));
        }
        if !self.is_contiguous() {
            return Err(BridgeError::invalid_shape(
                self.shape(),
                "typed access requires a contiguous array",
            ));
        }
        Ok(())
    }

    /// View the data as a typed slice
    ///
    /// Requires a host-resident, contiguous array whose dtype is `T::DTYPE`.
    pub fn as_slice<T: Element>(&self) -> BridgeResult<&[T]> {
        self.check_typed_access::<T>()?;
        let len = self.numel();
        if len == 0 {
            return Ok(&[]);
        }
        match &self.inner.storage {
            Storage::Host(words) => {
                let bytes: &[u8] = bytemuck::cast_slice(words.as_slice());
                Ok(bytemuck::cast_slice(&bytes[..self.inner.nbytes]))
            }
            Storage::External(ext) => {
                let ptr = ext.data_ptr() as *const T;
                if ptr.is_null() || ptr.align_offset(std::mem::align_of::<T>()) != 0 {
                    return Err(BridgeError::invalid_argument(format!(
                        "external data pointer {:p} is null or misaligned for {}",
                        ptr,
                        T::DTYPE
                    )));
                }
                // SAFETY: the producer guarantees `len` contiguous host elements
                // at `ptr` for as long as its managed tensor is alive, and the
                // ExternalTensor in this container keeps it alive for `&self`.
                Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
            }
        }
    }

    /// Mutable typed view of the data
    ///
    /// Only possible while this is the sole handle to bridge-owned host
    /// storage; otherwise `SharedArray` is returned.
    pub fn as_mut_slice<T: Element>(&mut self) -> BridgeResult<&mut [T]> {
        self.check_typed_access::<T>()?;
        let refcount = Arc::strong_count(&self.inner);
        let inner = Arc::get_mut(&mut self.inner).ok_or(BridgeError::SharedArray { refcount })?;
        match &mut inner.storage {
            Storage::Host(words) => {
                let bytes: &mut [u8] = bytemuck::cast_slice_mut(words.as_mut_slice());
                Ok(bytemuck::cast_slice_mut(&mut bytes[..inner.nbytes]))
            }
            Storage::External(_) => Err(BridgeError::invalid_argument(
                "imported engine arrays are read-only",
            )),
        }
    }

    /// Copy the data out into a vector
    pub fn to_vec<T: Element>(&self) -> BridgeResult<Vec<T>> {
        Ok(self.as_slice::<T>()?.to_vec())
    }
}

impl fmt::Debug for NDArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NDArray")
            .field("shape", &self.shape())
            .field("dtype", &self.dtype().to_string())
            .field("device", &self.device().to_string())
            .field("refcount", &self.refcount())
            .finish()
    }
}
