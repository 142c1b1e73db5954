//! DLPack tensor exchange
//!
//! The engine and the host runtime exchange arrays as DLPack managed
//! tensors. Export lends a handle to a consumer; import takes ownership of a
//! producer's tensor.
//!
//! - `DLTensor`: core tensor metadata (data ptr, shape, strides, dtype, device)
//! - `DLManagedTensor`: owned tensor with deleter callback
//! - `DLDevice`: device type and index
//! - `DLDataType`: element type (int/uint/float, bits, lanes)

mod export;
mod ffi;
mod import;

pub use export::to_dlpack;
pub use ffi::{DLDataType, DLDevice, DLManagedTensor, DLManagedTensorDeleter, DLTensor};
pub use import::from_dlpack;

pub(crate) use import::ExternalTensor;
