//! C boundary: opaque handles and wrapped return vectors

mod ffi;
mod vector_wrapper;

pub use ffi::{
    gb_vector_wrapper_free, gb_vector_wrapper_get, gb_vector_wrapper_size, CommunicatorHandle,
    GraphHandle, VectorWrapperHandle,
};
pub use vector_wrapper::{wrap_vector_return, VectorWrapper};
