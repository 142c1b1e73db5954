//! # graphbridge core
//!
//! Marshalling layer between a graph engine's typed arrays and a
//! dynamically-typed host runtime.
//!
//! - **Arrays**: reference-counted [`NDArray`] handles and int64 identifier arrays
//! - **Runtime**: [`Value`]s and [`PackedFunc`]s the host dispatches on
//! - **C boundary**: [`VectorWrapper`] for returning sequences of engine objects
//! - **DLPack**: zero-copy array exchange with the engine
//!
//! ## Quick Start
//!
//! ```rust
//! use graphbridge_core::{copy_to_id_array, is_valid_id_array, to_callable};
//!
//! let src = copy_to_id_array(&[0u32, 2, 4]).unwrap();
//! let dst = copy_to_id_array(&[1u32, 3, 5]).unwrap();
//! assert!(is_valid_id_array(&src));
//!
//! let value = to_callable(vec![src, dst]);
//! let arrays = value.into_arrays().unwrap();
//! assert_eq!(arrays.len(), 2);
//! ```

pub mod array;
pub mod capi;
pub mod config;
pub mod dlpack;
pub mod error;
pub mod runtime;

pub use array::{
    copy_to_id_array, id_array_to_vec, is_valid_id_array, try_copy_to_id_array, Element,
    IdArrayConverter, IdElement, NDArray,
};
pub use capi::{wrap_vector_return, CommunicatorHandle, GraphHandle, VectorWrapper};
pub use config::{BridgeConfig, NarrowingPolicy};
pub use error::{BridgeError, BridgeResult};
pub use runtime::{to_callable, PackedFunc, TypeCode, Value};

// Boundary types live in the leaf crate
pub use graphbridge_types::{
    device_equals, device_format, type_code, BoolFlag, DataType, DeviceContext, DeviceKind,
};

// Re-export bytemuck for consistent Pod usage in host bindings
pub use bytemuck;
