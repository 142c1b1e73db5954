//! # graphbridge types - boundary types with no graphbridge dependencies
//!
//! This is a leaf crate providing the canonical definitions of:
//! - [`DeviceContext`] / [`DeviceKind`] - where an array resides
//! - [`DataType`] - element type (code, bits, lanes), Pod-safe
//! - [`BoolFlag`] - tri-state boolean passed across the host boundary
//!
//! `graphbridge_core` and any host binding depend on this crate for these
//! types.

pub mod device;
pub mod dtype;
pub mod flag;

pub use device::{device_equals, device_format, DeviceContext, DeviceKind};
pub use dtype::{type_code, DataType};
pub use flag::BoolFlag;
