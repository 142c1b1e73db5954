//! Dynamically-typed values and packed functions
//!
//! The host runtime dispatches on [`Value`]s. Arrays produced by the engine
//! reach it as a single callable built by [`to_callable`].

mod convert;
mod packed_func;
mod value;

pub use convert::to_callable;
pub use packed_func::PackedFunc;
pub use value::{TypeCode, Value};
