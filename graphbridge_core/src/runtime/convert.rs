//! Adapting array sequences into callable values

use std::mem::size_of;

use super::packed_func::PackedFunc;
use super::value::{TypeCode, Value};
use crate::array::NDArray;
use crate::error::{BridgeError, BridgeResult};

/// Fresh list of handle clones, or `OutOfMemory`
fn clone_handles(arrays: &[NDArray]) -> BridgeResult<Vec<NDArray>> {
    let mut out = Vec::new();
    out.try_reserve_exact(arrays.len())
        .map_err(|_| BridgeError::OutOfMemory {
            bytes: arrays.len().saturating_mul(size_of::<NDArray>()),
        })?;
    out.extend(arrays.iter().cloned());
    Ok(out)
}

/// Package a sequence of arrays as a callable value
///
/// The returned function shares the handles; no buffers are copied.
/// Called with no arguments it yields every handle in order as
/// [`Value::ArrayList`]; called with one integer `i` it yields
/// [`Value::Array`] of the `i`-th handle.
///
/// The handle vector is moved in as is. Listing the handles allocates a new
/// vector per call; failure there is reported as `OutOfMemory` by the call.
pub fn to_callable(arrays: Vec<NDArray>) -> Value {
    log::debug!("adapting {} arrays into a callable", arrays.len());

    Value::Func(PackedFunc::new(move |args| match args {
        [] => clone_handles(&arrays).map(Value::ArrayList),
        [Value::Int(which)] => {
            let len = arrays.len();
            usize::try_from(*which)
                .ok()
                .and_then(|i| arrays.get(i))
                .map(|array| Value::Array(array.clone()))
                .ok_or(BridgeError::IndexOutOfRange {
                    // Negative indices report as past the end
                    index: usize::try_from(*which).unwrap_or(usize::MAX),
                    len,
                })
        }
        [other] => Err(BridgeError::type_mismatch(
            TypeCode::Int.name(),
            other.type_code().name(),
        )),
        _ => Err(BridgeError::invalid_argument(format!(
            "array list takes at most one index, got {} arguments",
            args.len()
        ))),
    }))
}
