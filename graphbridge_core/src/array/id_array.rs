//! Identifier arrays
//!
//! Lists of graph/node/edge ids cross the boundary as host-resident, rank-1,
//! int64 arrays. This module validates such arrays and builds them from
//! native sequences.

use std::fmt::Display;

use super::NDArray;
use crate::config::{BridgeConfig, NarrowingPolicy};
use crate::error::{BridgeError, BridgeResult};
use graphbridge_types::{DataType, DeviceContext};

/// Numeric types convertible to an id (`i64`)
pub trait IdElement: Copy + Display {
    /// Plain `as` cast; wraps or truncates silently
    fn to_id(self) -> i64;

    /// Exact conversion, `None` if the value changes
    fn try_to_id(self) -> Option<i64>;
}

macro_rules! impl_id_element_int {
    ($($t:ty),*) => {
        $(impl IdElement for $t {
            #[inline]
            fn to_id(self) -> i64 {
                self as i64
            }

            #[inline]
            fn try_to_id(self) -> Option<i64> {
                i64::try_from(self).ok()
            }
        })*
    };
}

impl_id_element_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

// 2^63 is exactly representable in both float widths
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

macro_rules! impl_id_element_float {
    ($($t:ty),*) => {
        $(impl IdElement for $t {
            #[inline]
            fn to_id(self) -> i64 {
                self as i64
            }

            fn try_to_id(self) -> Option<i64> {
                let v = self as f64;
                if v.is_finite() && v.fract() == 0.0 && v >= -TWO_POW_63 && v < TWO_POW_63 {
                    Some(v as i64)
                } else {
                    None
                }
            }
        })*
    };
}

impl_id_element_float!(f32, f64);

impl IdElement for bool {
    #[inline]
    fn to_id(self) -> i64 {
        self as i64
    }

    #[inline]
    fn try_to_id(self) -> Option<i64> {
        Some(self as i64)
    }
}

/// Whether the array is a valid 1-D int64 host array
///
/// Advisory: nothing else in the bridge enforces it.
pub fn is_valid_id_array(array: &NDArray) -> bool {
    let dtype = array.dtype();
    array.device().is_cpu()
        && array.ndim() == 1
        && dtype.is_signed_int()
        && dtype.bits == 64
}

fn alloc_id_array(len: usize) -> BridgeResult<NDArray> {
    let len = i64::try_from(len)
        .map_err(|_| BridgeError::invalid_argument(format!("{} ids exceed int64 length", len)))?;
    NDArray::empty(&[len], DataType::I64, DeviceContext::cpu())
}

/// Copy a sequence into a new int64 id array
///
/// Elements are cast with `as`: values outside the int64 range wrap (integers)
/// or saturate (floats) without error. An empty input yields a zero-length
/// array.
pub fn copy_to_id_array<T: IdElement>(values: &[T]) -> BridgeResult<NDArray> {
    let mut array = alloc_id_array(values.len())?;
    let out = array.as_mut_slice::<i64>()?;
    for (dst, &src) in out.iter_mut().zip(values) {
        *dst = src.to_id();
    }
    log::trace!("copied {} values into id array", values.len());
    Ok(array)
}

/// Like [`copy_to_id_array`], but rejects values that do not fit exactly
pub fn try_copy_to_id_array<T: IdElement>(values: &[T]) -> BridgeResult<NDArray> {
    let mut array = alloc_id_array(values.len())?;
    let out = array.as_mut_slice::<i64>()?;
    for (index, (dst, &src)) in out.iter_mut().zip(values).enumerate() {
        *dst = src.try_to_id().ok_or_else(|| {
            log::warn!("id conversion rejected {} at index {}", src, index);
            BridgeError::Narrowing {
                index,
                value: src.to_string(),
            }
        })?;
    }
    Ok(array)
}

/// Read an id array back into a vector
pub fn id_array_to_vec(array: &NDArray) -> BridgeResult<Vec<i64>> {
    if !is_valid_id_array(array) {
        return Err(BridgeError::InvalidIdArray(format!(
            "expected cpu rank-1 int64, got {} rank-{} {}",
            array.device(),
            array.ndim(),
            array.dtype()
        )));
    }
    array.to_vec::<i64>()
}

/// Id-array conversion governed by a [`BridgeConfig`]
#[derive(Debug, Clone, Default)]
pub struct IdArrayConverter {
    config: BridgeConfig,
}

impl IdArrayConverter {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Convert according to the configured length limit and narrowing policy
    pub fn convert<T: IdElement>(&self, values: &[T]) -> BridgeResult<NDArray> {
        if let Some(max) = self.config.max_id_array_len {
            if values.len() > max {
                return Err(BridgeError::invalid_argument(format!(
                    "{} ids exceed the configured maximum of {}",
                    values.len(),
                    max
                )));
            }
        }
        match self.config.narrowing {
            NarrowingPolicy::Unchecked => copy_to_id_array(values),
            NarrowingPolicy::Checked => try_copy_to_id_array(values),
        }
    }
}
