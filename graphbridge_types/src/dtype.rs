//! Array element types with DLPack layout
//!
//! [`DataType`] mirrors DLPack's `DLDataType`: a type code, a bit width and a
//! lane count, packed into 4 bytes.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// DLPack type codes
pub mod type_code {
    /// Signed integer
    pub const INT: u8 = 0;
    /// Unsigned integer
    pub const UINT: u8 = 1;
    /// IEEE float
    pub const FLOAT: u8 = 2;
    /// Opaque handle
    pub const OPAQUE_HANDLE: u8 = 3;
    /// Brain float
    pub const BFLOAT: u8 = 4;
    /// Complex float
    pub const COMPLEX: u8 = 5;
    /// Boolean
    pub const BOOL: u8 = 6;
}

/// Element type of an array
///
/// `lanes > 1` describes vectorized element types (e.g. `float32x4`).
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct DataType {
    /// Type category, one of [`type_code`]
    pub code: u8,
    /// Bits per lane
    pub bits: u8,
    /// Number of lanes
    pub lanes: u16,
}

impl DataType {
    /// Create a data type
    #[inline]
    pub const fn new(code: u8, bits: u8, lanes: u16) -> Self {
        Self { code, bits, lanes }
    }

    pub const I8: Self = Self::new(type_code::INT, 8, 1);
    pub const I16: Self = Self::new(type_code::INT, 16, 1);
    pub const I32: Self = Self::new(type_code::INT, 32, 1);
    pub const I64: Self = Self::new(type_code::INT, 64, 1);
    pub const U8: Self = Self::new(type_code::UINT, 8, 1);
    pub const U16: Self = Self::new(type_code::UINT, 16, 1);
    pub const U32: Self = Self::new(type_code::UINT, 32, 1);
    pub const U64: Self = Self::new(type_code::UINT, 64, 1);
    pub const F16: Self = Self::new(type_code::FLOAT, 16, 1);
    pub const F32: Self = Self::new(type_code::FLOAT, 32, 1);
    pub const F64: Self = Self::new(type_code::FLOAT, 64, 1);
    pub const BF16: Self = Self::new(type_code::BFLOAT, 16, 1);
    pub const BOOL: Self = Self::new(type_code::BOOL, 8, 1);

    /// Size of one element in bytes, rounded up to whole bytes
    #[inline]
    pub const fn size_bytes(&self) -> usize {
        (self.bits as usize * self.lanes as usize).div_ceil(8)
    }

    /// Check if this is a signed integer type
    #[inline]
    pub const fn is_signed_int(&self) -> bool {
        self.code == type_code::INT
    }

    /// Check if this is a floating point type
    #[inline]
    pub const fn is_float(&self) -> bool {
        self.code == type_code::FLOAT || self.code == type_code::BFLOAT
    }

    /// Parse from a dtype name (e.g. "int64", "i64", "float32", "int32x4")
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        let (base, lanes) = match s.split_once('x') {
            Some((base, lanes)) => (base.to_string(), lanes.parse::<u16>().ok()?),
            None => (s, 1),
        };
        let scalar = match base.as_str() {
            "int8" | "i8" => Self::I8,
            "int16" | "i16" => Self::I16,
            "int32" | "i32" | "int" => Self::I32,
            "int64" | "i64" | "long" => Self::I64,
            "uint8" | "u8" | "byte" => Self::U8,
            "uint16" | "u16" => Self::U16,
            "uint32" | "u32" => Self::U32,
            "uint64" | "u64" => Self::U64,
            "float16" | "f16" | "half" => Self::F16,
            "float32" | "f32" | "float" => Self::F32,
            "float64" | "f64" | "double" => Self::F64,
            "bfloat16" | "bf16" => Self::BF16,
            "bool" => Self::BOOL,
            _ => return None,
        };
        if lanes == 0 {
            return None;
        }
        Some(Self { lanes, ..scalar })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::BOOL {
            return f.write_str("bool");
        }
        let prefix = match self.code {
            type_code::INT => "int",
            type_code::UINT => "uint",
            type_code::FLOAT => "float",
            type_code::OPAQUE_HANDLE => "handle",
            type_code::BFLOAT => "bfloat",
            type_code::COMPLEX => "complex",
            type_code::BOOL => "bool",
            _ => "unknown",
        };
        write!(f, "{}{}", prefix, self.bits)?;
        if self.lanes != 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}
