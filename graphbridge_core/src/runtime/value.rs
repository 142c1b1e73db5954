//! Dynamically-typed values passed through the dispatch mechanism

use std::fmt;

use super::packed_func::PackedFunc;
use crate::array::NDArray;
use crate::error::{BridgeError, BridgeResult};
use graphbridge_types::{DataType, DeviceContext};

/// Type tag of a [`Value`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Null,
    Int,
    Float,
    Bool,
    Str,
    Device,
    DataType,
    NDArray,
    NDArrayList,
    Func,
}

impl TypeCode {
    pub const fn name(self) -> &'static str {
        match self {
            TypeCode::Null => "Null",
            TypeCode::Int => "Int",
            TypeCode::Float => "Float",
            TypeCode::Bool => "Bool",
            TypeCode::Str => "Str",
            TypeCode::Device => "Device",
            TypeCode::DataType => "DataType",
            TypeCode::NDArray => "NDArray",
            TypeCode::NDArrayList => "NDArrayList",
            TypeCode::Func => "Func",
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Argument or return value of a packed function call
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Device(DeviceContext),
    DataType(DataType),
    /// Single array handle
    Array(NDArray),
    /// Ordered array handles
    ArrayList(Vec<NDArray>),
    Func(PackedFunc),
}

impl Value {
    pub fn type_code(&self) -> TypeCode {
        match self {
            Value::Null => TypeCode::Null,
            Value::Int(_) => TypeCode::Int,
            Value::Float(_) => TypeCode::Float,
            Value::Bool(_) => TypeCode::Bool,
            Value::Str(_) => TypeCode::Str,
            Value::Device(_) => TypeCode::Device,
            Value::DataType(_) => TypeCode::DataType,
            Value::Array(_) => TypeCode::NDArray,
            Value::ArrayList(_) => TypeCode::NDArrayList,
            Value::Func(_) => TypeCode::Func,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn mismatch(&self, expected: TypeCode) -> BridgeError {
        BridgeError::type_mismatch(expected.name(), self.type_code().name())
    }

    /// Unpack the array handles a value carries, in order
    ///
    /// A function is called with no arguments and its result unpacked.
    pub fn into_arrays(self) -> BridgeResult<Vec<NDArray>> {
        match self {
            Value::ArrayList(arrays) => Ok(arrays),
            Value::Array(array) => Ok(vec![array]),
            Value::Func(func) => func.call(&[])?.into_arrays(),
            other => Err(other.mismatch(TypeCode::NDArrayList)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Device(ctx) => write!(f, "{}", ctx),
            Value::DataType(dtype) => write!(f, "{}", dtype),
            Value::Array(array) => write!(f, "NDArray({:?}, {})", array.shape(), array.dtype()),
            Value::ArrayList(arrays) => write!(f, "NDArrayList(len={})", arrays.len()),
            Value::Func(_) => write!(f, "PackedFunc"),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v.into())
            }
        })*
    };
}

impl_from_for_value! {
    i64 => Int,
    i32 => Int,
    u32 => Int,
    f64 => Float,
    bool => Bool,
    String => Str,
    &str => Str,
    DeviceContext => Device,
    DataType => DataType,
    NDArray => Array,
    Vec<NDArray> => ArrayList,
    PackedFunc => Func,
}

impl TryFrom<&Value> for i64 {
    type Error = BridgeError;
    fn try_from(v: &Value) -> BridgeResult<Self> {
        match v {
            Value::Int(i) => Ok(*i),
            other => Err(other.mismatch(TypeCode::Int)),
        }
    }
}

impl TryFrom<&Value> for f64 {
    type Error = BridgeError;
    fn try_from(v: &Value) -> BridgeResult<Self> {
        match v {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            other => Err(other.mismatch(TypeCode::Float)),
        }
    }
}

impl TryFrom<&Value> for bool {
    type Error = BridgeError;
    fn try_from(v: &Value) -> BridgeResult<Self> {
        match v {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch(TypeCode::Bool)),
        }
    }
}

impl TryFrom<&Value> for String {
    type Error = BridgeError;
    fn try_from(v: &Value) -> BridgeResult<Self> {
        match v {
            Value::Str(s) => Ok(s.clone()),
            other => Err(other.mismatch(TypeCode::Str)),
        }
    }
}

impl TryFrom<&Value> for DeviceContext {
    type Error = BridgeError;
    fn try_from(v: &Value) -> BridgeResult<Self> {
        match v {
            Value::Device(ctx) => Ok(*ctx),
            other => Err(other.mismatch(TypeCode::Device)),
        }
    }
}

impl TryFrom<&Value> for DataType {
    type Error = BridgeError;
    fn try_from(v: &Value) -> BridgeResult<Self> {
        match v {
            Value::DataType(dtype) => Ok(*dtype),
            other => Err(other.mismatch(TypeCode::DataType)),
        }
    }
}

impl TryFrom<&Value> for NDArray {
    type Error = BridgeError;
    fn try_from(v: &Value) -> BridgeResult<Self> {
        match v {
            Value::Array(array) => Ok(array.clone()),
            other => Err(other.mismatch(TypeCode::NDArray)),
        }
    }
}
