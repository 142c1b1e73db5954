use std::fmt;
use std::sync::Arc;

use super::value::Value;
use crate::error::BridgeResult;

type PackedFn = dyn Fn(&[Value]) -> BridgeResult<Value> + Send + Sync;

/// Type-erased function callable from the host runtime
///
/// Clones share the underlying closure.
#[derive(Clone)]
pub struct PackedFunc {
    inner: Arc<PackedFn>,
}

impl PackedFunc {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> BridgeResult<Value> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Invoke with positional arguments
    pub fn call(&self, args: &[Value]) -> BridgeResult<Value> {
        (self.inner)(args)
    }

    /// Whether both handles share one closure
    pub fn ptr_eq(&self, other: &PackedFunc) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for PackedFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedFunc")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    #[test]
    fn test_call_and_clone_share_closure() {
        let add = PackedFunc::new(|args| {
            let mut sum = 0i64;
            for arg in args {
                sum += i64::try_from(arg)?;
            }
            Ok(Value::Int(sum))
        });
        let alias = add.clone();
        assert!(add.ptr_eq(&alias));

        let out = alias.call(&[Value::from(2i64), Value::from(40i64)]).unwrap();
        assert!(matches!(out, Value::Int(42)));

        let err = add.call(&[Value::from("x")]).unwrap_err();
        assert!(matches!(err, BridgeError::TypeMismatch { .. }));
    }

    #[test]
    fn test_func_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PackedFunc>();
        assert_send_sync::<Value>();
    }
}
