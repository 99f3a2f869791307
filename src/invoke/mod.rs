//! Dynamic invocation: values, kinds and checked calls.
//!
//! ## Contents
//! - [`Kind`] runtime classification compared by signature checks
//! - [`Value`] boxed argument/result representation (plus [`Opaque`] host objects)
//! - [`Handler`] callable with declared parameter/return kinds
//! - [`invoke`] call an arbitrary value with an argument list
//!
//! ## Call flow
//! ```text
//! invoke(callee, args)
//!   ├─► callee is Value::Func?          no ─► InvalidCallable
//!   ├─► args.len() == params.len()?     no ─► ArityMismatch
//!   ├─► kind(args[i]) == params[i]?     no ─► TypeMismatch
//!   ├─► body(args).await
//!   └─► kinds(out) == returns?          no ─► ReturnMismatch
//! ```

mod handler;
mod kind;
mod value;

pub use handler::{FromValue, Handler, HandlerFuture, IntoHandler, IntoValues};
pub use kind::Kind;
pub use value::{Opaque, Value, kinds_of};

use crate::error::InvokeError;

/// Calls `callee` with `args`, checking callability and both shapes.
///
/// The invoker itself has no side effects; the only effects are the callee's.
///
/// ## Example
/// ```rust
/// use taskgate::{Handler, Value, invoke};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let double = Value::from(Handler::func(|n: i64| n * 2));
///     let out = invoke(&double, vec![Value::from(21i64)]).await.unwrap();
///     assert_eq!(out, vec![Value::from(42i64)]);
///
///     let err = invoke(&Value::from("nope"), vec![]).await.unwrap_err();
///     assert_eq!(err.as_label(), "invoke_invalid_callable");
/// }
/// ```
pub async fn invoke(callee: &Value, args: Vec<Value>) -> Result<Vec<Value>, InvokeError> {
    let handler = callee
        .as_handler()
        .ok_or(InvokeError::InvalidCallable {
            kind: callee.kind(),
        })?;
    handler.invoke(args).await
}

/// Resolves a submitted callee into a handler and checks `args` against it.
///
/// Used at submission time so that rejected work is never enqueued.
pub(crate) fn prepare(callee: Value, args: &[Value]) -> Result<Handler, InvokeError> {
    let handler = callee
        .into_handler()
        .map_err(|kind| InvokeError::InvalidCallable { kind })?;
    handler.check_args(args)?;
    Ok(handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_callable_is_rejected() {
        let err = invoke(&Value::from(5i64), Vec::new()).await.unwrap_err();
        assert_eq!(err, InvokeError::InvalidCallable { kind: Kind::Int });
    }

    #[test]
    fn prepare_checks_shape() {
        let callee = Value::from(Handler::func(|s: String| s.len() as i64));
        let err = prepare(callee.clone(), &[Value::from(1i64)]).unwrap_err();
        assert_eq!(err.as_label(), "invoke_type_mismatch");
        assert!(prepare(callee, &[Value::from("abc")]).is_ok());
    }
}
