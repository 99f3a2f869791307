//! # Callable abstraction with a declared signature.
//!
//! A [`Handler`] bundles an async body with the [`Kind`]s of its parameters
//! and results. The engine never calls a body blindly: every call goes through
//! [`Handler::invoke`], which checks the argument shape first and the produced
//! shape afterwards.
//!
//! Handlers are built either from plain closures (typed parameters, checked
//! through [`FromValue`] / [`IntoValues`]) or from async bodies over raw
//! value lists:
//!
//! ```text
//! Handler::func(|n: i64| format!("item-{n}"))        params=[int]  returns=[str]
//! Handler::from_async([Kind::Str], [], |args| async { .. ; vec![] })
//! ```
//!
//! ## Rules
//! - Cloning a handler shares the same body (`Arc`).
//! - Plain closures run inline on the calling task; put blocking or
//!   long-running work behind [`Handler::from_async`].

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::kind::Kind;
use super::value::{Opaque, Value, kinds_of};
use crate::error::InvokeError;

/// Future returned by a handler body.
pub type HandlerFuture = BoxFuture<'static, Result<Vec<Value>, InvokeError>>;

type Body = dyn Fn(Vec<Value>) -> HandlerFuture + Send + Sync;

/// A callable value with declared parameter and return kinds.
#[derive(Clone)]
pub struct Handler {
    name: Cow<'static, str>,
    params: Arc<[Kind]>,
    returns: Arc<[Kind]>,
    body: Arc<Body>,
}

impl Handler {
    /// Builds a handler from a plain closure with typed parameters.
    ///
    /// ## Example
    /// ```rust
    /// use taskgate::{Handler, Kind};
    ///
    /// let h = Handler::func(|s: String, n: i64| (s.len() as i64 + n,));
    /// assert_eq!(h.params(), &[Kind::Str, Kind::Int]);
    /// assert_eq!(h.returns(), &[Kind::Int]);
    /// ```
    pub fn func<F, Args>(f: F) -> Self
    where
        F: IntoHandler<Args>,
    {
        f.into_handler()
    }

    /// Builds a handler from an async body over raw values.
    ///
    /// The body only ever sees argument lists that already match `params`.
    pub fn from_async<F, Fut>(
        params: impl Into<Vec<Kind>>,
        returns: impl Into<Vec<Kind>>,
        f: F,
    ) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<Value>> + Send + 'static,
    {
        Self::from_parts(params.into(), returns.into(), move |args| {
            f(args).map(Ok::<_, InvokeError>).boxed()
        })
    }

    pub(crate) fn from_parts<B>(params: Vec<Kind>, returns: Vec<Kind>, body: B) -> Self
    where
        B: Fn(Vec<Value>) -> HandlerFuture + Send + Sync + 'static,
    {
        Self {
            name: Cow::Borrowed("anonymous"),
            params: params.into(),
            returns: returns.into(),
            body: Arc::new(body),
        }
    }

    /// Returns the handler with a label used in logs and events.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter kinds.
    pub fn params(&self) -> &[Kind] {
        &self.params
    }

    /// Declared return kinds.
    pub fn returns(&self) -> &[Kind] {
        &self.returns
    }

    /// Declared parameter count.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Checks `args` against the declared parameters without running the body.
    pub fn check_args(&self, args: &[Value]) -> Result<(), InvokeError> {
        if args.len() != self.params.len() {
            return Err(InvokeError::ArityMismatch {
                expected: self.params.len(),
                actual: args.len(),
            });
        }
        for (index, (expected, arg)) in self.params.iter().zip(args).enumerate() {
            let actual = arg.kind();
            if *expected != actual {
                return Err(InvokeError::TypeMismatch {
                    index,
                    expected: *expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Checks the arguments, runs the body and checks the produced values.
    pub async fn invoke(&self, args: Vec<Value>) -> Result<Vec<Value>, InvokeError> {
        self.check_args(&args)?;
        let out = (self.body)(args).await?;

        let produced = kinds_of(&out);
        if produced.as_slice() != &*self.returns {
            return Err(InvokeError::ReturnMismatch {
                expected: self.returns.to_vec(),
                actual: produced,
            });
        }
        Ok(out)
    }

    /// True if both handles share the same body.
    pub fn same(&self, other: &Handler) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.body), Arc::as_ptr(&other.body))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish()
    }
}

/// A Rust type that can be taken out of a [`Value`] of a fixed kind.
pub trait FromValue: Sized + Send + 'static {
    /// Kind this type is declared as in a signature.
    const KIND: Kind;

    /// Extracts the value, or `None` if the kind does not match.
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! impl_from_value {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                const KIND: Kind = Kind::$kind;

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$kind(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_from_value! {
    bool => Bool,
    i64 => Int,
    f64 => Float,
    String => Str,
    Vec<u8> => Bytes,
    Vec<Value> => List,
    BTreeMap<String, Value> => Map,
    Handler => Func,
    Opaque => Opaque,
}

impl FromValue for i32 {
    const KIND: Kind = Kind::Int;

    fn from_value(value: Value) -> Option<Self> {
        value.as_int().and_then(|n| i32::try_from(n).ok())
    }
}

impl FromValue for u32 {
    const KIND: Kind = Kind::Int;

    fn from_value(value: Value) -> Option<Self> {
        value.as_int().and_then(|n| u32::try_from(n).ok())
    }
}

/// What a plain closure may return: nothing, one value, or a tuple of values.
pub trait IntoValues: Send + 'static {
    /// Declared return kinds.
    fn kinds() -> Vec<Kind>;

    /// Boxes the returned values in declared order.
    fn into_values(self) -> Vec<Value>;
}

impl IntoValues for () {
    fn kinds() -> Vec<Kind> {
        Vec::new()
    }

    fn into_values(self) -> Vec<Value> {
        Vec::new()
    }
}

macro_rules! impl_into_values_single {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoValues for $ty {
                fn kinds() -> Vec<Kind> {
                    vec![<$ty as FromValue>::KIND]
                }

                fn into_values(self) -> Vec<Value> {
                    vec![Value::from(self)]
                }
            }
        )*
    };
}

impl_into_values_single!(
    bool,
    i64,
    i32,
    u32,
    f64,
    String,
    Vec<u8>,
    Vec<Value>,
    BTreeMap<String, Value>,
    Handler,
    Opaque,
);

macro_rules! impl_into_values_tuple {
    ($($ty:ident),+) => {
        #[allow(non_snake_case)]
        impl<$($ty),+> IntoValues for ($($ty,)+)
        where
            $($ty: FromValue + Into<Value>),+
        {
            fn kinds() -> Vec<Kind> {
                vec![$(<$ty as FromValue>::KIND),+]
            }

            fn into_values(self) -> Vec<Value> {
                let ($($ty,)+) = self;
                vec![$($ty.into()),+]
            }
        }
    };
}

impl_into_values_tuple!(A);
impl_into_values_tuple!(A, B);
impl_into_values_tuple!(A, B, C);
impl_into_values_tuple!(A, B, C, D);

/// Closures convertible into a [`Handler`]; `Args` is the parameter tuple.
pub trait IntoHandler<Args>: Send + Sync + 'static {
    fn into_handler(self) -> Handler;
}

macro_rules! impl_into_handler {
    ($($arg:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
        impl<F, R, $($arg,)*> IntoHandler<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: IntoValues,
            $($arg: FromValue,)*
        {
            fn into_handler(self) -> Handler {
                let params: Vec<Kind> = vec![$(<$arg as FromValue>::KIND),*];
                let arity = params.len();

                Handler::from_parts(params, R::kinds(), move |args: Vec<Value>| -> HandlerFuture {
                    let call = || -> Result<Vec<Value>, InvokeError> {
                        let mut args = args.into_iter();
                        let mut index = 0usize;
                        $(
                            let value = args
                                .next()
                                .ok_or(InvokeError::ArityMismatch { expected: arity, actual: index })?;
                            let actual = value.kind();
                            let $arg = <$arg as FromValue>::from_value(value).ok_or(
                                InvokeError::TypeMismatch {
                                    index,
                                    expected: <$arg as FromValue>::KIND,
                                    actual,
                                },
                            )?;
                            index += 1;
                        )*
                        Ok((self)($($arg),*).into_values())
                    };
                    futures::future::ready(call()).boxed()
                })
            }
        }
    };
}

impl_into_handler!();
impl_into_handler!(A);
impl_into_handler!(A, B);
impl_into_handler!(A, B, C);
impl_into_handler!(A, B, C, D);
impl_into_handler!(A, B, C, D, E);
impl_into_handler!(A, B, C, D, E, G);

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn typed_closure_round_trip() {
        let h = Handler::func(|n: i64| format!("2222-{n}"));
        assert_eq!(h.params(), &[Kind::Int]);
        assert_eq!(h.returns(), &[Kind::Str]);

        let out = h.invoke(vec![Value::from(7i64)]).await.unwrap();
        assert_eq!(out, vec![Value::from("2222-7")]);
    }

    #[tokio::test]
    async fn arity_is_checked_before_running() {
        let h = Handler::func(|a: i64, b: i64| a + b);
        let err = h.invoke(vec![Value::from(1i64)]).await.unwrap_err();
        assert_eq!(
            err,
            InvokeError::ArityMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[tokio::test]
    async fn kinds_are_checked_per_position() {
        let h = Handler::func(|s: String, n: i64| (s, n));
        let err = h
            .invoke(vec![Value::from("x"), Value::from("y")])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            InvokeError::TypeMismatch {
                index: 1,
                expected: Kind::Int,
                actual: Kind::Str
            }
        );
    }

    #[tokio::test]
    async fn async_body_must_honour_declared_returns() {
        let h = Handler::from_async(Vec::<Kind>::new(), [Kind::Int], |_args| async {
            vec![Value::from("not an int")]
        });
        let err = h.invoke(Vec::new()).await.unwrap_err();
        assert_eq!(err.as_label(), "invoke_return_mismatch");
    }

    #[tokio::test]
    async fn unit_and_tuple_returns() {
        let unit = Handler::func(|| ());
        assert!(unit.returns().is_empty());
        assert!(unit.invoke(Vec::new()).await.unwrap().is_empty());

        let pair = Handler::func(|| (String::from("x"), String::from("y")));
        assert_eq!(
            pair.invoke(Vec::new()).await.unwrap(),
            vec![Value::from("x"), Value::from("y")]
        );
    }

    #[test]
    fn clones_share_identity() {
        let h = Handler::func(|| true).named("flag");
        let other = Handler::func(|| true);
        assert!(h.same(&h.clone()));
        assert!(!h.same(&other));
        assert_eq!(h.name(), "flag");
    }
}
