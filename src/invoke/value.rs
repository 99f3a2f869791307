//! # Generic value representation.
//!
//! [`Value`] is the boxed form every argument and result travels in. Plain
//! Rust types convert into it with `From`, and back out with
//! [`FromValue`](crate::FromValue).
//!
//! ## Example
//! ```rust
//! use taskgate::{Kind, Value};
//!
//! let v = Value::from("hello");
//! assert_eq!(v.kind(), Kind::Str);
//! assert_eq!(v.as_str(), Some("hello"));
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{handler::Handler, kind::Kind};

/// A host object carried through the engine without inspection.
///
/// Cloning shares the same underlying object.
#[derive(Clone)]
pub struct Opaque(Arc<dyn Any + Send + Sync>);

impl Opaque {
    /// Wraps a host object.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Wraps an already shared host object.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self(value)
    }

    /// Borrows the wrapped object as `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// True if both handles point at the same object.
    pub fn same(&self, other: &Opaque) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Opaque(..)")
    }
}

/// A dynamically typed argument or result.
#[derive(Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Error(Arc<str>),
    Func(Handler),
    Opaque(Opaque),
}

impl Value {
    /// Returns the runtime kind of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Str(_) => Kind::Str,
            Value::Bytes(_) => Kind::Bytes,
            Value::List(_) => Kind::List,
            Value::Map(_) => Kind::Map,
            Value::Error(_) => Kind::Error,
            Value::Func(_) => Kind::Func,
            Value::Opaque(_) => Kind::Opaque,
        }
    }

    /// Builds an error value.
    pub fn error(message: impl Into<Arc<str>>) -> Self {
        Value::Error(message.into())
    }

    /// Builds an opaque value around a host object.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Opaque::new(value))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the handler if this value is callable.
    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Value::Func(h) => Some(h),
            _ => None,
        }
    }

    /// Converts into a handler, or returns the kind of the non-callable value.
    pub fn into_handler(self) -> Result<Handler, Kind> {
        match self {
            Value::Func(h) => Ok(h),
            other => Err(other.kind()),
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Func(_))
    }
}

/// Kinds of a value slice, in order.
pub fn kinds_of(values: &[Value]) -> Vec<Kind> {
    values.iter().map(Value::kind).collect()
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "bytes[{}]", b.len()),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(map) => f.debug_map().entries(map).finish(),
            Value::Error(e) => write!(f, "error({e:?})"),
            Value::Func(h) => write!(f, "func({})", h.name()),
            Value::Opaque(o) => fmt::Debug::fmt(o, f),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => a.same(b),
            (Value::Opaque(a), Value::Opaque(b)) => a.same(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl From<Handler> for Value {
    fn from(v: Handler) -> Self {
        Value::Func(v)
    }
}

impl From<Opaque> for Value {
    fn from(v: Opaque) -> Self {
        Value::Opaque(v)
    }
}
