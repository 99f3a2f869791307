//! # Runtime value classification.
//!
//! A [`Kind`] is what signature checks compare: a handler declares the kinds
//! of its parameters and results, and every [`Value`](crate::Value) reports
//! its own kind. Two shapes are compatible iff their kind lists are equal
//! position by position.

use std::fmt;

/// Runtime classification of a [`Value`](crate::Value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    List,
    Map,
    /// An error carried as an ordinary return value.
    Error,
    /// A callable ([`Handler`](crate::Handler)).
    Func,
    /// A host object passed through untouched (matched by kind only).
    Opaque,
}

impl Kind {
    /// Lowercase label used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Str => "str",
            Kind::Bytes => "bytes",
            Kind::List => "list",
            Kind::Map => "map",
            Kind::Error => "error",
            Kind::Func => "func",
            Kind::Opaque => "opaque",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
