//! Error types used by the taskgate runtime.
//!
//! - [`InvokeError`]: a callable could not be invoked with the given arguments.
//! - [`GateError`]: the weighted gate refused or abandoned an admission.
//! - [`RegistryError`]: submission / run failures of the bounded [`Registry`](crate::Registry).
//! - [`ExecutorError`]: fire-and-forget submission failures of the [`Executor`](crate::Executor).
//! - [`PipelineError`]: chain validation and execution failures.
//! - [`NamingError`]: the unique-name source failed.
//!
//! Every enum exposes `as_label()`, a short stable snake_case label for logs/metrics.

use thiserror::Error;

use crate::invoke::Kind;

/// # Errors produced by dynamic invocation.
///
/// Raised before the callable body runs: the engine checks the callee and the
/// argument shape against the declared signature at call time.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    /// The value given as a handler is not callable.
    #[error("value of kind {kind} is not callable")]
    InvalidCallable {
        /// Kind of the offending value.
        kind: Kind,
    },

    /// Argument count differs from the declared parameter count.
    #[error("expected {expected} argument(s), got {actual}")]
    ArityMismatch {
        /// Declared parameter count.
        expected: usize,
        /// Number of arguments supplied.
        actual: usize,
    },

    /// An argument's kind differs from the declared parameter kind.
    #[error("argument {index}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Zero-based argument position.
        index: usize,
        /// Declared kind.
        expected: Kind,
        /// Kind of the supplied argument.
        actual: Kind,
    },

    /// The callable produced values that do not match its declared return kinds.
    #[error("declared returns {expected:?}, produced {actual:?}")]
    ReturnMismatch {
        /// Declared return kinds.
        expected: Vec<Kind>,
        /// Kinds actually produced.
        actual: Vec<Kind>,
    },
}

impl InvokeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            InvokeError::InvalidCallable { .. } => "invoke_invalid_callable",
            InvokeError::ArityMismatch { .. } => "invoke_arity_mismatch",
            InvokeError::TypeMismatch { .. } => "invoke_type_mismatch",
            InvokeError::ReturnMismatch { .. } => "invoke_return_mismatch",
        }
    }
}

/// # Errors produced by the weighted gate.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    /// Requested weight can never fit; waiting would deadlock.
    #[error("requested weight {requested} exceeds gate capacity {capacity}")]
    CapacityExceeded {
        /// Weight asked for.
        requested: u32,
        /// Total capacity of the gate.
        capacity: u32,
    },

    /// The wait was abandoned through its cancellation token.
    #[error("gate acquisition cancelled")]
    Cancelled,

    /// The gate was closed while waiting.
    #[error("gate closed")]
    Closed,
}

impl GateError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            GateError::CapacityExceeded { .. } => "gate_capacity_exceeded",
            GateError::Cancelled => "gate_cancelled",
            GateError::Closed => "gate_closed",
        }
    }
}

/// # Errors produced by the unique-name source.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    /// The entropy source could not provide random bytes.
    #[error("entropy source failed: {reason}")]
    Entropy {
        /// Message reported by the entropy source.
        reason: String,
    },
}

impl NamingError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            NamingError::Entropy { .. } => "naming_entropy",
        }
    }
}

/// # Errors produced by the bounded registry.
///
/// Submission errors are returned synchronously; a rejected unit is never queued.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A unit with the same name is already registered.
    #[error("unit {name:?} already exists")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// `run` was requested with no queued units.
    #[error("no queued units to run")]
    Empty,

    /// A run is in flight; the operation needs an idle registry.
    #[error("a run is already in flight")]
    Busy,

    /// The run driver went away before delivering results.
    #[error("run aborted before delivering results")]
    RunAborted,

    /// The handler or its arguments were rejected at submission.
    #[error(transparent)]
    Invoke(#[from] InvokeError),
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::DuplicateName { .. } => "registry_duplicate_name",
            RegistryError::Empty => "registry_empty",
            RegistryError::Busy => "registry_busy",
            RegistryError::RunAborted => "registry_run_aborted",
            RegistryError::Invoke(e) => e.as_label(),
        }
    }
}

/// # Errors produced by fire-and-forget submission.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    /// The handler or its arguments were rejected before admission.
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    /// No name was given and none could be generated.
    #[error(transparent)]
    Naming(#[from] NamingError),

    /// The gate refused admission.
    #[error(transparent)]
    Gate(#[from] GateError),
}

impl ExecutorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecutorError::Invoke(e) => e.as_label(),
            ExecutorError::Naming(e) => e.as_label(),
            ExecutorError::Gate(e) => e.as_label(),
        }
    }
}

/// # Errors produced while building or executing a pipeline.
///
/// Validation errors are stored in the builder and freeze it; `execute()`
/// returns the stored error without launching anything.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The value appended as a stage is not callable.
    #[error("stage {stage}: value of kind {kind} is not callable")]
    InvalidCallable {
        /// Zero-based stage position.
        stage: usize,
        /// Kind of the offending value.
        kind: Kind,
    },

    /// First stage: bound arguments do not match the handler's parameters.
    #[error("stage {stage}: parameters {expected:?} do not match bound arguments {actual:?}")]
    SignatureMismatch {
        /// Zero-based stage position.
        stage: usize,
        /// Declared parameter kinds.
        expected: Vec<Kind>,
        /// Kinds of the bound arguments.
        actual: Vec<Kind>,
    },

    /// Previous outputs plus bound arguments do not add up to the parameter count.
    #[error(
        "stage {stage}: previous outputs ({outputs}) + bound arguments ({bound}) != parameters ({expected})"
    )]
    ChainArityMismatch {
        /// Zero-based stage position.
        stage: usize,
        /// Output count of the previous stage.
        outputs: usize,
        /// Bound argument count of this stage.
        bound: usize,
        /// Declared parameter count of this stage.
        expected: usize,
    },

    /// A position of previous outputs plus bound arguments has the wrong kind.
    #[error("stage {stage}: parameter {index} expects {expected}, chain supplies {actual}")]
    ChainTypeMismatch {
        /// Zero-based stage position.
        stage: usize,
        /// Zero-based parameter position.
        index: usize,
        /// Declared kind.
        expected: Kind,
        /// Kind supplied by the chain.
        actual: Kind,
    },

    /// `execute()` was called before any stage was appended.
    #[error("pipeline has no stages")]
    EmptyChain,

    /// No task name was given and none could be generated.
    #[error(transparent)]
    Naming(#[from] NamingError),

    /// The gate refused admission.
    #[error(transparent)]
    Gate(#[from] GateError),

    /// The owning executor was dropped.
    #[error("owning executor is gone")]
    ExecutorGone,
}

impl PipelineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PipelineError::InvalidCallable { .. } => "pipeline_invalid_callable",
            PipelineError::SignatureMismatch { .. } => "pipeline_signature_mismatch",
            PipelineError::ChainArityMismatch { .. } => "pipeline_chain_arity_mismatch",
            PipelineError::ChainTypeMismatch { .. } => "pipeline_chain_type_mismatch",
            PipelineError::EmptyChain => "pipeline_empty",
            PipelineError::Naming(e) => e.as_label(),
            PipelineError::Gate(e) => e.as_label(),
            PipelineError::ExecutorGone => "pipeline_executor_gone",
        }
    }

    /// True for errors raised while appending stages (shape validation).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidCallable { .. }
                | PipelineError::SignatureMismatch { .. }
                | PipelineError::ChainArityMismatch { .. }
                | PipelineError::ChainTypeMismatch { .. }
        )
    }
}
