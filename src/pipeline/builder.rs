//! # Pipeline builder: stage list with shape validation on append.
//!
//! ```text
//! Empty ──set name──► Building ──append ok──► Ready ──append ok──► Ready
//!   │                    │                      │
//!   └──────── append fails (stored error) ──────┴──► Failed (frozen)
//! ```
//!
//! For stage `i > 0` the previous stage's output kinds followed by the kinds
//! of this stage's bound arguments must equal the handler's parameter kinds,
//! position by position. Stage 0 sees only its bound arguments.

use crate::error::PipelineError;
use crate::invoke::{Handler, Kind, Value, kinds_of};

/// One validated pipeline stage.
#[derive(Debug, Clone)]
pub struct Stage {
    handler: Handler,
    bound_args: Vec<Value>,
    output_kinds: Vec<Kind>,
}

impl Stage {
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Arguments appended after the previous stage's outputs.
    pub fn bound_args(&self) -> &[Value] {
        &self.bound_args
    }

    /// Kinds this stage hands to the next one.
    pub fn output_kinds(&self) -> &[Kind] {
        &self.output_kinds
    }
}

/// Observable state of a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// No name, no stages.
    Empty,
    /// Named, no stages yet.
    Building,
    /// At least one valid stage.
    Ready,
    /// An append failed; further appends are no-ops.
    Failed,
}

/// Ordered stages plus the first validation error, if any.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    task_name: Option<String>,
    stages: Vec<Stage>,
    error: Option<PipelineError>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BuilderState {
        if self.error.is_some() {
            BuilderState::Failed
        } else if !self.stages.is_empty() {
            BuilderState::Ready
        } else if self.task_name.is_some() {
            BuilderState::Building
        } else {
            BuilderState::Empty
        }
    }

    pub fn task_name(&self) -> Option<&str> {
        self.task_name.as_deref()
    }

    pub fn set_task_name(&mut self, name: impl Into<String>) {
        self.task_name = Some(name.into());
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// The stored validation error.
    pub fn error(&self) -> Option<&PipelineError> {
        self.error.as_ref()
    }

    /// Appends a stage after validating it against the chain so far.
    ///
    /// # Errors
    /// The stored error if the builder is already `Failed`; otherwise the
    /// validation error, which is also stored and freezes the builder.
    pub fn append(&mut self, handler: Value, bound_args: Vec<Value>) -> Result<(), PipelineError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        match self.validate(handler, bound_args) {
            Ok(stage) => {
                self.stages.push(stage);
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Stores `err` unless an error is already stored.
    pub(crate) fn fail(&mut self, err: PipelineError) {
        self.error.get_or_insert(err);
    }

    /// Clears stages, bound arguments, output kinds, error and name.
    pub fn reset(&mut self) {
        self.task_name = None;
        self.stages.clear();
        self.error = None;
    }

    fn validate(&self, handler: Value, bound_args: Vec<Value>) -> Result<Stage, PipelineError> {
        let stage = self.stages.len();
        let handler = handler
            .into_handler()
            .map_err(|kind| PipelineError::InvalidCallable { stage, kind })?;
        let bound = kinds_of(&bound_args);

        match self.stages.last() {
            None => {
                if handler.params() != bound.as_slice() {
                    return Err(PipelineError::SignatureMismatch {
                        stage,
                        expected: handler.params().to_vec(),
                        actual: bound,
                    });
                }
            }
            Some(prev) => {
                let supplied: Vec<Kind> = prev
                    .output_kinds
                    .iter()
                    .chain(bound.iter())
                    .copied()
                    .collect();
                if supplied.len() != handler.arity() {
                    return Err(PipelineError::ChainArityMismatch {
                        stage,
                        outputs: prev.output_kinds.len(),
                        bound: bound.len(),
                        expected: handler.arity(),
                    });
                }
                let mismatch = handler
                    .params()
                    .iter()
                    .zip(&supplied)
                    .enumerate()
                    .find(|(_, (expected, actual))| expected != actual);
                if let Some((index, (expected, actual))) = mismatch {
                    return Err(PipelineError::ChainTypeMismatch {
                        stage,
                        index,
                        expected: *expected,
                        actual: *actual,
                    });
                }
            }
        }

        Ok(Stage {
            output_kinds: handler.returns().to_vec(),
            handler,
            bound_args,
        })
    }
}
