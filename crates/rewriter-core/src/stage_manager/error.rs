//! # Rewriter Stage Manager Errors
//!
//! Defines error types specific to pipeline assembly and execution.
//!
//! [`StageSystemError`] covers failures while resolving, initializing, or
//! driving a pipeline. [`Fault`] is what stages raise while events flow, and
//! [`PipelineException`] is the generic wrapper a fault is reported under
//! when it carries no I/O cause of its own.
use std::io;

use thiserror::Error;

use crate::stage_manager::StageRole;
use crate::stage_manager::runner::PipelineState;

#[derive(Debug, Error)]
pub enum StageSystemError {
    #[error("Unable to get {role} component with type '{type_name}'")]
    StageNotFound { role: StageRole, type_name: String },

    #[error("A {role} with type '{type_name}' is already registered")]
    StageAlreadyExists { role: StageRole, type_name: String },

    #[error("Failed to initialize {role} '{type_name}': {source}")]
    InitializationFailed {
        role: StageRole,
        type_name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Cannot {operation} while the pipeline is {state}")]
    InvalidState { operation: &'static str, state: PipelineState },

    #[error("Pipeline has already been finished")]
    AlreadyFinished,
}

/// Fault raised by a stage while events flow or while the generator completes
#[derive(Debug, Error)]
pub enum Fault {
    /// An I/O failure, reported to the caller as-is
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Any other processing failure
    #[error("{message}")]
    Processing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl Fault {
    /// Processing fault with a message only
    pub fn processing(message: impl Into<String>) -> Self {
        Fault::Processing {
            message: message.into(),
            source: None,
        }
    }

    /// Processing fault that records the error that caused it
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Fault::Processing {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Translate into the I/O vocabulary callers observe.
    ///
    /// An I/O cause, either the fault itself or the direct source of a
    /// processing fault, is passed through untouched. Anything else is wrapped
    /// in a [`PipelineException`] that keeps the fault as its source.
    pub fn into_reported(self) -> io::Error {
        match self {
            Fault::Io(cause) => cause,
            Fault::Processing {
                message,
                source: Some(source),
            } => match source.downcast::<io::Error>() {
                Ok(cause) => *cause,
                Err(source) => PipelineException::wrap(Fault::Processing {
                    message,
                    source: Some(source),
                }),
            },
            fault => PipelineException::wrap(fault),
        }
    }
}

/// Generic error reported when a fault has no I/O cause
#[derive(Debug, Error)]
#[error("Pipeline exception.")]
pub struct PipelineException {
    #[source]
    pub fault: Fault,
}

impl PipelineException {
    fn wrap(fault: Fault) -> io::Error {
        io::Error::other(PipelineException { fault })
    }
}
