//! Scheduler error types.

use dsched_proto::ProtocolError;
use thiserror::Error;

/// Errors that end a scheduling session.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("server rejected {command}: {message}")]
    Rejected {
        command: &'static str,
        message: String,
    },
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
