//! Cooperative task facilities for long-running editor computations.
//!
//! Work that must stay interruptible (formatting a large document, for example) is expressed as
//! a [`SequentialTask`]: a state machine advanced one small step at a time. The same task can be
//! driven synchronously with [`run_to_completion`] or from an async host with [`run_stepwise`],
//! which yields back to the Tokio scheduler between slices and reports progress. Cancellation is
//! cooperative via [`CancellationToken`] and is checked between steps.

mod progress;
mod stepwise;

use thiserror::Error;

pub use progress::{Progress, ProgressEvent, ProgressId, ProgressReceiver, ProgressSender};
pub use stepwise::{run_stepwise, run_to_completion, SequentialTask, StepwiseOptions};
pub use tokio_util::sync::CancellationToken;

/// Returned when a task observed its cancellation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("task cancelled")]
    Cancelled,
    #[error("task panicked")]
    Panicked,
}

impl From<Cancelled> for TaskError {
    fn from(_: Cancelled) -> Self {
        TaskError::Cancelled
    }
}
