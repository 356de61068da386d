// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The scheduler shell hands every dispatched node to an `Executor` from a
//! worker task and waits for the outcome. Production code uses
//! [`ProcessExecutor`](super::ProcessExecutor); tests provide their own
//! implementation that, for example, records start/finish order and returns
//! scripted outcomes.

use std::future::Future;
use std::pin::Pin;

use crate::engine::{JobOutcome, ScheduledNode};
use crate::errors::Result;

/// Trait abstracting how a node's job is executed.
pub trait Executor: Send + Sync {
    /// Run the node's job to completion.
    ///
    /// Returns the combined outcome (`Failed(code)` carries the first non-zero
    /// exit status). An `Err` means the job could not be run at all; the
    /// scheduler records it as returncode `-1`.
    fn run<'a>(
        &'a self,
        node: &'a ScheduledNode,
    ) -> Pin<Box<dyn Future<Output = Result<JobOutcome>> + Send + 'a>>;
}
