// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running a node's job: the mapper
//! command followed by the reducer command, as external processes spawned
//! with `tokio::process::Command`.
//!
//! - [`backend`] provides the [`Executor`] trait the scheduler talks to, so
//!   tests can substitute an executor that does not spawn processes.
//! - [`command`] builds the per-stage command lines and environment.
//! - [`process`] holds [`ProcessExecutor`], the production implementation.

pub mod backend;
pub mod command;
pub mod process;

pub use backend::Executor;
pub use command::Stage;
pub use process::ProcessExecutor;
