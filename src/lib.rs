//! Submits a job to a dbt JSON-RPC server and follows it to completion,
//! printing only the log lines not seen yet.
//!
//! The entry point for callers is [`run_job`]; [`JobRunner`] exposes the
//! individual `submit`, `ps` and `poll` steps over any [`rpc::RpcTransport`].

pub mod cli;
pub mod config;
pub mod error;
pub mod logs;
pub mod rpc;
pub mod runner;
pub mod state_machine;
pub mod ui;

pub use config::RunnerConfig;
pub use error::RunnerError;
pub use logs::{LogCursor, LogLevel, LogSink};
pub use runner::{JobRunner, PollSettings, run_job};
pub use state_machine::{JobHandle, JobRequest, RunReport};
