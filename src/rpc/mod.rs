pub mod client;
pub mod endpoint;
pub mod error;
pub mod types;

pub use client::{RpcClient, RpcTransport, TransportSettings};
pub use endpoint::{DEFAULT_ENDPOINTS, resolve_endpoint};
pub use error::RpcError;
pub use types::{
    JobParameters, LogEntry, PollParams, PollResult, PsParams, PsResult, RpcEnvelope, SubmitResult,
    TaskRow, TaskState,
};
