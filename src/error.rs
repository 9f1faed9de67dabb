use std::time::Duration;

use thiserror::Error;

use crate::rpc::RpcError;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Task {request_token} not found in `ps` listing")]
    TaskNotFound { request_token: String },

    #[error("Task {request_token} still running after {}s", waited.as_secs())]
    TimedOut {
        request_token: String,
        waited: Duration,
    },

    #[error("Polling for task {request_token} was cancelled")]
    Cancelled { request_token: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RunnerError {
    /// The request token the error is about, when there is one.
    pub fn request_token(&self) -> Option<&str> {
        match self {
            RunnerError::TaskNotFound { request_token }
            | RunnerError::TimedOut { request_token, .. }
            | RunnerError::Cancelled { request_token } => Some(request_token),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_out_display() {
        let err = RunnerError::TimedOut {
            request_token: "abc".into(),
            waited: Duration::from_secs(90),
        };
        assert_eq!(err.to_string(), "Task abc still running after 90s");
        assert_eq!(err.request_token(), Some("abc"));
    }

    #[test]
    fn rpc_error_converts() {
        let err: RunnerError = RpcError::shape("run", "missing field `request_token`").into();
        assert!(matches!(err, RunnerError::Rpc(RpcError::Shape { .. })));
        assert_eq!(err.request_token(), None);
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RunnerError>();
    }
}
