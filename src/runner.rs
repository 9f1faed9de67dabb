use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::logs::{LogLevel, LogSink, filter_and_print};
use crate::rpc::{
    LogEntry, PollParams, PollResult, PsParams, PsResult, RpcClient, RpcEnvelope, RpcError,
    RpcTransport, SubmitResult, TaskRow,
};
use crate::state_machine::{JobHandle, JobRequest, JobRun, RunReport, StateMachine, Transition};

/// How the poll loop paces itself and what it prints.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    /// Pause after every iteration, including the last one.
    pub interval: Duration,
    /// Give up once the job has been polled for this long. `None` waits forever.
    pub max_wait: Option<Duration>,
    pub level: LogLevel,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_wait: None,
            level: LogLevel::Info,
        }
    }
}

impl PollSettings {
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_wait: config.max_wait(),
            level: config.log_level,
        }
    }
}

/// Submits jobs and follows them to a terminal state.
pub struct JobRunner<T> {
    transport: T,
    settings: PollSettings,
    cancel: CancellationToken,
}

impl<T: RpcTransport> JobRunner<T> {
    pub fn new(transport: T, settings: PollSettings) -> Self {
        Self {
            transport,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token to stop polling.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Submit `request` and return the server's handle for it.
    pub async fn submit(&self, request: &JobRequest) -> Result<JobHandle, RunnerError> {
        let result: SubmitResult = self.request(&request.task, request.params()).await?;
        Ok(JobHandle::new(result.request_token))
    }

    /// List the server's tasks, optionally including completed ones.
    pub async fn list(&self, completed: bool) -> Result<Vec<TaskRow>, RunnerError> {
        let result: PsResult = self.request("ps", PsParams { completed }).await?;
        Ok(result.rows)
    }

    /// Current status of the task behind `handle`.
    pub async fn status(&self, handle: &JobHandle) -> Result<TaskRow, RunnerError> {
        self.list(true)
            .await?
            .into_iter()
            .find(|row| row.task_id == handle.request_token)
            .ok_or_else(|| RunnerError::TaskNotFound {
                request_token: handle.request_token.clone(),
            })
    }

    /// Log entries emitted since position `start`.
    pub async fn fetch_logs(&self, handle: &JobHandle, start: usize) -> Result<Vec<LogEntry>, RunnerError> {
        let params = PollParams {
            request_token: handle.request_token.clone(),
            logs: true,
            logs_start: start,
        };
        let result: PollResult = self.request("poll", params).await?;
        Ok(result.logs)
    }

    /// Submit `request`, then poll until the remote job leaves `running`.
    ///
    /// Every iteration queries `ps`, fetches the logs not seen yet, hands the
    /// admitted messages to `sink` and sleeps. Both `success` and failure
    /// states end the loop; the returned report carries which one it was.
    pub async fn execute(&self, request: &JobRequest, sink: &mut impl LogSink) -> Result<RunReport, RunnerError> {
        let handle = self.submit(request).await?;
        info!(task = %request.task, request_token = %handle.request_token, "job submitted");

        let mut run = JobRun::new(request.task.clone(), handle);
        StateMachine::start(&mut run);
        let started = Instant::now();

        loop {
            if self.cancel.is_cancelled() {
                return Err(self.cancelled(&run));
            }
            if let Some(max_wait) = self.settings.max_wait {
                let waited = started.elapsed();
                if waited >= max_wait {
                    return Err(RunnerError::TimedOut {
                        request_token: run.handle.request_token.clone(),
                        waited,
                    });
                }
            }

            let status = self.status(&run.handle).await?;
            sink.observe(&status.state);

            let logs = self.fetch_logs(&run.handle, run.cursor.position()).await?;
            let fetched = filter_and_print(&logs, self.settings.level, sink);
            run.cursor.advance(fetched);

            let transition = StateMachine::observe(&mut run, &status.state);
            debug!(
                request_token = %run.handle.request_token,
                state = %status.state,
                fetched,
                cursor = run.cursor.position(),
                "poll iteration"
            );

            let interrupted = self.pause().await;

            if let Transition::Complete(state) = transition {
                info!(request_token = %run.handle.request_token, state = %state, polls = run.polls, "job finished");
                return Ok(RunReport::from_run(&run, state));
            }
            if interrupted {
                return Err(self.cancelled(&run));
            }
        }
    }

    async fn request<P, R>(&self, method: &str, params: P) -> Result<R, RunnerError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let envelope = RpcEnvelope::new(method, params)?;
        let value = self.transport.call(&envelope).await?;
        serde_json::from_value(value).map_err(|e| RpcError::shape(method, e.to_string()).into())
    }

    // Returns true when the sleep was cut short by cancellation.
    async fn pause(&self) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => true,
            _ = sleep(self.settings.interval) => false,
        }
    }

    fn cancelled(&self, run: &JobRun) -> RunnerError {
        RunnerError::Cancelled {
            request_token: run.handle.request_token.clone(),
        }
    }
}

/// Resolve the endpoint from `config`, run `request` and follow it to completion.
pub async fn run_job(
    config: &RunnerConfig,
    request: &JobRequest,
    sink: &mut impl LogSink,
) -> Result<RunReport, RunnerError> {
    let client = RpcClient::connect(&config.endpoints, config.transport()).await?;
    JobRunner::new(client, PollSettings::from_config(config))
        .execute(request, sink)
        .await
}
