use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::Phase;
use crate::logs::LogCursor;
use crate::rpc::{JobParameters, TaskState};

/// Task name that accepts the data/schema test flags.
pub const TEST_TASK: &str = "test";

/// What the caller asks the server to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// RPC method, passed through verbatim (`run`, `test`, `docs.generate`, ...).
    pub task: String,
    pub models: Option<String>,
    pub exclude: Option<String>,
    pub run_data_tests: bool,
    pub run_schema_tests: bool,
}

impl JobRequest {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            models: None,
            exclude: None,
            run_data_tests: true,
            run_schema_tests: true,
        }
    }

    pub fn models(mut self, models: impl Into<String>) -> Self {
        self.models = Some(models.into());
        self
    }

    pub fn exclude(mut self, exclude: impl Into<String>) -> Self {
        self.exclude = Some(exclude.into());
        self
    }

    pub fn data_tests(mut self, enabled: bool) -> Self {
        self.run_data_tests = enabled;
        self
    }

    pub fn schema_tests(mut self, enabled: bool) -> Self {
        self.run_schema_tests = enabled;
        self
    }

    /// Submission parameters. Empty selectors are dropped and the test flags
    /// are only attached for the `test` task.
    pub fn params(&self) -> JobParameters {
        let params = JobParameters::new(self.models.as_deref(), self.exclude.as_deref());
        if self.task == TEST_TASK {
            params.with_tests(self.run_data_tests, self.run_schema_tests)
        } else {
            params
        }
    }
}

/// Opaque handle returned by the server on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub request_token: String,
}

impl JobHandle {
    pub fn new(request_token: impl Into<String>) -> Self {
        Self {
            request_token: request_token.into(),
        }
    }
}

/// One execution of a submitted job, from submission to a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
    pub id: String,
    pub task: String,
    pub handle: JobHandle,
    pub phase: Phase,
    pub phase_history: Vec<Phase>,
    pub cursor: LogCursor,
    pub polls: u32,
    pub last_state: Option<TaskState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRun {
    pub fn new(task: impl Into<String>, handle: JobHandle) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            task: task.into(),
            handle,
            phase: Phase::Submitted,
            phase_history: Vec::new(),
            cursor: LogCursor::new(),
            polls: 0,
            last_state: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Summary produced once the remote job reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub task: String,
    pub request_token: String,
    pub final_state: TaskState,
    pub phase_transitions: Vec<Phase>,
    pub polls: u32,
    pub log_entries: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl RunReport {
    pub fn from_run(run: &JobRun, final_state: TaskState) -> Self {
        let now = Utc::now();
        let duration = now - run.created_at;
        let mut transitions = run.phase_history.clone();
        transitions.push(run.phase);

        Self {
            run_id: run.id.clone(),
            task: run.task.clone(),
            request_token: run.handle.request_token.clone(),
            final_state,
            phase_transitions: transitions,
            polls: run.polls,
            log_entries: run.cursor.position(),
            started_at: run.created_at,
            completed_at: now,
            duration_ms: duration.num_milliseconds(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.final_state.is_success()
    }
}
