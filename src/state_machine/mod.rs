mod job;
mod state;

pub use job::{JobHandle, JobRequest, JobRun, RunReport, TEST_TASK};
pub use state::{Phase, StateMachine, Transition};
