use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::job::JobRun;
use crate::rpc::TaskState;

/// Phases of a job run: SUBMITTED → POLLING → TERMINATED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Submitted,
    Polling,
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Submitted => write!(f, "SUBMITTED"),
            Phase::Polling => write!(f, "POLLING"),
            Phase::Terminated => write!(f, "TERMINATED"),
        }
    }
}

/// The result of feeding an observation to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Moved to a new phase.
    Next(Phase),
    /// Still polling; the remote job is running.
    Continue,
    /// The remote job reached a terminal state.
    Complete(TaskState),
}

/// Drives a `JobRun` through its phases.
pub struct StateMachine;

impl StateMachine {
    /// Submission succeeded: start polling. Only valid from `Submitted`.
    pub fn start(run: &mut JobRun) -> Transition {
        match run.phase {
            Phase::Submitted => {
                Self::enter(run, Phase::Polling);
                Transition::Next(Phase::Polling)
            }
            Phase::Polling => Transition::Continue,
            Phase::Terminated => Self::terminated(run),
        }
    }

    /// Record the state `ps` reported for this run.
    ///
    /// - `running` keeps the run polling.
    /// - Anything else terminates it, whether `success`, `error` or unknown.
    /// - `Terminated` is final and ignores further observations.
    pub fn observe(run: &mut JobRun, state: &TaskState) -> Transition {
        if run.phase == Phase::Terminated {
            return Self::terminated(run);
        }

        run.polls += 1;
        run.last_state = Some(state.clone());
        run.updated_at = Utc::now();

        if state.is_terminal() {
            Self::enter(run, Phase::Terminated);
            Transition::Complete(state.clone())
        } else {
            if run.phase == Phase::Submitted {
                Self::enter(run, Phase::Polling);
            }
            Transition::Continue
        }
    }

    fn enter(run: &mut JobRun, phase: Phase) {
        run.phase_history.push(run.phase);
        run.phase = phase;
        run.updated_at = Utc::now();
    }

    fn terminated(run: &JobRun) -> Transition {
        let state = run
            .last_state
            .clone()
            .unwrap_or_else(|| TaskState::Other("unknown".into()));
        Transition::Complete(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::job::JobHandle;

    fn make_run() -> JobRun {
        JobRun::new("run", JobHandle::new("token-1"))
    }

    #[test]
    fn happy_path_walks_all_phases() {
        let mut run = make_run();
        assert_eq!(run.phase, Phase::Submitted);

        let t = StateMachine::start(&mut run);
        assert_eq!(t, Transition::Next(Phase::Polling));

        let t = StateMachine::observe(&mut run, &TaskState::Running);
        assert_eq!(t, Transition::Continue);
        assert_eq!(run.phase, Phase::Polling);

        let t = StateMachine::observe(&mut run, &TaskState::Success);
        assert_eq!(t, Transition::Complete(TaskState::Success));
        assert_eq!(run.phase, Phase::Terminated);
        assert_eq!(run.polls, 2);
        assert_eq!(
            run.phase_history,
            vec![Phase::Submitted, Phase::Polling]
        );
    }

    #[test]
    fn error_state_terminates() {
        let mut run = make_run();
        StateMachine::start(&mut run);

        let t = StateMachine::observe(&mut run, &TaskState::Error);
        assert_eq!(t, Transition::Complete(TaskState::Error));
        assert_eq!(run.last_state, Some(TaskState::Error));
    }

    #[test]
    fn unknown_state_terminates() {
        let mut run = make_run();
        StateMachine::start(&mut run);

        let killed = TaskState::Other("killed".into());
        let t = StateMachine::observe(&mut run, &killed);
        assert_eq!(t, Transition::Complete(killed));
    }

    #[test]
    fn terminated_is_final() {
        let mut run = make_run();
        StateMachine::start(&mut run);
        StateMachine::observe(&mut run, &TaskState::Success);

        let t = StateMachine::observe(&mut run, &TaskState::Running);
        assert_eq!(t, Transition::Complete(TaskState::Success));
        assert_eq!(run.polls, 1);
        assert_eq!(run.phase, Phase::Terminated);

        let t = StateMachine::start(&mut run);
        assert_eq!(t, Transition::Complete(TaskState::Success));
    }

    #[test]
    fn observe_before_start_still_polls() {
        let mut run = make_run();
        let t = StateMachine::observe(&mut run, &TaskState::Running);
        assert_eq!(t, Transition::Continue);
        assert_eq!(run.phase, Phase::Polling);
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::Submitted.to_string(), "SUBMITTED");
        assert_eq!(Phase::Polling.to_string(), "POLLING");
        assert_eq!(Phase::Terminated.to_string(), "TERMINATED");
    }
}
