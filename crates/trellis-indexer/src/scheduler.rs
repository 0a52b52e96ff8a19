//! Rebuild coalescing state machine
//!
//! Guarantees: at most one rebuild runs at a time, no request is silently
//! dropped, and a burst of requests arriving mid-build collapses into
//! exactly one follow-up run. Pure state so the guarantees are testable
//! without a runtime.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Idle,
    Building,
}

/// What the caller must do after asking for a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Begin a rebuild now.
    Start,
    /// One is already running; a follow-up has been queued.
    Coalesced,
}

/// What the caller must do after reporting a finished build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    /// Requests arrived mid-build; start the queued follow-up immediately.
    RunAgain,
    /// Nothing queued; the scheduler is idle again.
    Idle,
}

#[derive(Debug, Default)]
pub struct RebuildScheduler {
    state: State,
    pending: bool,
}

impl RebuildScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_building(&self) -> bool {
        self.state == State::Building
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    pub fn request(&mut self) -> Request {
        match self.state {
            State::Idle => {
                self.state = State::Building;
                Request::Start
            }
            State::Building => {
                self.pending = true;
                Request::Coalesced
            }
        }
    }

    /// Report that the running build completed. On [`Finish::RunAgain`] the
    /// state stays Building and the caller owns the follow-up run.
    pub fn finish(&mut self) -> Finish {
        debug_assert_eq!(self.state, State::Building, "finish without a running build");
        if self.pending {
            self.pending = false;
            Finish::RunAgain
        } else {
            self.state = State::Idle;
            Finish::Idle
        }
    }
}
