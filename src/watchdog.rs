//! Liveness watchdog.
//!
//! The ring has no idea whether it is deadlocked. The watchdog sits outside it and only looks at
//! the event journal: if nothing new is reported for `stall`, or the whole dinner takes longer
//! than `deadline`, the run is declared frozen.

use std::{
    fmt,
    time::{Duration, Instant},
};

use crate::event::Journal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every philosopher ate and left.
    Finished,
    /// Every philosopher left, but `done` of them ate; the rest were cancelled from outside.
    Interrupted { done: usize },
    /// No event for `idle` while some philosophers were still at the table.
    Stalled { idle: Duration },
    /// Events kept coming but the dinner did not finish in time.
    DeadlineExceeded { elapsed: Duration },
}

impl Verdict {
    /// Anything short of every philosopher eating, including a table cancelled from outside.
    pub fn is_frozen(&self) -> bool {
        !matches!(self, Verdict::Finished)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Finished => write!(f, "finished"),
            Verdict::Interrupted { done } => write!(f, "interrupted with {done} done"),
            Verdict::Stalled { idle } => write!(f, "stalled for {idle:?}"),
            Verdict::DeadlineExceeded { elapsed } => write!(f, "deadline exceeded after {elapsed:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watchdog {
    stall: Duration,
    deadline: Duration,
}

impl Watchdog {
    pub fn new(stall: Duration, deadline: Duration) -> Self {
        Watchdog { stall, deadline }
    }

    /// Watches `journal` until `seats` philosophers left the table or the run is judged frozen.
    /// Only a `Done` from every seat counts as finished.
    pub fn watch(&self, journal: &Journal, seats: usize) -> Verdict {
        let start = Instant::now();
        let mut seen = 0;
        loop {
            let elapsed = start.elapsed();
            if elapsed >= self.deadline {
                return Verdict::DeadlineExceeded { elapsed };
            }
            let window = self.stall.min(self.deadline - elapsed);
            let progress = journal.wait_for(seen, window);
            if progress.done >= seats {
                return Verdict::Finished;
            }
            if progress.terminated >= seats {
                return Verdict::Interrupted {
                    done: progress.done,
                };
            }
            if progress.events == seen && window == self.stall {
                return Verdict::Stalled { idle: self.stall };
            }
            seen = progress.events;
        }
    }
}
