//! Seats the philosophers, lets them eat, and reports how it went.

use std::{
    panic,
    sync::{Arc, Barrier},
    thread,
    time::{Duration, Instant},
};

use tracing::{info, warn};

use crate::{
    config::DinnerConfig,
    error::{Error, Result},
    event::{Event, EventKind, Journal},
    philosopher::Philosopher,
    ring::ResourceRing,
    seat::Seat,
    watchdog::Verdict,
};

/// What a single dinner looked like.
#[derive(Debug)]
pub struct Outcome {
    pub verdict: Verdict,
    pub events: Vec<Event>,
    /// What each philosopher's `run` returned, by seat.
    pub results: Vec<Result<()>>,
    /// Chopsticks held and philosophers blocked when the watchdog fired. Empty if it never did.
    pub held_at_freeze: Vec<bool>,
    pub waiting_at_freeze: usize,
    /// Chopsticks still held after every philosopher left.
    pub held_at_end: usize,
    pub elapsed: Duration,
}

impl Outcome {
    pub fn seats(&self) -> usize {
        self.results.len()
    }

    pub fn done(&self) -> usize {
        self.count(|k| *k == EventKind::Done)
    }

    pub fn acquisitions(&self) -> usize {
        self.count(|k| matches!(k, EventKind::Acquired { .. }))
    }

    pub fn releases(&self) -> usize {
        self.count(|k| matches!(k, EventKind::Released { .. }))
    }

    pub fn count(&self, pred: impl Fn(&EventKind) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.kind)).count()
    }

    /// Every philosopher stuck on its second chopstick with the whole ring taken.
    pub fn is_deadlock(&self) -> bool {
        self.verdict.is_frozen()
            && self.done() == 0
            && !self.held_at_freeze.is_empty()
            && self.held_at_freeze.iter().all(|h| *h)
            && self.waiting_at_freeze == self.seats()
    }

    /// Turns a frozen dinner into [`Error::LivenessFailure`].
    pub fn into_result(self) -> Result<Outcome> {
        if self.verdict.is_frozen() {
            return Err(Error::LivenessFailure {
                seats: self.seats(),
                done: self.done(),
                acquisitions: self.acquisitions(),
            });
        }
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct Dinner {
    config: DinnerConfig,
}

impl Dinner {
    pub fn new(config: DinnerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Dinner { config })
    }

    /// A fresh ring sized for this table.
    pub fn ring(&self) -> Result<ResourceRing> {
        ResourceRing::new(self.config.seats)
    }

    pub fn run(&self) -> Result<Outcome> {
        Ok(self.run_on(Arc::new(self.ring()?)))
    }

    /// Runs one dinner on `ring`, which may be interrupted from outside while it runs.
    ///
    /// A frozen table is torn down by interrupting the ring, so every philosopher thread is
    /// joined before this returns.
    pub fn run_on(&self, ring: Arc<ResourceRing>) -> Outcome {
        let seats = self.config.seats;
        assert_eq!(ring.seats(), seats, "ring does not match the table");

        let journal = Arc::new(Journal::new());
        let gate = Arc::new(Barrier::new(seats));
        let start = Instant::now();
        let mut v = Vec::with_capacity(seats);

        for i in 0..seats {
            let philosopher = Philosopher::new(
                Seat::new(i, seats),
                ring.clone(),
                self.config.strategy,
                self.config.timing,
                journal.clone(),
            );
            let gate0 = gate.clone();
            let t = thread::spawn(move || {
                gate0.wait();
                philosopher.run()
            });
            v.push(t);
        }

        let verdict = self.config.watchdog().watch(&journal, seats);
        let (held_at_freeze, waiting_at_freeze) = if verdict.is_frozen() {
            let held = ring.snapshot();
            let waiting = ring.waiting();
            let last_event = journal.events().last().map(|e| journal.offset(e));
            warn!(
                strategy = %self.config.strategy,
                waiting,
                ?last_event,
                "table did not finish ({verdict}), held chopsticks {held:?}"
            );
            ring.interrupt();
            (held, waiting)
        } else {
            (Vec::new(), 0)
        };

        let results = v
            .into_iter()
            .map(|t| t.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect();

        let outcome = Outcome {
            verdict,
            events: journal.events(),
            results,
            held_at_freeze,
            waiting_at_freeze,
            held_at_end: ring.held_count(),
            elapsed: start.elapsed(),
        };
        info!(
            strategy = %self.config.strategy,
            done = outcome.done(),
            acquisitions = outcome.acquisitions(),
            elapsed = ?outcome.elapsed,
            "dinner {}",
            outcome.verdict
        );
        outcome
    }
}
