//! Observable trace of a dinner.
//!
//! Every philosopher reports what it did to an [`EventSink`]. The [`Journal`] keeps the whole
//! trace in order so the interleaving can be replayed afterwards, and lets a watchdog block
//! until something new happens.

use std::{
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Reported after the chopstick is taken.
    Acquired { slot: usize },
    Eating,
    /// Reported before the chopstick is put back, so a trace never shows two holders at once.
    Released { slot: usize },
    /// Gave up on the second chopstick and put the first one down.
    BackedOff { slot: usize },
    Done,
    Interrupted,
}

impl EventKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Done | EventKind::Interrupted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub seat: usize,
    pub kind: EventKind,
    pub at: Instant,
}

pub trait EventSink: Send + Sync {
    fn record(&self, event: Event);
}

/// Where a philosopher is in its lifecycle, as far as the trace can tell.
///
/// Waiting is not traced: a philosopher blocked on its next chopstick shows up in the state it
/// reached before the wait (`Idle` or `HoldingPrimary`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhilosopherState {
    Idle,
    HoldingPrimary,
    HoldingBoth,
    Eating,
    Done,
    Interrupted,
}

/// Progress seen by [`Journal::wait_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub events: usize,
    pub done: usize,
    pub terminated: usize,
}

#[derive(Debug)]
pub struct Journal {
    start: Instant,
    events: Mutex<Vec<Event>>,
    cond: Condvar,
}

impl Default for Journal {
    fn default() -> Self {
        Journal::new()
    }
}

impl Journal {
    pub fn new() -> Self {
        Journal {
            start: Instant::now(),
            events: Mutex::new(Vec::new()),
            cond: Condvar::new(),
        }
    }

    /// Time of `event` relative to the creation of the journal.
    pub fn offset(&self, event: &Event) -> Duration {
        event.at.saturating_duration_since(self.start)
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn count(&self, pred: impl Fn(&EventKind) -> bool) -> usize {
        self.lock().iter().filter(|e| pred(&e.kind)).count()
    }

    pub fn acquisitions(&self) -> usize {
        self.count(|k| matches!(k, EventKind::Acquired { .. }))
    }

    pub fn done(&self) -> usize {
        self.count(|k| *k == EventKind::Done)
    }

    /// Everything `seat` did, in order.
    pub fn trace_of(&self, seat: usize) -> Vec<EventKind> {
        self.lock()
            .iter()
            .filter(|e| e.seat == seat)
            .map(|e| e.kind)
            .collect()
    }

    pub fn state_of(&self, seat: usize) -> PhilosopherState {
        replay(&self.trace_of(seat))
    }

    /// Blocks until the journal holds more than `seen` events or `timeout` passes.
    pub fn wait_for(&self, seen: usize, timeout: Duration) -> Progress {
        let (events, _) = self
            .cond
            .wait_timeout_while(self.lock(), timeout, |events| events.len() <= seen)
            .unwrap_or_else(PoisonError::into_inner);
        Progress {
            events: events.len(),
            done: events.iter().filter(|e| e.kind == EventKind::Done).count(),
            terminated: events.iter().filter(|e| e.kind.is_terminal()).count(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for Journal {
    fn record(&self, event: Event) {
        self.lock().push(event);
        self.cond.notify_all();
    }
}

fn replay(trace: &[EventKind]) -> PhilosopherState {
    let mut state = PhilosopherState::Idle;
    let mut held = 0;
    for kind in trace {
        state = match kind {
            EventKind::Acquired { .. } => {
                held += 1;
                if held >= 2 {
                    PhilosopherState::HoldingBoth
                } else {
                    PhilosopherState::HoldingPrimary
                }
            }
            EventKind::Eating => PhilosopherState::Eating,
            EventKind::Released { .. } => {
                held -= 1;
                match (state, held) {
                    (PhilosopherState::Eating, _) => PhilosopherState::Eating,
                    (_, 0) => PhilosopherState::Idle,
                    _ => PhilosopherState::HoldingPrimary,
                }
            }
            EventKind::BackedOff { .. } => state,
            EventKind::Done => PhilosopherState::Done,
            EventKind::Interrupted => PhilosopherState::Interrupted,
        };
    }
    state
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{sync::Arc, thread};

    fn event(seat: usize, kind: EventKind) -> Event {
        Event {
            seat,
            kind,
            at: Instant::now(),
        }
    }

    #[test]
    fn test_replay_states() {
        use EventKind::*;

        assert_eq!(replay(&[]), PhilosopherState::Idle);
        assert_eq!(
            replay(&[Acquired { slot: 1 }]),
            PhilosopherState::HoldingPrimary
        );
        assert_eq!(
            replay(&[Acquired { slot: 1 }, Acquired { slot: 0 }]),
            PhilosopherState::HoldingBoth
        );
        assert_eq!(
            replay(&[
                Acquired { slot: 1 },
                Acquired { slot: 0 },
                Eating,
                Released { slot: 0 }
            ]),
            PhilosopherState::Eating
        );
        assert_eq!(
            replay(&[Acquired { slot: 1 }, BackedOff { slot: 0 }, Released { slot: 1 }]),
            PhilosopherState::Idle
        );
        assert_eq!(
            replay(&[Acquired { slot: 1 }, Released { slot: 1 }, Interrupted]),
            PhilosopherState::Interrupted
        );
    }

    #[test]
    fn test_journal_counts() {
        let journal = Journal::new();
        journal.record(event(0, EventKind::Acquired { slot: 0 }));
        journal.record(event(1, EventKind::Acquired { slot: 1 }));
        journal.record(event(0, EventKind::Done));

        assert_eq!(journal.len(), 3);
        assert_eq!(journal.acquisitions(), 2);
        assert_eq!(journal.done(), 1);
        assert_eq!(
            journal.trace_of(0),
            vec![EventKind::Acquired { slot: 0 }, EventKind::Done]
        );
        assert_eq!(journal.state_of(1), PhilosopherState::HoldingPrimary);
    }

    #[test]
    fn test_wait_for() {
        let journal = Arc::new(Journal::new());

        let progress = journal.wait_for(0, Duration::from_millis(10));
        assert_eq!(progress.events, 0);

        let journal0 = journal.clone();
        let t = thread::spawn(move || {
            journal0.record(event(0, EventKind::Interrupted));
        });
        let progress = journal.wait_for(0, Duration::from_secs(5));
        t.join().unwrap();
        assert_eq!(progress, Progress {
                events: 1,
                done: 0,
                terminated: 1
            });
    }
}
