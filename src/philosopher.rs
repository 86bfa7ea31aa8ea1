use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use rand::Rng;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    event::{Event, EventKind, EventSink},
    ring::ResourceRing,
    seat::Seat,
    strategy::Strategy,
};

/// How long a philosopher thinks between its two chopsticks, and how long it eats.
///
/// The think time is what lets every philosopher get its first chopstick before anyone reaches
/// for the second; it is slept for real on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub think: Duration,
    pub eat: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            think: Duration::from_millis(50),
            eat: Duration::from_millis(10),
        }
    }
}

pub struct Philosopher {
    seat: Seat,
    ring: Arc<ResourceRing>,
    strategy: Strategy,
    timing: Timing,
    sink: Arc<dyn EventSink>,
}

impl Philosopher {
    pub fn new(
        seat: Seat,
        ring: Arc<ResourceRing>,
        strategy: Strategy,
        timing: Timing,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        assert_eq!(seat.seats(), ring.seats(), "one seat per chopstick");
        Philosopher {
            seat,
            ring,
            strategy,
            timing,
            sink,
        }
    }

    /// Eats once and leaves.
    ///
    /// If the ring is interrupted while waiting, the chopsticks already taken are put back, the
    /// meal is skipped and [`Error::Interrupted`] is returned.
    pub fn run(self) -> Result<()> {
        let mut held = Vec::with_capacity(2);

        if let Err(e) = self.pick_up(&mut held) {
            self.put_down(&mut held);
            warn!(seat = self.seat.index(), "philosopher {} interrupted", self.seat);
            self.emit(EventKind::Interrupted);
            return Err(e);
        }

        info!(seat = self.seat.index(), "philosopher {} is eating", self.seat);
        self.emit(EventKind::Eating);
        thread::sleep(self.timing.eat);

        self.put_down(&mut held);
        info!(seat = self.seat.index(), "philosopher {} is done", self.seat);
        self.emit(EventKind::Done);
        Ok(())
    }

    fn pick_up(&self, held: &mut Vec<usize>) -> Result<()> {
        let (first, second) = self.strategy.order(self.seat);
        match self.strategy {
            Strategy::Arbitrator => {
                thread::sleep(self.timing.think);
                debug!(seat = self.seat.index(), first, second, "waiting for both chopsticks");
                self.ring.acquire_both(first, second)?;
                self.took(held, first);
                self.took(held, second);
                Ok(())
            }
            Strategy::Backoff { timeout } => loop {
                self.take(held, first)?;
                thread::sleep(self.timing.think);
                match self.ring.acquire_timeout(second, timeout) {
                    Ok(()) => {
                        self.took(held, second);
                        return Ok(());
                    }
                    Err(Error::Contention { slot, waited }) => {
                        debug!(seat = self.seat.index(), slot, ?waited, "backing off");
                        self.emit(EventKind::BackedOff { slot });
                        self.put_down(held);
                        thread::sleep(jitter(timeout));
                    }
                    Err(e) => return Err(e),
                }
            },
            Strategy::Symmetric | Strategy::Asymmetric | Strategy::Hierarchy => {
                self.take(held, first)?;
                thread::sleep(self.timing.think);
                self.take(held, second)
            }
        }
    }

    fn take(&self, held: &mut Vec<usize>, slot: usize) -> Result<()> {
        debug!(seat = self.seat.index(), slot, "waiting for chopstick");
        self.ring.acquire(slot)?;
        self.took(held, slot);
        Ok(())
    }

    fn took(&self, held: &mut Vec<usize>, slot: usize) {
        held.push(slot);
        info!(
            seat = self.seat.index(),
            slot,
            "philosopher {} picked up chopstick {}",
            self.seat,
            slot
        );
        self.emit(EventKind::Acquired { slot });
    }

    // Only what was actually taken goes back, most recent first.
    fn put_down(&self, held: &mut Vec<usize>) {
        while let Some(slot) = held.pop() {
            self.emit(EventKind::Released { slot });
            self.ring.release(slot);
            debug!(seat = self.seat.index(), slot, "put down chopstick");
        }
    }

    fn emit(&self, kind: EventKind) {
        self.sink.record(Event {
            seat: self.seat.index(),
            kind,
            at: Instant::now(),
        });
    }
}

fn jitter(timeout: Duration) -> Duration {
    let max = timeout.as_millis().max(1) as u64;
    Duration::from_millis(rand::thread_rng().gen_range(1..=max))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::event::{Journal, PhilosopherState};

    fn quick() -> Timing {
        Timing {
            think: Duration::from_millis(1),
            eat: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_lone_philosopher_eats_once() {
        let ring = Arc::new(ResourceRing::new(5).unwrap());
        let journal = Arc::new(Journal::new());
        let seat = Seat::new(0, 5);

        Philosopher::new(seat, ring.clone(), Strategy::Symmetric, quick(), journal.clone())
            .run()
            .unwrap();

        assert_eq!(
            journal.trace_of(0),
            vec![
                EventKind::Acquired { slot: 0 },
                EventKind::Acquired { slot: 4 },
                EventKind::Eating,
                EventKind::Released { slot: 4 },
                EventKind::Released { slot: 0 },
                EventKind::Done,
            ]
        );
        assert_eq!(journal.state_of(0), PhilosopherState::Done);
        assert_eq!(ring.held_count(), 0);
    }

    #[test]
    fn test_interrupted_philosopher_releases_only_what_it_holds() {
        let ring = Arc::new(ResourceRing::new(3).unwrap());
        let journal = Arc::new(Journal::new());
        // seat 1 needs chopsticks 1 and 0; chopstick 0 is taken from outside
        ring.acquire(0).unwrap();

        let seat = Seat::new(1, 3);
        let philosopher =
            Philosopher::new(seat, ring.clone(), Strategy::Symmetric, quick(), journal.clone());
        let t = thread::spawn(move || philosopher.run());

        while ring.waiting() == 0 {
            thread::yield_now();
        }
        ring.interrupt();

        assert_eq!(t.join().unwrap(), Err(Error::Interrupted));
        assert_eq!(
            journal.trace_of(1),
            vec![
                EventKind::Acquired { slot: 1 },
                EventKind::Released { slot: 1 },
                EventKind::Interrupted,
            ]
        );
        // the outside holder still has its chopstick, nobody freed it by mistake
        assert_eq!(ring.snapshot(), vec![true, false, false]);
    }

    #[test]
    fn test_backoff_gives_up_and_retries() {
        let ring = Arc::new(ResourceRing::new(2).unwrap());
        let journal = Arc::new(Journal::new());
        ring.acquire(0).unwrap();

        let seat = Seat::new(1, 2);
        let strategy = Strategy::Backoff {
            timeout: Duration::from_millis(5),
        };
        let philosopher = Philosopher::new(seat, ring.clone(), strategy, quick(), journal.clone());
        let t = thread::spawn(move || philosopher.run());

        while journal.count(|k| matches!(k, EventKind::BackedOff { .. })) == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        ring.release(0);

        t.join().unwrap().unwrap();
        assert_eq!(journal.state_of(1), PhilosopherState::Done);
        assert_eq!(ring.held_count(), 0);
    }

    #[test]
    fn test_interrupted_arbitrator_holds_nothing() {
        let ring = Arc::new(ResourceRing::new(4).unwrap());
        let journal = Arc::new(Journal::new());
        ring.acquire(1).unwrap();

        let seat = Seat::new(2, 4);
        let philosopher =
            Philosopher::new(seat, ring.clone(), Strategy::Arbitrator, quick(), journal.clone());
        let t = thread::spawn(move || philosopher.run());

        while ring.waiting() == 0 {
            thread::yield_now();
        }
        ring.interrupt();

        assert_eq!(t.join().unwrap(), Err(Error::Interrupted));
        assert_eq!(journal.trace_of(2), vec![EventKind::Interrupted]);
        ring.release(1);
        assert_eq!(ring.held_count(), 0);
    }

    #[test]
    fn test_interrupted_backoff_puts_first_chopstick_back() {
        let ring = Arc::new(ResourceRing::new(2).unwrap());
        let journal = Arc::new(Journal::new());
        ring.acquire(0).unwrap();

        // long enough that the interrupt lands inside the bounded wait
        let strategy = Strategy::Backoff {
            timeout: Duration::from_secs(30),
        };
        let seat = Seat::new(1, 2);
        let philosopher = Philosopher::new(seat, ring.clone(), strategy, quick(), journal.clone());
        let t = thread::spawn(move || philosopher.run());

        while ring.waiting() == 0 {
            thread::yield_now();
        }
        ring.interrupt();

        assert_eq!(t.join().unwrap(), Err(Error::Interrupted));
        assert_eq!(
            journal.trace_of(1),
            vec![
                EventKind::Acquired { slot: 1 },
                EventKind::Released { slot: 1 },
                EventKind::Interrupted,
            ]
        );
        ring.release(0);
        assert_eq!(ring.held_count(), 0);
    }

    #[test]
    fn test_arbitrator_takes_both() {
        let ring = Arc::new(ResourceRing::new(4).unwrap());
        let journal = Arc::new(Journal::new());
        let seat = Seat::new(2, 4);

        Philosopher::new(seat, ring.clone(), Strategy::Arbitrator, quick(), journal.clone())
            .run()
            .unwrap();

        assert_eq!(
            &journal.trace_of(2)[..2],
            &[EventKind::Acquired { slot: 2 }, EventKind::Acquired { slot: 1 }]
        );
        assert_eq!(ring.held_count(), 0);
    }
}
