//! # The chopstick ring
//!
//! A ring of N binary slots protected by a single `Mutex`, coordinated by a single `Condvar`.
//! There is no predictable waiter for a released slot, so every release wakes everyone and each
//! waiter re-checks its own slot.

use std::{
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use crate::error::{Error, Result};

#[derive(Debug)]
struct Slots {
    held: Vec<bool>,
    // threads currently parked on the condvar
    waiting: usize,
    interrupted: bool,
}

#[derive(Debug)]
pub struct ResourceRing {
    seats: usize,
    lock: Mutex<Slots>,
    cond: Condvar,
}

impl ResourceRing {
    /// Creates a ring with every chopstick on the table.
    pub fn new(seats: usize) -> Result<Self> {
        if seats < 2 {
            return Err(Error::InvalidRingSize { seats });
        }
        Ok(ResourceRing {
            seats,
            lock: Mutex::new(Slots {
                held: vec![false; seats],
                waiting: 0,
                interrupted: false,
            }),
            cond: Condvar::new(),
        })
    }

    pub fn seats(&self) -> usize {
        self.seats
    }

    /// Blocks until chopstick `index` is free, then takes it.
    ///
    /// There is no timeout. The only way out of a wait that can never be satisfied is
    /// [`interrupt`](Self::interrupt).
    pub fn acquire(&self, index: usize) -> Result<()> {
        self.check(index);
        let mut slots = self.slots();
        slots.waiting += 1;
        while slots.held[index] && !slots.interrupted {
            slots = self.cond.wait(slots).unwrap_or_else(PoisonError::into_inner);
        }
        slots.waiting -= 1;
        if slots.interrupted {
            return Err(Error::Interrupted);
        }
        slots.held[index] = true;
        Ok(())
    }

    /// Like [`acquire`](Self::acquire), but gives up with [`Error::Contention`] after `timeout`.
    pub fn acquire_timeout(&self, index: usize, timeout: Duration) -> Result<()> {
        self.check(index);
        let start = Instant::now();
        let mut slots = self.slots();
        slots.waiting += 1;
        let (mut slots, _) = self
            .cond
            .wait_timeout_while(slots, timeout, |s| s.held[index] && !s.interrupted)
            .unwrap_or_else(PoisonError::into_inner);
        slots.waiting -= 1;
        if slots.interrupted {
            return Err(Error::Interrupted);
        }
        if slots.held[index] {
            return Err(Error::Contention {
                slot: index,
                waited: start.elapsed(),
            });
        }
        slots.held[index] = true;
        Ok(())
    }

    /// Takes both chopsticks at once, or waits holding neither.
    pub fn acquire_both(&self, a: usize, b: usize) -> Result<()> {
        self.check(a);
        self.check(b);
        assert_ne!(a, b, "a philosopher needs two distinct chopsticks");
        let mut slots = self.slots();
        slots.waiting += 1;
        while (slots.held[a] || slots.held[b]) && !slots.interrupted {
            slots = self.cond.wait(slots).unwrap_or_else(PoisonError::into_inner);
        }
        slots.waiting -= 1;
        if slots.interrupted {
            return Err(Error::Interrupted);
        }
        slots.held[a] = true;
        slots.held[b] = true;
        Ok(())
    }

    /// Puts chopstick `index` back and wakes every waiter.
    ///
    /// # Panics
    ///
    /// Releasing a chopstick nobody holds breaks the ring's accounting and panics.
    pub fn release(&self, index: usize) {
        self.check(index);
        let mut slots = self.slots();
        assert!(slots.held[index], "released chopstick {index} which is not held");
        slots.held[index] = false;
        self.cond.notify_all();
    }

    /// Cancels every current and future wait on this ring. Releases keep working so that
    /// interrupted philosophers can put their chopsticks back.
    pub fn interrupt(&self) {
        let mut slots = self.slots();
        slots.interrupted = true;
        self.cond.notify_all();
    }

    pub fn is_held(&self, index: usize) -> bool {
        self.check(index);
        self.slots().held[index]
    }

    pub fn held_count(&self) -> usize {
        self.slots().held.iter().filter(|h| **h).count()
    }

    /// Number of threads currently blocked in one of the acquire calls.
    pub fn waiting(&self) -> usize {
        self.slots().waiting
    }

    pub fn snapshot(&self) -> Vec<bool> {
        self.slots().held.clone()
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        // A philosopher panicking mid-protocol must not wedge the rest of the table.
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, index: usize) {
        assert!(
            index < self.seats,
            "chopstick {index} is outside a ring of {}",
            self.seats
        );
    }
}
