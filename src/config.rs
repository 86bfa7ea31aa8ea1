use std::time::Duration;

use crate::{
    error::{Error, Result},
    philosopher::Timing,
    strategy::Strategy,
    watchdog::Watchdog,
};

/// Everything needed to seat a table and judge whether dinner froze.
///
/// The number of philosophers is the number of chopsticks; there is no way to set them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DinnerConfig {
    pub seats: usize,
    pub strategy: Strategy,
    pub timing: Timing,
    /// Silence after which the watchdog declares the table frozen.
    pub stall: Duration,
    /// Upper bound on a whole dinner.
    pub deadline: Duration,
}

impl Default for DinnerConfig {
    fn default() -> Self {
        DinnerConfig {
            seats: 5,
            strategy: Strategy::Symmetric,
            timing: Timing::default(),
            stall: Duration::from_millis(500),
            deadline: Duration::from_secs(10),
        }
    }
}

impl DinnerConfig {
    pub fn with_seats(mut self, seats: usize) -> Self {
        self.seats = seats;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_think(mut self, think: Duration) -> Self {
        self.timing.think = think;
        self
    }

    pub fn with_eat(mut self, eat: Duration) -> Self {
        self.timing.eat = eat;
        self
    }

    pub fn with_stall(mut self, stall: Duration) -> Self {
        self.stall = stall;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.seats < 2 {
            return Err(Error::InvalidRingSize { seats: self.seats });
        }
        // A healthy philosopher is silent while thinking or eating.
        let quiet = self.timing.think.max(self.timing.eat);
        if self.stall <= quiet {
            return Err(Error::InvalidConfig(format!(
                "stall window {:?} must be longer than think/eat time {quiet:?}",
                self.stall
            )));
        }
        if self.deadline < self.stall {
            return Err(Error::InvalidConfig(format!(
                "deadline {:?} is shorter than stall window {:?}",
                self.deadline, self.stall
            )));
        }
        if let Strategy::Backoff { timeout } = self.strategy {
            if timeout.is_zero() {
                return Err(Error::InvalidConfig("backoff timeout must be positive".into()));
            }
        }
        Ok(())
    }

    pub fn watchdog(&self) -> Watchdog {
        Watchdog::new(self.stall, self.deadline)
    }
}
