//! How a philosopher picks up its two chopsticks.
//!
//! Only [`Strategy::Symmetric`] can close the cycle of waits. The others each break one of the
//! conditions a cyclic wait needs, using nothing but the ring's public operations.

use std::{fmt, str::FromStr, time::Duration};

use crate::{error::Error, seat::Seat};

pub const DEFAULT_BACKOFF_TIMEOUT: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Primary, then secondary. Everyone holding a primary is a closed cycle.
    #[default]
    Symmetric,
    /// Seat 0 picks up its secondary first.
    Asymmetric,
    /// Lower-numbered chopstick first, regardless of role.
    Hierarchy,
    /// Both chopsticks in a single all-or-nothing grant.
    Arbitrator,
    /// Waits at most `timeout` for the secondary, then puts the primary down and retries.
    Backoff { timeout: Duration },
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Symmetric,
        Strategy::Asymmetric,
        Strategy::Hierarchy,
        Strategy::Arbitrator,
        Strategy::Backoff {
            timeout: DEFAULT_BACKOFF_TIMEOUT,
        },
    ];

    /// Order in which `seat` takes its chopsticks one at a time.
    pub fn order(&self, seat: Seat) -> (usize, usize) {
        let (p, s) = (seat.primary(), seat.secondary());
        match self {
            Strategy::Asymmetric if seat.index() == 0 => (s, p),
            Strategy::Hierarchy => (p.min(s), p.max(s)),
            _ => (p, s),
        }
    }

    pub fn is_deadlock_free(&self) -> bool {
        !matches!(self, Strategy::Symmetric)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Symmetric => "symmetric",
            Strategy::Asymmetric => "asymmetric",
            Strategy::Hierarchy => "hierarchy",
            Strategy::Arbitrator => "arbitrator",
            Strategy::Backoff { .. } => "backoff",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidConfig(format!("unknown strategy `{s}`")))
    }
}
