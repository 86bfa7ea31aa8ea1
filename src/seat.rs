use std::fmt;

/// A philosopher's place at the table, which fixes the two chopsticks it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seat {
    index: usize,
    seats: usize,
}

impl Seat {
    /// # Panics
    ///
    /// Panics if `index` is not in `0..seats`.
    pub fn new(index: usize, seats: usize) -> Self {
        assert!(index < seats, "seat {index} does not exist at a table of {seats}");
        Seat { index, seats }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn seats(&self) -> usize {
        self.seats
    }

    /// The chopstick at the philosopher's own index.
    pub fn primary(&self) -> usize {
        self.index
    }

    /// The chopstick one seat down, wrapping seat 0 around to the last chopstick.
    pub fn secondary(&self) -> usize {
        (self.index + self.seats - 1) % self.seats
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}
