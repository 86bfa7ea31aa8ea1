use std::time::Duration;

/// Errors surfaced by the ring, the philosophers and the driver.
///
/// Slot-array invariant violations (an index outside the ring, releasing a
/// free slot) are programming errors and panic instead of showing up here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A ring needs at least two seats, otherwise primary and secondary coincide.
    #[error("invalid ring size {seats}: at least 2 seats are required")]
    InvalidRingSize { seats: usize },

    /// The ring was interrupted while (or before) waiting for a slot.
    #[error("wait interrupted")]
    Interrupted,

    /// A timeout-bounded acquire gave up.
    #[error("chopstick {slot} still held after {waited:?}")]
    Contention { slot: usize, waited: Duration },

    /// The watchdog saw no progress; the run froze.
    #[error("no progress: {done} of {seats} philosophers done after {acquisitions} acquisitions")]
    LivenessFailure {
        seats: usize,
        done: usize,
        acquisitions: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
