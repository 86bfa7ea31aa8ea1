//! Dining philosophers on a ring of chopsticks.
//!
//! N philosophers sit around a table with N chopsticks between them. Philosopher `i` needs
//! chopstick `i` and chopstick `i - 1` (wrapping around), takes them one at a time, eats once,
//! and puts both back. With every philosopher taking its own chopstick first and then thinking
//! for a moment, the table reliably ends up in a cycle of waits where nobody can eat.
//!
//! [`ResourceRing`] owns the chopsticks. [`Philosopher`] runs one seat on its own thread, using
//! one of the [`Strategy`] variants to order its acquisitions. [`Dinner`] seats everyone, lets a
//! [`Watchdog`] decide whether the table froze, and tears a frozen table down.

pub mod config;
pub mod error;
pub mod event;
pub mod philosopher;
pub mod ring;
pub mod seat;
pub mod strategy;
pub mod table;
pub mod watchdog;

pub use config::DinnerConfig;
pub use error::{Error, Result};
pub use event::{Event, EventKind, EventSink, Journal, PhilosopherState};
pub use philosopher::{Philosopher, Timing};
pub use ring::ResourceRing;
pub use seat::Seat;
pub use strategy::Strategy;
pub use table::{Dinner, Outcome};
pub use watchdog::{Verdict, Watchdog};
