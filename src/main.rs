use clap::Parser;
use libc::SIGINT;
use philosophers::{Dinner, DinnerConfig, ResourceRing, Strategy};
use signal_hook::iterator::Signals;
use std::{
    error::Error,
    process::ExitCode,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Seat philosophers around a ring of chopsticks and see whether they all get to eat.
#[derive(Parser, Debug)]
#[command(name = "philosophers")]
struct Args {
    /// Number of philosophers, which is also the number of chopsticks.
    #[arg(short, long, default_value_t = 5)]
    seats: usize,

    /// symmetric, asymmetric, hierarchy, arbitrator or backoff.
    #[arg(long, default_value_t = Strategy::Symmetric)]
    strategy: Strategy,

    #[arg(long, default_value_t = 50)]
    think_ms: u64,

    #[arg(long, default_value_t = 10)]
    eat_ms: u64,

    /// Silence after which the table counts as frozen.
    #[arg(long, default_value_t = 500)]
    stall_ms: u64,

    #[arg(long, default_value_t = 10_000)]
    deadline_ms: u64,

    #[arg(short, long, default_value_t = 1)]
    trials: usize,
}

impl Args {
    fn config(&self) -> DinnerConfig {
        DinnerConfig::default()
            .with_seats(self.seats)
            .with_strategy(self.strategy)
            .with_think(Duration::from_millis(self.think_ms))
            .with_eat(Duration::from_millis(self.eat_ms))
            .with_stall(Duration::from_millis(self.stall_ms))
            .with_deadline(Duration::from_millis(self.deadline_ms))
    }
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let dinner = Dinner::new(args.config())?;

    // Ctrl-C interrupts whatever table is currently seated.
    let current: Arc<Mutex<Option<Arc<ResourceRing>>>> = Arc::new(Mutex::new(None));
    let stop = Arc::new(AtomicBool::new(false));
    let mut signals = Signals::new([SIGINT])?;
    {
        let current = current.clone();
        let stop = stop.clone();
        thread::spawn(move || {
            for sig in signals.forever() {
                warn!("received signal {sig}, interrupting the table");
                stop.store(true, Ordering::SeqCst);
                if let Some(ring) = current.lock().ok().and_then(|c| c.clone()) {
                    ring.interrupt();
                }
            }
        });
    }

    let mut frozen = 0;
    let mut finished = 0;
    for trial in 0..args.trials {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        let ring = Arc::new(dinner.ring()?);
        if let Ok(mut c) = current.lock() {
            *c = Some(ring.clone());
        }

        let outcome = dinner.run_on(ring);
        if outcome.verdict.is_frozen() {
            frozen += 1;
        } else {
            finished += 1;
        }
        info!(
            trial,
            done = outcome.done(),
            deadlock = outcome.is_deadlock(),
            "trial {trial}: {}",
            outcome.verdict
        );
    }

    info!(
        strategy = %args.strategy,
        seats = args.seats,
        "{finished} dinners finished, {frozen} did not"
    );
    Ok(if frozen > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}
