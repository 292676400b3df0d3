//! Timers that drive analysis cycles.
//!
//! [`CandleScheduler`] phase-locks work to candle boundaries, firing a fixed
//! offset before each close. [`IntervalScheduler`] is the plain
//! constant-period variant used by the low-latency live loop. Both share
//! single-flight semantics: a tick that arrives while the previous cycle is
//! still running is skipped, never queued.

pub mod gate;
pub mod timing;

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use common::Result;
use gate::SingleFlight;

/// Handle to the cycle currently holding the gate, shared between the tick
/// loop that spawns it and `stop()`, which must be able to abort it.
type InFlight = Arc<Mutex<Option<JoinHandle<()>>>>;

/// One unit of repeatable work. Errors are logged by the scheduler and do
/// not stop the schedule.
#[async_trait]
pub trait Cycle: Send + Sync {
    async fn run(&self) -> Result<()>;
}

/// Runs a [`Cycle`] once per candle, a fixed offset before each close.
pub struct CandleScheduler {
    task: Option<JoinHandle<()>>,
    in_flight: InFlight,
}

impl CandleScheduler {
    pub fn new() -> Self {
        Self {
            task: None,
            in_flight: InFlight::default(),
        }
    }

    /// Start the schedule. The first run lands `offset_before_close` before
    /// the next candle boundary (or the one after, if that window has
    /// already passed); subsequent runs follow every `period`, fixed-rate.
    ///
    /// Calling `start` on a running scheduler restarts it from the current
    /// clock. Each start gets its own single-flight gate, so a permit held
    /// by a cycle from a previous incarnation can never open the new one.
    pub fn start(&mut self, work: Arc<dyn Cycle>, period: Duration, offset_before_close: Duration) {
        self.stop();

        let delay = timing::initial_delay(now_unix_ms(), period, offset_before_close);
        info!(
            delay_ms = delay.as_millis() as u64,
            period_ms = period.as_millis() as u64,
            "candle scheduler armed"
        );

        let gate = SingleFlight::new();
        let in_flight = self.in_flight.clone();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut ticker = tokio::time::interval(period);
            // Late ticks fast-forward to the next clean boundary instead of
            // firing mid-candle.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            drive(ticker, gate, work, in_flight).await;
        }));
    }

    /// Cancel the pending timer and abort the in-flight cycle, if any.
    /// Safe to call repeatedly; a later `start` re-derives its delay from
    /// the clock.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(cycle) = self.in_flight.lock().unwrap().take() {
            cycle.abort();
        }
    }
}

impl Default for CandleScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CandleScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Runs a [`Cycle`] every fixed period with no phase-lock. First run one
/// full period after `start`.
pub struct IntervalScheduler {
    task: Option<JoinHandle<()>>,
    in_flight: InFlight,
}

impl IntervalScheduler {
    pub fn new() -> Self {
        Self {
            task: None,
            in_flight: InFlight::default(),
        }
    }

    pub fn start(&mut self, work: Arc<dyn Cycle>, period: Duration) {
        self.stop();

        let gate = SingleFlight::new();
        let in_flight = self.in_flight.clone();
        self.task = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            drive(ticker, gate, work, in_flight).await;
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(cycle) = self.in_flight.lock().unwrap().take() {
            cycle.abort();
        }
    }
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Shared tick loop: one attempted run per tick, skipped outright when the
/// previous run still holds the gate. The spawned cycle's handle is parked
/// in `in_flight` so `stop()` can abort it.
async fn drive(
    mut ticker: tokio::time::Interval,
    gate: SingleFlight,
    work: Arc<dyn Cycle>,
    in_flight: InFlight,
) {
    loop {
        ticker.tick().await;
        match gate.try_acquire() {
            Some(permit) => {
                let work = work.clone();
                let cycle = tokio::spawn(async move {
                    if let Err(e) = work.run().await {
                        warn!(error = %e, "cycle failed; schedule continues");
                    }
                    drop(permit);
                });
                *in_flight.lock().unwrap() = Some(cycle);
            }
            None => {
                // Overrun: not an error, just a skipped tick.
                warn!("previous cycle still running; skipping this tick");
            }
        }
    }
}

fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as u64
}
