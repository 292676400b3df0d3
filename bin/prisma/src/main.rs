use std::sync::Arc;

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use common::{Config, Error, Signal, SignalSink};
use engine::{AnalysisPipeline, DirFrameSource};
use oracle::GeminiOracle;
use scheduler::{CandleScheduler, IntervalScheduler};
use strategy::Registry;
use throttle::CallQueue;

/// Logs every emitted signal and cycle error. The place to hang real
/// persistence or notification delivery later.
struct LogSink;

impl SignalSink for LogSink {
    fn on_signal(&self, signal: &Signal) {
        match serde_json::to_string(signal) {
            Ok(json) => info!(target: "prisma::signals", %json, "SIGNAL"),
            Err(e) => error!(error = %e, "failed to serialize signal"),
        }
    }

    fn on_error(&self, e: &Error) {
        if e.is_rate_limited() {
            error!(target: "prisma::signals", error = %e, "rate limited, waiting it out");
        } else {
            error!(target: "prisma::signals", error = %e, "analysis cycle error");
        }
    }
}

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ───────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(
        asset = %cfg.asset,
        timeframe_min = cfg.timeframe_minutes,
        live_mode = cfg.live_mode,
        "prisma starting"
    );

    // ── Components ───────────────────────────────────────────────────────────
    let queue = CallQueue::new(
        cfg.oracle_cooldown,
        Some(Arc::new(|depth| {
            debug!(depth, "oracle queue depth changed");
        })),
    );
    let oracle = Arc::new(GeminiOracle::new(
        &cfg.gemini_api_key,
        &cfg.gemini_model,
        &cfg.asset,
    ));
    let frames = Arc::new(DirFrameSource::new(&cfg.frame_dir));
    let registry = Arc::new(Registry::standard());
    let sink = Arc::new(LogSink);

    let pipeline = Arc::new(AnalysisPipeline::new(
        frames,
        oracle,
        queue,
        registry,
        sink,
        cfg.timeframe_minutes,
    ));

    // ── Schedulers ───────────────────────────────────────────────────────────
    // The candle loop fires a fixed offset before each candle close; the
    // optional live loop polls on a short period. Both feed the same
    // throttled queue, so the oracle still sees at most one call per
    // cooldown.
    let mut candle_loop = CandleScheduler::new();
    candle_loop.start(pipeline.clone(), cfg.timeframe(), cfg.trigger_offset);

    let mut live_loop = IntervalScheduler::new();
    if cfg.live_mode {
        info!(interval_ms = cfg.live_interval.as_millis() as u64, "live loop enabled");
        live_loop.start(pipeline, cfg.live_interval);
    }

    info!("analysis loops started; waiting for shutdown signal");
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl-c");

    candle_loop.stop();
    live_loop.stop();
    info!("shutdown complete");
}
