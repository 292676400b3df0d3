use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use common::{FrameSource, Oracle, Result, SignalSink};
use scheduler::Cycle;
use strategy::Registry;
use throttle::CallQueue;

/// One evaluation cycle: frame → throttled oracle call → snapshot
/// validation → strategy evaluation → at most one signal to the sink.
///
/// Both the candle loop and the live loop drive instances of this through
/// the SAME [`CallQueue`], so one-in-flight holds globally. Failures are
/// contained to the cycle they occur in; the immutable registry is never
/// affected.
pub struct AnalysisPipeline {
    frames: Arc<dyn FrameSource>,
    oracle: Arc<dyn Oracle>,
    queue: CallQueue,
    registry: Arc<Registry>,
    sink: Arc<dyn SignalSink>,
    timeframe_minutes: u32,
}

impl AnalysisPipeline {
    pub fn new(
        frames: Arc<dyn FrameSource>,
        oracle: Arc<dyn Oracle>,
        queue: CallQueue,
        registry: Arc<Registry>,
        sink: Arc<dyn SignalSink>,
        timeframe_minutes: u32,
    ) -> Self {
        Self {
            frames,
            oracle,
            queue,
            registry,
            sink,
            timeframe_minutes,
        }
    }
}

#[async_trait]
impl Cycle for AnalysisPipeline {
    async fn run(&self) -> Result<()> {
        let Some(frame) = self.frames.next_frame().await? else {
            debug!("no frame available; skipping cycle");
            return Ok(());
        };

        let oracle = self.oracle.clone();
        let snapshot = self
            .queue
            .submit(async move { oracle.analyze_frame(&frame).await })
            .await?;

        let snapshot = match snapshot {
            Ok(s) => s,
            Err(e) => {
                if e.is_rate_limited() {
                    warn!(error = %e, "oracle quota exhausted; queue pacing will recover");
                } else {
                    warn!(error = %e, "oracle call failed");
                }
                self.sink.on_error(&e);
                return Err(e);
            }
        };

        // Structurally incomplete extraction is a soft failure: logged,
        // no signal, the cycle ends normally.
        if let Err(e) = snapshot.validate() {
            warn!(error = %e, asset = %snapshot.asset, "discarding invalid snapshot");
            return Ok(());
        }

        match self.registry.evaluate(&snapshot, self.timeframe_minutes) {
            Some(signal) => {
                info!(
                    strategy = %signal.strategy,
                    direction = %signal.direction,
                    price = signal.price,
                    "signal emitted"
                );
                self.sink.on_signal(&signal);
            }
            None => debug!(asset = %snapshot.asset, "no strategy fired this cycle"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use common::{
        Candle, Direction, EntryTiming, Error, Frame, MarketSnapshot, Signal, Verdict,
    };
    use strategy::{Confluence, EntryRule, StrategyDescriptor, Trigger};

    struct StaticFrames {
        frame: Option<Frame>,
    }

    #[async_trait]
    impl FrameSource for StaticFrames {
        async fn next_frame(&self) -> Result<Option<Frame>> {
            Ok(self.frame.clone())
        }
    }

    enum OracleScript {
        Snapshot(MarketSnapshot),
        RateLimit,
        Failure,
    }

    struct ScriptedOracle {
        script: OracleScript,
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl Oracle for ScriptedOracle {
        async fn analyze_frame(&self, _frame: &Frame) -> Result<MarketSnapshot> {
            *self.calls.lock().unwrap() += 1;
            match &self.script {
                OracleScript::Snapshot(s) => Ok(s.clone()),
                OracleScript::RateLimit => Err(Error::RateLimited("HTTP 429".into())),
                OracleScript::Failure => Err(Error::Oracle("HTTP 500".into())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        signals: Mutex<Vec<Signal>>,
        errors: Mutex<Vec<String>>,
    }

    impl SignalSink for RecordingSink {
        fn on_signal(&self, signal: &Signal) {
            self.signals.lock().unwrap().push(signal.clone());
        }
        fn on_error(&self, error: &Error) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    fn frame() -> Frame {
        Frame::new("image/png", vec![1, 2, 3])
    }

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot {
            asset: "EURUSD".into(),
            candles: vec![Candle::from_ohlc(1.0850, 1.0853, 1.0848, 1.0852)],
            ..Default::default()
        }
    }

    fn trivial_registry() -> Arc<Registry> {
        let descriptor = StrategyDescriptor {
            name: "trivial",
            timeframes: &[],
            instruments: &[],
            filters: &[],
            triggers: &[Trigger::Always],
            entry: EntryRule {
                timing: EntryTiming::Immediate,
                direction: |_| Verdict::Long,
            },
            expiry_minutes: 1,
        };
        Arc::new(Registry::new(vec![descriptor], Confluence::standard()))
    }

    fn pipeline(
        frame: Option<Frame>,
        script: OracleScript,
        registry: Arc<Registry>,
    ) -> (AnalysisPipeline, Arc<ScriptedOracle>, Arc<RecordingSink>) {
        let oracle = Arc::new(ScriptedOracle {
            script,
            calls: Mutex::new(0),
        });
        let sink = Arc::new(RecordingSink::default());
        let queue = CallQueue::new(Duration::from_millis(10), None);
        let p = AnalysisPipeline::new(
            Arc::new(StaticFrames { frame }),
            oracle.clone(),
            queue,
            registry,
            sink.clone(),
            1,
        );
        (p, oracle, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn missing_frame_skips_silently() {
        let (p, oracle, sink) =
            pipeline(None, OracleScript::Snapshot(snapshot()), trivial_registry());
        p.run().await.unwrap();
        assert_eq!(*oracle.calls.lock().unwrap(), 0);
        assert!(sink.signals.lock().unwrap().is_empty());
        assert!(sink.errors.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn happy_path_emits_exactly_one_signal() {
        let (p, oracle, sink) = pipeline(
            Some(frame()),
            OracleScript::Snapshot(snapshot()),
            trivial_registry(),
        );
        p.run().await.unwrap();
        assert_eq!(*oracle.calls.lock().unwrap(), 1);
        let signals = sink.signals.lock().unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].strategy, "trivial");
        assert_eq!(signals[0].direction, Direction::Long);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_snapshot_is_a_soft_failure() {
        let empty = MarketSnapshot {
            asset: "EURUSD".into(),
            ..Default::default()
        };
        let (p, _oracle, sink) = pipeline(
            Some(frame()),
            OracleScript::Snapshot(empty),
            trivial_registry(),
        );
        // Cycle ends Ok: no signal, no sink error.
        p.run().await.unwrap();
        assert!(sink.signals.lock().unwrap().is_empty());
        assert!(sink.errors.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_is_surfaced_and_reported() {
        let (p, _oracle, sink) = pipeline(
            Some(frame()),
            OracleScript::RateLimit,
            trivial_registry(),
        );
        let err = p.run().await.unwrap_err();
        assert!(err.is_rate_limited());
        let errors = sink.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("rate limit"));
    }

    #[tokio::test(start_paused = true)]
    async fn oracle_failure_does_not_poison_later_cycles() {
        let (p, _oracle, sink) = pipeline(
            Some(frame()),
            OracleScript::Failure,
            trivial_registry(),
        );
        assert!(p.run().await.is_err());
        assert_eq!(sink.errors.lock().unwrap().len(), 1);

        // A fresh cycle on the same queue works fine afterwards.
        let (p2, _oracle2, sink2) = pipeline(
            Some(frame()),
            OracleScript::Snapshot(snapshot()),
            trivial_registry(),
        );
        p2.run().await.unwrap();
        assert_eq!(sink2.signals.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_market_ends_cleanly_with_no_signal() {
        let (p, _oracle, sink) = pipeline(
            Some(frame()),
            OracleScript::Snapshot(snapshot()),
            Arc::new(Registry::standard()),
        );
        p.run().await.unwrap();
        assert!(sink.signals.lock().unwrap().is_empty());
    }
}
