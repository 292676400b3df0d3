//! Strategies built on raw candle structure: sweeps, rejections,
//! consolidations and fake-outs.

use common::{EntryTiming, MarketSnapshot, Verdict};

use crate::{EntryRule, Filter, StrategyDescriptor, Trigger};

/// Trend-reversal read on M1: a swing break that already retraced half,
/// the 3-period MA flipping with it, confirmed by an indecision candle.
pub(super) fn reversal_reader() -> StrategyDescriptor {
    StrategyDescriptor {
        name: "Reversal Reader",
        timeframes: &[1],
        instruments: &["EURUSD", "GBPUSD", "USDJPY", "XAUUSD"],
        filters: &[Filter::SwingBroken, Filter::Ma3Flipped],
        triggers: &[Trigger::ReversalCandle {
            min_wick_body_ratio: 2.0,
            max_body: 0.00015,
        }],
        entry: EntryRule {
            timing: EntryTiming::NextCandle,
            direction: wick_side,
        },
        expiry_minutes: 2,
    }
}

/// Stop hunt: price pierces the last swing extreme and closes at least 70%
/// back into the candle. Entry fades the sweep.
pub(super) fn liquidity_grab() -> StrategyDescriptor {
    StrategyDescriptor {
        name: "Liquidity Grab",
        timeframes: &[1],
        instruments: &["EURUSD", "GBPUSD"],
        filters: &[Filter::Sweep { min_retrace: 0.7 }],
        triggers: &[Trigger::NonDoji],
        entry: EntryRule {
            timing: EntryTiming::NextCandle,
            direction: fade_sweep,
        },
        expiry_minutes: 2,
    }
}

/// Rejection at a liquidity level (±2 pips) confirmed by an engulfing or
/// pin bar.
pub(super) fn arab_traders() -> StrategyDescriptor {
    StrategyDescriptor {
        name: "Arab Traders",
        timeframes: &[1, 5],
        instruments: &["EURUSD", "GBPUSD", "USDJPY", "XAUUSD"],
        filters: &[
            Filter::LiquidityTouch { tolerance: 0.0002 },
            Filter::Rejection {
                min_wick_body_ratio: 0.75,
            },
        ],
        triggers: &[Trigger::EngulfingOrPin],
        entry: EntryRule {
            timing: EntryTiming::NextCandle,
            direction: prior_wick_side,
        },
        expiry_minutes: 5,
    }
}

/// Double false breakout: two touches on a level, close back inside.
pub(super) fn real_traders() -> StrategyDescriptor {
    StrategyDescriptor {
        name: "Real Traders",
        timeframes: &[1, 5],
        instruments: &["EURUSD", "GBPUSD", "USDCHF", "XAUUSD"],
        filters: &[Filter::DoubleTap],
        triggers: &[Trigger::CloseBackInside],
        entry: EntryRule {
            timing: EntryTiming::Immediate,
            direction: failed_break,
        },
        expiry_minutes: 3,
    }
}

/// Consolidation squeeze broken by a high-volume directional bar.
pub(super) fn wilday_breakout() -> StrategyDescriptor {
    StrategyDescriptor {
        name: "Wilday Breakout",
        timeframes: &[1, 5],
        instruments: &["EURUSD", "GBPUSD", "XAUUSD"],
        filters: &[Filter::Consolidation {
            lookback: 5,
            max_body: 0.0002,
        }],
        triggers: &[Trigger::VolumeBreak {
            min_ratio: 2.5,
            min_body: 0.0003,
        }],
        entry: EntryRule {
            timing: EntryTiming::Immediate,
            direction: candle_color,
        },
        expiry_minutes: 3,
    }
}

/// Three consecutive fake-out wicks followed by an ignition bar.
pub(super) fn abanob_fakeout() -> StrategyDescriptor {
    StrategyDescriptor {
        name: "Abanob Fake-Out",
        timeframes: &[1, 5],
        instruments: &["EURUSD", "GBPUSD"],
        filters: &[Filter::FakeOut {
            min_wick_body_ratio: 1.5,
        }],
        triggers: &[Trigger::Ignition { min_body: 0.0003 }],
        entry: EntryRule {
            timing: EntryTiming::Immediate,
            direction: candle_color,
        },
        expiry_minutes: 3,
    }
}

// ─── Direction rules ─────────────────────────────────────────────────────────

/// Long wick below means buyers defended; above means sellers did.
fn wick_side(snap: &MarketSnapshot) -> Verdict {
    match snap.last_candle() {
        Some(c) if c.lower_wick > c.upper_wick => Verdict::Long,
        Some(_) => Verdict::Short,
        None => Verdict::Wait,
    }
}

/// Same read, but on the rejection candle before the trigger bar.
fn prior_wick_side(snap: &MarketSnapshot) -> Verdict {
    let n = snap.candles.len();
    if n < 2 {
        return Verdict::Wait;
    }
    let rejection = &snap.candles[n - 2];
    if rejection.lower_wick > rejection.upper_wick {
        Verdict::Long
    } else {
        Verdict::Short
    }
}

/// A sweep above the last swing high is sold; everything else is a swept
/// low and gets bought.
fn fade_sweep(snap: &MarketSnapshot) -> Verdict {
    let Some(c) = snap.last_candle() else {
        return Verdict::Wait;
    };
    match snap.swing_highs.last() {
        Some(&h) if c.high > h => Verdict::Short,
        _ => Verdict::Long,
    }
}

/// Close back above a swept low is long; back below a swept high is short.
fn failed_break(snap: &MarketSnapshot) -> Verdict {
    let Some(c) = snap.last_candle() else {
        return Verdict::Wait;
    };
    match snap.swing_lows.last() {
        Some(&l) if c.close > l => Verdict::Long,
        _ => Verdict::Short,
    }
}

fn candle_color(snap: &MarketSnapshot) -> Verdict {
    match snap.last_candle() {
        Some(c) if c.is_bullish() => Verdict::Long,
        Some(_) => Verdict::Short,
        None => Verdict::Wait,
    }
}
