//! Strategies anchored to drawn levels: order blocks, fair value gaps,
//! VWAP, supply/demand zones and fib retracements.

use common::{EntryTiming, MarketSnapshot, Verdict};

use crate::filter::fair_value_gap as fvg_direction_of;
use crate::{EntryRule, Filter, StrategyDescriptor, Trigger};

/// Retest of a prior order block (±2 pips) with an imbalance candle.
pub(super) fn order_block() -> StrategyDescriptor {
    StrategyDescriptor {
        name: "Order Block",
        timeframes: &[1, 5],
        instruments: &["EURUSD", "GBPUSD", "XAUUSD"],
        filters: &[Filter::BlockTest { tolerance: 0.0002 }],
        triggers: &[Trigger::Imbalance],
        entry: EntryRule {
            timing: EntryTiming::Immediate,
            direction: block_side,
        },
        expiry_minutes: 3,
    }
}

/// Three-candle gap waiting to fill, entered on the retest into the gap.
pub(super) fn fair_value_gap() -> StrategyDescriptor {
    StrategyDescriptor {
        name: "Fair Value Gap",
        timeframes: &[1, 5],
        instruments: &["EURUSD", "GBPUSD", "USDJPY"],
        filters: &[Filter::GapExists],
        triggers: &[Trigger::GapRetest],
        entry: EntryRule {
            timing: EntryTiming::Immediate,
            direction: gap_fill,
        },
        expiry_minutes: 3,
    }
}

/// Touch of the VWAP (±3 pips) with a flagged bounce.
pub(super) fn vwap_bounce() -> StrategyDescriptor {
    StrategyDescriptor {
        name: "VWAP Bounce",
        timeframes: &[1, 5],
        instruments: &["EURUSD", "GBPUSD"],
        filters: &[Filter::VwapTouch { tolerance: 0.0003 }],
        triggers: &[Trigger::Bounce],
        entry: EntryRule {
            timing: EntryTiming::Immediate,
            direction: vwap_side,
        },
        expiry_minutes: 3,
    }
}

/// Reversal candle printed inside a drawn supply/demand zone.
pub(super) fn binary_forex_zones() -> StrategyDescriptor {
    StrategyDescriptor {
        name: "Binary Forex Zones",
        timeframes: &[1, 5],
        instruments: &["EURUSD", "GBPUSD", "USDCHF"],
        filters: &[Filter::SupplyDemand],
        triggers: &[Trigger::HammerOrDoji],
        entry: EntryRule {
            timing: EntryTiming::NextCandle,
            direction: zone_reversal,
        },
        expiry_minutes: 5,
    }
}

/// Touch of a fib retracement level (±2 pips) confirmed by an engulfing.
pub(super) fn fib_channel() -> StrategyDescriptor {
    StrategyDescriptor {
        name: "Fib Channel",
        timeframes: &[1, 5],
        instruments: &["EURUSD", "GBPUSD"],
        filters: &[Filter::FibTouch { tolerance: 0.0002 }],
        triggers: &[Trigger::Engulfing],
        entry: EntryRule {
            timing: EntryTiming::NextCandle,
            direction: fib_side,
        },
        expiry_minutes: 5,
    }
}

// ─── Direction rules ─────────────────────────────────────────────────────────

/// A tested buy block supports price; a tested sell block caps it.
fn block_side(snap: &MarketSnapshot) -> Verdict {
    let Some(c) = snap.last_candle() else {
        return Verdict::Wait;
    };
    let Some(blocks) = snap.order_blocks.as_ref() else {
        return Verdict::Wait;
    };
    let tested_buy = blocks.buy.iter().any(|b| (c.close - b).abs() <= 0.0002);
    if tested_buy {
        Verdict::Long
    } else {
        Verdict::Short
    }
}

/// A gap below price fills upward; a gap above fills downward.
fn gap_fill(snap: &MarketSnapshot) -> Verdict {
    fvg_direction_of(&snap.candles)
        .map(Verdict::from)
        .unwrap_or(Verdict::Wait)
}

fn vwap_side(snap: &MarketSnapshot) -> Verdict {
    let (Some(c), Some(vwap)) = (snap.last_candle(), snap.vwap) else {
        return Verdict::Wait;
    };
    if c.close > vwap {
        Verdict::Long
    } else {
        Verdict::Short
    }
}

/// A hammer in a zone is bought; a doji fades the candle's own color.
fn zone_reversal(snap: &MarketSnapshot) -> Verdict {
    let Some(c) = snap.last_candle() else {
        return Verdict::Wait;
    };
    if c.is_hammer {
        Verdict::Long
    } else if c.is_bullish() {
        Verdict::Short
    } else {
        Verdict::Long
    }
}

/// Price above the touched level treats it as support, below as resistance.
fn fib_side(snap: &MarketSnapshot) -> Verdict {
    let Some(c) = snap.last_candle() else {
        return Verdict::Wait;
    };
    let Some(levels) = snap.fib_levels.as_deref() else {
        return Verdict::Wait;
    };
    match levels.iter().find(|l| (c.close - **l).abs() <= 0.0002) {
        Some(&level) if c.close > level => Verdict::Long,
        Some(_) => Verdict::Short,
        None => Verdict::Wait,
    }
}
