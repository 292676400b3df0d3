//! Strategies driven by oscillator/flow readings extracted from the chart:
//! cumulative delta, parabolic SAR and RSI divergence.

use common::{EntryTiming, MarketSnapshot, Verdict};

use crate::filter::hidden_divergence;
use crate::{EntryRule, Filter, StrategyDescriptor, Trigger};

/// Aggressive order-flow flip: cumulative delta changed sign on the last
/// two readings. Follows the new side of the flow.
pub(super) fn delta_volume() -> StrategyDescriptor {
    StrategyDescriptor {
        name: "Delta Volume",
        timeframes: &[1],
        instruments: &["EURUSD", "GBPUSD"],
        filters: &[Filter::DeltaFlip],
        triggers: &[Trigger::DeltaPresent],
        entry: EntryRule {
            timing: EntryTiming::Immediate,
            direction: follow_delta,
        },
        expiry_minutes: 1,
    }
}

/// Parabolic SAR crossed to the other side of price; follow the new trend.
pub(super) fn psar_flip() -> StrategyDescriptor {
    StrategyDescriptor {
        name: "PSAR Flip",
        timeframes: &[1, 5],
        instruments: &["EURUSD", "GBPUSD"],
        filters: &[Filter::SarFlip],
        triggers: &[Trigger::SarPresent],
        entry: EntryRule {
            timing: EntryTiming::NextCandle,
            direction: follow_sar,
        },
        expiry_minutes: 2,
    }
}

/// Hidden RSI divergence at an extreme, confirmed by an engulfing candle.
pub(super) fn saboya_divergence() -> StrategyDescriptor {
    StrategyDescriptor {
        name: "Saboya Divergence",
        timeframes: &[5],
        instruments: &["EURUSD", "GBPUSD", "USDJPY"],
        filters: &[Filter::RsiDivergence],
        triggers: &[Trigger::Engulfing],
        entry: EntryRule {
            timing: EntryTiming::NextCandle,
            direction: divergence_side,
        },
        expiry_minutes: 5,
    }
}

// ─── Direction rules ─────────────────────────────────────────────────────────

fn follow_delta(snap: &MarketSnapshot) -> Verdict {
    match snap.delta_history.as_deref().and_then(|d| d.last()) {
        Some(&last) if last > 0.0 => Verdict::Long,
        Some(_) => Verdict::Short,
        None => Verdict::Wait,
    }
}

/// SAR below price is an uptrend, above is a downtrend.
fn follow_sar(snap: &MarketSnapshot) -> Verdict {
    let Some(c) = snap.last_candle() else {
        return Verdict::Wait;
    };
    match snap.sar_history.as_deref().and_then(|s| s.last()) {
        Some(&sar) if sar < c.close => Verdict::Long,
        Some(_) => Verdict::Short,
        None => Verdict::Wait,
    }
}

fn divergence_side(snap: &MarketSnapshot) -> Verdict {
    hidden_divergence(snap)
        .map(Verdict::from)
        .unwrap_or(Verdict::Wait)
}
