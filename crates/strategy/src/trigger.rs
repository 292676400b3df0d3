use common::MarketSnapshot;

/// One confirmation predicate. A strategy fires when ANY of its triggers
/// fires (its filters must all have passed first).
///
/// Like filters, triggers fail closed on missing optional data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// Engulfing candle or pin bar.
    EngulfingOrPin,
    Engulfing,
    /// Hammer or doji reversal candle.
    HammerOrDoji,
    /// Indecision bar: dominant wick at least `min_wick_body_ratio` of a
    /// body no larger than `max_body`.
    ReversalCandle {
        min_wick_body_ratio: f64,
        max_body: f64,
    },
    /// Breakout bar: volume at least `min_ratio` of average with a body of
    /// at least `min_body`.
    VolumeBreak { min_ratio: f64, min_body: f64 },
    /// Directional bar of at least `min_body`, not a doji.
    Ignition { min_body: f64 },
    /// Close came back inside the last swing levels after a touch.
    CloseBackInside,
    /// Any non-doji close.
    NonDoji,
    /// Price retested the inside of a fair value gap.
    GapRetest,
    /// The current candle printed a fair-value-gap imbalance.
    Imbalance,
    /// The extractor flagged a bounce off the tested level.
    Bounce,
    /// Delta history is available for the follow-the-delta entry.
    DeltaPresent,
    /// SAR history is available for the follow-the-SAR entry.
    SarPresent,
    /// Unconditional.
    Always,
}

impl Trigger {
    pub fn fires(&self, snap: &MarketSnapshot) -> bool {
        if matches!(self, Trigger::Always) {
            return true;
        }
        let Some(c) = snap.last_candle() else {
            return false;
        };

        match *self {
            Trigger::EngulfingOrPin => c.is_engulfing || c.is_pin_bar,
            Trigger::Engulfing => c.is_engulfing,
            Trigger::HammerOrDoji => c.is_hammer || c.is_doji,
            Trigger::ReversalCandle {
                min_wick_body_ratio,
                max_body,
            } => {
                c.body > 0.0
                    && c.upper_wick.max(c.lower_wick) >= c.body * min_wick_body_ratio
                    && c.body <= max_body
            }
            Trigger::VolumeBreak {
                min_ratio,
                min_body,
            } => c.volume_ratio >= min_ratio && c.body >= min_body,
            Trigger::Ignition { min_body } => c.body >= min_body && c.close != c.open,
            Trigger::CloseBackInside => {
                snap.swing_highs.last().is_some_and(|&h| c.close < h)
                    || snap.swing_lows.last().is_some_and(|&l| c.close > l)
            }
            Trigger::NonDoji => c.close != c.open,
            Trigger::GapRetest => c.close_inside_gap == Some(true),
            Trigger::Imbalance => c.is_fair_value_gap == Some(true),
            Trigger::Bounce => c.is_bounce == Some(true),
            Trigger::DeltaPresent => snap.delta_history.as_deref().is_some_and(|d| !d.is_empty()),
            Trigger::SarPresent => snap.sar_history.as_deref().is_some_and(|s| !s.is_empty()),
            Trigger::Always => true,
        }
    }
}
