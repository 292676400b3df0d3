use common::{Candle, Direction, MarketSnapshot};

/// One named market-structure predicate. Each variant carries its own
/// thresholds and reads exactly the snapshot slice it needs.
///
/// Every variant fails closed: missing optional data means the filter does
/// not pass, never a panic or a default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    /// Price swept beyond the last swing extreme with a long wick and
    /// closed back at least `min_retrace` of the candle range.
    Sweep { min_retrace: f64 },
    /// Close within `tolerance` of any swing high or low.
    LiquidityTouch { tolerance: f64 },
    /// Dominant wick at least `min_wick_body_ratio` of the body.
    Rejection { min_wick_body_ratio: f64 },
    /// At least two recorded touches on the same side.
    DoubleTap,
    /// Swing extreme broken by the candle's extreme, with the close already
    /// retraced half of the swing range.
    SwingBroken,
    /// Close crossed the 3-period moving average against the prior bar.
    Ma3Flipped,
    /// Hidden RSI divergence at overbought/oversold extremes.
    RsiDivergence,
    /// The last `lookback` candles all have bodies at most `max_body`.
    Consolidation { lookback: usize, max_body: f64 },
    /// The last three candles each printed a wick over
    /// `min_wick_body_ratio` of their body.
    FakeOut { min_wick_body_ratio: f64 },
    /// Close sits inside a drawn supply/demand zone.
    SupplyDemand,
    /// Close within `tolerance` of a fib retracement level.
    FibTouch { tolerance: f64 },
    /// Close within `tolerance` of a buy or sell order block.
    BlockTest { tolerance: f64 },
    /// Close within `tolerance` of the VWAP.
    VwapTouch { tolerance: f64 },
    /// A three-candle fair value gap exists at the right edge.
    GapExists,
    /// Cumulative delta flipped sign on the last two readings.
    DeltaFlip,
    /// Parabolic SAR moved to the other side of price.
    SarFlip,
}

impl Filter {
    pub fn passes(&self, snap: &MarketSnapshot) -> bool {
        let Some(c) = snap.last_candle() else {
            return false;
        };

        match *self {
            Filter::Sweep { min_retrace } => sweep(c, snap, min_retrace),
            Filter::LiquidityTouch { tolerance } => snap
                .swing_highs
                .iter()
                .chain(snap.swing_lows.iter())
                .any(|level| (c.close - level).abs() <= tolerance),
            Filter::Rejection {
                min_wick_body_ratio,
            } => c.body > 0.0 && c.upper_wick.max(c.lower_wick) / c.body >= min_wick_body_ratio,
            Filter::DoubleTap => snap.swing_highs.len() >= 2 || snap.swing_lows.len() >= 2,
            Filter::SwingBroken => swing_broken(c, snap),
            Filter::Ma3Flipped => ma3_flipped(snap),
            Filter::RsiDivergence => hidden_divergence(snap).is_some(),
            Filter::Consolidation { lookback, max_body } => {
                snap.candles.len() >= lookback
                    && snap.candles[snap.candles.len() - lookback..]
                        .iter()
                        .all(|c| c.body <= max_body)
            }
            Filter::FakeOut {
                min_wick_body_ratio,
            } => {
                snap.candles.len() >= 3
                    && snap.candles[snap.candles.len() - 3..].iter().all(|c| {
                        c.body > 0.0
                            && c.upper_wick.max(c.lower_wick) > c.body * min_wick_body_ratio
                    })
            }
            Filter::SupplyDemand => snap
                .supply_demand_zones
                .as_deref()
                .is_some_and(|zones| zones.iter().any(|z| z.contains(c.close))),
            Filter::FibTouch { tolerance } => snap
                .fib_levels
                .as_deref()
                .is_some_and(|levels| levels.iter().any(|l| (c.close - l).abs() <= tolerance)),
            Filter::BlockTest { tolerance } => snap.order_blocks.as_ref().is_some_and(|blocks| {
                blocks
                    .buy
                    .iter()
                    .chain(blocks.sell.iter())
                    .any(|b| (c.close - b).abs() <= tolerance)
            }),
            Filter::VwapTouch { tolerance } => snap
                .vwap
                .is_some_and(|vwap| (c.close - vwap).abs() <= tolerance),
            Filter::GapExists => fair_value_gap(&snap.candles).is_some(),
            Filter::DeltaFlip => snap.delta_history.as_deref().is_some_and(|deltas| {
                deltas
                    .len()
                    .checked_sub(2)
                    .map(|i| {
                        let (a, b) = (deltas[i], deltas[i + 1]);
                        (a > 0.0 && b < 0.0) || (a < 0.0 && b > 0.0)
                    })
                    .unwrap_or(false)
            }),
            Filter::SarFlip => sar_flip(snap),
        }
    }
}

fn sweep(c: &Candle, snap: &MarketSnapshot, min_retrace: f64) -> bool {
    let range = c.range();
    if range <= 0.0 {
        return false;
    }

    if let Some(&last_high) = snap.swing_highs.last() {
        if c.high > last_high {
            return (c.high - c.close) / range >= min_retrace;
        }
    }
    if let Some(&last_low) = snap.swing_lows.last() {
        if c.low < last_low {
            return (c.close - c.low) / range >= min_retrace;
        }
    }
    false
}

fn swing_broken(c: &Candle, snap: &MarketSnapshot) -> bool {
    let (Some(&last_high), Some(&last_low)) = (snap.swing_highs.last(), snap.swing_lows.last())
    else {
        return false;
    };
    let range = last_high - last_low;
    if range <= 0.0 {
        return false;
    }

    // Broken by the extreme, already half retraced by the close.
    if c.high > last_high {
        return c.close <= last_high - range * 0.5;
    }
    if c.low < last_low {
        return c.close >= last_low + range * 0.5;
    }
    false
}

fn ma3_flipped(snap: &MarketSnapshot) -> bool {
    let Some(ma3) = snap.ma3 else {
        return false;
    };
    let n = snap.candles.len();
    if n < 4 {
        return false;
    }

    let prev_ma3: f64 = snap.candles[n - 4..n - 1].iter().map(|c| c.close).sum::<f64>() / 3.0;
    let last = &snap.candles[n - 1];
    let prev = &snap.candles[n - 2];

    (last.close > ma3 && prev_ma3 <= prev.close) || (last.close < ma3 && prev_ma3 >= prev.close)
}

fn sar_flip(snap: &MarketSnapshot) -> bool {
    let Some(sar) = snap.sar_history.as_deref() else {
        return false;
    };
    let n = snap.candles.len();
    if sar.len() < 2 || n < 2 {
        return false;
    }

    let (prev_sar, cur_sar) = (sar[sar.len() - 2], sar[sar.len() - 1]);
    let (prev, cur) = (&snap.candles[n - 2], &snap.candles[n - 1]);

    let flip_up = prev_sar > prev.high && cur_sar < cur.low;
    let flip_down = prev_sar < prev.low && cur_sar > cur.high;
    flip_up || flip_down
}

/// Hidden RSI divergence on the last two bars, gated to RSI extremes.
/// Bearish: higher price high with a lower RSI above 70. Bullish: lower
/// price low with a higher RSI below 30.
pub(crate) fn hidden_divergence(snap: &MarketSnapshot) -> Option<Direction> {
    let rsi = snap.rsi_history.as_deref()?;
    let n = snap.candles.len();
    if n < 3 || rsi.len() < 3 {
        return None;
    }

    let (p2, p3) = (&snap.candles[n - 2], &snap.candles[n - 1]);
    let (r2, r3) = (rsi[rsi.len() - 2], rsi[rsi.len() - 1]);

    if p3.high > p2.high && r3 < r2 && r3 > 70.0 {
        return Some(Direction::Short);
    }
    if p3.low < p2.low && r3 > r2 && r3 < 30.0 {
        return Some(Direction::Long);
    }
    None
}

/// Three-candle fair value gap at the right edge of the window. A gap
/// below price (expected to fill upward) is long; a gap above is short.
pub(crate) fn fair_value_gap(candles: &[Candle]) -> Option<Direction> {
    if candles.len() < 3 {
        return None;
    }
    let window = &candles[candles.len() - 3..];
    let (a, c) = (&window[0], &window[2]);

    if c.low > a.high {
        return Some(Direction::Long);
    }
    if c.high < a.low {
        return Some(Direction::Short);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Candle;

    fn snap_with(candles: Vec<Candle>) -> MarketSnapshot {
        MarketSnapshot {
            asset: "EURUSD".into(),
            candles,
            ..Default::default()
        }
    }

    #[test]
    fn sweep_passes_on_deep_retrace_above_swing_high() {
        let mut snap = snap_with(vec![Candle::from_ohlc(1.0854, 1.0855, 1.08528, 1.0853)]);
        snap.swing_highs = vec![1.0850];
        assert!(Filter::Sweep { min_retrace: 0.7 }.passes(&snap));
    }

    #[test]
    fn sweep_fails_on_shallow_retrace() {
        let mut snap = snap_with(vec![Candle::from_ohlc(1.0854, 1.0855, 1.0845, 1.0853)]);
        snap.swing_highs = vec![1.0850];
        // Retrace is only (1.0855 - 1.0853) / 0.0010 = 20%.
        assert!(!Filter::Sweep { min_retrace: 0.7 }.passes(&snap));
    }

    #[test]
    fn sweep_fails_closed_without_swings() {
        let snap = snap_with(vec![Candle::from_ohlc(1.0854, 1.0855, 1.0845, 1.0853)]);
        assert!(!Filter::Sweep { min_retrace: 0.7 }.passes(&snap));
    }

    #[test]
    fn vwap_touch_fails_closed_without_vwap() {
        let snap = snap_with(vec![Candle::from_ohlc(1.0, 1.1, 0.9, 1.0)]);
        assert!(!Filter::VwapTouch { tolerance: 0.0003 }.passes(&snap));
    }

    #[test]
    fn vwap_touch_respects_tolerance() {
        let mut snap = snap_with(vec![Candle::from_ohlc(1.0851, 1.0855, 1.0848, 1.0852)]);
        snap.vwap = Some(1.0850);
        assert!(Filter::VwapTouch { tolerance: 0.0003 }.passes(&snap));
        snap.vwap = Some(1.0840);
        assert!(!Filter::VwapTouch { tolerance: 0.0003 }.passes(&snap));
    }

    #[test]
    fn delta_flip_detects_sign_change_only() {
        let mut snap = snap_with(vec![Candle::from_ohlc(1.0, 1.1, 0.9, 1.0)]);
        snap.delta_history = Some(vec![120.0, -40.0]);
        assert!(Filter::DeltaFlip.passes(&snap));
        snap.delta_history = Some(vec![120.0, 40.0]);
        assert!(!Filter::DeltaFlip.passes(&snap));
        snap.delta_history = Some(vec![-40.0]);
        assert!(!Filter::DeltaFlip.passes(&snap));
    }

    #[test]
    fn consolidation_needs_full_lookback_of_small_bodies() {
        let small = Candle::from_ohlc(1.0850, 1.0852, 1.0849, 1.0851);
        let big = Candle::from_ohlc(1.0850, 1.0860, 1.0849, 1.0858);
        let filter = Filter::Consolidation {
            lookback: 5,
            max_body: 0.0002,
        };

        let snap = snap_with(vec![small.clone(); 5]);
        assert!(filter.passes(&snap));

        let mut candles = vec![small.clone(); 4];
        candles.push(big);
        assert!(!filter.passes(&snap_with(candles)));

        assert!(!filter.passes(&snap_with(vec![small; 4])));
    }

    #[test]
    fn fair_value_gap_direction_matches_gap_side() {
        // Gap up: third candle's low clears the first candle's high.
        let gap_up = vec![
            Candle::from_ohlc(1.0800, 1.0805, 1.0795, 1.0803),
            Candle::from_ohlc(1.0803, 1.0815, 1.0803, 1.0814),
            Candle::from_ohlc(1.0814, 1.0820, 1.0810, 1.0818),
        ];
        assert_eq!(fair_value_gap(&gap_up), Some(Direction::Long));

        let gap_down = vec![
            Candle::from_ohlc(1.0820, 1.0825, 1.0815, 1.0816),
            Candle::from_ohlc(1.0816, 1.0816, 1.0800, 1.0802),
            Candle::from_ohlc(1.0802, 1.0808, 1.0798, 1.0800),
        ];
        assert_eq!(fair_value_gap(&gap_down), Some(Direction::Short));

        let no_gap = vec![
            Candle::from_ohlc(1.0800, 1.0810, 1.0795, 1.0805),
            Candle::from_ohlc(1.0805, 1.0812, 1.0800, 1.0808),
            Candle::from_ohlc(1.0808, 1.0815, 1.0805, 1.0812),
        ];
        assert_eq!(fair_value_gap(&no_gap), None);
    }

    #[test]
    fn rsi_divergence_requires_extreme_band() {
        let mut snap = snap_with(vec![
            Candle::from_ohlc(1.0800, 1.0810, 1.0795, 1.0805),
            Candle::from_ohlc(1.0805, 1.0815, 1.0800, 1.0810),
            Candle::from_ohlc(1.0810, 1.0820, 1.0805, 1.0812),
        ]);
        // Higher high with falling RSI above 70: bearish divergence.
        snap.rsi_history = Some(vec![70.0, 78.0, 74.0]);
        assert_eq!(hidden_divergence(&snap), Some(Direction::Short));
        // Same shape mid-range: no divergence.
        snap.rsi_history = Some(vec![50.0, 58.0, 54.0]);
        assert_eq!(hidden_divergence(&snap), None);
    }

    #[test]
    fn sar_flip_detects_side_change() {
        let mut snap = snap_with(vec![
            Candle::from_ohlc(1.0800, 1.0810, 1.0795, 1.0798),
            Candle::from_ohlc(1.0798, 1.0815, 1.0797, 1.0812),
        ]);
        // SAR above the first candle, below the second: flip up.
        snap.sar_history = Some(vec![1.0815, 1.0790]);
        assert!(Filter::SarFlip.passes(&snap));
        // SAR stayed above both: no flip.
        snap.sar_history = Some(vec![1.0815, 1.0820]);
        assert!(!Filter::SarFlip.passes(&snap));
    }

    #[test]
    fn block_test_checks_both_sides() {
        let mut snap = snap_with(vec![Candle::from_ohlc(1.0851, 1.0855, 1.0848, 1.0851)]);
        snap.order_blocks = Some(common::OrderBlocks {
            buy: vec![1.0850],
            sell: vec![],
        });
        assert!(Filter::BlockTest { tolerance: 0.0002 }.passes(&snap));
        snap.order_blocks = Some(common::OrderBlocks {
            buy: vec![],
            sell: vec![1.0890],
        });
        assert!(!Filter::BlockTest { tolerance: 0.0002 }.passes(&snap));
    }
}
