use serde::Deserialize;

use common::{Candle, MarketSnapshot, OrderBlocks, Zone};

/// The extraction schema the model is asked to fill, camelCase on the wire.
/// Everything beyond OHLC is optional; the model omits what it cannot read
/// off the chart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataDto {
    pub asset: Option<String>,
    #[serde(default)]
    pub candles: Vec<CandleDto>,
    #[serde(default)]
    pub swing_highs: Vec<f64>,
    #[serde(default)]
    pub swing_lows: Vec<f64>,
    pub rsi_history: Option<Vec<f64>>,
    pub delta_history: Option<Vec<f64>>,
    pub sar_history: Option<Vec<f64>>,
    pub fib_levels: Option<Vec<f64>>,
    /// `[high, low]` pairs as drawn on the chart.
    pub supply_demand_zones: Option<Vec<Vec<f64>>>,
    pub order_blocks: Option<OrderBlocksDto>,
    pub vwap: Option<f64>,
    pub ma3: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandleDto {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub upper_wick: Option<f64>,
    pub lower_wick: Option<f64>,
    pub body: Option<f64>,
    #[serde(default)]
    pub is_engulfing: bool,
    #[serde(default)]
    pub is_pin_bar: bool,
    #[serde(default)]
    pub is_doji: bool,
    #[serde(default)]
    pub is_hammer: bool,
    pub volume_ratio: Option<f64>,
    pub is_fair_value_gap: Option<bool>,
    pub close_inside_gap: Option<bool>,
    pub is_bounce: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderBlocksDto {
    #[serde(default)]
    pub buy: Vec<f64>,
    #[serde(default)]
    pub sell: Vec<f64>,
}

impl ChartDataDto {
    /// Normalize into the engine's snapshot. Missing derived candle fields
    /// are recomputed from OHLC; malformed zone pairs are dropped.
    pub fn into_snapshot(self, fallback_asset: &str) -> MarketSnapshot {
        let candles = self.candles.into_iter().map(CandleDto::into_candle).collect();

        let zones = self.supply_demand_zones.map(|zones| {
            zones
                .into_iter()
                .filter_map(|pair| match pair[..] {
                    [high, low, ..] => Some(Zone {
                        high: high.max(low),
                        low: high.min(low),
                    }),
                    _ => None,
                })
                .collect::<Vec<_>>()
        });

        MarketSnapshot {
            asset: self
                .asset
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| fallback_asset.to_string()),
            candles,
            swing_highs: self.swing_highs,
            swing_lows: self.swing_lows,
            rsi_history: self.rsi_history,
            delta_history: self.delta_history,
            sar_history: self.sar_history,
            fib_levels: self.fib_levels,
            supply_demand_zones: zones,
            order_blocks: self.order_blocks.map(|b| OrderBlocks {
                buy: b.buy,
                sell: b.sell,
            }),
            vwap: self.vwap,
            ma3: self.ma3,
        }
    }
}

impl CandleDto {
    fn into_candle(self) -> Candle {
        let mut c = Candle::from_ohlc(self.open, self.high, self.low, self.close);
        if let Some(w) = self.upper_wick {
            c.upper_wick = w.max(0.0);
        }
        if let Some(w) = self.lower_wick {
            c.lower_wick = w.max(0.0);
        }
        if let Some(b) = self.body {
            c.body = b.max(0.0);
        }
        c.is_engulfing = self.is_engulfing;
        c.is_pin_bar = self.is_pin_bar;
        c.is_doji = self.is_doji;
        c.is_hammer = self.is_hammer;
        c.volume_ratio = self.volume_ratio.unwrap_or(1.0);
        c.is_fair_value_gap = self.is_fair_value_gap;
        c.close_inside_gap = self.close_inside_gap;
        c.is_bounce = self.is_bounce;
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_extraction_parses_and_derives_shape() {
        let json = r#"{
            "asset": "EUR/USD",
            "candles": [
                {"open": 1.0850, "high": 1.0855, "low": 1.0848, "close": 1.0853}
            ],
            "swingHighs": [1.0850],
            "swingLows": []
        }"#;
        let dto: ChartDataDto = serde_json::from_str(json).unwrap();
        let snap = dto.into_snapshot("EURUSD");

        assert_eq!(snap.asset, "EUR/USD");
        assert_eq!(snap.candles.len(), 1);
        let c = &snap.candles[0];
        assert!((c.body - 0.0003).abs() < 1e-12);
        assert!(!c.is_engulfing);
        assert_eq!(c.volume_ratio, 1.0);
        assert!(snap.rsi_history.is_none());
    }

    #[test]
    fn missing_asset_falls_back_to_configured_one() {
        let json = r#"{"candles": [{"open": 1.0, "high": 1.1, "low": 0.9, "close": 1.05}]}"#;
        let dto: ChartDataDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.into_snapshot("GBPUSD").asset, "GBPUSD");
    }

    #[test]
    fn zone_pairs_are_normalized_high_low() {
        let json = r#"{
            "candles": [{"open": 1.0, "high": 1.1, "low": 0.9, "close": 1.05}],
            "supplyDemandZones": [[1.0800, 1.0820], [1.0900], []]
        }"#;
        let dto: ChartDataDto = serde_json::from_str(json).unwrap();
        let snap = dto.into_snapshot("EURUSD");
        let zones = snap.supply_demand_zones.unwrap();
        // Incomplete pairs are dropped; the swapped pair is reordered.
        assert_eq!(zones.len(), 1);
        assert!(zones[0].high > zones[0].low);
    }
}
