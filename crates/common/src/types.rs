use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One fixed-duration OHLC candle plus the derived shape features the
/// strategy rules consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Distance from the body top to the high. Never negative.
    pub upper_wick: f64,
    /// Distance from the body bottom to the low. Never negative.
    pub lower_wick: f64,
    /// `|close - open|`.
    pub body: f64,
    pub is_engulfing: bool,
    pub is_pin_bar: bool,
    pub is_doji: bool,
    pub is_hammer: bool,
    /// Current volume over average volume.
    pub volume_ratio: f64,
    pub is_fair_value_gap: Option<bool>,
    pub close_inside_gap: Option<bool>,
    pub is_bounce: Option<bool>,
}

impl Candle {
    /// Build a plain candle from OHLC values, deriving wicks and body.
    /// Shape flags default to false and must be set by the extractor.
    pub fn from_ohlc(open: f64, high: f64, low: f64, close: f64) -> Self {
        let body_top = open.max(close);
        let body_bottom = open.min(close);
        Self {
            open,
            high,
            low,
            close,
            upper_wick: (high - body_top).max(0.0),
            lower_wick: (body_bottom - low).max(0.0),
            body: (close - open).abs(),
            is_engulfing: false,
            is_pin_bar: false,
            is_doji: false,
            is_hammer: false,
            volume_ratio: 1.0,
            is_fair_value_gap: None,
            close_inside_gap: None,
            is_bounce: None,
        }
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Full candle range, high to low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// A supply/demand zone drawn on the chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub high: f64,
    pub low: f64,
}

impl Zone {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.low && price <= self.high
    }
}

/// Buy-side and sell-side order block levels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBlocks {
    pub buy: Vec<f64>,
    pub sell: Vec<f64>,
}

/// Normalized view of the chart at one instant, as extracted by the oracle.
///
/// `candles` runs oldest to newest; the last element is the current candle.
/// Optional fields may be missing from a given extraction; rules that need
/// them fail closed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub asset: String,
    pub candles: Vec<Candle>,
    /// Recent local maxima, oldest to newest.
    pub swing_highs: Vec<f64>,
    /// Recent local minima, oldest to newest.
    pub swing_lows: Vec<f64>,
    pub rsi_history: Option<Vec<f64>>,
    pub delta_history: Option<Vec<f64>>,
    pub sar_history: Option<Vec<f64>>,
    pub fib_levels: Option<Vec<f64>>,
    pub supply_demand_zones: Option<Vec<Zone>>,
    pub order_blocks: Option<OrderBlocks>,
    pub vwap: Option<f64>,
    /// 3-period moving average of closes.
    pub ma3: Option<f64>,
}

impl MarketSnapshot {
    /// The current candle. `None` only on a structurally invalid snapshot.
    pub fn last_candle(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// A snapshot is usable only if the oracle extracted at least one candle.
    pub fn validate(&self) -> Result<()> {
        if self.candles.is_empty() {
            return Err(Error::InvalidSnapshot(
                "extraction returned no candles".into(),
            ));
        }
        Ok(())
    }
}

/// Trade direction of an emitted signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// What an entry rule concluded: an actionable direction, or stand aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Long,
    Short,
    Wait,
}

impl Verdict {
    pub fn direction(self) -> Option<Direction> {
        match self {
            Verdict::Long => Some(Direction::Long),
            Verdict::Short => Some(Direction::Short),
            Verdict::Wait => None,
        }
    }
}

impl From<Direction> for Verdict {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Long => Verdict::Long,
            Direction::Short => Verdict::Short,
        }
    }
}

/// Whether a signal should be acted on at the current candle's close or at
/// the open of the next candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryTiming {
    Immediate,
    NextCandle,
}

impl std::fmt::Display for EntryTiming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryTiming::Immediate => write!(f, "immediate"),
            EntryTiming::NextCandle => write!(f, "next candle"),
        }
    }
}

/// Output unit of one evaluation cycle. Built once, handed to the sink,
/// never mutated by the engine afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub asset: String,
    pub direction: Direction,
    /// Name of the strategy that produced the signal.
    pub strategy: String,
    /// Latest close at evaluation time.
    pub price: f64,
    pub reason: String,
    pub entry_timing: EntryTiming,
    pub expiry_minutes: u32,
    pub time: DateTime<Utc>,
}

impl Signal {
    pub fn new(
        asset: impl Into<String>,
        direction: Direction,
        strategy: impl Into<String>,
        price: f64,
        reason: impl Into<String>,
        entry_timing: EntryTiming,
        expiry_minutes: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            asset: asset.into(),
            direction,
            strategy: strategy.into(),
            price,
            reason: reason.into(),
            entry_timing,
            expiry_minutes,
            time: Utc::now(),
        }
    }
}
