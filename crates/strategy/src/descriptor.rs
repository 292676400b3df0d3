use common::{Direction, EntryTiming, MarketSnapshot, Verdict};

use crate::{Filter, Trigger};

/// When and in which direction a passing strategy enters.
#[derive(Clone, Copy)]
pub struct EntryRule {
    pub timing: EntryTiming,
    /// Pure function of the snapshot. `Wait` means the strategy has no
    /// actionable read this cycle and is skipped before its filters run.
    pub direction: fn(&MarketSnapshot) -> Verdict,
}

/// Immutable declaration of one ordinary strategy. Declared once at
/// registry construction, read-only at evaluation time.
#[derive(Clone, Copy)]
pub struct StrategyDescriptor {
    pub name: &'static str,
    /// Minute granularities the strategy applies to. Empty means any.
    pub timeframes: &'static [u32],
    /// Asset identifiers the strategy applies to. Empty means any.
    pub instruments: &'static [&'static str],
    /// ALL must pass.
    pub filters: &'static [Filter],
    /// ANY must fire.
    pub triggers: &'static [Trigger],
    pub entry: EntryRule,
    pub expiry_minutes: u32,
}

impl StrategyDescriptor {
    pub fn applies(&self, asset: &str, timeframe_minutes: u32) -> bool {
        let tf_ok =
            self.timeframes.is_empty() || self.timeframes.contains(&timeframe_minutes);
        let asset_ok = self.instruments.is_empty()
            || self
                .instruments
                .iter()
                .any(|i| normalize(i) == normalize(asset));
        tf_ok && asset_ok
    }
}

impl std::fmt::Debug for StrategyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyDescriptor")
            .field("name", &self.name)
            .field("timeframes", &self.timeframes)
            .field("instruments", &self.instruments)
            .finish()
    }
}

/// Extractors label assets inconsistently ("EUR/USD", "eurusd", "EURUSD").
fn normalize(asset: &str) -> String {
    asset
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// A strategy whose filters and triggers all passed this cycle; the raw
/// material of the confluence check and of the final priority pick.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub name: &'static str,
    pub direction: Direction,
    pub timing: EntryTiming,
    pub expiry_minutes: u32,
}

/// The confluence meta-strategy: fires only when at least `quorum`
/// independent strategies agree on a direction in the same cycle. Held
/// apart from the ordinary strategies structurally, so the engine never
/// matches on a name.
#[derive(Debug, Clone, Copy)]
pub struct Confluence {
    pub name: &'static str,
    pub quorum: usize,
    pub timing: EntryTiming,
    pub expiry_minutes: u32,
}

impl Confluence {
    pub fn standard() -> Self {
        Self {
            name: "Confluence (3+ aligned)",
            quorum: 3,
            timing: EntryTiming::NextCandle,
            expiry_minutes: 3,
        }
    }

    /// Majority direction and its contributors, if the quorum is met.
    /// A long quorum wins a (rare) double quorum.
    pub fn agreement(&self, passed: &[Candidate]) -> Option<(Direction, Vec<&'static str>)> {
        let longs = passed
            .iter()
            .filter(|c| c.direction == Direction::Long)
            .count();
        let shorts = passed.len() - longs;

        let direction = if longs >= self.quorum && longs >= shorts {
            Direction::Long
        } else if shorts >= self.quorum {
            Direction::Short
        } else {
            return None;
        };

        let contributors = passed
            .iter()
            .filter(|c| c.direction == direction)
            .map(|c| c.name)
            .collect();
        Some((direction, contributors))
    }
}
