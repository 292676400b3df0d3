use tracing::debug;

use common::{MarketSnapshot, Signal};

use crate::descriptor::{Candidate, Confluence, StrategyDescriptor};
use crate::strategies;

/// Ordered strategy set plus the confluence meta-strategy. Built once,
/// read-only at evaluation time; failures elsewhere in a cycle never touch
/// it.
pub struct Registry {
    strategies: Vec<StrategyDescriptor>,
    confluence: Confluence,
}

impl Registry {
    /// The built-in strategy set in priority order with the standard
    /// 3-quorum confluence.
    pub fn standard() -> Self {
        Self::new(strategies::standard(), Confluence::standard())
    }

    pub fn new(strategies: Vec<StrategyDescriptor>, confluence: Confluence) -> Self {
        for s in &strategies {
            debug!(name = s.name, "registered strategy");
        }
        Self {
            strategies,
            confluence,
        }
    }

    pub fn strategies(&self) -> &[StrategyDescriptor] {
        &self.strategies
    }

    /// Evaluate one snapshot. Emits at most one signal per cycle:
    ///
    /// 1. Every applicable ordinary strategy is evaluated (direction
    ///    pre-filter, then ALL filters, then ANY trigger) and collected
    ///    with no early exit, so confluence has full information.
    /// 2. If at least `quorum` candidates agree on a direction, the
    ///    confluence signal is emitted and nothing else is.
    /// 3. Otherwise the first candidate in registration order wins.
    /// 4. No candidates is a valid quiet cycle.
    pub fn evaluate(&self, snap: &MarketSnapshot, timeframe_minutes: u32) -> Option<Signal> {
        let last = snap.last_candle()?;
        let price = last.close;

        let mut passed: Vec<Candidate> = Vec::new();
        for strat in &self.strategies {
            if !strat.applies(&snap.asset, timeframe_minutes) {
                continue;
            }
            // Cheap pre-filter: a strategy with no actionable read this
            // cycle never gets its filters run.
            let Some(direction) = (strat.entry.direction)(snap).direction() else {
                continue;
            };
            if !strat.filters.iter().all(|f| f.passes(snap)) {
                continue;
            }
            if !strat.triggers.iter().any(|t| t.fires(snap)) {
                continue;
            }

            debug!(strategy = strat.name, %direction, "strategy passed");
            passed.push(Candidate {
                name: strat.name,
                direction,
                timing: strat.entry.timing,
                expiry_minutes: strat.expiry_minutes,
            });
        }

        if let Some((direction, contributors)) = self.confluence.agreement(&passed) {
            let reason = format!(
                "Confluence of {} strategies: {}.",
                contributors.len(),
                contributors.join(", ")
            );
            return Some(Signal::new(
                snap.asset.clone(),
                direction,
                self.confluence.name,
                price,
                reason,
                self.confluence.timing,
                self.confluence.expiry_minutes,
            ));
        }

        passed.first().map(|c| {
            Signal::new(
                snap.asset.clone(),
                c.direction,
                c.name,
                price,
                format!("{} - filters and triggers satisfied.", c.name),
                c.timing,
                c.expiry_minutes,
            )
        })
    }
}
