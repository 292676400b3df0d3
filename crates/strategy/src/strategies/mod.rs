//! The built-in strategy set, in priority order (highest first).
//!
//! Priority matters twice: when confluence does not fire, the first passing
//! strategy wins; and within a cycle every strategy is still evaluated so
//! confluence sees the full picture.

mod indicator;
mod levels;
mod price_action;

use crate::StrategyDescriptor;

pub fn standard() -> Vec<StrategyDescriptor> {
    vec![
        // Meta-read of market structure, highest priority.
        price_action::reversal_reader(),
        // Smart-money levels.
        levels::order_block(),
        price_action::liquidity_grab(),
        indicator::delta_volume(),
        levels::fair_value_gap(),
        levels::vwap_bounce(),
        indicator::psar_flip(),
        // Classic pattern plays.
        price_action::arab_traders(),
        price_action::real_traders(),
        indicator::saboya_divergence(),
        price_action::wilday_breakout(),
        levels::binary_forex_zones(),
        price_action::abanob_fakeout(),
        levels::fib_channel(),
    ]
}
