use std::time::Duration;

/// Delay until the next trigger point: `offset_before_close` before a candle
/// boundary.
///
/// If the current candle's trigger window has already passed, the delay
/// rolls into the next candle rather than firing late inside this one.
/// For all `0 <= offset < period` the result satisfies `0 <= delay < period`.
pub fn initial_delay(now_ms: u64, period: Duration, offset_before_close: Duration) -> Duration {
    let period_ms = period.as_millis() as i64;
    assert!(period_ms > 0, "candle period must be positive");
    let offset_ms = (offset_before_close.as_millis() as i64) % period_ms;

    let elapsed = (now_ms % period_ms as u64) as i64;
    let delay = (period_ms - elapsed - offset_ms).rem_euclid(period_ms);
    Duration::from_millis(delay as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn fires_offset_before_the_boundary() {
        // 10s into a 1-minute candle, 5s trigger offset: fire in 45s.
        let delay = initial_delay(10_000, MINUTE, Duration::from_secs(5));
        assert_eq!(delay, Duration::from_secs(45));
    }

    #[test]
    fn rolls_into_next_candle_when_window_passed() {
        // 58s into the candle: the 5s-before-close point is behind us, so
        // the first fire lands 5s before the NEXT close.
        let delay = initial_delay(58_000, MINUTE, Duration::from_secs(5));
        assert_eq!(delay, Duration::from_secs(57));
    }

    #[test]
    fn exactly_on_the_trigger_point_fires_now() {
        let delay = initial_delay(55_000, MINUTE, Duration::from_secs(5));
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn at_boundary_with_zero_offset_fires_now() {
        let delay = initial_delay(600_000, MINUTE, Duration::ZERO);
        assert_eq!(delay, Duration::ZERO);
    }
}
