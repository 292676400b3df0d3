use std::time::Duration;

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Oracle
    pub gemini_api_key: String,
    pub gemini_model: String,

    // Frames
    pub frame_dir: String,

    // Analysis
    pub asset: String,
    /// Candle length in minutes. One analysis attempt per candle.
    pub timeframe_minutes: u32,
    /// How far before each candle close the analysis fires.
    pub trigger_offset: Duration,
    /// Minimum spacing between consecutive oracle calls.
    pub oracle_cooldown: Duration,
    /// Tick period of the low-latency live loop.
    pub live_interval: Duration,
    /// Whether the live loop runs alongside the candle loop.
    pub live_mode: bool,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            gemini_api_key: required_env("GEMINI_API_KEY"),
            gemini_model: optional_env("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            frame_dir: optional_env("FRAME_DIR").unwrap_or_else(|| "frames".to_string()),
            asset: optional_env("ASSET").unwrap_or_else(|| "EURUSD".to_string()),
            timeframe_minutes: parse_env("TIMEFRAME_MINUTES", 1),
            trigger_offset: Duration::from_secs(parse_env("TRIGGER_OFFSET_SECS", 5)),
            oracle_cooldown: Duration::from_millis(parse_env("ORACLE_COOLDOWN_MS", 6000)),
            live_interval: Duration::from_millis(parse_env("LIVE_INTERVAL_MS", 1000)),
            live_mode: optional_env("LIVE_MODE")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// Candle duration as wall-clock time.
    pub fn timeframe(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeframe_minutes) * 60)
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    optional_env(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
