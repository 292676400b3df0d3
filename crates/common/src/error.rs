use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The oracle refused the call because an external quota was exceeded.
    /// Waiting resolves this; the queue cooldown is the only pacing defense.
    #[error("Oracle rate limit hit: {0}")]
    RateLimited(String),

    /// Any other oracle-side failure: transport error, malformed response.
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// The oracle answered but the result is structurally unusable.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The call queue's pump is gone; no further submissions can run.
    #[error("Call queue closed")]
    QueueClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Distinguishes "wait and it resolves itself" from everything else.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
