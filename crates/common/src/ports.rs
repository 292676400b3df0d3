use async_trait::async_trait;

use crate::{MarketSnapshot, Result, Signal};

/// One captured chart frame, ready to send to the oracle.
#[derive(Debug, Clone)]
pub struct Frame {
    /// e.g. "image/png".
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// The external model that turns a raw frame into structured market data.
///
/// Treated as untrusted, rate-limited and fallible. All calls MUST go
/// through the throttled call queue; nothing else defends the quota.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn analyze_frame(&self, frame: &Frame) -> Result<MarketSnapshot>;
}

/// Supplies chart frames to the analysis loops.
///
/// `Ok(None)` means no frame is currently available and the cycle should
/// be skipped silently.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn next_frame(&self) -> Result<Option<Frame>>;
}

/// Receives emitted signals and cycle errors. Fire and forget: the
/// pipeline never waits on acknowledgement, and the sink owns whatever
/// happens to a signal afterwards (persistence, display, outcome tracking).
pub trait SignalSink: Send + Sync {
    fn on_signal(&self, signal: &Signal);
    fn on_error(&self, error: &crate::Error);
}
