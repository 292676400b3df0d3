use async_trait::async_trait;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use common::{Error, Frame, MarketSnapshot, Oracle, Result};

use crate::dto::ChartDataDto;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// What the model is asked to read off the chart. The response must be the
/// bare extraction JSON (`responseMimeType` pins it).
const EXTRACTION_PROMPT: &str = "\
Extract the market structure visible in this trading chart screenshot as a \
single JSON object with fields: asset, candles (last 10, oldest first, each \
with open/high/low/close, upperWick/lowerWick/body, isEngulfing/isPinBar/\
isDoji/isHammer, volumeRatio, and when visible isFairValueGap/closeInsideGap/\
isBounce), swingHighs, swingLows, and when identifiable rsiHistory, \
deltaHistory, sarHistory, fibLevels, supplyDemandZones ([high, low] pairs), \
orderBlocks ({buy, sell}), vwap, ma3. Omit any field that is not clearly \
readable.";

/// REST client for the Gemini `generateContent` endpoint.
///
/// Callers never invoke this directly; every call goes through the
/// throttled queue, which is the only rate-limit defense.
pub struct GeminiOracle {
    api_key: String,
    model: String,
    fallback_asset: String,
    http: Client,
}

impl GeminiOracle {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        fallback_asset: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            fallback_asset: fallback_asset.into(),
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn analyze_frame(&self, frame: &Frame) -> Result<MarketSnapshot> {
        let body = json!({
            "contents": [{
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": frame.mime_type,
                            "data": BASE64_STANDARD.encode(&frame.data),
                        }
                    },
                    { "text": EXTRACTION_PROMPT }
                ]
            }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let url = format!("{BASE_URL}/models/{}:generateContent", self.model);
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_failure(status.as_u16(), &text));
        }

        let payload: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Oracle(format!("unreadable model response: {e}")))?;
        let extraction = payload
            .first_text()
            .ok_or_else(|| Error::Oracle("model response contained no text part".into()))?;

        debug!(bytes = extraction.len(), model = %self.model, "extraction received");

        let dto: ChartDataDto = serde_json::from_str(extraction)
            .map_err(|e| Error::Oracle(format!("malformed extraction JSON: {e}")))?;
        Ok(dto.into_snapshot(&self.fallback_asset))
    }
}

/// Split quota exhaustion from everything else, so callers can tell "wait
/// and retry" apart from a broken request.
fn classify_failure(status: u16, body: &str) -> Error {
    let lower = body.to_lowercase();
    if status == 429 || lower.contains("resource_exhausted") || lower.contains("quota") {
        Error::RateLimited(format!("HTTP {status}: {body}"))
    } else {
        Error::Oracle(format!("HTTP {status}: {body}"))
    }
}

// ─── Gemini response envelope ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .iter()
            .flat_map(|c| c.content.parts.iter())
            .find_map(|p| p.text.as_deref())
    }
}
