//! Gemini-backed implementation of the [`common::Oracle`] port: one chart
//! frame in, one normalized [`common::MarketSnapshot`] out.

pub mod client;
pub mod dto;

pub use client::GeminiOracle;
pub use dto::ChartDataDto;
