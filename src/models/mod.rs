//! Data models for the stock analysis pipeline
//!
//! Market data, derived statistics, chart points and chat transcripts.

pub mod bar;
pub mod chart;
pub mod chat;
pub mod metrics;
pub mod period;

// Re-export commonly used types for convenience
pub use bar::{PriceBar, PriceSeries};
pub use chart::PricePoint;
pub use chat::{AgentSpec, ChatMessage, Transcript};
pub use metrics::MetricsReport;
pub use period::LookbackPeriod;
