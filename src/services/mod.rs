pub mod analysis_service;
pub mod chart_service;
pub mod chat_service;
pub mod metrics_service;

pub use analysis_service::{analyze_stock, StockAnalysis};
pub use chat_service::{format_transcript, ChatService};
pub use metrics_service::format_report;
