//! Chat panel models

use uuid::Uuid;

/// Speaker name used for the opening message
pub const USER_SPEAKER: &str = "User";

/// A persona on the analyst panel
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    pub name: String,
    pub system_message: String,
}

impl AgentSpec {
    pub fn new(name: &str, system_message: &str) -> Self {
        Self {
            name: name.to_string(),
            system_message: system_message.to_string(),
        }
    }

    /// The stock analyst and data scientist personas
    pub fn default_panel() -> Vec<AgentSpec> {
        vec![
            AgentSpec::new(
                "StockAnalyst",
                "You are a stock market analyst. Analyze data and provide insights.",
            ),
            AgentSpec::new(
                "DataScientist",
                "You are a data scientist. Create visualizations and perform statistical analysis.",
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub speaker: String,
    pub content: String,
}

/// Every message exchanged during one panel session, in order
#[derive(Debug, Clone)]
pub struct Transcript {
    pub id: Uuid,
    pub messages: Vec<ChatMessage>,
}
