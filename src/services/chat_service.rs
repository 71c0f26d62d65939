use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{ChatBackend, ChatRole};
use crate::models::chat::USER_SPEAKER;
use crate::models::{AgentSpec, ChatMessage, Transcript};
use crate::utils::errors::AppError;

/// Hands a report to a fixed panel of personas and collects one reply from each
pub struct ChatService<B: ChatBackend> {
    backend: B,
    agents: Vec<AgentSpec>,
    max_round: usize,
}

impl<B: ChatBackend> ChatService<B> {
    pub fn new(backend: B, agents: Vec<AgentSpec>, max_round: usize) -> Self {
        Self {
            backend,
            agents,
            max_round,
        }
    }

    /// Run one pass over the panel with `report` as the opening message.
    ///
    /// The transcript holds at most `max_round` messages, the opening message included.
    pub async fn run(&self, report: &str) -> Result<Transcript, AppError> {
        let id = Uuid::new_v4();
        let mut messages = vec![ChatMessage {
            speaker: USER_SPEAKER.to_string(),
            content: report.to_string(),
        }];

        for agent in &self.agents {
            if messages.len() >= self.max_round {
                warn!(
                    "Chat {} reached max_round {}; {} will not reply",
                    id, self.max_round, agent.name
                );
                break;
            }

            let history = history_for(agent, &messages);
            info!("Chat {}: waiting on {}", id, agent.name);
            let reply = self.backend.complete(&agent.system_message, &history).await?;

            messages.push(ChatMessage {
                speaker: agent.name.clone(),
                content: reply,
            });
        }

        info!("Chat {} finished with {} messages", id, messages.len());
        Ok(Transcript { id, messages })
    }
}

/// Conversation as seen by `agent`: its own turns are assistant messages,
/// everyone else's are user messages tagged with the speaker's name
fn history_for(agent: &AgentSpec, messages: &[ChatMessage]) -> Vec<(ChatRole, String)> {
    messages
        .iter()
        .map(|m| {
            if m.speaker == agent.name {
                (ChatRole::Assistant, m.content.clone())
            } else {
                (ChatRole::User, format!("{}: {}", m.speaker, m.content))
            }
        })
        .collect()
}

/// Plain-text rendering of a transcript for the terminal
pub fn format_transcript(transcript: &Transcript) -> String {
    let mut output = format!("Conversation {}\n", transcript.id);
    for message in &transcript.messages {
        output.push_str(&format!("\n[{}]\n{}\n", message.speaker, message.content.trim()));
    }
    output
}
