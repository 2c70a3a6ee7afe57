//! Participants and their positions

use crate::core::ids::ParticipantId;
use crate::core::model::Model;
use crate::flow::config::AgenticFlowConfiguration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a participant is a person or a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantType {
    Human,
    Ai,
}

/// A participant's stance (e.g. "pro" / "con"), normalized to lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(String);

impl Position {
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Position {
    fn from(value: &str) -> Self {
        Position::new(value)
    }
}

/// Request to join a debate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewParticipant {
    pub name: String,
    pub participant_type: ParticipantType,
    pub position: Position,
    /// Provider id used for AI turns (e.g. "anthropic")
    pub provider: Option<String>,
    pub model: Option<Model>,
    /// Agentic flow applied to this participant's automated turns
    pub flow: Option<AgenticFlowConfiguration>,
}

impl NewParticipant {
    /// An AI participant bound to a provider and model
    pub fn ai(
        name: impl Into<String>,
        position: impl Into<Position>,
        provider: impl Into<String>,
        model: Model,
    ) -> Self {
        Self {
            name: name.into(),
            participant_type: ParticipantType::Ai,
            position: position.into(),
            provider: Some(provider.into()),
            model: Some(model),
            flow: None,
        }
    }

    /// A human participant
    pub fn human(name: impl Into<String>, position: impl Into<Position>) -> Self {
        Self {
            name: name.into(),
            participant_type: ParticipantType::Human,
            position: position.into(),
            provider: None,
            model: None,
            flow: None,
        }
    }

    pub fn with_flow(mut self, flow: AgenticFlowConfiguration) -> Self {
        self.flow = Some(flow);
        self
    }
}

/// A participant registered in a debate (Entity, owned by the debate)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub participant_type: ParticipantType,
    pub position: Position,
    pub provider: Option<String>,
    pub model: Option<Model>,
    pub flow: Option<AgenticFlowConfiguration>,
    pub active: bool,
    pub response_count: u32,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    pub fn from_request(request: NewParticipant, now: DateTime<Utc>) -> Self {
        Self {
            id: ParticipantId::new(),
            name: request.name,
            participant_type: request.participant_type,
            position: request.position,
            provider: request.provider,
            model: request.model,
            flow: request.flow,
            active: true,
            response_count: 0,
            joined_at: now,
        }
    }

    pub fn is_ai(&self) -> bool {
        self.participant_type == ParticipantType::Ai
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_is_normalized() {
        assert_eq!(Position::new("  PRO "), Position::new("pro"));
        assert_eq!(Position::from("Con").as_str(), "con");
    }

    #[test]
    fn test_from_request() {
        let request = NewParticipant::ai("Alice", "pro", "anthropic", Model::ClaudeSonnet45);
        let participant = Participant::from_request(request, Utc::now());
        assert!(participant.is_ai());
        assert!(participant.active);
        assert_eq!(participant.response_count, 0);
        assert_eq!(participant.provider.as_deref(), Some("anthropic"));
    }

    #[test]
    fn test_human_has_no_binding() {
        let request = NewParticipant::human("Bob", "con");
        assert_eq!(request.participant_type, ParticipantType::Human);
        assert!(request.provider.is_none());
        assert!(request.model.is_none());
    }
}
