//! Model value object representing an LLM model bound to a participant

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Known LLM models (Value Object)
///
/// Participants are bound to a model; the gateway uses the model family to
/// pick cache lifetimes and default routes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    // Claude models
    ClaudeOpus45,
    ClaudeSonnet45,
    ClaudeHaiku45,
    // GPT models
    Gpt52,
    Gpt5Mini,
    Gpt41,
    // Gemini models
    Gemini3Pro,
    // Custom
    Custom(String),
}

/// Model family, used for per-family policies (cache TTL, routing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Claude,
    Gpt,
    Gemini,
    Other,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Claude => "claude",
            ModelFamily::Gpt => "gpt",
            ModelFamily::Gemini => "gemini",
            ModelFamily::Other => "other",
        }
    }

    /// Provider id that conventionally serves this family
    pub fn default_provider(&self) -> Option<&'static str> {
        match self {
            ModelFamily::Claude => Some("anthropic"),
            ModelFamily::Gpt => Some("openai"),
            ModelFamily::Gemini => Some("google"),
            ModelFamily::Other => None,
        }
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::ClaudeOpus45 => "claude-opus-4.5",
            Model::ClaudeSonnet45 => "claude-sonnet-4.5",
            Model::ClaudeHaiku45 => "claude-haiku-4.5",
            Model::Gpt52 => "gpt-5.2",
            Model::Gpt5Mini => "gpt-5-mini",
            Model::Gpt41 => "gpt-4.1",
            Model::Gemini3Pro => "gemini-3-pro-preview",
            Model::Custom(s) => s,
        }
    }

    /// Family of this model. Custom names are classified by prefix.
    pub fn family(&self) -> ModelFamily {
        match self {
            Model::ClaudeOpus45 | Model::ClaudeSonnet45 | Model::ClaudeHaiku45 => {
                ModelFamily::Claude
            }
            Model::Gpt52 | Model::Gpt5Mini | Model::Gpt41 => ModelFamily::Gpt,
            Model::Gemini3Pro => ModelFamily::Gemini,
            Model::Custom(name) => {
                let lower = name.to_lowercase();
                if lower.starts_with("claude") {
                    ModelFamily::Claude
                } else if lower.starts_with("gpt") || lower.starts_with("o1") {
                    ModelFamily::Gpt
                } else if lower.starts_with("gemini") {
                    ModelFamily::Gemini
                } else {
                    ModelFamily::Other
                }
            }
        }
    }

    /// Check if this is a Claude model
    pub fn is_claude(&self) -> bool {
        self.family() == ModelFamily::Claude
    }

    /// Check if this is a GPT model
    pub fn is_gpt(&self) -> bool {
        self.family() == ModelFamily::Gpt
    }
}

impl Default for Model {
    fn default() -> Self {
        Model::ClaudeSonnet45
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "claude-opus-4.5" => Model::ClaudeOpus45,
            "claude-sonnet-4.5" => Model::ClaudeSonnet45,
            "claude-haiku-4.5" => Model::ClaudeHaiku45,
            "gpt-5.2" => Model::Gpt52,
            "gpt-5-mini" => Model::Gpt5Mini,
            "gpt-4.1" => Model::Gpt41,
            "gemini-3-pro-preview" => Model::Gemini3Pro,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl From<&str> for Model {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(model) => model,
            Err(never) => match never {},
        }
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Model::from(s.as_str()))
    }
}
