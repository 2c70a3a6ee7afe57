//! Prompt templates for debate turns

/// A previous response shown to the participant taking a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub round: u32,
    pub speaker: String,
    pub position: String,
    pub content: String,
}

/// Templates for generating the prompt of one debate turn
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for a debater holding `position`
    pub fn turn_system(position: &str) -> String {
        format!(
            r#"You are a skilled debater arguing the "{}" position in a structured, multi-round debate.
Make the strongest honest case for your position. Respond directly to the arguments of the other side.
Be concise: one focused argument per turn, supported by reasoning and evidence."#,
            position
        )
    }

    /// User prompt for a debate turn
    pub fn turn_prompt(
        topic: &str,
        position: &str,
        round: u32,
        max_rounds: u32,
        transcript: &[TranscriptEntry],
    ) -> String {
        let mut prompt = format!(
            r#"Debate topic: {}

You argue the "{}" position. This is round {} of {}.
"#,
            topic, position, round, max_rounds
        );

        if transcript.is_empty() {
            prompt.push_str("\nYou open the debate. Present your opening argument.\n");
        } else {
            prompt.push_str("\nDebate so far:\n");
            for entry in transcript {
                prompt.push_str(&format!(
                    "\n--- Round {} · {} ({}) ---\n{}\n",
                    entry.round, entry.speaker, entry.position, entry.content
                ));
            }
            if round == max_rounds {
                prompt.push_str("\nThis is the final round. Give your closing argument.\n");
            } else {
                prompt.push_str("\nRespond to the strongest opposing point, then advance your case.\n");
            }
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_turn() {
        let prompt = PromptTemplate::turn_prompt("Ban cars?", "pro", 1, 3, &[]);
        assert!(prompt.contains("Ban cars?"));
        assert!(prompt.contains("round 1 of 3"));
        assert!(prompt.contains("opening argument"));
    }

    #[test]
    fn test_transcript_and_closing() {
        let transcript = vec![TranscriptEntry {
            round: 2,
            speaker: "B".to_string(),
            position: "con".to_string(),
            content: "Cars enable rural access.".to_string(),
        }];
        let prompt = PromptTemplate::turn_prompt("Ban cars?", "pro", 3, 3, &transcript);
        assert!(prompt.contains("Round 2 · B (con)"));
        assert!(prompt.contains("rural access"));
        assert!(prompt.contains("closing argument"));
    }

    #[test]
    fn test_system_mentions_position() {
        assert!(PromptTemplate::turn_system("con").contains("\"con\""));
    }
}
