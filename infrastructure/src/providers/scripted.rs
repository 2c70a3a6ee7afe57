//! Offline provider that answers from position-aware templates.
//!
//! Replies are a pure function of the request (prompt, system prompt,
//! temperature), so runs are reproducible and the gateway cache behaves
//! like it would against a real model. The provider understands the
//! conventions of the flow prompts: score requests, answer markers,
//! confidence lines, red-team reviews and step-back abstractions.

use agora_application::ports::provider_call::{GatewayError, ProviderCallPort, ProviderRequest};
use async_trait::async_trait;
use std::time::Duration;

/// Temperatures above this produce the alternative phrasing
const VARIANT_TEMPERATURE: f64 = 0.8;

#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    latency: Option<Duration>,
    confidence: f64,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self {
            latency: None,
            confidence: 0.85,
        }
    }
}

/// What a debate turn prompt tells us about the speaker
#[derive(Debug, Default, PartialEq)]
struct TurnContext {
    topic: Option<String>,
    position: Option<String>,
    round: Option<u32>,
    max_rounds: Option<u32>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated network latency per call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Value reported on "Confidence:" lines
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    fn reply(&self, request: &ProviderRequest) -> String {
        let prompt = request.prompt.as_str();

        if prompt.contains(r#"Reply with JSON: {"score""#) {
            return format!(r#"{{"score": {}}}"#, score_for(prompt));
        }

        let mut context = TurnContext::parse(prompt);
        if context.position.is_none()
            && let Some(system) = &request.params.system_prompt
        {
            context.position = quoted_after(system, "arguing the ");
        }

        if prompt.starts_with("You are a red team reviewer") {
            return objections(&context);
        }
        if prompt.contains("What general principles") {
            return principles(&context);
        }

        let variant = request
            .params
            .temperature
            .is_some_and(|t| t > VARIANT_TEMPERATURE);
        let mut answer = argument(&context, variant);

        if let Some(marker) = marker_instruction(prompt) {
            answer = format!(
                "{}\n{}\n{}",
                reasoning(&context, prompt),
                marker,
                answer
            );
        }
        if prompt.contains(r#""Confidence: X""#) {
            answer.push_str(&format!("\nConfidence: {:.2}", self.confidence));
        }
        answer
    }
}

#[async_trait]
impl ProviderCallPort for ScriptedProvider {
    async fn call(&self, request: &ProviderRequest) -> Result<String, GatewayError> {
        if request.prompt.trim().is_empty() {
            return Err(GatewayError::InvalidRequest("empty prompt".to_string()));
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self.reply(request))
    }
}

impl TurnContext {
    fn parse(prompt: &str) -> Self {
        let topic = prompt
            .lines()
            .find_map(|line| line.strip_prefix("Debate topic: "))
            .map(|t| t.trim().to_string());
        let position = quoted_after(prompt, "You argue the ");

        let (round, max_rounds) = prompt
            .split_once("This is round ")
            .and_then(|(_, rest)| {
                let (round, rest) = rest.split_once(" of ")?;
                let max: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                Some((round.parse().ok(), max.parse().ok()))
            })
            .unwrap_or((None, None));

        Self {
            topic,
            position,
            round,
            max_rounds,
        }
    }

    fn topic(&self) -> &str {
        self.topic.as_deref().unwrap_or("the question")
    }

    fn stance(&self) -> Stance {
        Stance::of(self.position.as_deref())
    }

    fn is_final_round(&self) -> bool {
        matches!((self.round, self.max_rounds), (Some(r), Some(m)) if r == m && m > 1)
    }
}

/// The marker in a `write "MARKER" on its own line` instruction
fn marker_instruction(prompt: &str) -> Option<String> {
    let (before, _) = prompt.rsplit_once("\" on its own line")?;
    let (_, marker) = before.rsplit_once('"')?;
    Some(marker.to_string())
}

/// The first `"quoted"` string that directly follows `prefix`
fn quoted_after(text: &str, prefix: &str) -> Option<String> {
    let (_, rest) = text.split_once(prefix)?;
    let rest = rest.strip_prefix('"')?;
    let (quoted, _) = rest.split_once('"')?;
    Some(quoted.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stance {
    For,
    Against,
    Neutral,
}

impl Stance {
    fn of(position: Option<&str>) -> Self {
        let Some(position) = position else {
            return Stance::Neutral;
        };
        let position = position.to_lowercase();
        if ["con", "against", "oppose", "no"]
            .iter()
            .any(|p| position.starts_with(p))
        {
            Stance::Against
        } else if ["pro", "for", "support", "yes"]
            .iter()
            .any(|p| position.starts_with(p))
        {
            Stance::For
        } else {
            Stance::Neutral
        }
    }
}

fn argument(context: &TurnContext, variant: bool) -> String {
    let topic = context.topic();
    let position = context.position.as_deref().unwrap_or("neutral");
    let opening = match context.round {
        Some(1) | None => "Opening argument",
        _ if context.is_final_round() => "Closing argument",
        Some(_) => "Rebuttal",
    };

    let claim = match (context.stance(), variant) {
        (Stance::For, false) => format!(
            "The case for \"{}\" rests on its benefits outweighing its costs.",
            topic
        ),
        (Stance::For, true) => format!(
            "Weighing costs against benefits, \"{}\" comes out ahead.",
            topic
        ),
        (Stance::Against, false) => format!(
            "The case against \"{}\" rests on risks the other side underestimates.",
            topic
        ),
        (Stance::Against, true) => format!(
            "The risks of \"{}\" are larger than its supporters admit.",
            topic
        ),
        (Stance::Neutral, false) => format!(
            "\"{}\" has strong considerations on both sides.",
            topic
        ),
        (Stance::Neutral, true) => format!(
            "Both sides of \"{}\" raise points worth weighing.",
            topic
        ),
    };

    let support = match context.stance() {
        Stance::For => "Evidence from comparable cases shows measurable gains, and the transition costs are one-off.",
        Stance::Against => "Comparable cases show the promised gains rarely materialize, while the costs persist.",
        Stance::Neutral => "The evidence is mixed, so the answer depends on how the trade-offs are weighted.",
    };

    format!("{} ({}): {} {}", opening, position, claim, support)
}

fn reasoning(context: &TurnContext, prompt: &str) -> String {
    format!(
        "Reasoning: the question concerns {}. The prompt is {} words long; the key trade-off is between benefits and risks.",
        context.topic(),
        prompt.split_whitespace().count()
    )
}

fn objections(context: &TurnContext) -> String {
    format!(
        "1. The answer on {} relies on favourable comparisons.\n2. It ignores second-order effects.\n3. It does not quantify its central claim.",
        context.topic()
    )
}

fn principles(context: &TurnContext) -> String {
    format!(
        "Principles for {}:\n- Weigh costs and benefits for everyone affected.\n- Prefer evidence over anecdote.\n- Consider reversibility of the decision.",
        context.topic()
    )
}

/// Deterministic 1-10 score, longer candidates score higher
fn score_for(prompt: &str) -> u32 {
    let candidate = prompt
        .split_once("Candidate answer:")
        .map(|(_, rest)| rest)
        .unwrap_or(prompt);
    let candidate = candidate
        .split_once("\n\nRate how")
        .map(|(candidate, _)| candidate)
        .unwrap_or(candidate);
    let words = candidate.split_whitespace().count() as u32;
    (words / 10).clamp(1, 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_domain::{FlowPromptTemplate, Model, PromptTemplate};

    fn request(prompt: impl Into<String>) -> ProviderRequest {
        ProviderRequest::new("scripted", Model::default(), prompt)
    }

    fn turn_prompt(position: &str, round: u32) -> String {
        PromptTemplate::turn_prompt("Ban cars downtown", position, round, 3, &[])
    }

    #[test]
    fn test_parses_turn_context() {
        let context = TurnContext::parse(&turn_prompt("pro", 2));
        assert_eq!(
            context,
            TurnContext {
                topic: Some("Ban cars downtown".to_string()),
                position: Some("pro".to_string()),
                round: Some(2),
                max_rounds: Some(3),
            }
        );
    }

    #[tokio::test]
    async fn test_answers_are_position_aware() {
        let provider = ScriptedProvider::new();
        let pro = provider.call(&request(turn_prompt("pro", 1))).await.unwrap();
        let con = provider.call(&request(turn_prompt("con", 1))).await.unwrap();

        assert!(pro.contains("case for \"Ban cars downtown\""));
        assert!(con.contains("case against \"Ban cars downtown\""));
        assert!(pro.starts_with("Opening argument"));
    }

    #[tokio::test]
    async fn test_position_from_system_prompt() {
        let provider = ScriptedProvider::new();
        let req = request("Should we?").with_system_prompt(PromptTemplate::turn_system("con"));
        let reply = provider.call(&req).await.unwrap();
        assert!(reply.contains("(con)"));
    }

    #[tokio::test]
    async fn test_follows_marker_instruction() {
        let provider = ScriptedProvider::new();
        let prompt =
            FlowPromptTemplate::internal_monologue(&turn_prompt("pro", 1), "FINAL ANSWER:");
        let reply = provider.call(&request(prompt)).await.unwrap();

        let (reasoning, answer) = reply.split_once("\nFINAL ANSWER:\n").unwrap();
        assert!(reasoning.starts_with("Reasoning:"));
        assert!(answer.contains("case for"));
    }

    #[tokio::test]
    async fn test_score_and_confidence_conventions() {
        let provider = ScriptedProvider::new().with_confidence(0.4);

        let score = provider
            .call(&request(FlowPromptTemplate::score_branch("Q", "a b c")))
            .await
            .unwrap();
        assert_eq!(score, r#"{"score": 1}"#);

        let confident = provider
            .call(&request(FlowPromptTemplate::confidence(&turn_prompt("con", 1))))
            .await
            .unwrap();
        assert!(confident.ends_with("\nConfidence: 0.40"));
    }

    #[tokio::test]
    async fn test_high_temperature_changes_phrasing() {
        let provider = ScriptedProvider::new();
        let cool = request(turn_prompt("pro", 1)).with_temperature(0.3);
        let hot = request(turn_prompt("pro", 1)).with_temperature(1.0);

        let a = provider.call(&cool).await.unwrap();
        assert_eq!(a, provider.call(&cool).await.unwrap());
        assert_ne!(a, provider.call(&hot).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_prompt_is_invalid() {
        let err = ScriptedProvider::new().call(&request("  ")).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));
    }

    #[test]
    fn test_stance_keywords() {
        assert_eq!(Stance::of(Some("Pro")), Stance::For);
        assert_eq!(Stance::of(Some("against")), Stance::Against);
        assert_eq!(Stance::of(Some("moderator")), Stance::Neutral);
        assert_eq!(Stance::of(None), Stance::Neutral);
    }
}
