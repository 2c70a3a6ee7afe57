//! Prompt templates used by the agentic flow strategies

use crate::flow::config::{PREVIOUS_PLACEHOLDER, PROMPT_PLACEHOLDER};

/// Separates the critique from the revised answer in self-critique output
pub const REVISION_MARKER: &str = "REVISED ANSWER:";

/// Templates for each augmentation step
pub struct FlowPromptTemplate;

impl FlowPromptTemplate {
    /// internal_monologue: think privately, then answer after `marker`
    pub fn internal_monologue(prompt: &str, marker: &str) -> String {
        format!(
            r#"{}

Before answering, reason step by step about the question privately.
When you are done reasoning, write "{}" on its own line followed by your final answer only."#,
            prompt, marker
        )
    }

    /// self_critique_loop: critique a draft, then revise it after
    /// [`REVISION_MARKER`]
    pub fn critique_and_revise(prompt: &str, draft: &str) -> String {
        format!(
            r#"Task:
{}

Draft answer:
{}

First critique this draft: list its factual errors, weak reasoning and missing points.
Then write "{}" on its own line followed by an improved answer that addresses the critique."#,
            prompt, draft, REVISION_MARKER
        )
    }

    /// multi_agent_red_team: attack a draft
    pub fn red_team_attack(prompt: &str, draft: &str) -> String {
        format!(
            r#"You are a red team reviewer. Find the strongest objections to the answer below.

Task:
{}

Answer under review:
{}

List the most damaging counter-arguments and weaknesses."#,
            prompt, draft
        )
    }

    /// multi_agent_red_team: defend and revise against the attack
    pub fn red_team_defend(prompt: &str, draft: &str, attack: &str) -> String {
        format!(
            r#"Task:
{}

Your answer:
{}

Objections raised by a red team:
{}

Revise your answer so that it withstands these objections. Output only the revised answer."#,
            prompt, draft, attack
        )
    }

    /// tool_calling_verification: explain the tool-call convention
    pub fn tool_instructions(prompt: &str, marker: &str, tools: &[String]) -> String {
        let available = if tools.is_empty() {
            "none".to_string()
        } else {
            tools.join(", ")
        };
        format!(
            r#"{}

You may verify factual claims with tools. Available tools: {}.
To call a tool, write a line "{} tool_name(arguments)". Then still give your best answer."#,
            prompt, available, marker
        )
    }

    /// tool_calling_verification: re-prompt with tool results
    pub fn tool_followup(prompt: &str, response: &str, results: &[(String, String)]) -> String {
        let mut out = format!(
            r#"Task:
{}

Your previous answer:
{}

Tool results:
"#,
            prompt, response
        );
        for (call, result) in results {
            out.push_str(&format!("\n--- {} ---\n{}\n", call, result));
        }
        out.push_str("\nGive your final answer, corrected where the tool results contradict it.");
        out
    }

    /// rag_with_reranking: inject retrieved context
    pub fn rag_context(prompt: &str, documents: &[String]) -> String {
        let mut out = String::from("Use the following context where it is relevant.\n");
        for (i, doc) in documents.iter().enumerate() {
            out.push_str(&format!("\n[{}] {}\n", i + 1, doc));
        }
        out.push_str(&format!("\nQuestion:\n{}", prompt));
        out
    }

    /// confidence_scoring: ask for a confidence line
    pub fn confidence(prompt: &str) -> String {
        format!(
            r#"{}

After your answer, add a final line "Confidence: X" where X is a number between 0 and 1."#,
            prompt
        )
    }

    /// confidence_scoring: retry after a low-confidence answer
    pub fn confidence_retry(prompt: &str, previous: &str, confidence: f64) -> String {
        format!(
            r#"{}

A previous attempt answered with confidence {:.2}:
{}

Reconsider carefully and give a better supported answer.
After your answer, add a final line "Confidence: X" where X is a number between 0 and 1."#,
            prompt, confidence, previous
        )
    }

    /// constitutional_prompting: principle preamble
    pub fn constitutional(prompt: &str, principles: &[String]) -> String {
        let mut out = String::from("Follow these principles in your answer:\n");
        for (i, principle) in principles.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, principle));
        }
        out.push('\n');
        out.push_str(prompt);
        out
    }

    /// tree_of_thoughts: expand one branch
    pub fn branch(prompt: &str, branch: usize, branches: usize, basis: Option<&str>) -> String {
        match basis {
            None => format!(
                r#"{}

Approach {} of {}: propose a distinct line of argument and develop it into an answer."#,
                prompt, branch, branches
            ),
            Some(basis) => format!(
                r#"{}

Current best line of argument:
{}

Refinement {} of {}: deepen or strengthen this line of argument and give the improved answer."#,
                prompt, basis, branch, branches
            ),
        }
    }

    /// tree_of_thoughts: score a candidate branch
    pub fn score_branch(prompt: &str, candidate: &str) -> String {
        format!(
            r#"Task:
{}

Candidate answer:
{}

Rate how convincing and well-supported this answer is. Reply with JSON: {{"score": N}} where N is 1-10."#,
            prompt, candidate
        )
    }

    /// step_back_prompting: abstract the question
    pub fn step_back(prompt: &str) -> String {
        format!(
            r#"Before answering the question below, step back.
What general principles or background knowledge are needed to answer it well? State them.

Question:
{}"#,
            prompt
        )
    }

    /// step_back_prompting: answer the original with the abstraction as context
    pub fn step_back_answer(prompt: &str, principles: &str) -> String {
        format!(
            r#"Relevant principles and background:
{}

Using them, answer the question:
{}"#,
            principles, prompt
        )
    }

    /// prompt_chaining: fill a stage template
    pub fn chain_stage(template: &str, prompt: &str, previous: Option<&str>) -> String {
        let filled = template.replace(PROMPT_PLACEHOLDER, prompt);
        let filled = filled.replace(PREVIOUS_PLACEHOLDER, previous.unwrap_or(""));
        if previous.is_none() && !template.contains(PROMPT_PLACEHOLDER) {
            format!("{}\n\n{}", filled, prompt)
        } else {
            filled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_stage_placeholders() {
        assert_eq!(
            FlowPromptTemplate::chain_stage("Outline: {prompt}", "ban cars?", None),
            "Outline: ban cars?"
        );
        assert_eq!(
            FlowPromptTemplate::chain_stage("Expand: {previous}", "ban cars?", Some("1. air")),
            "Expand: 1. air"
        );
    }

    #[test]
    fn test_first_stage_without_prompt_placeholder_appends_prompt() {
        let stage = FlowPromptTemplate::chain_stage("List key facts.", "ban cars?", None);
        assert!(stage.starts_with("List key facts."));
        assert!(stage.ends_with("ban cars?"));
    }

    #[test]
    fn test_constitutional_numbering() {
        let out = FlowPromptTemplate::constitutional(
            "Q",
            &["Be fair.".to_string(), "Be brief.".to_string()],
        );
        assert!(out.contains("1. Be fair."));
        assert!(out.contains("2. Be brief."));
        assert!(out.ends_with("Q"));
    }

    #[test]
    fn test_tool_instructions_mention_marker() {
        let out = FlowPromptTemplate::tool_instructions("Q", "TOOL_CALL:", &["search".to_string()]);
        assert!(out.contains("TOOL_CALL: tool_name(arguments)"));
        assert!(out.contains("search"));
    }
}
