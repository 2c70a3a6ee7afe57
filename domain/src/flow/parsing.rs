//! Text extraction helpers used by the flow strategies.
//!
//! Pure text pattern matching over model output, no I/O.
//!
//! | Function | Used by | Looks for |
//! |----------|---------|-----------|
//! | [`split_on_marker`] | internal_monologue | reasoning / final answer marker |
//! | [`parse_confidence`] | confidence_scoring | `Confidence: 0.8`, `80%`, `8/10` |
//! | [`parse_tool_calls`] | tool_calling_verification | `TOOL_CALL: name(args)` lines |
//! | [`parse_branch_score`] | tree_of_thoughts | numeric score 1-10 |
//! | [`similarity`] | ensemble_voting | word-set overlap |

use std::collections::BTreeSet;

/// Split `text` at the last occurrence of `marker` (ASCII case-insensitive).
///
/// Returns `(reasoning, final_answer)`. Without a marker the whole text is
/// the final answer and there is no reasoning.
pub fn split_on_marker(text: &str, marker: &str) -> (Option<String>, String) {
    let haystack = text.to_ascii_lowercase();
    let needle = marker.to_ascii_lowercase();

    match haystack.rfind(&needle) {
        Some(index) => {
            let reasoning = text[..index].trim();
            let answer = text[index + marker.len()..].trim();
            let reasoning = (!reasoning.is_empty()).then(|| reasoning.to_string());
            (reasoning, answer.to_string())
        }
        None => (None, text.trim().to_string()),
    }
}

/// Extract a self-reported confidence in `0.0..=1.0`.
///
/// Looks at the text after the last `confidence` mention and accepts
/// `0.85`, `85%`, `85` (read as percent) or `8/10`.
pub fn parse_confidence(text: &str) -> Option<f64> {
    let lower = text.to_ascii_lowercase();
    let index = lower.rfind("confidence")?;
    let tail = &text[index + "confidence".len()..];

    let token = tail
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c == ':' || c == '=' || c == '*' || c == ','))
        .find(|w| w.starts_with(|c: char| c.is_ascii_digit() || c == '.'))?;
    let token = token.trim_end_matches(['.', ')']);

    if let Some((num, den)) = token.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den <= 0.0 {
            return None;
        }
        return Some((num / den).clamp(0.0, 1.0));
    }
    if let Some(percent) = token.strip_suffix('%') {
        let value: f64 = percent.parse().ok()?;
        return Some((value / 100.0).clamp(0.0, 1.0));
    }

    let value: f64 = token.parse().ok()?;
    if value > 1.0 {
        Some((value / 100.0).clamp(0.0, 1.0))
    } else {
        Some(value.max(0.0))
    }
}

/// Remove any trailing `Confidence: ...` line from an answer
pub fn strip_confidence_line(text: &str) -> String {
    text.lines()
        .filter(|line| {
            !line
                .trim_start_matches(['*', '#', ' '])
                .to_ascii_lowercase()
                .starts_with("confidence")
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: String,
}

/// Parse lines of the form `<marker> name(arguments)` or
/// `<marker> name arguments`.
pub fn parse_tool_calls(text: &str, marker: &str) -> Vec<ToolCallRequest> {
    text.lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix(marker)?.trim();
            if rest.is_empty() {
                return None;
            }
            let (name, arguments) = match rest.find('(') {
                Some(open) if rest.ends_with(')') => {
                    (&rest[..open], &rest[open + 1..rest.len() - 1])
                }
                _ => rest.split_once(char::is_whitespace).unwrap_or((rest, "")),
            };
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(ToolCallRequest {
                name: name.to_string(),
                arguments: arguments.trim().to_string(),
            })
        })
        .collect()
}

/// Remove tool-call lines from a response
pub fn strip_tool_calls(text: &str, marker: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().starts_with(marker))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Parse a branch score in `1.0..=10.0`.
///
/// Accepts JSON `{"score": 8}`, `8/10`, `Score: 7`. Returns 5.0 when no
/// score can be found.
pub fn parse_branch_score(text: &str) -> f64 {
    if let Some(start) = text.find('{')
        && let Some(end) = text[start..].rfind('}')
        && let Ok(value) = serde_json::from_str::<serde_json::Value>(&text[start..start + end + 1])
        && let Some(score) = value.get("score").and_then(|v| v.as_f64())
    {
        return score.clamp(1.0, 10.0);
    }

    for word in text.split_whitespace() {
        if let Some(num) = word.strip_suffix("/10")
            && let Ok(num) = num.parse::<f64>()
        {
            return num.clamp(1.0, 10.0);
        }
        if let Ok(num) = word
            .trim_matches(|c: char| !c.is_ascii_digit() && c != '.')
            .trim_end_matches('.')
            .parse::<f64>()
            && (1.0..=10.0).contains(&num)
        {
            return num;
        }
    }
    5.0
}

fn word_set(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Jaccard similarity of the lowercase word sets (1.0 for two empty texts)
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = word_set(a);
    let b = word_set(b);
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let shared = a.intersection(&b).count();
    let union = a.union(&b).count();
    shared as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_marker() {
        let (reasoning, answer) =
            split_on_marker("Let me think.\nfinal answer: Cars must go.", "FINAL ANSWER:");
        assert_eq!(reasoning.as_deref(), Some("Let me think."));
        assert_eq!(answer, "Cars must go.");

        let (reasoning, answer) = split_on_marker("  just an answer ", "FINAL ANSWER:");
        assert!(reasoning.is_none());
        assert_eq!(answer, "just an answer");
    }

    #[test]
    fn test_parse_confidence_formats() {
        assert_eq!(parse_confidence("Answer.\nConfidence: 0.85"), Some(0.85));
        assert_eq!(parse_confidence("confidence = 70%"), Some(0.7));
        assert_eq!(parse_confidence("**Confidence**: 8/10"), Some(0.8));
        assert_eq!(parse_confidence("Confidence: 90"), Some(0.9));
        assert_eq!(parse_confidence("no score here"), None);
    }

    #[test]
    fn test_strip_confidence_line() {
        assert_eq!(
            strip_confidence_line("The answer.\nConfidence: 0.9"),
            "The answer."
        );
    }

    #[test]
    fn test_parse_tool_calls() {
        let text = "Checking.\nTOOL_CALL: search(urban car bans)\nTOOL_CALL: calculator 2+2\nDone.";
        let calls = parse_tool_calls(text, "TOOL_CALL:");
        assert_eq!(
            calls,
            vec![
                ToolCallRequest {
                    name: "search".to_string(),
                    arguments: "urban car bans".to_string()
                },
                ToolCallRequest {
                    name: "calculator".to_string(),
                    arguments: "2+2".to_string()
                },
            ]
        );
        assert_eq!(strip_tool_calls(text, "TOOL_CALL:"), "Checking.\nDone.");
    }

    #[test]
    fn test_parse_branch_score() {
        assert_eq!(parse_branch_score(r#"{"score": 8}"#), 8.0);
        assert_eq!(parse_branch_score("I'd give it 7/10"), 7.0);
        assert_eq!(parse_branch_score("Score: 9."), 9.0);
        assert_eq!(parse_branch_score("nothing"), 5.0);
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("Ban cars now", "ban CARS now!"), 1.0);
        assert_eq!(similarity("alpha", "beta"), 0.0);
        assert!(similarity("ban cars in cities", "ban cars") > 0.4);
    }
}
