//! Agentic flow configuration and parameter validation
//!
//! A configuration is a flow type plus a loose parameter map (as stored in
//! the `agentic_flows` table). [`AgenticFlowConfiguration::settings`] turns
//! the map into typed [`FlowSettings`]; every problem (unknown key, wrong
//! type, out-of-range value, bad regex) surfaces there, so a configuration
//! that validated once never fails to parse at execution time.

use crate::core::error::DomainError;
use crate::flow::flow_type::AgenticFlowType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default call budget per execution
pub const DEFAULT_MAX_CALLS: u32 = 32;

/// Keys accepted by every flow
const COMMON_KEYS: &[&str] = &["baseline_check", "max_calls"];

/// Flow type plus parameters (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgenticFlowConfiguration {
    #[serde(rename = "type")]
    pub flow_type: AgenticFlowType,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

impl AgenticFlowConfiguration {
    pub fn new(flow_type: AgenticFlowType) -> Self {
        Self {
            flow_type,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Validate the parameters without keeping the parsed form
    pub fn validate(&self) -> Result<(), DomainError> {
        self.settings().map(|_| ())
    }

    /// Parse the parameter map into typed settings
    pub fn settings(&self) -> Result<FlowSettings, DomainError> {
        let params = Params {
            flow: self.flow_type,
            map: &self.parameters,
        };
        params.reject_unknown_keys()?;

        let common = CommonSettings {
            baseline_check: params.bool("baseline_check", false)?,
            max_calls: params.u32_in("max_calls", DEFAULT_MAX_CALLS, 1, 1024)?,
        };

        let strategy = match self.flow_type {
            AgenticFlowType::InternalMonologue => StrategySettings::InternalMonologue {
                marker: params.non_empty_string("marker", "FINAL ANSWER:")?,
            },
            AgenticFlowType::SelfCritiqueLoop => StrategySettings::SelfCritiqueLoop {
                iterations: params.u32_in("iterations", 2, 1, 5)?,
            },
            AgenticFlowType::MultiAgentRedTeam => StrategySettings::MultiAgentRedTeam,
            AgenticFlowType::ToolCallingVerification => {
                StrategySettings::ToolCallingVerification {
                    tool_marker: params.non_empty_string("tool_marker", "TOOL_CALL:")?,
                    max_tool_calls: params.u32_in("max_tool_calls", 3, 1, 16)? as usize,
                }
            }
            AgenticFlowType::RagWithReranking => {
                let top_k = params.u32_in("top_k", 3, 1, 50)? as usize;
                let candidates = params.u32_in("candidates", 10, 1, 200)? as usize;
                if candidates < top_k {
                    return Err(params.invalid(
                        "candidates",
                        format!("must be at least top_k ({})", top_k),
                    ));
                }
                StrategySettings::RagWithReranking { top_k, candidates }
            }
            AgenticFlowType::ConfidenceScoring => StrategySettings::ConfidenceScoring {
                threshold: params.f64_in("threshold", 0.7, 0.0, 1.0)?,
                recall_below_threshold: params.bool("recall_below_threshold", true)?,
            },
            AgenticFlowType::ConstitutionalPrompting => {
                let principles = params.string_list("principles")?;
                StrategySettings::ConstitutionalPrompting {
                    principles: principles.unwrap_or_else(default_principles),
                }
            }
            AgenticFlowType::EnsembleVoting => {
                let ensemble_size = params.u32_in("ensemble_size", 3, 2, 7)? as usize;
                let temperatures = match params.f64_list("temperatures")? {
                    Some(list) => {
                        if list.len() != ensemble_size {
                            return Err(params.invalid(
                                "temperatures",
                                format!(
                                    "expected {} values, got {}",
                                    ensemble_size,
                                    list.len()
                                ),
                            ));
                        }
                        if let Some(t) = list.iter().find(|t| !(0.0..=2.0).contains(*t)) {
                            return Err(params.invalid(
                                "temperatures",
                                format!("{} is outside 0.0..=2.0", t),
                            ));
                        }
                        list
                    }
                    None => default_temperatures(ensemble_size),
                };
                StrategySettings::EnsembleVoting {
                    ensemble_size,
                    temperatures,
                    similarity_threshold: params.f64_in("similarity_threshold", 0.8, 0.0, 1.0)?,
                }
            }
            AgenticFlowType::PostProcessingRules => StrategySettings::PostProcessingRules {
                rules: params.rewrite_rules("rules")?,
                trim: params.bool("trim", true)?,
                max_length: params.optional_u32("max_length")?.map(|n| n as usize),
            },
            AgenticFlowType::TreeOfThoughts => StrategySettings::TreeOfThoughts {
                branches: params.u32_in("branches", 3, 2, 5)? as usize,
                depth: params.u32_in("depth", 1, 1, 3)?,
            },
            AgenticFlowType::StepBackPrompting => StrategySettings::StepBackPrompting,
            AgenticFlowType::PromptChaining => {
                let stages = params
                    .string_list("stages")?
                    .ok_or_else(|| params.invalid("stages", "at least one stage is required"))?;
                if stages.is_empty() {
                    return Err(params.invalid("stages", "at least one stage is required"));
                }
                if let Some(i) = stages
                    .iter()
                    .skip(1)
                    .position(|s| !s.contains(PREVIOUS_PLACEHOLDER))
                {
                    return Err(params.invalid(
                        "stages",
                        format!(
                            "stage {} is missing the {} placeholder",
                            i + 2,
                            PREVIOUS_PLACEHOLDER
                        ),
                    ));
                }
                StrategySettings::PromptChaining { stages }
            }
        };

        Ok(FlowSettings { common, strategy })
    }
}

/// Placeholder replaced by the previous stage's output
pub const PREVIOUS_PLACEHOLDER: &str = "{previous}";
/// Placeholder replaced by the original prompt
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Settings shared by every flow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommonSettings {
    /// Issue an extra unaugmented call to compare against
    pub baseline_check: bool,
    /// Provider call budget for one execution
    pub max_calls: u32,
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self {
            baseline_check: false,
            max_calls: DEFAULT_MAX_CALLS,
        }
    }
}

/// A compiled `{pattern, replacement}` rule
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub pattern: Regex,
    pub replacement: String,
}

impl RewriteRule {
    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }
}

/// Strategy-specific settings
#[derive(Debug, Clone)]
pub enum StrategySettings {
    InternalMonologue {
        marker: String,
    },
    SelfCritiqueLoop {
        iterations: u32,
    },
    MultiAgentRedTeam,
    ToolCallingVerification {
        tool_marker: String,
        max_tool_calls: usize,
    },
    RagWithReranking {
        top_k: usize,
        candidates: usize,
    },
    ConfidenceScoring {
        threshold: f64,
        recall_below_threshold: bool,
    },
    ConstitutionalPrompting {
        principles: Vec<String>,
    },
    EnsembleVoting {
        ensemble_size: usize,
        temperatures: Vec<f64>,
        similarity_threshold: f64,
    },
    PostProcessingRules {
        rules: Vec<RewriteRule>,
        trim: bool,
        max_length: Option<usize>,
    },
    TreeOfThoughts {
        branches: usize,
        depth: u32,
    },
    StepBackPrompting,
    PromptChaining {
        stages: Vec<String>,
    },
}

/// Parsed, validated configuration
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub common: CommonSettings,
    pub strategy: StrategySettings,
}

/// Principles injected when `principles` is not configured
pub fn default_principles() -> Vec<String> {
    [
        "Argue from evidence and state the evidence you rely on.",
        "Engage with the strongest form of the opposing position.",
        "Do not attack people, only arguments.",
        "Acknowledge uncertainty instead of overstating claims.",
        "Stay on the debate topic.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Evenly spread temperatures between 0.3 and 1.0
fn default_temperatures(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![0.7];
    }
    let step = 0.7 / (n - 1) as f64;
    (0..n)
        .map(|i| ((0.3 + step * i as f64) * 100.0).round() / 100.0)
        .collect()
}

fn allowed_keys(flow: AgenticFlowType) -> &'static [&'static str] {
    match flow {
        AgenticFlowType::InternalMonologue => &["marker"],
        AgenticFlowType::SelfCritiqueLoop => &["iterations"],
        AgenticFlowType::MultiAgentRedTeam => &[],
        AgenticFlowType::ToolCallingVerification => &["tool_marker", "max_tool_calls"],
        AgenticFlowType::RagWithReranking => &["top_k", "candidates"],
        AgenticFlowType::ConfidenceScoring => &["threshold", "recall_below_threshold"],
        AgenticFlowType::ConstitutionalPrompting => &["principles"],
        AgenticFlowType::EnsembleVoting => {
            &["ensemble_size", "temperatures", "similarity_threshold"]
        }
        AgenticFlowType::PostProcessingRules => &["rules", "trim", "max_length"],
        AgenticFlowType::TreeOfThoughts => &["branches", "depth"],
        AgenticFlowType::StepBackPrompting => &[],
        AgenticFlowType::PromptChaining => &["stages"],
    }
}

// ==================== Parameter access ====================

struct Params<'a> {
    flow: AgenticFlowType,
    map: &'a BTreeMap<String, Value>,
}

impl Params<'_> {
    fn invalid(&self, key: &str, reason: impl std::fmt::Display) -> DomainError {
        DomainError::config(format!("{}.{}: {}", self.flow, key, reason))
    }

    fn reject_unknown_keys(&self) -> Result<(), DomainError> {
        let allowed = allowed_keys(self.flow);
        match self
            .map
            .keys()
            .find(|k| !allowed.contains(&k.as_str()) && !COMMON_KEYS.contains(&k.as_str()))
        {
            Some(key) => Err(self.invalid(key, "unknown parameter")),
            None => Ok(()),
        }
    }

    fn bool(&self, key: &str, default: bool) -> Result<bool, DomainError> {
        match self.map.get(key) {
            None => Ok(default),
            Some(v) => v.as_bool().ok_or_else(|| self.invalid(key, "expected a boolean")),
        }
    }

    fn optional_u32(&self, key: &str) -> Result<Option<u32>, DomainError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(key, "expected a non-negative integer")),
        }
    }

    fn u32_in(&self, key: &str, default: u32, min: u32, max: u32) -> Result<u32, DomainError> {
        let value = self.optional_u32(key)?.unwrap_or(default);
        if !(min..=max).contains(&value) {
            return Err(self.invalid(key, format!("{} is outside {}..={}", value, min, max)));
        }
        Ok(value)
    }

    fn f64_in(&self, key: &str, default: f64, min: f64, max: f64) -> Result<f64, DomainError> {
        let value = match self.map.get(key) {
            None => default,
            Some(v) => v.as_f64().ok_or_else(|| self.invalid(key, "expected a number"))?,
        };
        if !(min..=max).contains(&value) {
            return Err(self.invalid(key, format!("{} is outside {}..={}", value, min, max)));
        }
        Ok(value)
    }

    fn non_empty_string(&self, key: &str, default: &str) -> Result<String, DomainError> {
        match self.map.get(key) {
            None => Ok(default.to_string()),
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
            Some(_) => Err(self.invalid(key, "expected a non-empty string")),
        }
    }

    fn string_list(&self, key: &str) -> Result<Option<Vec<String>>, DomainError> {
        let Some(value) = self.map.get(key) else {
            return Ok(None);
        };
        let items = value
            .as_array()
            .ok_or_else(|| self.invalid(key, "expected a list of strings"))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(String::from)
                    .ok_or_else(|| self.invalid(key, "expected a list of strings"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn f64_list(&self, key: &str) -> Result<Option<Vec<f64>>, DomainError> {
        let Some(value) = self.map.get(key) else {
            return Ok(None);
        };
        let items = value
            .as_array()
            .ok_or_else(|| self.invalid(key, "expected a list of numbers"))?;
        items
            .iter()
            .map(|item| {
                item.as_f64()
                    .ok_or_else(|| self.invalid(key, "expected a list of numbers"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn rewrite_rules(&self, key: &str) -> Result<Vec<RewriteRule>, DomainError> {
        let Some(value) = self.map.get(key) else {
            return Ok(Vec::new());
        };
        let items = value
            .as_array()
            .ok_or_else(|| self.invalid(key, "expected a list of {pattern, replacement}"))?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let pattern = item
                    .get("pattern")
                    .and_then(Value::as_str)
                    .ok_or_else(|| self.invalid(key, format!("rule {} has no pattern", i + 1)))?;
                let replacement = item
                    .get("replacement")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let pattern = Regex::new(pattern)
                    .map_err(|e| self.invalid(key, format!("rule {}: {}", i + 1, e)))?;
                Ok(RewriteRule {
                    pattern,
                    replacement,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_for_every_flow_type() {
        for flow in AgenticFlowType::ALL {
            let config = AgenticFlowConfiguration::new(flow);
            if flow == AgenticFlowType::PromptChaining {
                assert!(config.validate().is_err(), "chaining needs stages");
            } else {
                let settings = config.settings().unwrap();
                assert_eq!(settings.common.max_calls, DEFAULT_MAX_CALLS);
                assert!(!settings.common.baseline_check);
            }
        }
    }

    #[test]
    fn test_self_critique_range() {
        let ok = AgenticFlowConfiguration::new(AgenticFlowType::SelfCritiqueLoop)
            .with_param("iterations", 5);
        assert!(matches!(
            ok.settings().unwrap().strategy,
            StrategySettings::SelfCritiqueLoop { iterations: 5 }
        ));

        let too_many = AgenticFlowConfiguration::new(AgenticFlowType::SelfCritiqueLoop)
            .with_param("iterations", 6);
        let err = too_many.validate().unwrap_err();
        assert!(err.to_string().contains("self_critique_loop.iterations"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let config = AgenticFlowConfiguration::new(AgenticFlowType::InternalMonologue)
            .with_param("iterations", 2);
        assert!(matches!(
            config.validate(),
            Err(DomainError::Configuration(_))
        ));
    }

    #[test]
    fn test_ensemble_temperatures_must_match_size() {
        let config = AgenticFlowConfiguration::new(AgenticFlowType::EnsembleVoting)
            .with_param("ensemble_size", 3)
            .with_param("temperatures", json!([0.2, 0.9]));
        assert!(config.validate().is_err());

        let defaults = AgenticFlowConfiguration::new(AgenticFlowType::EnsembleVoting)
            .settings()
            .unwrap();
        match defaults.strategy {
            StrategySettings::EnsembleVoting { temperatures, .. } => {
                assert_eq!(temperatures, vec![0.3, 0.65, 1.0]);
            }
            other => panic!("unexpected settings: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_regex_fails_at_validation() {
        let config = AgenticFlowConfiguration::new(AgenticFlowType::PostProcessingRules)
            .with_param("rules", json!([{ "pattern": "(unclosed", "replacement": "" }]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rewrite_rule_applies() {
        let config = AgenticFlowConfiguration::new(AgenticFlowType::PostProcessingRules)
            .with_param("rules", json!([{ "pattern": "\\s+", "replacement": " " }]));
        let StrategySettings::PostProcessingRules { rules, trim, .. } =
            config.settings().unwrap().strategy
        else {
            panic!("wrong settings");
        };
        assert!(trim);
        assert_eq!(rules[0].apply("a   b\n c"), "a b c");
    }

    #[test]
    fn test_chaining_requires_previous_placeholder() {
        let bad = AgenticFlowConfiguration::new(AgenticFlowType::PromptChaining)
            .with_param("stages", json!(["Outline {prompt}", "Expand the outline"]));
        let err = bad.validate().unwrap_err();
        assert!(err.to_string().contains("stage 2"));

        let good = AgenticFlowConfiguration::new(AgenticFlowType::PromptChaining)
            .with_param("stages", json!(["Outline {prompt}", "Expand: {previous}"]));
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_rag_candidates_at_least_top_k() {
        let config = AgenticFlowConfiguration::new(AgenticFlowType::RagWithReranking)
            .with_param("top_k", 5)
            .with_param("candidates", 4);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serde_shape() {
        let config: AgenticFlowConfiguration = serde_json::from_value(json!({
            "type": "confidence_scoring",
            "parameters": { "threshold": 0.5 }
        }))
        .unwrap();
        assert_eq!(config.flow_type, AgenticFlowType::ConfidenceScoring);
        assert!(config.validate().is_ok());
    }
}
