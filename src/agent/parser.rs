//! Parser for ReAct-style model output.
//!
//! The model is asked to answer with either
//! `Action: <tool>` + `Action Input: <input>` or `Final Answer: <text>`.
//! Everything that fits neither shape is `Unparseable` with a reason the loop
//! can feed back to the model.

use std::sync::LazyLock;

use regex::Regex;

pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

const OBSERVATION_MARKER: &str = "\nObservation:";

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:[ \t]*([^\n]*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
        .expect("action pattern is valid")
});

static ACTION_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)").expect("action line pattern is valid"));

/// What the model decided to do in one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentDecision {
    Action {
        thought: String,
        tool: String,
        input: String,
    },
    FinalAnswer {
        thought: String,
        text: String,
    },
    Unparseable {
        reason: String,
    },
}

/// Parse one model turn.
pub fn parse(output: &str) -> AgentDecision {
    let text = truncate_at_observation(output);
    let includes_answer = text.contains(FINAL_ANSWER_MARKER);

    if let Some(caps) = ACTION_RE.captures(text) {
        if includes_answer {
            return AgentDecision::Unparseable {
                reason: "Parsing LLM output produced both a final answer and a parse-able action"
                    .to_string(),
            };
        }

        let tool = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        if tool.is_empty() {
            return AgentDecision::Unparseable {
                reason: "Missing tool name after 'Action:'".to_string(),
            };
        }
        let input = caps
            .get(2)
            .map(|m| m.as_str().trim().trim_matches('"').trim())
            .unwrap_or("");
        let start = caps.get(0).map(|m| m.start()).unwrap_or(0);

        return AgentDecision::Action {
            thought: clean_thought(&text[..start]),
            tool: tool.to_string(),
            input: input.to_string(),
        };
    }

    if let Some(idx) = text.rfind(FINAL_ANSWER_MARKER) {
        let answer = text[idx + FINAL_ANSWER_MARKER.len()..].trim();
        if answer.is_empty() {
            return AgentDecision::Unparseable {
                reason: "'Final Answer:' was empty".to_string(),
            };
        }
        let first = text.find(FINAL_ANSWER_MARKER).unwrap_or(idx);
        return AgentDecision::FinalAnswer {
            thought: clean_thought(&text[..first]),
            text: answer.to_string(),
        };
    }

    let reason = if ACTION_LINE_RE.is_match(text) {
        "Missing 'Action Input:' after 'Action:'"
    } else {
        "Missing 'Action:' after 'Thought:'"
    };
    AgentDecision::Unparseable {
        reason: reason.to_string(),
    }
}

/// Drop anything from a model-invented `Observation:` onwards; observations
/// only ever come from tools.
pub fn truncate_at_observation(output: &str) -> &str {
    match output.find(OBSERVATION_MARKER) {
        Some(idx) => &output[..idx],
        None => output,
    }
}

fn clean_thought(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix("Thought:").unwrap_or(text).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action_and_input() {
        let out = "I should look for news.\nAction: WebSearch\nAction Input: \"AI regulation UK\"\n";
        assert_eq!(
            parse(out),
            AgentDecision::Action {
                thought: "I should look for news.".to_string(),
                tool: "WebSearch".to_string(),
                input: "AI regulation UK".to_string(),
            }
        );
    }

    #[test]
    fn numbered_action_lines_are_accepted() {
        match parse("Thought: go\nAction 1: WebSearch\nAction 1 Input: rust 2026") {
            AgentDecision::Action { tool, input, thought } => {
                assert_eq!(tool, "WebSearch");
                assert_eq!(input, "rust 2026");
                assert_eq!(thought, "go");
            }
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[test]
    fn tool_name_stays_on_its_line() {
        match parse("Next Action: check.\nAction: WebSearch\nAction Input: AI") {
            AgentDecision::Action { thought, tool, input } => {
                assert_eq!(tool, "WebSearch");
                assert_eq!(input, "AI");
                assert_eq!(thought, "Next Action: check.");
            }
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[test]
    fn parses_multiline_final_answer() {
        let out = "Thought: I now have enough information\nFinal Answer: Big week for AI.\n\nWhat do you think?";
        assert_eq!(
            parse(out),
            AgentDecision::FinalAnswer {
                thought: "I now have enough information".to_string(),
                text: "Big week for AI.\n\nWhat do you think?".to_string(),
            }
        );
    }

    #[test]
    fn hallucinated_observation_is_ignored() {
        let out = "Action: WebSearch\nAction Input: AI\nObservation: made up\nFinal Answer: nope";
        match parse(out) {
            AgentDecision::Action { input, .. } => assert_eq!(input, "AI"),
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[test]
    fn action_and_final_answer_together_is_unparseable() {
        let out = "Action: WebSearch\nAction Input: AI\nFinal Answer: done";
        assert!(matches!(parse(out), AgentDecision::Unparseable { .. }));
    }

    #[test]
    fn reports_what_is_missing() {
        match parse("I think the answer is obvious.") {
            AgentDecision::Unparseable { reason } => assert!(reason.contains("Missing 'Action:'")),
            other => panic!("unexpected decision: {other:?}"),
        }
        match parse("Thought: search\nAction: WebSearch") {
            AgentDecision::Unparseable { reason } => assert!(reason.contains("Missing 'Action Input:'")),
            other => panic!("unexpected decision: {other:?}"),
        }
        match parse("Final Answer:   ") {
            AgentDecision::Unparseable { reason } => assert!(reason.contains("empty")),
            other => panic!("unexpected decision: {other:?}"),
        }
    }
}
