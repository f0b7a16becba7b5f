//! Core agent loop implementation.

use thiserror::Error;

use super::parser::{parse, truncate_at_observation, AgentDecision, FINAL_ANSWER_MARKER};
use super::prompt::{build_prompt, DEFAULT_STYLE_RULES, FINAL_ANSWER_NUDGE};
use crate::config::AgentConfig;
use crate::llm::{LlmError, ModelProvider};
use crate::tools::ToolRegistry;

/// Action recorded for a turn the parser rejected.
pub const PARSE_ERROR_ACTION: &str = "_Exception";

/// Output used when the iteration cap is hit and the extra turn gives nothing usable.
pub const ITERATION_LIMIT_MESSAGE: &str = "Agent stopped due to iteration limit.";

/// One think/act/observe step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStep {
    pub thought: String,
    pub action: String,
    pub action_input: String,
    pub observation: String,
    /// Model output for this turn, replayed in later prompts.
    pub log: String,
}

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    FinalAnswer,
    /// Cap reached; `output` is best-effort.
    IterationLimit,
}

/// Result of one loop run.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub output: String,
    pub steps: Vec<AgentStep>,
    pub termination: Termination,
    /// Model turns that named a tool (known or not).
    pub tool_rounds: usize,
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Could not parse model output after {attempts} attempts: {reason}")]
    ParseRecoveryExhausted { attempts: usize, reason: String },

    #[error("Model call failed: {0}")]
    Model(#[from] LlmError),
}

/// Bounded think/act/observe controller.
///
/// # Algorithm
/// 1. Render the prompt with the tools and every previous step
/// 2. Ask the model for its next move and parse it
/// 3. Action: run the tool, record the observation, repeat
/// 4. Final Answer: stop
/// 5. Unparseable: re-prompt with a hint, up to `max_parse_retries` times in a row
///
/// At most `max_iterations` model turns run, so at most that many tool calls.
/// Hitting the cap triggers one extra tool-less turn asking for the answer.
pub struct ReasoningLoop {
    model: ModelProvider,
    tools: ToolRegistry,
    max_iterations: usize,
    max_parse_retries: usize,
    style_rules: String,
}

impl ReasoningLoop {
    pub fn new(model: ModelProvider, tools: ToolRegistry, config: &AgentConfig) -> Self {
        Self {
            model,
            tools,
            max_iterations: config.max_iterations,
            max_parse_retries: config.max_parse_retries,
            style_rules: config
                .style_guide
                .clone()
                .unwrap_or_else(|| DEFAULT_STYLE_RULES.to_string()),
        }
    }

    /// Run the loop for a topic.
    pub async fn run(&self, topic: &str) -> Result<AgentRun, AgentError> {
        let mut steps: Vec<AgentStep> = Vec::new();
        let mut tool_rounds = 0;
        let mut parse_failures = 0;

        for iteration in 0..self.max_iterations {
            tracing::debug!(iteration = iteration + 1, "Agent iteration");

            let prompt = build_prompt(topic, &self.tools, &self.style_rules, &steps);
            let output = self.model.complete(&prompt).await?;

            match parse(&output) {
                AgentDecision::FinalAnswer { text, .. } => {
                    tracing::info!(
                        iterations = iteration + 1,
                        tool_rounds,
                        "Agent reached final answer"
                    );
                    return Ok(AgentRun {
                        output: text,
                        steps,
                        termination: Termination::FinalAnswer,
                        tool_rounds,
                    });
                }
                AgentDecision::Action {
                    thought,
                    tool,
                    input,
                } => {
                    parse_failures = 0;
                    tool_rounds += 1;
                    tracing::info!(tool = %tool, input = %input, "Agent calling tool");

                    let observation = self.invoke_tool(&tool, &input).await;
                    steps.push(AgentStep {
                        thought,
                        action: tool,
                        action_input: input,
                        observation,
                        log: truncate_at_observation(&output).to_string(),
                    });
                }
                AgentDecision::Unparseable { reason } => {
                    parse_failures += 1;
                    if parse_failures > self.max_parse_retries {
                        tracing::error!(attempts = parse_failures, reason = %reason, "Parse recovery exhausted");
                        return Err(AgentError::ParseRecoveryExhausted {
                            attempts: parse_failures,
                            reason,
                        });
                    }

                    tracing::warn!(reason = %reason, "Unparseable model output, re-prompting");
                    steps.push(AgentStep {
                        thought: String::new(),
                        action: PARSE_ERROR_ACTION.to_string(),
                        action_input: String::new(),
                        observation: parse_error_hint(&reason),
                        log: truncate_at_observation(&output).to_string(),
                    });
                }
            }
        }

        tracing::warn!(
            max_iterations = self.max_iterations,
            tool_rounds,
            "Iteration limit reached, asking for a final answer"
        );
        let output = self.force_final_answer(topic, &steps).await;

        Ok(AgentRun {
            output,
            steps,
            termination: Termination::IterationLimit,
            tool_rounds,
        })
    }

    /// Run a tool; unknown tools and tool errors become observation text so
    /// the model can react to them.
    async fn invoke_tool(&self, tool: &str, input: &str) -> String {
        if self.tools.get(tool).is_none() {
            return format!(
                "{} is not a valid tool, try one of [{}].",
                tool,
                self.tools.tool_names().join(", ")
            );
        }

        match self.tools.execute(tool, input).await {
            Ok(observation) => observation,
            Err(e) => {
                tracing::warn!(tool, error = %e, "Tool invocation failed");
                format!("Error: {}", e)
            }
        }
    }

    async fn force_final_answer(&self, topic: &str, steps: &[AgentStep]) -> String {
        let mut prompt = build_prompt(topic, &self.tools, &self.style_rules, steps);
        prompt.push_str(FINAL_ANSWER_NUDGE);

        let output = match self.model.complete(&prompt).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(error = %e, "Final answer turn failed");
                return ITERATION_LIMIT_MESSAGE.to_string();
            }
        };

        match parse(&output) {
            AgentDecision::FinalAnswer { text, .. } => text,
            AgentDecision::Unparseable { .. } => {
                let text = truncate_at_observation(&output).trim();
                if text.is_empty() || has_react_markers(text) {
                    ITERATION_LIMIT_MESSAGE.to_string()
                } else {
                    text.to_string()
                }
            }
            AgentDecision::Action { .. } => ITERATION_LIMIT_MESSAGE.to_string(),
        }
    }
}

/// Plain prose only; half-formed ReAct turns never become the post.
fn has_react_markers(text: &str) -> bool {
    ["Thought:", "Action:", "Action Input:", FINAL_ANSWER_MARKER]
        .iter()
        .any(|marker| text.contains(marker))
}

fn parse_error_hint(reason: &str) -> String {
    format!(
        "Invalid Format: {}. Reply with an 'Action:' line followed by an 'Action Input:' line, or with a 'Final Answer:' line.",
        reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{provider_with, FailingLlm, ScriptedLlm};
    use crate::tools::Tool;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const SEARCH: &str = "Thought: I need news\nAction: WebSearch\nAction Input: AI news";

    struct FakeSearch {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeSearch {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl Tool for FakeSearch {
        fn name(&self) -> &str {
            "WebSearch"
        }

        fn description(&self) -> &str {
            "Search for recent news and articles."
        }

        async fn execute(&self, input: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("search backend exploded");
            }
            Ok(format!("Found news about {} at https://news.com/story", input))
        }
    }

    fn agent(llm: Arc<ScriptedLlm>, search: Arc<FakeSearch>, max_iterations: usize) -> ReasoningLoop {
        let config = AgentConfig {
            max_iterations,
            ..AgentConfig::default()
        };
        let search: Arc<dyn Tool> = search;
        ReasoningLoop::new(provider_with(llm), ToolRegistry::new(vec![search]), &config)
    }

    #[tokio::test]
    async fn searches_then_answers() {
        let llm = Arc::new(ScriptedLlm::new(&[SEARCH, "Thought: done\nFinal Answer: AI is moving fast."]));
        let search = FakeSearch::new(false);
        let run = agent(llm.clone(), search.clone(), 5).run("AI").await.unwrap();

        assert_eq!(run.output, "AI is moving fast.");
        assert_eq!(run.termination, Termination::FinalAnswer);
        assert_eq!(run.tool_rounds, 1);
        assert_eq!(run.steps.len(), 1);
        assert_eq!(run.steps[0].action_input, "AI news");
        assert_eq!(run.steps[0].observation, "Found news about AI news at https://news.com/story");
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);

        let prompts = llm.prompts();
        assert!(prompts[1].contains("Observation: Found news about AI news"));
    }

    #[tokio::test]
    async fn iteration_cap_bounds_tool_calls_and_forces_an_answer() {
        let llm = Arc::new(ScriptedLlm::new(&[SEARCH, SEARCH, SEARCH, "Final Answer: Best effort post."]));
        let search = FakeSearch::new(false);
        let run = agent(llm.clone(), search.clone(), 3).run("AI").await.unwrap();

        assert_eq!(run.termination, Termination::IterationLimit);
        assert_eq!(run.output, "Best effort post.");
        assert_eq!(search.calls.load(Ordering::SeqCst), 3);
        assert_eq!(run.tool_rounds, 3);
        assert_eq!(llm.calls(), 4);
        assert!(llm.prompts()[3].ends_with(FINAL_ANSWER_NUDGE));
    }

    #[tokio::test]
    async fn iteration_cap_never_yields_empty_output() {
        let llm = Arc::new(ScriptedLlm::repeating(SEARCH));
        let search = FakeSearch::new(false);
        let run = agent(llm, search.clone(), 2).run("AI").await.unwrap();

        assert_eq!(run.output, ITERATION_LIMIT_MESSAGE);
        assert_eq!(search.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unprefixed_text_on_forced_turn_is_kept() {
        let llm = Arc::new(ScriptedLlm::new(&[SEARCH, "Here is a post about AI."]));
        let run = agent(llm, FakeSearch::new(false), 1).run("AI").await.unwrap();
        assert_eq!(run.output, "Here is a post about AI.");
        assert_eq!(run.termination, Termination::IterationLimit);
    }

    #[tokio::test]
    async fn half_formed_turn_after_cap_is_not_the_post() {
        for forced in ["Thought: I now know\nFinal Answer:   ", "Thought: search more\nAction: WebSearch"] {
            let llm = Arc::new(ScriptedLlm::new(&[SEARCH, forced]));
            let run = agent(llm, FakeSearch::new(false), 1).run("AI").await.unwrap();
            assert_eq!(run.output, ITERATION_LIMIT_MESSAGE, "forced turn: {forced:?}");
            assert_eq!(run.termination, Termination::IterationLimit);
        }
    }

    #[tokio::test]
    async fn recovers_from_one_parse_error() {
        let llm = Arc::new(ScriptedLlm::new(&["I am not sure.", "Final Answer: Recovered."]));
        let run = agent(llm.clone(), FakeSearch::new(false), 5).run("AI").await.unwrap();

        assert_eq!(run.output, "Recovered.");
        assert_eq!(run.steps.len(), 1);
        assert_eq!(run.steps[0].action, PARSE_ERROR_ACTION);
        assert!(llm.prompts()[1].contains("Invalid Format: Missing 'Action:'"));
    }

    #[tokio::test]
    async fn parse_failures_in_a_row_are_fatal() {
        let llm = Arc::new(ScriptedLlm::new(&["nonsense", "more nonsense"]));
        let err = agent(llm, FakeSearch::new(false), 5).run("AI").await.unwrap_err();
        assert!(matches!(err, AgentError::ParseRecoveryExhausted { attempts: 2, .. }));
    }

    #[tokio::test]
    async fn successful_parse_resets_retry_budget() {
        let llm = Arc::new(ScriptedLlm::new(&["nonsense", SEARCH, "still nonsense", "Final Answer: ok"]));
        let run = agent(llm, FakeSearch::new(false), 5).run("AI").await.unwrap();
        assert_eq!(run.output, "ok");
        assert_eq!(run.steps.len(), 3);
    }

    #[tokio::test]
    async fn unknown_tool_becomes_observation() {
        let llm = Arc::new(ScriptedLlm::new(&[
            "Action: Wikipedia\nAction Input: AI",
            "Final Answer: done",
        ]));
        let search = FakeSearch::new(false);
        let run = agent(llm, search.clone(), 5).run("AI").await.unwrap();

        assert_eq!(
            run.steps[0].observation,
            "Wikipedia is not a valid tool, try one of [WebSearch]."
        );
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn tool_errors_are_folded_into_observation() {
        let llm = Arc::new(ScriptedLlm::new(&[SEARCH, "Final Answer: done"]));
        let run = agent(llm, FakeSearch::new(true), 5).run("AI").await.unwrap();
        assert_eq!(run.steps[0].observation, "Error: search backend exploded");
    }

    #[tokio::test]
    async fn model_failure_aborts_the_run() {
        let config = AgentConfig::default();
        let search: Arc<dyn Tool> = FakeSearch::new(false);
        let agent = ReasoningLoop::new(provider_with(Arc::new(FailingLlm)), ToolRegistry::new(vec![search]), &config);
        assert!(matches!(agent.run("AI").await, Err(AgentError::Model(_))));
    }

    #[tokio::test]
    async fn custom_style_guide_reaches_the_prompt() {
        let llm = Arc::new(ScriptedLlm::new(&["Final Answer: hi"]));
        let config = AgentConfig {
            style_guide: Some("Write in haiku.".to_string()),
            ..AgentConfig::default()
        };
        let search: Arc<dyn Tool> = FakeSearch::new(false);
        ReasoningLoop::new(provider_with(llm.clone()), ToolRegistry::new(vec![search]), &config)
            .run("AI")
            .await
            .unwrap();
        assert!(llm.prompts()[0].contains("Write in haiku."));
    }
}
