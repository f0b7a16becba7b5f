//! Prompt templates for the post-writing agent.

use super::AgentStep;
use crate::tools::ToolRegistry;

/// Built-in style rules for the post. Replaceable through configuration.
pub const DEFAULT_STYLE_RULES: &str = "\
FORMATTING
1. No asterisks, markdown symbols or symbol bullet points. Use simple numbered points (1., 2., 3.) or flowing paragraphs.
2. No hyphens or dashes of any kind. Use commas or full stops instead.
3. No semicolons and no ellipses.
4. Use colons sparingly and never open with phrases like \"Key points:\".

LANGUAGE (British English)
5. Be direct. Drop hedging words and stock transitions such as \"furthermore\" or \"in conclusion\".
6. Use contractions naturally and prefer plain words (use, not utilise).
7. Vary sentence length and write as if speaking to a colleague.

STRUCTURE
8. Open with a hook or a question.
9. Present 2 or 3 insights with brief commentary.
10. Close with a question or a call to action.
11. Add emojis where they suit and keep the post under 300 words.";

/// Appended on the extra turn that follows the iteration cap.
pub const FINAL_ANSWER_NUDGE: &str =
    "\n\nI now need to return a final answer based on the previous steps:";

/// Build the full agent prompt: instructions, tools, and the scratchpad of
/// previous steps.
pub fn build_prompt(topic: &str, tools: &ToolRegistry, style_rules: &str, steps: &[AgentStep]) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("{}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");
    let tool_names = tools.tool_names().join(", ");
    let scratchpad = render_scratchpad(steps);

    format!(
        r#"You are a professional social media writer and news analyst who writes in British English.

Your task:
1. Search for the most recent and relevant news about: {topic}
2. Find 2 or 3 credible sources
3. Write an engaging post that follows the style rules below

## Style Rules
{style_rules}

## Tools
You have access to the following tools:
{tool_descriptions}

Use this format:

Question: the input question
Thought: think about what to do
Action: the action to take, must be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (Thought/Action/Action Input/Observation can repeat)
Thought: I now have enough information to write the post
Final Answer: the complete post, following every style rule

Begin!

Question: {topic}
Thought:{scratchpad}"#,
        topic = topic,
        style_rules = style_rules.trim(),
        tool_descriptions = tool_descriptions,
        tool_names = tool_names,
        scratchpad = scratchpad,
    )
}

/// Previous steps in the `log / Observation / Thought` shape the model expects
/// to continue from.
pub fn render_scratchpad(steps: &[AgentStep]) -> String {
    steps
        .iter()
        .map(|step| format!("{}\nObservation: {}\nThought: ", step.log.trim_end(), step.observation))
        .collect()
}
