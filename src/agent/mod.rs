//! Agent module - the post-writing reasoning loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Build the prompt with style rules, tools and previous steps
//! 2. Call the model and parse its reply
//! 3. If the model requests a tool, execute it and feed the observation back
//! 4. Repeat until the model produces a final answer or the iteration cap is hit

mod agent_loop;
pub mod parser;
mod prompt;

pub use agent_loop::{
    AgentError, AgentRun, AgentStep, ReasoningLoop, Termination, ITERATION_LIMIT_MESSAGE,
    PARSE_ERROR_ACTION,
};
pub use parser::{parse, AgentDecision};
pub use prompt::{build_prompt, DEFAULT_STYLE_RULES};
