//! ReAct prompt templating.
//!
//! ReAct mode keeps the loop unchanged and only alters the prompt: the model
//! is instructed to narrate Thought/Action/Observation steps in its own text
//! and to close with the final-answer marker.

/// Literal phrase that ends a run when it appears in model output.
pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

/// Template appended to the system prompt when ReAct mode is enabled.
pub fn react_prompt(tool_names: &[String]) -> String {
    format!(
        r#"
Answer the following questions as best you can.

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, could be one of the given tools: {tool_names:?}
At this point you may call for an action to be taken, but you must return the Question and Thought as content in your response
Observation: the result of the action
... (this Thought/Action/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

Begin!
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_tools_and_marker() {
        let prompt = react_prompt(&["get_current_weather".into(), "get_news_stories".into()]);

        assert!(prompt.contains("get_current_weather"));
        assert!(prompt.contains("get_news_stories"));
        assert!(prompt.contains(FINAL_ANSWER_MARKER));
        assert!(prompt.contains("Observation: the result of the action"));
    }
}
