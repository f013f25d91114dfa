//! Prompt builder for rendering templates and assembling chat messages.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use docchat_core::{AppError, AppResult};
use docchat_llm::{ChatMessage, Role};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build the message list for one question.
///
/// The result is the definition's system message, then the most recent
/// conversation turns, then the rendered template carrying the retrieved
/// context and the question.
///
/// # Example
/// ```no_run
/// use docchat_prompt::{build_prompt, builtin_prompt, ResponseMode};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt(ResponseMode::Strict)?;
/// let built = build_prompt(&def, "What is the refund window?", "[1] Source: policy.pdf\n...", &[])?;
/// assert_eq!(built.messages.len(), 2);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    question: &str,
    context: &str,
    history: &[ChatMessage],
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut variables = HashMap::new();
    variables.insert("context", context);
    variables.insert("question", question);
    let user = render_template(&definition.template, &variables)?;

    let recent = trim_history(history, definition.history.max_turns);
    let history_messages = recent.len();

    let mut messages = Vec::with_capacity(history_messages + 2);
    messages.push(ChatMessage::system(definition.system.clone()));
    messages.extend(recent);
    messages.push(ChatMessage::user(user));

    Ok(BuiltPrompt {
        messages,
        temperature: definition.generation.temperature,
        max_tokens: definition.generation.max_tokens,
        top_p: definition.generation.top_p,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            mode: definition.mode,
            history_messages,
        },
    })
}

/// Keep the last `max_turns * 2` messages, then drop anything that is not a
/// user or assistant message.
pub fn trim_history(history: &[ChatMessage], max_turns: usize) -> Vec<ChatMessage> {
    let keep = max_turns.saturating_mul(2);
    let start = history.len().saturating_sub(keep);

    history[start..]
        .iter()
        .filter(|m| matches!(m.role, Role::User | Role::Assistant))
        .cloned()
        .collect()
}

fn render_template(template: &str, variables: &HashMap<&str, &str>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::builtin_prompt;
    use crate::types::ResponseMode;

    fn conversation(turns: usize) -> Vec<ChatMessage> {
        (0..turns)
            .flat_map(|i| {
                [
                    ChatMessage::user(format!("question {}", i)),
                    ChatMessage::assistant(format!("answer {}", i)),
                ]
            })
            .collect()
    }

    #[test]
    fn test_render_does_not_escape() {
        let mut vars = HashMap::new();
        vars.insert("question", "Is 3 < 5 & \"true\"?");
        let rendered = render_template("Q: {{question}}", &vars).unwrap();
        assert_eq!(rendered, "Q: Is 3 < 5 & \"true\"?");
    }

    #[test]
    fn test_build_prompt_layout() {
        let def = builtin_prompt(ResponseMode::Strict).unwrap();
        let built = build_prompt(&def, "What is X?", "[1] Source: a.pdf\nX is Y.", &[]).unwrap();

        assert_eq!(built.messages.len(), 2);
        assert_eq!(built.messages[0].role, Role::System);
        assert_eq!(built.messages[0].content, def.system);
        assert_eq!(built.messages[1].role, Role::User);
        assert_eq!(
            built.messages[1].content,
            "Document Context:\n[1] Source: a.pdf\nX is Y.\n\nQuestion: What is X?\n\nPlease provide a detailed answer based on the above context."
        );
        assert_eq!(built.temperature, 0.3);
        assert_eq!(built.max_tokens, 1024);
        assert_eq!(built.metadata.source_prompt_id, "rag.answer.strict");
        assert_eq!(built.metadata.history_messages, 0);
    }

    #[test]
    fn test_history_is_inserted_between_system_and_question() {
        let def = builtin_prompt(ResponseMode::Hybrid).unwrap();
        let history = conversation(2);
        let built = build_prompt(&def, "next?", "ctx", &history).unwrap();

        assert_eq!(built.messages.len(), 6);
        assert_eq!(built.messages[1].content, "question 0");
        assert_eq!(built.messages[4].content, "answer 1");
        assert_eq!(built.metadata.mode, ResponseMode::Hybrid);
        assert_eq!(built.temperature, 0.5);
    }

    #[test]
    fn test_trim_history_keeps_last_turns() {
        let history = conversation(8);
        let trimmed = trim_history(&history, 5);

        assert_eq!(trimmed.len(), 10);
        assert_eq!(trimmed[0].content, "question 3");
        assert_eq!(trimmed[9].content, "answer 7");
    }

    #[test]
    fn test_trim_history_drops_system_messages() {
        let mut history = conversation(1);
        history.push(ChatMessage::system("ignored"));
        let trimmed = trim_history(&history, 5);

        assert_eq!(trimmed.len(), 2);
        assert!(trimmed.iter().all(|m| m.role != Role::System));
        assert!(trim_history(&history, 0).is_empty());
    }
}
