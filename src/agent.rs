//! Grounded answer composition.
//!
//! The agent is a persona (role, goal, backstory) wrapped around an LLM
//! provider. Each chat turn becomes an [`AgentTask`]: the question, the
//! prior conversation, and the passages retrieval produced. The agent
//! renders the task into a prompt and returns the model's answer verbatim.
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::llm::{ChatMessage, GenerationConfig, LlmError, LlmProvider};

/// The persona handed to the model as its system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl Default for AgentDefinition {
    fn default() -> Self {
        Self {
            role: "Documentation assistant".to_string(),
            goal: "Answer questions using only the provided context passages, citing the source documents you used."
                .to_string(),
            backstory: "You help users find answers inside their own document collection. \
                        You never invent facts: when the context does not contain the answer, you say so plainly."
                .to_string(),
        }
    }
}

/// A retrieved passage handed to the agent as grounding context.
#[derive(Debug, Clone)]
pub struct ContextPassage {
    pub document: String,
    pub content: String,
}

/// One grounded answer-composition task.
#[derive(Debug, Clone)]
pub struct AgentTask {
    pub question: String,
    pub history: Vec<ChatMessage>,
    pub passages: Vec<ContextPassage>,
}

/// An agent that composes grounded answers through an LLM provider.
pub struct DocAgent {
    definition: AgentDefinition,
    provider: Arc<dyn LlmProvider>,
    generation: GenerationConfig,
}

impl DocAgent {
    pub fn new(
        definition: AgentDefinition,
        provider: Arc<dyn LlmProvider>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            definition,
            provider,
            generation,
        }
    }

    /// Execute one task: build the prompt, invoke the provider, return the
    /// answer text.
    pub async fn run(&self, task: &AgentTask) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(task.history.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt()));
        messages.extend(task.history.iter().cloned());
        messages.push(ChatMessage::user(build_task_prompt(task)));

        debug!(
            passages = task.passages.len(),
            history = task.history.len(),
            "running agent task"
        );

        self.provider.chat(&messages, &self.generation).await
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are: {}.\nYour goal: {}\n\n{}",
            self.definition.role, self.definition.goal, self.definition.backstory
        )
    }
}

/// Render the task into the final user message: numbered context passages
/// with their source documents, then the question.
fn build_task_prompt(task: &AgentTask) -> String {
    let mut prompt = String::new();

    if task.passages.is_empty() {
        prompt.push_str(
            "No context passages were retrieved for this question. \
             Say that you have nothing in the document collection to answer from.\n\n",
        );
    } else {
        prompt.push_str(
            "Answer using only the context passages below. \
             If they do not contain the answer, say you do not know.\n\nContext:\n",
        );
        for (i, passage) in task.passages.iter().enumerate() {
            prompt.push_str(&format!(
                "[{}] ({})\n{}\n\n",
                i + 1,
                passage.document,
                passage.content.trim()
            ));
        }
    }

    prompt.push_str(&format!("Question: {}", task.question));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Role, ScriptedProvider};

    fn task_with(passages: Vec<ContextPassage>) -> AgentTask {
        AgentTask {
            question: "How do I install it?".to_string(),
            history: vec![],
            passages,
        }
    }

    #[test]
    fn test_default_definition_is_grounded() {
        let def = AgentDefinition::default();
        assert!(!def.role.is_empty());
        assert!(def.goal.contains("context"));
    }

    #[test]
    fn test_task_prompt_numbers_passages() {
        let task = task_with(vec![
            ContextPassage {
                document: "install.md".to_string(),
                content: "Run the installer.".to_string(),
            },
            ContextPassage {
                document: "faq.md".to_string(),
                content: "See the install guide.".to_string(),
            },
        ]);

        let prompt = build_task_prompt(&task);
        assert!(prompt.contains("[1] (install.md)"));
        assert!(prompt.contains("[2] (faq.md)"));
        assert!(prompt.contains("Run the installer."));
        assert!(prompt.ends_with("Question: How do I install it?"));
    }

    #[test]
    fn test_task_prompt_empty_context() {
        let prompt = build_task_prompt(&task_with(vec![]));
        assert!(prompt.contains("No context passages"));
        assert!(prompt.contains("Question: How do I install it?"));
    }

    #[tokio::test]
    async fn test_agent_run_builds_conversation() {
        let provider = Arc::new(ScriptedProvider::new(["the answer"]));
        let agent = DocAgent::new(
            AgentDefinition::default(),
            provider.clone(),
            GenerationConfig::default(),
        );

        let task = AgentTask {
            question: "What is docchat?".to_string(),
            history: vec![
                ChatMessage::user("hi"),
                ChatMessage::assistant("hello, ask me about your documents"),
            ],
            passages: vec![ContextPassage {
                document: "readme.md".to_string(),
                content: "docchat answers questions about documents.".to_string(),
            }],
        };

        let answer = agent.run(&task).await.unwrap();
        assert_eq!(answer, "the answer");

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        let messages = &calls[0];

        // system + 2 history turns + task prompt
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Documentation assistant"));
        assert_eq!(messages[1].content, "hi");
        assert_eq!(messages[3].role, Role::User);
        assert!(messages[3].content.contains("readme.md"));
        assert!(messages[3].content.contains("What is docchat?"));
    }
}
