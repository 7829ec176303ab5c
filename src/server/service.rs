//! The chat service: turn an incoming message list into a grounded answer.
//!
//! This is the one piece of request logic the server owns — extract the
//! last user message, retrieve passages for it, hand everything to the
//! agent, and shape the response.
use serde::Serialize;
use tracing::info;

use crate::agent::{AgentTask, ContextPassage};
use crate::llm::{ChatMessage, Role};
use crate::server::routes::ApiError;
use crate::server::state::AppState;

/// Maximum snippet length returned to the UI, in characters.
const SNIPPET_MAX_CHARS: usize = 240;

/// A source passage backing the answer, as rendered by the UI.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub document: String,
    pub snippet: String,
    pub similarity: f64,
}

/// The chat route's response body.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceInfo>,
}

/// Answer one chat request.
///
/// The question is the LAST user message in the list; everything before it
/// is conversation history and passes to the agent unchanged.
pub async fn answer_chat(
    state: &AppState,
    messages: &[ChatMessage],
) -> Result<ChatResponse, ApiError> {
    let question_idx = messages
        .iter()
        .rposition(|m| m.role == Role::User)
        .ok_or_else(|| ApiError::BadRequest("no user message in request".to_string()))?;

    let question = messages[question_idx].content.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::BadRequest("user message is empty".to_string()));
    }
    let history = messages[..question_idx].to_vec();

    // Retrieve grounding passages for the question
    let query_vector = state
        .embedder()
        .embed(&question)
        .map_err(|e| ApiError::Internal(format!("embedding failed: {e}")))?;

    let results = {
        let store = state.store().lock().await;
        store
            .search(
                state.collection_id(),
                &query_vector,
                state.config().search_top_k,
            )
            .map_err(|e| ApiError::Internal(format!("search failed: {e}")))?
    };

    info!(
        passages = results.len(),
        "answering chat question: \"{question}\""
    );

    let passages: Vec<ContextPassage> = results
        .iter()
        .map(|r| ContextPassage {
            document: r.document_name.clone(),
            content: r.chunk_content.clone(),
        })
        .collect();

    let sources: Vec<SourceInfo> = results
        .iter()
        .map(|r| SourceInfo {
            document: r.document_name.clone(),
            snippet: truncate_chars(&r.chunk_content, SNIPPET_MAX_CHARS),
            similarity: r.similarity,
        })
        .collect();

    // Retrieval coming back empty is not an error; the agent says so.
    let task = AgentTask {
        question,
        history,
        passages,
    };

    let answer = state.agent().run(&task).await.map_err(ApiError::Upstream)?;

    Ok(ChatResponse { answer, sources })
}

/// Truncate to at most `max` characters, appending an ellipsis when cut.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentDefinition, DocAgent};
    use crate::config::Config;
    use crate::embedder::hash::HashEmbedder;
    use crate::embedder::Embedder;
    use crate::llm::{GenerationConfig, ScriptedProvider};
    use crate::store::{Chunk, Store};
    use chrono::Utc;
    use std::sync::Arc;

    fn test_state(responses: Vec<&str>) -> (AppState, Arc<ScriptedProvider>) {
        let mut store = Store::open_in_memory(384).unwrap();
        let coll = store.collection("doc_chunks").unwrap();
        let embedder = Arc::new(HashEmbedder::default());

        // Seed one searchable document
        let content = "docchat ingests documents and answers questions.";
        let vector = embedder.embed(content).unwrap();
        store
            .upsert_document(
                coll,
                "readme.md",
                Utc::now(),
                &[Chunk {
                    position: 0,
                    content,
                }],
                &[vector],
            )
            .unwrap();

        let provider = Arc::new(ScriptedProvider::new(responses));
        let agent = DocAgent::new(
            AgentDefinition::default(),
            provider.clone(),
            GenerationConfig::default(),
        );

        let state = AppState::new(store, coll, embedder, agent, Arc::new(Config::default()));
        (state, provider)
    }

    #[tokio::test]
    async fn test_answer_chat_happy_path() {
        let (state, provider) = test_state(vec!["It ingests documents."]);

        let messages = vec![ChatMessage::user("What does docchat do?")];
        let response = answer_chat(&state, &messages).await.unwrap();

        assert_eq!(response.answer, "It ingests documents.");
        assert!(!response.sources.is_empty());
        assert_eq!(response.sources[0].document, "readme.md");

        // The agent saw the retrieved passage
        let calls = provider.calls();
        let last_msg = &calls[0].last().unwrap().content;
        assert!(last_msg.contains("readme.md"));
        assert!(last_msg.contains("What does docchat do?"));
    }

    #[tokio::test]
    async fn test_answer_chat_uses_last_user_message() {
        let (state, provider) = test_state(vec!["answer"]);

        let messages = vec![
            ChatMessage::user("first question"),
            ChatMessage::assistant("first answer"),
            ChatMessage::user("second question"),
        ];
        answer_chat(&state, &messages).await.unwrap();

        let calls = provider.calls();
        let sent = &calls[0];
        // system + 2 history + task
        assert_eq!(sent.len(), 4);
        assert!(sent.last().unwrap().content.contains("second question"));
        assert_eq!(sent[1].content, "first question");
        assert_eq!(sent[2].content, "first answer");
    }

    #[tokio::test]
    async fn test_answer_chat_no_user_message() {
        let (state, _) = test_state(vec![]);

        let err = answer_chat(&state, &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let messages = vec![ChatMessage::assistant("hello")];
        let err = answer_chat(&state, &messages).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_answer_chat_blank_question() {
        let (state, _) = test_state(vec![]);
        let messages = vec![ChatMessage::user("   ")];
        let err = answer_chat(&state, &messages).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 240), "short");
        let long = "x".repeat(300);
        let cut = truncate_chars(&long, 240);
        assert_eq!(cut.chars().count(), 241); // 240 + ellipsis
        assert!(cut.ends_with('…'));
    }
}
