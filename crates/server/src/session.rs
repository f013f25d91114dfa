//! In-memory chat sessions.

use chrono::{DateTime, Utc};
use docchat_knowledge::{Citation, RagAnswer};
use docchat_llm::{ChatMessage, Role};
use docchat_prompt::ResponseMode;
use serde::Serialize;
use std::collections::HashMap;

/// One message in a session's visible history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Citation>,
    pub timestamp: DateTime<Utc>,
}

/// A browser chat session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub mode: ResponseMode,
    pub history: Vec<ChatEntry>,
    /// Files uploaded through this session
    pub file_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    fn new(mode: ResponseMode) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mode,
            history: Vec::new(),
            file_names: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// History as chat messages for the prompt builder.
    pub fn chat_messages(&self) -> Vec<ChatMessage> {
        self.history
            .iter()
            .map(|entry| ChatMessage::new(entry.role, entry.content.clone()))
            .collect()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Sessions keyed by id.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<String, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_session(&mut self, mode: ResponseMode) -> Session {
        let session = Session::new(mode);
        tracing::debug!("Created session {} ({})", session.id, mode);
        self.sessions.insert(session.id.clone(), session.clone());
        session
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn set_mode(&mut self, id: &str, mode: ResponseMode) -> Option<&Session> {
        let session = self.sessions.get_mut(id)?;
        session.mode = mode;
        session.touch();
        Some(session)
    }

    pub fn set_file_names(&mut self, id: &str, file_names: Vec<String>) -> bool {
        match self.sessions.get_mut(id) {
            Some(session) => {
                session.file_names = file_names;
                session.touch();
                true
            }
            None => false,
        }
    }

    /// Append a question and its answer to a session's history.
    pub fn record_exchange(&mut self, id: &str, question: &str, answer: &RagAnswer) -> bool {
        let Some(session) = self.sessions.get_mut(id) else {
            return false;
        };

        let now = Utc::now();
        session.history.push(ChatEntry {
            role: Role::User,
            content: question.to_string(),
            sources: Vec::new(),
            timestamp: now,
        });
        session.history.push(ChatEntry {
            role: Role::Assistant,
            content: answer.answer.clone(),
            sources: answer.sources.clone(),
            timestamp: now,
        });
        session.updated_at = now;
        true
    }

    /// Clear history and file names of every session.
    pub fn reset_all(&mut self) {
        for session in self.sessions.values_mut() {
            session.history.clear();
            session.file_names.clear();
            session.touch();
        }
    }

    pub fn remove_session(&mut self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}
