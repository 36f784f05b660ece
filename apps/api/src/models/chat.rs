use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// System prompt used when the caller does not supply one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
/// Appended to the system prompt when the caller asks for French output.
pub const FRENCH_INSTRUCTION: &str = "Respond only in French.";

pub const DEFAULT_MAX_TOKENS: u32 = 1024;
/// Output ceiling of the pinned model; larger budgets are rejected upstream.
pub const MAX_TOKENS_LIMIT: u32 = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Locale of the course UI. English is the primary locale; anything else
/// gets an explicit output-language instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

/// Body of `POST /api/messages`. Built fresh per call, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// A request whose sole message is a user turn.
    pub fn single_user(content: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            messages: vec![ChatMessage {
                role: Role::User,
                content: content.into(),
            }],
            system: None,
            language: None,
            max_tokens: Some(max_tokens),
        }
    }

    pub fn with_language(mut self, language: Option<Language>) -> Self {
        self.language = language;
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.messages.is_empty() {
            return Err(AppError::Validation(
                "messages must contain at least one message".to_string(),
            ));
        }
        if let Some(index) = self
            .messages
            .iter()
            .position(|m| m.content.trim().is_empty())
        {
            return Err(AppError::Validation(format!(
                "messages[{index}].content cannot be empty"
            )));
        }
        if let Some(max_tokens) = self.max_tokens {
            if max_tokens == 0 || max_tokens > MAX_TOKENS_LIMIT {
                return Err(AppError::Validation(format!(
                    "max_tokens must be between 1 and {MAX_TOKENS_LIMIT}"
                )));
            }
        }
        Ok(())
    }

    pub fn effective_max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    /// The system prompt actually sent upstream, with the language
    /// instruction appended for the secondary locale.
    pub fn effective_system(&self) -> String {
        let base = self
            .system
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);

        match self.language.unwrap_or_default() {
            Language::Fr => format!("{base}\n\n{FRENCH_INSTRUCTION}"),
            Language::En => base.to_string(),
        }
    }
}
