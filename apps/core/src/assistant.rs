//! Conversation orchestration.
//!
//! The `Assistant` is the caller of the core: it owns no per-conversation state
//! itself. Each `Conversation` holds mode, histories and the cached status, and
//! is passed by reference into every operation.

use crate::brain::IntentClassifier;
use crate::models::{ClassificationResult, Intent, PageLink};
use crate::preflight::StatusReport;
use crate::response_bank::ResponseBank;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Answer used whenever no approved intent applies.
pub const FALLBACK_RESPONSE: &str =
    "I could not find a matching topic in the response bank. Try a guided question or rephrase.";

/// Chat interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    /// Browse approved questions; no model call.
    Guided,
    /// Type a question; classified into the response bank.
    FreeText,
}

impl ChatMode {
    /// Parses a launcher hint such as `guided`, `free` or `free-text`.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_lowercase().as_str() {
            "guided" | "guide" => Some(ChatMode::Guided),
            "free" | "free-text" | "free text" | "unguided" => Some(ChatMode::FreeText),
            _ => None,
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatMode::Guided => write!(f, "Guided"),
            ChatMode::FreeText => write!(f, "Free text"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Set on assistant answers that came from the bank.
    pub intent_id: Option<String>,
}

/// Advisory shown next to a free-text reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    CredentialMissing,
    NoMatch,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::CredentialMissing => {
                "Free text requests need an OpenAI API key. Add it to a local .env file and restart the app."
            }
            Notice::NoMatch => {
                "The classifier could not match your question with enough confidence. Try rephrasing or use guided mode."
            }
        }
    }
}

/// What the assistant posted in response to one action.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub question: String,
    pub content: String,
    /// The answering intent, `None` when the fallback text was used.
    pub intent_id: Option<String>,
    /// Present for free-text replies.
    pub classification: Option<ClassificationResult>,
    pub notice: Option<Notice>,
}

/// Per-conversation state owned by the caller.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: Uuid,
    mode: ChatMode,
    guided_history: Vec<ChatMessage>,
    free_history: Vec<ChatMessage>,
    last_intent_id: Option<String>,
    guided_auto_prompts: HashMap<String, String>,
    status: Option<StatusReport>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: ChatMode::Guided,
            guided_history: Vec::new(),
            free_history: Vec::new(),
            last_intent_id: None,
            guided_auto_prompts: HashMap::new(),
            status: None,
        }
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn history(&self, mode: ChatMode) -> &[ChatMessage] {
        match mode {
            ChatMode::Guided => &self.guided_history,
            ChatMode::FreeText => &self.free_history,
        }
    }

    pub fn last_intent_id(&self) -> Option<&str> {
        self.last_intent_id.as_deref()
    }

    /// Last cached status report, if any probe has run.
    pub fn status(&self) -> Option<&StatusReport> {
        self.status.as_ref()
    }

    fn push(&mut self, mode: ChatMode, role: Role, content: String, intent_id: Option<String>) {
        let history = match mode {
            ChatMode::Guided => &mut self.guided_history,
            ChatMode::FreeText => &mut self.free_history,
        };
        history.push(ChatMessage {
            role,
            content,
            intent_id,
        });
    }
}

/// Drives guided and free-text conversations over the shared core.
#[derive(Clone)]
pub struct Assistant {
    bank: Arc<ResponseBank>,
    classifier: Arc<IntentClassifier>,
}

impl Assistant {
    pub fn new(bank: Arc<ResponseBank>, classifier: Arc<IntentClassifier>) -> Self {
        Self { bank, classifier }
    }

    pub fn response_bank(&self) -> &ResponseBank {
        &self.bank
    }

    pub fn free_text_available(&self) -> bool {
        self.classifier.has_credential()
    }

    /// Returns the cached status, probing the backend only when none is cached or `force` is set.
    #[instrument(skip_all, fields(conversation = %conv.id, force = force))]
    pub async fn refresh_status(&self, conv: &mut Conversation, force: bool) -> StatusReport {
        if !force {
            if let Some(status) = &conv.status {
                return status.clone();
            }
        }
        let status = self.classifier.check_status().await;
        conv.status = Some(status.clone());
        status
    }

    /// Switches mode. Free text falls back to guided without a credential; entering
    /// free text re-probes the backend.
    pub async fn switch_mode(&self, conv: &mut Conversation, requested: ChatMode) -> ChatMode {
        let effective = if requested == ChatMode::FreeText && !self.free_text_available() {
            ChatMode::Guided
        } else {
            requested
        };
        let changed = effective != conv.mode;
        conv.mode = effective;
        if effective == ChatMode::FreeText && changed {
            self.refresh_status(conv, true).await;
        }
        info!(conversation = %conv.id, "Chat mode is now {}", effective);
        effective
    }

    /// Anchors guided mode to `page`: posts the page's primary question once.
    ///
    /// Returns the posted reply, or `None` when it was already shown or the bank is empty.
    pub fn open_page(&self, conv: &mut Conversation, page: &str) -> Option<Reply> {
        let intent = self
            .bank
            .primary_intent_for_page(page)
            .or_else(|| self.bank.intents().first())?;

        let already_answered = conv.guided_history.iter().any(|m| {
            m.role == Role::Assistant && m.intent_id.as_deref() == Some(intent.intent_id.as_str())
        });
        let already_prompted =
            conv.guided_auto_prompts.get(page).map(String::as_str) == Some(intent.intent_id.as_str());
        if already_answered || already_prompted {
            return None;
        }

        let reply = post_intent(conv, ChatMode::Guided, intent);
        conv.guided_auto_prompts
            .insert(page.to_string(), intent.intent_id.clone());
        Some(reply)
    }

    /// Posts the canonical question and answer of `intent_id` into the current mode's history.
    pub fn select_intent(&self, conv: &mut Conversation, intent_id: &str) -> Option<Reply> {
        let intent = self.bank.intent_by_id(intent_id)?;
        let mode = conv.mode;
        Some(post_intent(conv, mode, intent))
    }

    /// Free-text flow: classifies `text` and answers strictly from the bank.
    ///
    /// Returns `None` for blank input; nothing is recorded or classified.
    #[instrument(skip_all, fields(conversation = %conv.id))]
    pub async fn ask(&self, conv: &mut Conversation, text: &str) -> Option<Reply> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        conv.push(ChatMode::FreeText, Role::User, text.to_string(), None);

        let result = self.classifier.classify(text).await;
        let answer = self.bank.intent_by_id(&result.intent_id);
        let (content, intent_id) = match answer {
            Some(intent) => (intent.response.clone(), Some(intent.intent_id.clone())),
            None => (FALLBACK_RESPONSE.to_string(), None),
        };

        conv.push(ChatMode::FreeText, Role::Assistant, content.clone(), intent_id.clone());
        conv.last_intent_id = intent_id.clone();

        let notice = if !self.classifier.has_credential() && answer.is_none() {
            Some(Notice::CredentialMissing)
        } else if result.is_no_match() {
            Some(Notice::NoMatch)
        } else {
            None
        };

        Some(Reply {
            question: text.to_string(),
            content,
            intent_id,
            classification: Some(result),
            notice,
        })
    }

    /// Follow-up suggestions for the last answered intent.
    pub fn next_best(&self, conv: &Conversation) -> Vec<&Intent> {
        conv.last_intent_id
            .as_deref()
            .map(|id| self.bank.next_best(id))
            .unwrap_or_default()
    }

    pub fn page_links(&self, intent_id: &str) -> &[PageLink] {
        self.bank.page_links_for_intent(intent_id)
    }
}

fn post_intent(conv: &mut Conversation, mode: ChatMode, intent: &Intent) -> Reply {
    let question = intent.question().to_string();
    conv.push(mode, Role::User, question.clone(), None);
    conv.push(
        mode,
        Role::Assistant,
        intent.response.clone(),
        Some(intent.intent_id.clone()),
    );
    conv.last_intent_id = Some(intent.intent_id.clone());
    Reply {
        question,
        content: intent.response.clone(),
        intent_id: Some(intent.intent_id.clone()),
        classification: None,
        notice: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_hints() {
        assert_eq!(ChatMode::from_hint("Guide"), Some(ChatMode::Guided));
        assert_eq!(ChatMode::from_hint("free-text"), Some(ChatMode::FreeText));
        assert_eq!(ChatMode::from_hint("unguided"), Some(ChatMode::FreeText));
        assert_eq!(ChatMode::from_hint("panel"), None);
    }

    #[test]
    fn test_new_conversation_starts_guided_and_empty() {
        let conv = Conversation::new();
        assert_eq!(conv.mode(), ChatMode::Guided);
        assert!(conv.history(ChatMode::Guided).is_empty());
        assert!(conv.history(ChatMode::FreeText).is_empty());
        assert!(conv.status().is_none());
    }
}
