//! Conversation state store
//!
//! Holds the message log, the orchestrator state and the typing flag for one
//! session. Performs no validation: the state machine decides, the store
//! records.

use crate::providers::AuditReport;
use crate::state_machine::{ConvState, MenuOption, WaitingFor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type MessageId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Assistant,
    User,
}

/// How the presentation layer should treat a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    /// Carries selectable choices
    Options,
    /// Asks the user to type something specific
    Input,
    /// Analysis output
    Result,
}

/// Message body: plain (markdown) text or a rich block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: String },
    AuditReport { url: String, report: AuditReport },
    Contact { label: String, href: String },
}

#[cfg(test)]
impl MessageContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text { text } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub key: MenuOption,
    pub label: String,
}

impl From<MenuOption> for OptionChoice {
    fn from(option: MenuOption) -> Self {
        Self {
            key: option,
            label: option.label().to_string(),
        }
    }
}

/// A message as recorded in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub kind: MessageKind,
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionChoice>,
    pub created_at: DateTime<Utc>,
}

/// A message the orchestrator wants appended; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub role: Role,
    pub kind: MessageKind,
    pub content: MessageContent,
    pub options: Vec<MenuOption>,
}

impl OutboundMessage {
    fn assistant(kind: MessageKind, content: MessageContent) -> Self {
        Self {
            role: Role::Assistant,
            kind,
            content,
            options: vec![],
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::assistant(MessageKind::Text, MessageContent::Text { text: text.into() })
    }

    pub fn input_prompt(text: impl Into<String>) -> Self {
        Self::assistant(MessageKind::Input, MessageContent::Text { text: text.into() })
    }

    pub fn options(text: impl Into<String>, options: &[MenuOption]) -> Self {
        Self {
            options: options.to_vec(),
            ..Self::assistant(MessageKind::Options, MessageContent::Text { text: text.into() })
        }
    }

    pub fn result_text(text: impl Into<String>) -> Self {
        Self::assistant(MessageKind::Result, MessageContent::Text { text: text.into() })
    }

    pub fn audit_report(url: impl Into<String>, report: AuditReport) -> Self {
        Self::assistant(
            MessageKind::Result,
            MessageContent::AuditReport {
                url: url.into(),
                report,
            },
        )
    }

    pub fn contact(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self::assistant(
            MessageKind::Text,
            MessageContent::Contact {
                label: label.into(),
                href: href.into(),
            },
        )
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            ..Self::text(text)
        }
    }

    /// Plain text body, if any
    #[cfg(test)]
    pub fn text_body(&self) -> Option<&str> {
        self.content.as_text()
    }
}

/// Snapshot handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub is_typing: bool,
    /// Choices the orchestrator currently accepts
    pub options: Vec<OptionChoice>,
    pub waiting_for: WaitingFor,
    pub subject_url: Option<String>,
    pub phase: &'static str,
}

/// Single-writer store for one session
#[derive(Debug)]
pub struct ConversationStore {
    session_id: String,
    messages: Vec<Message>,
    next_id: MessageId,
    state: ConvState,
    is_typing: bool,
    transient: Option<MessageId>,
}

impl ConversationStore {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            next_id: 1,
            state: ConvState::default(),
            is_typing: false,
            transient: None,
        }
    }

    fn push(&mut self, outbound: OutboundMessage) -> &Message {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            role: outbound.role,
            kind: outbound.kind,
            content: outbound.content,
            options: outbound.options.into_iter().map(OptionChoice::from).collect(),
            created_at: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Append a permanent message
    pub fn append(&mut self, outbound: OutboundMessage) -> &Message {
        if let Some(id) = self.transient {
            tracing::warn!(session_id = %self.session_id, transient_id = id, "Appending while a transient message is outstanding");
        }
        self.push(outbound)
    }

    /// Append a message that will be retracted once its operation settles.
    ///
    /// Returns the id of any transient message that had to be dropped to
    /// make room, alongside the new message.
    pub fn show_transient(&mut self, outbound: OutboundMessage) -> (Option<MessageId>, &Message) {
        let replaced = self.transient;
        if let Some(id) = replaced {
            self.retract_transient(id);
        }
        let id = self.push(outbound).id;
        self.transient = Some(id);
        (replaced, &self.messages[self.messages.len() - 1])
    }

    /// Remove the outstanding transient message. Returns false when `id` is not it.
    pub fn retract_transient(&mut self, id: MessageId) -> bool {
        if self.transient != Some(id) {
            return false;
        }
        self.transient = None;
        self.messages.retain(|m| m.id != id);
        true
    }

    #[cfg(test)]
    pub fn transient(&self) -> Option<MessageId> {
        self.transient
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn state(&self) -> &ConvState {
        &self.state
    }

    pub fn set_state(&mut self, state: ConvState) {
        self.state = state;
    }

    pub fn set_typing(&mut self, is_typing: bool) {
        self.is_typing = is_typing;
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.session_id.clone(),
            messages: self.messages().to_vec(),
            is_typing: self.is_typing,
            options: self
                .state
                .offered_options()
                .iter()
                .copied()
                .map(OptionChoice::from)
                .collect(),
            waiting_for: self.state.waiting_for(),
            subject_url: self.state.subject_url.clone(),
            phase: self.state.phase.name(),
        }
    }
}
