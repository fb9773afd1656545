use chrono::{DateTime, Utc};

use super::message::{DeliveryStatus, Message, Role};
use crate::api::{ChatReply, ChatRequest};
use crate::session::Session;

pub const DEFAULT_ASSISTANT_REPLY: &str = "Sorry, no response was received";
pub const DEFAULT_SEND_ERROR: &str = "Failed to send message";

/// What `begin_send` decided to do with the input.
#[derive(Debug, Clone, PartialEq)]
pub enum SendStart {
    /// Blank input; nothing happened.
    Ignored,
    /// Not signed in; nothing was appended.
    SignInRequired,
    Started(PendingSend),
}

/// A user message that has been appended and awaits its reply.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSend {
    pub message_id: String,
    pub request: ChatRequest,
    epoch: u64,
}

/// Message list of one chat with one character.
///
/// Sending is split in two phases so that several requests may be in flight:
/// `begin_send` appends the user message as `Pending` and builds the request,
/// `complete_send` confirms or fails it and appends the reply.
#[derive(Debug, Clone)]
pub struct Transcript {
    character_id: String,
    messages: Vec<Message>,
    loading: bool,
    error: Option<String>,
    last_id: u64,
    epoch: u64,
}

impl Transcript {
    pub fn new(character_id: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            messages: Vec::new(),
            loading: false,
            error: None,
            last_id: 0,
            epoch: 0,
        }
    }

    pub fn character_id(&self) -> &str {
        &self.character_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn begin_send(&mut self, text: &str, session: &Session) -> SendStart {
        self.begin_send_at(text, session, Utc::now())
    }

    pub fn begin_send_at(&mut self, text: &str, session: &Session, now: DateTime<Utc>) -> SendStart {
        if text.trim().is_empty() {
            return SendStart::Ignored;
        }
        if !session.is_authenticated() {
            return SendStart::SignInRequired;
        }

        let history: Vec<_> = self
            .messages
            .iter()
            .map(Message::to_history_entry)
            .collect();
        let timestamp = self.clamp_timestamp(now);
        let message_id = self.next_id(timestamp);
        self.messages.push(Message {
            id: message_id.clone(),
            role: Role::User,
            content: text.to_string(),
            timestamp,
            image_url: None,
            status: DeliveryStatus::Pending,
        });
        self.loading = true;
        self.error = None;

        SendStart::Started(PendingSend {
            message_id,
            request: ChatRequest {
                message: text.to_string(),
                character: self.character_id.clone(),
                history,
                session_id: format!("chat_{}", now.timestamp_millis()),
                user_id: session.user_id(),
            },
            epoch: self.epoch,
        })
    }

    pub fn complete_send(
        &mut self,
        pending: PendingSend,
        outcome: Result<ChatReply, String>,
    ) -> Option<&Message> {
        self.complete_send_at(pending, outcome, Utc::now())
    }

    /// Settles a pending send. Returns the appended assistant message, if any.
    ///
    /// Completions that arrive after the transcript was cleared only drop the
    /// loading flag.
    pub fn complete_send_at(
        &mut self,
        pending: PendingSend,
        outcome: Result<ChatReply, String>,
        now: DateTime<Utc>,
    ) -> Option<&Message> {
        self.loading = false;
        if pending.epoch != self.epoch {
            return None;
        }

        match outcome {
            Ok(reply) => {
                self.set_status(&pending.message_id, DeliveryStatus::Confirmed);
                let timestamp = self.clamp_timestamp(now);
                let id = self.next_id(timestamp);
                let content = reply
                    .response
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ASSISTANT_REPLY.to_string());
                let image_url = reply.image_url.filter(|url| !url.trim().is_empty());
                self.messages.push(Message {
                    id,
                    role: Role::Assistant,
                    content,
                    timestamp,
                    image_url,
                    status: DeliveryStatus::Confirmed,
                });
                self.messages.last()
            }
            Err(message) => {
                self.set_status(&pending.message_id, DeliveryStatus::Failed);
                let message = message.trim();
                self.error = Some(if message.is_empty() {
                    DEFAULT_SEND_ERROR.to_string()
                } else {
                    message.to_string()
                });
                None
            }
        }
    }

    /// Switches the active character; the message list is always emptied.
    pub fn switch_character(&mut self, character_id: impl Into<String>) {
        self.character_id = character_id.into();
        self.messages.clear();
        self.epoch += 1;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.error = None;
        self.epoch += 1;
    }

    fn set_status(&mut self, message_id: &str, status: DeliveryStatus) {
        if let Some(message) = self
            .messages
            .iter_mut()
            .find(|message| message.id == message_id)
        {
            message.status = status;
        }
    }

    fn clamp_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.messages.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        }
    }

    fn next_id(&mut self, timestamp: DateTime<Utc>) -> String {
        let millis = u64::try_from(timestamp.timestamp_millis()).unwrap_or(0);
        let id = millis.max(self.last_id + 1);
        self.last_id = id;
        id.to_string()
    }
}
