use charchat_contracts::chat::{Message, SendStart, Transcript, DEFAULT_SEND_ERROR};
use charchat_contracts::session::TokenStore;
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::session::SessionManager;

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank input.
    Ignored,
    SignInRequired,
    Replied(Message),
    Failed(String),
    /// The reply arrived after the transcript was cleared or switched.
    Discarded,
}

/// Drives one chat transcript against the backend.
#[derive(Debug, Clone)]
pub struct ChatPipeline {
    transcript: Transcript,
}

impl ChatPipeline {
    pub fn new(character_id: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::new(character_id),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn send<S: TokenStore>(
        &mut self,
        sessions: &mut SessionManager<S>,
        backend: &dyn Backend,
        text: &str,
    ) -> SendOutcome {
        let pending = match self.transcript.begin_send(text, sessions.session()) {
            SendStart::Ignored => return SendOutcome::Ignored,
            SendStart::SignInRequired => return SendOutcome::SignInRequired,
            SendStart::Started(pending) => pending,
        };

        debug!(
            character = %pending.request.character,
            history = pending.request.history.len(),
            "sending chat message"
        );
        let (reply, failure) = match backend.chat(sessions.bearer(), &pending.request) {
            Ok(reply) => (Ok(reply), None),
            Err(err) => (Err(err.user_message(DEFAULT_SEND_ERROR)), Some(err)),
        };

        let appended = self.transcript.complete_send(pending, reply).cloned();
        match failure {
            None => {
                sessions.refresh_quietly(backend);
                match appended {
                    Some(message) => SendOutcome::Replied(message),
                    None => SendOutcome::Discarded,
                }
            }
            Some(err) => {
                warn!(error = %err, "chat request failed");
                sessions.note_failure(&err);
                SendOutcome::Failed(
                    self.transcript
                        .error()
                        .unwrap_or(DEFAULT_SEND_ERROR)
                        .to_string(),
                )
            }
        }
    }

    pub fn switch_character(&mut self, character_id: impl Into<String>) {
        self.transcript.switch_character(character_id);
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    pub fn dismiss_error(&mut self) {
        self.transcript.dismiss_error();
    }
}
