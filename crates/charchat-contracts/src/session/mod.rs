mod oauth;
mod token_store;

use serde::{Deserialize, Serialize};

pub use oauth::{parse_oauth_callback, OAuthCallback};
pub use token_store::{FileTokenStore, MemoryTokenStore, StoredTokens, TokenStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    Unknown,
    Checking,
    Authenticated,
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub coins: i64,
}

/// Result of one whoami round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Verified(UserInfo),
    /// The backend answered with a non-success status: the token is stale.
    Rejected,
    /// The backend could not be reached; nothing is known about the token.
    Unreachable,
}

/// Client-side view of who is signed in.
///
/// `Unknown -> Checking -> {Authenticated | Anonymous}` and
/// `Authenticated -> Anonymous` on invalidation. Adopting a new token restarts
/// the machine at `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    refresh_token: Option<String>,
    phase: AuthPhase,
    user: Option<UserInfo>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            token: None,
            refresh_token: None,
            phase: AuthPhase::Unknown,
            user: None,
        }
    }

    pub fn from_tokens(tokens: StoredTokens) -> Self {
        let mut session = Self::new();
        session.token = non_empty(tokens.auth_token);
        session.refresh_token = non_empty(tokens.refresh_token);
        session
    }

    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == AuthPhase::Authenticated
    }

    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|user| user.id)
    }

    pub fn coins(&self) -> i64 {
        self.user.as_ref().map(|user| user.coins).unwrap_or(0)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn stored_tokens(&self) -> StoredTokens {
        StoredTokens {
            auth_token: self.token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }

    /// Starts a whoami check and returns the token to verify.
    ///
    /// Without a token the session settles on `Anonymous` and `None` is
    /// returned. A refresh of an authenticated session keeps it
    /// `Authenticated` until the outcome is known.
    pub fn begin_check(&mut self) -> Option<String> {
        let Some(token) = self.token.clone() else {
            self.phase = AuthPhase::Anonymous;
            self.user = None;
            return None;
        };
        if self.phase != AuthPhase::Authenticated {
            self.phase = AuthPhase::Checking;
        }
        Some(token)
    }

    pub fn complete_check(&mut self, outcome: CheckOutcome) {
        match outcome {
            CheckOutcome::Verified(user) => {
                self.phase = AuthPhase::Authenticated;
                self.user = Some(user);
            }
            CheckOutcome::Rejected => self.invalidate(),
            CheckOutcome::Unreachable => {
                self.phase = AuthPhase::Anonymous;
                self.user = None;
            }
        }
    }

    /// Replaces the tokens (sign-in or OAuth callback). The previous user is
    /// forgotten until the next check completes.
    pub fn adopt_tokens(&mut self, tokens: StoredTokens) {
        self.token = non_empty(tokens.auth_token);
        self.refresh_token = non_empty(tokens.refresh_token);
        self.user = None;
        self.phase = AuthPhase::Unknown;
    }

    /// Drops both tokens and the user. Used for logout and for 401/403 answers.
    pub fn invalidate(&mut self) {
        self.token = None;
        self.refresh_token = None;
        self.user = None;
        self.phase = AuthPhase::Anonymous;
    }

    /// Applies a coin balance reported by an action response before the next
    /// refresh lands.
    pub fn set_coins(&mut self, coins: i64) {
        if let Some(user) = self.user.as_mut() {
            user.coins = coins;
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
