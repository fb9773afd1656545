use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("sign in required")]
    SignInRequired,
    #[error("not enough coins: have {have}, need {need}")]
    InsufficientCoins { have: i64, need: i64 },
    #[error("{0}")]
    Validation(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("token store failed: {0}")]
    Store(String),
    #[error("backend rejected credentials ({status})")]
    Unauthorized { status: u16, detail: Option<String> },
    #[error("backend request failed ({status}): {body}")]
    Http {
        status: u16,
        detail: Option<String>,
        body: String,
    },
    #[error("backend unreachable: {message}")]
    Transport { message: String },
    #[error("backend returned invalid JSON: {message}")]
    Decode { message: String },
}

impl ClientError {
    pub fn store(err: anyhow::Error) -> Self {
        ClientError::Store(format!("{err:#}"))
    }

    /// True for 401/403 answers, which invalidate the session.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    /// Backend `detail` text, when the error body carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Unauthorized { detail, .. } | ClientError::Http { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }

    /// The string shown next to the control that triggered the request.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::SignInRequired => "Sign in required".to_string(),
            ClientError::InsufficientCoins { have, need } => {
                format!("Not enough coins! You have {have}, {need} are needed.")
            }
            ClientError::Validation(message) | ClientError::Config(message) => message.clone(),
            ClientError::Transport { .. } => format!("{fallback}: backend unreachable"),
            ClientError::Unauthorized { .. } | ClientError::Http { .. } => self
                .detail()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
            ClientError::Store(_) | ClientError::Decode { .. } => fallback.to_string(),
        }
    }
}
