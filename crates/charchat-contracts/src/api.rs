//! Request and response bodies exchanged with the backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::UserInfo;

pub const FALLBACK_USERNAME: &str = "User";

/// `GET /auth/me/`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MeResponse {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub coins: Option<i64>,
}

impl MeResponse {
    pub fn into_user_info(self) -> UserInfo {
        let username = [self.username, self.email]
            .into_iter()
            .flatten()
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .unwrap_or_else(|| FALLBACK_USERNAME.to_string());
        UserInfo {
            id: self.id,
            username,
            coins: self.coins.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

/// `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub character: String,
    pub history: Vec<HistoryEntry>,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// `POST /api/v1/characters/set-main-photos/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetMainPhotosRequest {
    pub character_name: String,
    pub photo_ids: Vec<String>,
}

/// `POST /api/v1/generate-image/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageGenerationRequest {
    pub character: String,
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f64,
    pub use_default_prompts: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageGenerationResponse {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// One element of `GET /api/v1/characters/{name}/photos/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CharacterPhotoRecord {
    #[serde(default)]
    pub id: Option<Value>,
    /// Empty when the backend omitted it; such photos are skipped.
    #[serde(default, deserialize_with = "crate::characters::nullable_string")]
    pub url: String,
    #[serde(default, deserialize_with = "nullable_bool")]
    pub is_main: bool,
}

fn nullable_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Human-readable line for the model list.
pub fn models_summary(count: usize) -> String {
    format!("{count} model(s) available")
}

/// Pulls the FastAPI `detail` out of an error body.
///
/// `detail` is either a plain string or a list of validation errors carrying
/// `msg`; anything else yields `None`.
pub fn error_detail(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let detail = parsed.get("detail")?;
    let text = match detail {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(Value::as_str))
            .map(str::to_string)?,
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)?,
        _ => return None,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
