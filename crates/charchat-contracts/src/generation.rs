use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ImageGenerationRequest;

/// Coins charged by the backend for one generated photo.
pub const PHOTO_GENERATION_COST: i64 = 30;

pub const DEFAULT_STEPS: u32 = 20;
pub const DEFAULT_CFG_SCALE: f64 = 4.0;
pub const DEFAULT_WIDTH: u32 = 512;
pub const DEFAULT_HEIGHT: u32 = 512;
pub const DEFAULT_NEGATIVE_PROMPT: &str = "blurry, low quality, distorted, bad anatomy";
pub const DEFAULT_PHOTO_PROMPT: &str = "portrait, high quality, detailed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub steps: u32,
    pub cfg_scale: f64,
    pub width: u32,
    pub height: u32,
    pub negative_prompt: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            cfg_scale: DEFAULT_CFG_SCALE,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
        }
    }
}

impl GenerationSettings {
    /// Reads `GET /api/v1/fallback-settings/`. Missing, zero or malformed
    /// fields keep their defaults.
    pub fn from_payload(payload: &Value) -> Self {
        let defaults = Self::default();
        Self {
            steps: positive_u32(payload.get("steps")).unwrap_or(defaults.steps),
            cfg_scale: payload
                .get("cfg_scale")
                .and_then(Value::as_f64)
                .filter(|value| *value > 0.0)
                .unwrap_or(defaults.cfg_scale),
            width: positive_u32(payload.get("width")).unwrap_or(defaults.width),
            height: positive_u32(payload.get("height")).unwrap_or(defaults.height),
            negative_prompt: payload
                .get("negative_prompt")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .unwrap_or(defaults.negative_prompt),
        }
    }
}

/// Character fields the photo prompt falls back to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoSubject {
    pub name: String,
    pub appearance: Option<String>,
    pub location: Option<String>,
}

impl PhotoSubject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Custom prompt if given, else "appearance location", else a generic
    /// portrait prompt.
    pub fn resolve_prompt(&self, custom_prompt: Option<&str>) -> String {
        if let Some(custom) = custom_prompt
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            return custom.to_string();
        }
        let described = format!(
            "{} {}",
            self.appearance.as_deref().unwrap_or(""),
            self.location.as_deref().unwrap_or("")
        );
        let described = described.trim();
        if described.is_empty() {
            DEFAULT_PHOTO_PROMPT.to_string()
        } else {
            described.to_string()
        }
    }

    pub fn build_request(
        &self,
        custom_prompt: Option<&str>,
        settings: &GenerationSettings,
        user_id: Option<i64>,
    ) -> ImageGenerationRequest {
        let character = if self.name.trim().is_empty() {
            "character".to_string()
        } else {
            self.name.trim().to_string()
        };
        ImageGenerationRequest {
            character,
            prompt: self.resolve_prompt(custom_prompt),
            negative_prompt: settings.negative_prompt.clone(),
            width: settings.width,
            height: settings.height,
            steps: settings.steps,
            cfg_scale: settings.cfg_scale,
            use_default_prompts: false,
            user_id,
        }
    }
}

fn positive_u32(value: Option<&Value>) -> Option<u32> {
    value
        .and_then(Value::as_u64)
        .and_then(|raw| u32::try_from(raw).ok())
        .filter(|raw| *raw > 0)
}
