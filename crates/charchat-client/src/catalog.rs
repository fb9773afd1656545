use charchat_contracts::api::models_summary;
use charchat_contracts::generation::GenerationSettings;
use tracing::warn;

use crate::backend::Backend;

pub const MODELS_UNAVAILABLE: &str = "Information unavailable";

/// One-line description of the models the backend serves.
pub fn describe_models(backend: &dyn Backend) -> String {
    match backend.list_models() {
        Ok(models) => models_summary(models.len()),
        Err(err) => {
            warn!(error = %err, "failed loading models");
            MODELS_UNAVAILABLE.to_string()
        }
    }
}

/// Generation parameters from the backend, or the built-in defaults.
pub fn load_generation_settings(backend: &dyn Backend) -> GenerationSettings {
    match backend.fallback_settings() {
        Ok(payload) => GenerationSettings::from_payload(&payload),
        Err(err) => {
            warn!(error = %err, "failed loading generation settings; using defaults");
            GenerationSettings::default()
        }
    }
}
