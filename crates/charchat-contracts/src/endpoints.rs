pub const WHOAMI: &str = "/auth/me/";
pub const MODELS: &str = "/api/v1/models/";
pub const CHAT: &str = "/chat";
pub const CHARACTERS: &str = "/api/v1/characters/";
pub const CHARACTER_CREATE: &str = "/api/v1/characters/create/";
pub const SET_MAIN_PHOTOS: &str = "/api/v1/characters/set-main-photos/";
pub const GENERATE_IMAGE: &str = "/api/v1/generate-image/";
pub const FALLBACK_SETTINGS: &str = "/api/v1/fallback-settings/";

/// `PUT` / `DELETE` target for one character.
pub fn character_path(name: &str) -> String {
    format!("/api/v1/characters/{}", urlencoding::encode(name.trim()))
}

pub fn character_photos_path(name: &str) -> String {
    format!("/api/v1/characters/{}/photos/", urlencoding::encode(name.trim()))
}

/// Joins a normalized base url and an endpoint path.
pub fn join(base_url: &str, path: &str) -> Option<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return None;
    }
    let base = base_url.trim_end_matches('/');
    if trimmed.starts_with('/') {
        Some(format!("{base}{trimmed}"))
    } else {
        Some(format!("{base}/{trimmed}"))
    }
}
