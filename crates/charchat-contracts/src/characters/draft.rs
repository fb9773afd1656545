use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingFields(pub &'static [&'static str]);

impl std::fmt::Display for MissingFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "All required fields must be filled in ({})", self.0.join(", "))
    }
}

impl std::error::Error for MissingFields {}

/// Form contents for creating or editing a character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDraft {
    pub name: String,
    pub personality: String,
    pub situation: String,
    pub instructions: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub appearance: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Body of `POST /api/v1/characters/create/` and `PUT /api/v1/characters/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterPayload {
    pub name: String,
    pub personality: String,
    pub situation: String,
    pub instructions: String,
    pub style: Option<String>,
    pub appearance: Option<String>,
    pub location: Option<String>,
}

const REQUIRED_FIELDS: [&str; 4] = ["name", "personality", "situation", "instructions"];

impl CharacterDraft {
    /// Trims every field; blank optional fields become `null`.
    pub fn into_payload(self) -> Result<CharacterPayload, MissingFields> {
        let payload = CharacterPayload {
            name: self.name.trim().to_string(),
            personality: self.personality.trim().to_string(),
            situation: self.situation.trim().to_string(),
            instructions: self.instructions.trim().to_string(),
            style: optional(self.style),
            appearance: optional(self.appearance),
            location: optional(self.location),
        };

        let required = [
            &payload.name,
            &payload.personality,
            &payload.situation,
            &payload.instructions,
        ];
        if required.iter().any(|value| value.is_empty()) {
            return Err(MissingFields(&REQUIRED_FIELDS));
        }
        Ok(payload)
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
