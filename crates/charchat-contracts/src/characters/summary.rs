use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const MY_CHARACTER_TAG: &str = "My Character";
pub const MY_CHARACTER_AUTHOR: &str = "Me";
pub const MISSING_DESCRIPTION: &str = "No description available";

/// One element of `GET /api/v1/characters/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CharacterRecord {
    #[serde(default)]
    pub id: Value,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default)]
    pub character_appearance: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub main_photos: Option<Value>,
}

impl CharacterRecord {
    /// Falls back to the name when the backend sent no id.
    pub fn id_string(&self) -> String {
        match &self.id {
            Value::Null => self.name.trim().to_string(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }

    /// Records without a name cannot be addressed and are left out of listings.
    pub fn is_listable(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn is_owned(&self) -> bool {
        matches!(&self.user_id, Some(value) if !value.is_null())
    }

    /// Photo urls from `main_photos`, which the backend sends either as a
    /// JSON list or as a JSON-encoded string of one.
    pub fn photo_urls(&self) -> Vec<String> {
        let decoded = match &self.main_photos {
            Some(Value::String(raw)) => serde_json::from_str::<Value>(raw).unwrap_or(Value::Null),
            Some(other) => other.clone(),
            None => Value::Null,
        };
        decoded
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        item.as_str()
                            .or_else(|| item.get("url").and_then(Value::as_str))
                            .map(str::to_string)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Card-level view of a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub description: String,
    pub avatar: String,
    pub photos: Vec<String>,
    pub tags: Vec<String>,
    pub author: String,
    pub likes: u64,
    pub views: u64,
    pub comments: u64,
}

impl Character {
    pub fn from_record(record: &CharacterRecord) -> Self {
        let description = record
            .character_appearance
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(MISSING_DESCRIPTION)
            .to_string();
        Self {
            id: record.id_string(),
            name: record.name.clone(),
            description,
            avatar: avatar_letter(&record.name),
            photos: record.photo_urls(),
            tags: Vec::new(),
            author: String::new(),
            likes: 0,
            views: 0,
            comments: 0,
        }
    }
}

/// Cards for the whole catalogue.
pub fn catalogue_characters(records: &[CharacterRecord]) -> Vec<Character> {
    records
        .iter()
        .filter(|record| record.is_listable())
        .map(Character::from_record)
        .collect()
}

/// Cards for the characters owned by the signed-in user.
pub fn owned_characters(records: &[CharacterRecord]) -> Vec<Character> {
    records
        .iter()
        .filter(|record| record.is_listable() && record.is_owned())
        .map(|record| Character {
            tags: vec![MY_CHARACTER_TAG.to_string()],
            author: MY_CHARACTER_AUTHOR.to_string(),
            photos: Vec::new(),
            ..Character::from_record(record)
        })
        .collect()
}

/// Reads a string that may be `null`, yielding an empty string.
pub(crate) fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn avatar_letter(name: &str) -> String {
    name.trim()
        .chars()
        .next()
        .map(|ch| ch.to_uppercase().collect())
        .unwrap_or_default()
}
