mod draft;
mod summary;

pub use draft::{CharacterDraft, CharacterPayload, MissingFields};
pub(crate) use summary::nullable_string;
pub use summary::{
    catalogue_characters, owned_characters, Character, CharacterRecord, MISSING_DESCRIPTION,
    MY_CHARACTER_AUTHOR, MY_CHARACTER_TAG,
};

/// Coins charged by the backend for a new character.
pub const CHARACTER_CREATION_COST: i64 = 10;
