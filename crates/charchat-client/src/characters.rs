use charchat_contracts::characters::{
    catalogue_characters, owned_characters, Character, CharacterDraft, CharacterPayload, CHARACTER_CREATION_COST,
};
use charchat_contracts::session::TokenStore;
use serde_json::Value;
use tracing::{info, warn};

use crate::backend::Backend;
use crate::error::ClientError;
use crate::session::SessionManager;

/// Character listing and the create/edit/delete flows.
///
/// Every mutation refreshes the session afterwards since the backend may
/// have charged coins.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterManager;

impl CharacterManager {
    pub fn new() -> Self {
        Self
    }

    /// Characters owned by the signed-in user.
    pub fn list_mine<S: TokenStore>(
        &self,
        sessions: &mut SessionManager<S>,
        backend: &dyn Backend,
    ) -> Result<Vec<Character>, ClientError> {
        let token = sessions.require_bearer()?;
        let records = backend
            .list_characters(Some(&token))
            .inspect_err(|err| sessions.note_failure(err))?;
        Ok(owned_characters(&records))
    }

    /// The whole catalogue, as shown to anyone.
    pub fn list_all<S: TokenStore>(
        &self,
        sessions: &SessionManager<S>,
        backend: &dyn Backend,
    ) -> Result<Vec<Character>, ClientError> {
        let records = backend.list_characters(sessions.bearer())?;
        Ok(catalogue_characters(&records))
    }

    pub fn create<S: TokenStore>(
        &self,
        sessions: &mut SessionManager<S>,
        backend: &dyn Backend,
        draft: CharacterDraft,
    ) -> Result<Value, ClientError> {
        let payload = validate(draft)?;
        let token = sessions.require_bearer()?;
        let coins = sessions.session().coins();
        if coins < CHARACTER_CREATION_COST {
            return Err(ClientError::InsufficientCoins {
                have: coins,
                need: CHARACTER_CREATION_COST,
            });
        }
        let created = backend
            .create_character(&token, &payload)
            .inspect_err(|err| sessions.note_failure(err))?;
        info!(name = %payload.name, "character created");
        sessions.refresh_quietly(backend);
        Ok(created)
    }

    pub fn update<S: TokenStore>(
        &self,
        sessions: &mut SessionManager<S>,
        backend: &dyn Backend,
        name: &str,
        draft: CharacterDraft,
    ) -> Result<Value, ClientError> {
        let name = required_name(name)?;
        let payload = validate(draft)?;
        let token = sessions.require_bearer()?;
        let updated = backend
            .update_character(&token, name, &payload)
            .inspect_err(|err| sessions.note_failure(err))?;
        info!(name, "character updated");
        sessions.refresh_quietly(backend);
        Ok(updated)
    }

    pub fn delete<S: TokenStore>(
        &self,
        sessions: &mut SessionManager<S>,
        backend: &dyn Backend,
        name: &str,
    ) -> Result<(), ClientError> {
        let name = required_name(name)?;
        let token = sessions.require_bearer()?;
        backend
            .delete_character(&token, name)
            .inspect_err(|err| {
                warn!(name, error = %err, "character delete failed");
                sessions.note_failure(err);
            })?;
        info!(name, "character deleted");
        sessions.refresh_quietly(backend);
        Ok(())
    }
}

fn validate(draft: CharacterDraft) -> Result<CharacterPayload, ClientError> {
    draft
        .into_payload()
        .map_err(|missing| ClientError::Validation(missing.to_string()))
}

fn required_name(name: &str) -> Result<&str, ClientError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ClientError::Validation(
            "character name must not be empty".to_string(),
        ));
    }
    Ok(name)
}
