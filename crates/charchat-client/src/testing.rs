//! In-memory `Backend` for controller tests.

use std::cell::RefCell;

use charchat_contracts::api::{
    CharacterPhotoRecord, ChatReply, ChatRequest, ImageGenerationRequest,
    ImageGenerationResponse, MeResponse, SetMainPhotosRequest,
};
use charchat_contracts::characters::{CharacterPayload, CharacterRecord};
use serde_json::{json, Value};

use crate::backend::Backend;
use crate::error::ClientError;

type Reply<T> = RefCell<Option<Result<T, ClientError>>>;

#[derive(Debug, Default)]
pub struct FakeBackend {
    offline: bool,
    me: Option<MeResponse>,
    calls: RefCell<Vec<String>>,
    chat_reply: Reply<ChatReply>,
    generate_reply: Reply<ImageGenerationResponse>,
    save_reply: Reply<Value>,
    delete_reply: Reply<()>,
    characters: Reply<Vec<CharacterRecord>>,
    photos: Reply<Vec<CharacterPhotoRecord>>,
    models: Reply<Vec<Value>>,
    settings: Reply<Value>,
    chat_requests: RefCell<Vec<ChatRequest>>,
    generate_requests: RefCell<Vec<ImageGenerationRequest>>,
    saved_main_photos: RefCell<Vec<SetMainPhotosRequest>>,
    created_characters: RefCell<Vec<CharacterPayload>>,
}

impl FakeBackend {
    /// Rejects every token until `with_user` is called.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: i64, username: &str, coins: i64) -> Self {
        self.me = Some(MeResponse {
            id,
            username: Some(username.to_string()),
            email: None,
            coins: Some(coins),
        });
        self
    }

    pub fn rejecting_tokens(mut self) -> Self {
        self.me = None;
        self
    }

    /// Every call fails as if the backend were down.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn set_chat_reply(&self, reply: Result<ChatReply, ClientError>) {
        *self.chat_reply.borrow_mut() = Some(reply);
    }

    pub fn set_generate_reply(&self, reply: Result<ImageGenerationResponse, ClientError>) {
        *self.generate_reply.borrow_mut() = Some(reply);
    }

    pub fn set_save_reply(&self, reply: Result<Value, ClientError>) {
        *self.save_reply.borrow_mut() = Some(reply);
    }

    pub fn set_delete_reply(&self, reply: Result<(), ClientError>) {
        *self.delete_reply.borrow_mut() = Some(reply);
    }

    pub fn set_characters(&self, reply: Result<Vec<CharacterRecord>, ClientError>) {
        *self.characters.borrow_mut() = Some(reply);
    }

    pub fn set_character_photos(&self, reply: Result<Vec<CharacterPhotoRecord>, ClientError>) {
        *self.photos.borrow_mut() = Some(reply);
    }

    pub fn set_models(&self, reply: Result<Vec<Value>, ClientError>) {
        *self.models.borrow_mut() = Some(reply);
    }

    pub fn set_settings(&self, reply: Result<Value, ClientError>) {
        *self.settings.borrow_mut() = Some(reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.borrow().clone()
    }

    pub fn generate_requests(&self) -> Vec<ImageGenerationRequest> {
        self.generate_requests.borrow().clone()
    }

    pub fn saved_main_photos(&self) -> Vec<SetMainPhotosRequest> {
        self.saved_main_photos.borrow().clone()
    }

    pub fn created_characters(&self) -> Vec<CharacterPayload> {
        self.created_characters.borrow().clone()
    }

    fn record(&self, call: String) -> Result<(), ClientError> {
        self.calls.borrow_mut().push(call);
        if self.offline {
            return Err(ClientError::Transport {
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    fn reply<T: Clone>(slot: &Reply<T>, default: impl FnOnce() -> T) -> Result<T, ClientError> {
        slot.borrow().clone().unwrap_or_else(|| Ok(default()))
    }
}

impl Backend for FakeBackend {
    fn whoami(&self, token: &str) -> Result<MeResponse, ClientError> {
        self.record(format!("whoami:{token}"))?;
        self.me.clone().ok_or(ClientError::Unauthorized {
            status: 401,
            detail: Some("Could not validate credentials".to_string()),
        })
    }

    fn list_models(&self) -> Result<Vec<Value>, ClientError> {
        self.record("list_models".to_string())?;
        Self::reply(&self.models, Vec::new)
    }

    fn chat(&self, token: Option<&str>, request: &ChatRequest) -> Result<ChatReply, ClientError> {
        self.record(format!("chat:{}", token.unwrap_or("-")))?;
        self.chat_requests.borrow_mut().push(request.clone());
        Self::reply(&self.chat_reply, ChatReply::default)
    }

    fn list_characters(&self, _token: Option<&str>) -> Result<Vec<CharacterRecord>, ClientError> {
        self.record("list_characters".to_string())?;
        Self::reply(&self.characters, Vec::new)
    }

    fn create_character(
        &self,
        _token: &str,
        payload: &CharacterPayload,
    ) -> Result<Value, ClientError> {
        self.record("create_character".to_string())?;
        self.created_characters.borrow_mut().push(payload.clone());
        Ok(json!({"name": payload.name}))
    }

    fn update_character(
        &self,
        _token: &str,
        name: &str,
        payload: &CharacterPayload,
    ) -> Result<Value, ClientError> {
        self.record(format!("update_character:{name}"))?;
        Ok(json!({"name": payload.name}))
    }

    fn delete_character(&self, _token: &str, name: &str) -> Result<(), ClientError> {
        self.record(format!("delete_character:{name}"))?;
        Self::reply(&self.delete_reply, || ())
    }

    fn character_photos(&self, name: &str) -> Result<Vec<CharacterPhotoRecord>, ClientError> {
        self.record(format!("character_photos:{name}"))?;
        Self::reply(&self.photos, Vec::new)
    }

    fn set_main_photos(
        &self,
        _token: &str,
        request: &SetMainPhotosRequest,
    ) -> Result<Value, ClientError> {
        self.record("set_main_photos".to_string())?;
        self.saved_main_photos.borrow_mut().push(request.clone());
        Self::reply(&self.save_reply, || json!({"success": true}))
    }

    fn generate_image(
        &self,
        _token: &str,
        request: &ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse, ClientError> {
        self.record("generate_image".to_string())?;
        let count = {
            let mut requests = self.generate_requests.borrow_mut();
            requests.push(request.clone());
            requests.len()
        };
        Self::reply(&self.generate_reply, || ImageGenerationResponse {
            image_url: Some(format!("/static/photos/generated_{count}.png")),
            filename: Some(format!("generated_{count}.png")),
        })
    }

    fn fallback_settings(&self) -> Result<Value, ClientError> {
        self.record("fallback_settings".to_string())?;
        Self::reply(&self.settings, || json!({}))
    }
}
