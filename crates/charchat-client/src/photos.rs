use charchat_contracts::api::{CharacterPhotoRecord, SetMainPhotosRequest};
use charchat_contracts::generation::{GenerationSettings, PhotoSubject, PHOTO_GENERATION_COST};
use charchat_contracts::photos::{
    photo_id_from_filename, Carousel, GeneratedPhoto, PhotoSelection, ToggleOutcome,
};
use charchat_contracts::session::TokenStore;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::catalog::load_generation_settings;
use crate::error::ClientError;
use crate::session::SessionManager;

pub const NO_PHOTOS_SELECTED: &str = "No photos selected to save";
pub const MISSING_IMAGE_URL: &str = "The server did not return an image URL";
pub const GENERATION_FAILED: &str = "Photo generation failed";
pub const SAVE_FAILED: &str = "Error while saving photos";
pub const UNKNOWN_ERROR: &str = "Unknown error";
pub const PHOTO_GENERATED: &str = "Photo generated successfully!";
pub const PHOTOS_SAVED: &str = "Main photos saved!";

/// What the caller does after a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Main photos changed server-side; listings must be fetched again.
    Reload,
}

/// Photo generation and main-photo selection for one character.
#[derive(Debug, Clone)]
pub struct PhotoStudio {
    subject: PhotoSubject,
    settings: GenerationSettings,
    selection: PhotoSelection,
    carousel: Carousel,
    generating: bool,
    error: Option<String>,
    success: Option<String>,
}

impl PhotoStudio {
    pub fn new(subject: PhotoSubject) -> Self {
        Self {
            subject,
            settings: GenerationSettings::default(),
            selection: PhotoSelection::new(),
            carousel: Carousel::new(),
            generating: false,
            error: None,
            success: None,
        }
    }

    pub fn subject(&self) -> &PhotoSubject {
        &self.subject
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn photos(&self) -> &[GeneratedPhoto] {
        self.selection.photos()
    }

    pub fn selected_ids(&self) -> &[String] {
        self.selection.selected_ids()
    }

    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn load_settings(&mut self, backend: &dyn Backend) {
        self.settings = load_generation_settings(backend);
    }

    /// Seeds the strip with photos already stored for the character. Stored
    /// main photos are flagged as main but start out unselected.
    pub fn load_existing(&mut self, backend: &dyn Backend) {
        let records = match backend.character_photos(&self.subject.name) {
            Ok(records) => records,
            Err(err) => {
                warn!(character = %self.subject.name, error = %err, "failed loading character photos");
                return;
            }
        };
        let usable: Vec<&CharacterPhotoRecord> = records
            .iter()
            .filter(|record| !record.url.trim().is_empty())
            .collect();
        if usable.len() < records.len() {
            debug!(skipped = records.len() - usable.len(), "photo records without url");
        }
        let main_ids: Vec<String> = usable
            .iter()
            .filter(|record| record.is_main)
            .map(|record| record_photo_id(record))
            .collect();
        self.selection.replace(
            usable
                .iter()
                .map(|record| (record_photo_id(record), record.url.clone())),
        );
        self.selection.mark_main(&main_ids);
        self.carousel.reset();
        debug!(count = self.selection.len(), "loaded character photos");
    }

    /// Ids currently stored as the character's main photos.
    pub fn main_ids(&self) -> Vec<&str> {
        self.selection.main_ids()
    }

    pub fn toggle(&mut self, photo_id: &str) -> ToggleOutcome {
        let outcome = self.selection.toggle(photo_id);
        if let ToggleOutcome::Ignored(reason) = outcome {
            debug!(photo_id, ?reason, "photo toggle ignored");
        }
        outcome
    }

    pub fn next(&mut self) {
        self.carousel.next(self.selection.len());
    }

    pub fn prev(&mut self) {
        self.carousel.prev();
    }

    pub fn dismiss_messages(&mut self) {
        self.error = None;
        self.success = None;
    }

    /// Generates one photo and appends it unselected.
    pub fn generate<S: TokenStore>(
        &mut self,
        sessions: &mut SessionManager<S>,
        backend: &dyn Backend,
        custom_prompt: Option<&str>,
    ) -> Result<GeneratedPhoto, String> {
        self.success = None;
        let coins = sessions.session().coins();
        if !sessions.session().is_authenticated() || coins < PHOTO_GENERATION_COST {
            return Err(self.fail(
                &ClientError::InsufficientCoins {
                    have: coins,
                    need: PHOTO_GENERATION_COST,
                },
                GENERATION_FAILED,
            ));
        }
        let token = match sessions.require_bearer() {
            Ok(token) => token,
            Err(err) => return Err(self.fail(&err, GENERATION_FAILED)),
        };

        self.generating = true;
        self.error = None;
        let request =
            self.subject
                .build_request(custom_prompt, &self.settings, sessions.session().user_id());
        debug!(character = %request.character, prompt = %request.prompt, "generating photo");
        let result = backend.generate_image(&token, &request);
        self.generating = false;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                sessions.note_failure(&err);
                return Err(self.fail(&err, GENERATION_FAILED));
            }
        };
        let Some(url) = response.image_url.filter(|url| !url.trim().is_empty()) else {
            return Err(self.fail(
                &ClientError::Validation(MISSING_IMAGE_URL.to_string()),
                GENERATION_FAILED,
            ));
        };

        let filename = response
            .filename
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| Utc::now().timestamp_millis().to_string());
        let id = photo_id_from_filename(&filename);
        let had_one = self.selection.len() == 1;
        self.selection.push(id.clone(), url);
        if had_one {
            self.carousel.reset();
        }
        self.success = Some(PHOTO_GENERATED.to_string());
        info!(photo_id = %id, "photo generated");

        sessions.refresh_quietly(backend);
        self.selection
            .photos()
            .iter()
            .find(|photo| photo.id == id)
            .cloned()
            .ok_or_else(|| GENERATION_FAILED.to_string())
    }

    /// Stores the selected photos as the character's main photos.
    pub fn save<S: TokenStore>(
        &mut self,
        sessions: &mut SessionManager<S>,
        backend: &dyn Backend,
    ) -> Result<SaveOutcome, String> {
        self.success = None;
        if self.selection.selected_ids().is_empty() {
            self.error = Some(NO_PHOTOS_SELECTED.to_string());
            return Err(NO_PHOTOS_SELECTED.to_string());
        }
        let token = match sessions.require_bearer() {
            Ok(token) => token,
            Err(err) => return Err(self.fail(&err, SAVE_FAILED)),
        };

        let request = SetMainPhotosRequest {
            character_name: self.subject.name.clone(),
            photo_ids: self.selection.selected_ids().to_vec(),
        };
        match backend.set_main_photos(&token, &request) {
            Ok(_) => {
                info!(character = %request.character_name, count = request.photo_ids.len(), "main photos saved");
                self.selection.mark_main(&request.photo_ids);
                self.error = None;
                self.success = Some(PHOTOS_SAVED.to_string());
                Ok(SaveOutcome::Reload)
            }
            Err(err) => {
                warn!(error = %err, "saving main photos failed");
                sessions.note_failure(&err);
                let message = match &err {
                    ClientError::Unauthorized { .. } | ClientError::Http { .. } => format!(
                        "Failed to save photos: {}",
                        err.detail().unwrap_or(UNKNOWN_ERROR)
                    ),
                    _ => SAVE_FAILED.to_string(),
                };
                self.error = Some(message.clone());
                Err(message)
            }
        }
    }

    fn fail(&mut self, err: &ClientError, fallback: &str) -> String {
        let message = err.user_message(fallback);
        self.error = Some(message.clone());
        message
    }
}

/// Photo id of a stored record: its `id` when present, else the file stem
/// of its url.
fn record_photo_id(record: &CharacterPhotoRecord) -> String {
    match &record.id {
        Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
        Some(Value::Number(id)) => id.to_string(),
        _ => {
            let filename = record
                .url
                .rsplit('/')
                .next()
                .unwrap_or(record.url.as_str());
            photo_id_from_filename(filename)
        }
    }
}

#[cfg(test)]
mod tests {
    use charchat_contracts::api::ImageGenerationResponse;
    use charchat_contracts::photos::{IgnoreReason, MAX_SELECTED_PHOTOS};
    use charchat_contracts::session::{MemoryTokenStore, StoredTokens};
    use serde_json::json;

    use super::*;
    use crate::testing::FakeBackend;

    fn signed_in(backend: &FakeBackend) -> anyhow::Result<SessionManager<MemoryTokenStore>> {
        let mut sessions = SessionManager::new(MemoryTokenStore::with_tokens(StoredTokens {
            auth_token: Some("good".to_string()),
            refresh_token: None,
        }));
        sessions.load(backend)?;
        Ok(sessions)
    }

    fn studio() -> PhotoStudio {
        PhotoStudio::new(PhotoSubject {
            name: "anna".to_string(),
            appearance: Some("red hair".to_string()),
            location: Some("beach".to_string()),
        })
    }

    fn seeded(ids: &[&str]) -> PhotoStudio {
        let mut studio = studio();
        studio.selection.replace(
            ids.iter()
                .map(|id| (id.to_string(), format!("/static/{id}.png"))),
        );
        studio
    }

    #[test]
    fn generate_requires_coins() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(1, "anna", 29);
        let mut sessions = signed_in(&backend)?;
        let mut studio = studio();

        let result = studio.generate(&mut sessions, &backend, None);
        assert_eq!(
            result,
            Err("Not enough coins! You have 29, 30 are needed.".to_string())
        );
        assert!(backend.generate_requests().is_empty());
        assert!(studio.photos().is_empty());
        Ok(())
    }

    #[test]
    fn generate_appends_unselected_photo_and_refreshes() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(1, "anna", 100);
        backend.set_generate_reply(Ok(ImageGenerationResponse {
            image_url: Some("/static/photos/anna_1.png".to_string()),
            filename: Some("anna_1.png".to_string()),
        }));
        let mut sessions = signed_in(&backend)?;
        let mut studio = studio();

        let photo = studio
            .generate(&mut sessions, &backend, None)
            .map_err(anyhow::Error::msg)?;
        assert_eq!(photo.id, "anna_1");
        assert!(!photo.is_selected);
        assert_eq!(studio.success(), Some(PHOTO_GENERATED));
        assert!(!studio.is_generating());

        let requests = backend.generate_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "red hair beach");
        assert_eq!(requests[0].character, "anna");
        assert_eq!(requests[0].user_id, Some(1));
        assert!(!requests[0].use_default_prompts);
        assert_eq!(backend.calls().last().map(String::as_str), Some("whoami:good"));
        Ok(())
    }

    #[test]
    fn custom_prompt_wins() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(1, "anna", 100);
        let mut sessions = signed_in(&backend)?;
        let mut studio = studio();
        studio
            .generate(&mut sessions, &backend, Some("  in a red dress "))
            .map_err(anyhow::Error::msg)?;
        assert_eq!(backend.generate_requests()[0].prompt, "in a red dress");
        Ok(())
    }

    #[test]
    fn missing_image_url_is_an_error() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(1, "anna", 100);
        backend.set_generate_reply(Ok(ImageGenerationResponse {
            image_url: None,
            filename: Some("x.png".to_string()),
        }));
        let mut sessions = signed_in(&backend)?;
        let mut studio = studio();

        assert_eq!(
            studio.generate(&mut sessions, &backend, None),
            Err(MISSING_IMAGE_URL.to_string())
        );
        assert!(studio.photos().is_empty());
        assert_eq!(studio.error(), Some(MISSING_IMAGE_URL));
        Ok(())
    }

    #[test]
    fn second_photo_resets_carousel() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(1, "anna", 100);
        let mut sessions = signed_in(&backend)?;
        let mut studio = seeded(&["a"]);
        studio.carousel = {
            let mut carousel = Carousel::new();
            carousel.next(3);
            carousel
        };
        assert_eq!(studio.carousel().translate_pct(), -100);

        studio
            .generate(&mut sessions, &backend, None)
            .map_err(anyhow::Error::msg)?;
        assert_eq!(studio.photos().len(), 2);
        assert_eq!(studio.carousel().translate_pct(), 0);
        Ok(())
    }

    #[test]
    fn fourth_selection_is_ignored() {
        let mut studio = seeded(&["a", "b", "c", "d"]);
        for id in ["a", "b", "c"] {
            assert_eq!(studio.toggle(id), ToggleOutcome::Selected);
        }
        assert_eq!(
            studio.toggle("d"),
            ToggleOutcome::Ignored(IgnoreReason::CapReached)
        );
        assert_eq!(studio.selected_ids().len(), MAX_SELECTED_PHOTOS);

        assert_eq!(studio.toggle("b"), ToggleOutcome::Deselected);
        assert_eq!(studio.toggle("d"), ToggleOutcome::Selected);
        assert_eq!(studio.selected_ids(), ["a", "c", "d"]);
    }

    #[test]
    fn save_without_selection_makes_no_request() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(1, "anna", 100);
        let mut sessions = signed_in(&backend)?;
        let mut studio = seeded(&["a"]);

        assert_eq!(
            studio.save(&mut sessions, &backend),
            Err(NO_PHOTOS_SELECTED.to_string())
        );
        assert!(backend.saved_main_photos().is_empty());
        Ok(())
    }

    #[test]
    fn save_requires_sign_in() -> anyhow::Result<()> {
        let backend = FakeBackend::new();
        let mut sessions = SessionManager::new(MemoryTokenStore::new());
        sessions.load(&backend)?;
        let mut studio = seeded(&["a"]);
        studio.toggle("a");

        assert_eq!(
            studio.save(&mut sessions, &backend),
            Err("Sign in required".to_string())
        );
        Ok(())
    }

    #[test]
    fn save_posts_selected_ids() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(1, "anna", 100);
        let mut sessions = signed_in(&backend)?;
        let mut studio = seeded(&["a", "b"]);
        studio.toggle("b");

        assert_eq!(studio.save(&mut sessions, &backend), Ok(SaveOutcome::Reload));
        let saved = backend.saved_main_photos();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].character_name, "anna");
        assert_eq!(saved[0].photo_ids, vec!["b".to_string()]);
        Ok(())
    }

    #[test]
    fn save_failure_carries_backend_detail() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(1, "anna", 100);
        let mut sessions = signed_in(&backend)?;
        let mut studio = seeded(&["a"]);
        studio.toggle("a");

        backend.set_save_reply(Err(ClientError::Http {
            status: 404,
            detail: Some("Character not found".to_string()),
            body: String::new(),
        }));
        assert_eq!(
            studio.save(&mut sessions, &backend),
            Err("Failed to save photos: Character not found".to_string())
        );

        backend.set_save_reply(Err(ClientError::Http {
            status: 500,
            detail: None,
            body: "oops".to_string(),
        }));
        assert_eq!(
            studio.save(&mut sessions, &backend),
            Err("Failed to save photos: Unknown error".to_string())
        );
        Ok(())
    }

    #[test]
    fn load_existing_flags_main_photos_without_selecting() {
        let backend = FakeBackend::new();
        backend.set_character_photos(Ok(vec![
            CharacterPhotoRecord {
                id: Some(json!("p1")),
                url: "/static/photos/p1.png".to_string(),
                is_main: true,
            },
            CharacterPhotoRecord {
                id: None,
                url: "/static/photos/anna_77.jpg".to_string(),
                is_main: false,
            },
            CharacterPhotoRecord {
                id: Some(json!("broken")),
                url: String::new(),
                is_main: true,
            },
        ]));
        let mut studio = studio();
        studio.load_existing(&backend);

        let ids: Vec<&str> = studio.photos().iter().map(|photo| photo.id.as_str()).collect();
        assert_eq!(ids, ["p1", "anna_77"]);
        assert_eq!(studio.main_ids(), vec!["p1"]);
        assert!(studio.selected_ids().is_empty());
        assert_eq!(backend.calls(), vec!["character_photos:anna"]);
    }

    #[test]
    fn saving_marks_selection_as_main() -> anyhow::Result<()> {
        let backend = FakeBackend::new().with_user(1, "anna", 100);
        let mut sessions = signed_in(&backend)?;
        let mut studio = seeded(&["a", "b"]);
        studio.selection.mark_main(&["a".to_string()]);
        studio.toggle("b");

        assert_eq!(studio.save(&mut sessions, &backend), Ok(SaveOutcome::Reload));
        assert_eq!(studio.main_ids(), vec!["b"]);
        Ok(())
    }

    #[test]
    fn load_existing_failure_keeps_list() {
        let backend = FakeBackend::new().offline();
        let mut studio = seeded(&["a"]);
        studio.load_existing(&backend);
        assert_eq!(studio.photos().len(), 1);
        assert_eq!(studio.error(), None);
    }

    #[test]
    fn navigation_clamps() {
        let mut studio = seeded(&["a", "b"]);
        studio.next();
        studio.next();
        assert_eq!(studio.carousel().translate_pct(), -100);
        studio.prev();
        studio.prev();
        assert_eq!(studio.carousel().translate_pct(), 0);
    }
}
