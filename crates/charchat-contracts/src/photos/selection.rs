use serde::{Deserialize, Serialize};

pub const MAX_SELECTED_PHOTOS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPhoto {
    pub id: String,
    pub url: String,
    pub is_selected: bool,
    /// Already stored as one of the character's main photos.
    #[serde(default)]
    pub is_main: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    CapReached,
    UnknownPhoto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Selected,
    Deselected,
    Ignored(IgnoreReason),
}

/// Photos shown for a character and the ids picked for its card.
///
/// At most [`MAX_SELECTED_PHOTOS`] ids are selected; a further selection is
/// dropped until one is released. `selected` keeps selection order and always
/// agrees with the per-photo flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoSelection {
    photos: Vec<GeneratedPhoto>,
    selected: Vec<String>,
}

impl PhotoSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn photos(&self) -> &[GeneratedPhoto] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn selected_ids(&self) -> &[String] {
        &self.selected
    }

    /// Appends an unselected photo. A photo whose id is already listed only
    /// has its url refreshed.
    pub fn push(&mut self, id: impl Into<String>, url: impl Into<String>) {
        let id = id.into();
        let url = url.into();
        if let Some(existing) = self.photos.iter_mut().find(|photo| photo.id == id) {
            existing.url = url;
            return;
        }
        self.photos.push(GeneratedPhoto {
            id,
            url,
            is_selected: false,
            is_main: false,
        });
    }

    /// Replaces the whole list; every selection is dropped.
    pub fn replace(&mut self, photos: impl IntoIterator<Item = (String, String)>) {
        self.photos.clear();
        self.selected.clear();
        for (id, url) in photos {
            self.push(id, url);
        }
    }

    /// Flags exactly the given ids as main photos. Selection is untouched.
    pub fn mark_main(&mut self, ids: &[String]) {
        for photo in &mut self.photos {
            photo.is_main = ids.contains(&photo.id);
        }
    }

    pub fn main_ids(&self) -> Vec<&str> {
        self.photos
            .iter()
            .filter(|photo| photo.is_main)
            .map(|photo| photo.id.as_str())
            .collect()
    }

    pub fn toggle(&mut self, photo_id: &str) -> ToggleOutcome {
        let Some(index) = self.photos.iter().position(|photo| photo.id == photo_id) else {
            return ToggleOutcome::Ignored(IgnoreReason::UnknownPhoto);
        };

        if self.photos[index].is_selected {
            self.photos[index].is_selected = false;
            self.selected.retain(|id| id != photo_id);
            return ToggleOutcome::Deselected;
        }

        if self.selected.len() >= MAX_SELECTED_PHOTOS {
            return ToggleOutcome::Ignored(IgnoreReason::CapReached);
        }
        self.photos[index].is_selected = true;
        self.selected.push(photo_id.to_string());
        ToggleOutcome::Selected
    }
}

/// Derives a photo id from the generated file name by dropping a `.png` or
/// `.jpg` extension.
pub fn photo_id_from_filename(filename: &str) -> String {
    filename.replacen(".png", "", 1).replacen(".jpg", "", 1)
}
