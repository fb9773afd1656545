mod carousel;
mod selection;

pub use carousel::Carousel;
pub use selection::{
    photo_id_from_filename, GeneratedPhoto, IgnoreReason, PhotoSelection, ToggleOutcome,
    MAX_SELECTED_PHOTOS,
};
