pub mod backend;
pub mod catalog;
pub mod characters;
pub mod chat;
pub mod config;
pub mod error;
pub mod photos;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{Backend, HttpBackend};
pub use catalog::{describe_models, load_generation_settings};
pub use characters::CharacterManager;
pub use chat::{ChatPipeline, SendOutcome};
pub use config::{ClientConfig, ConfigOverrides};
pub use error::ClientError;
pub use photos::{PhotoStudio, SaveOutcome};
pub use session::SessionManager;
