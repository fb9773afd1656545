pub mod api;
pub mod characters;
pub mod chat;
pub mod endpoints;
pub mod generation;
pub mod photos;
pub mod repl;
pub mod session;
