// Library surface for the quiz core; the terminal front end lives in main.rs
// and only talks to the core through these modules.
pub mod app_dirs;
pub mod catalog;
pub mod config;
pub mod error;
pub mod metadata;
pub mod player;
pub mod quiz;
pub mod report;
pub mod runtime;
pub mod selection;
pub mod session;
pub mod source;

pub use catalog::{Item, ItemCatalog, ItemHandle};
pub use error::QuizError;
pub use quiz::{Quiz, QuizState, Stage, Verdict};
