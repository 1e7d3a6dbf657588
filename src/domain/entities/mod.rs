//! Domain entities - Core business objects with no external dependencies

pub mod command;
pub mod repo_state;
pub mod reply;

pub use command::Command;
pub use repo_state::{BuildState, RepoState, RepoStateList};
pub use reply::{Attachment, AttachmentField, Color, Reply};
