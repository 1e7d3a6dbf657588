//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod ci;

pub use bot::ChatPoster;
pub use ci::{CiProvider, Session};
