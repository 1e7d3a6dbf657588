//! Domain layer - Core business logic with no external dependencies
//! 
//! This layer contains:
//! - Entities: Core business objects (Command, RepoState, Reply)
//! - Traits: Abstractions for infrastructure (ChatPoster, CiProvider)

pub mod entities;
pub mod traits;
