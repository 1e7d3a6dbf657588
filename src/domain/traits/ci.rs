use async_trait::async_trait;
use std::fmt;
use crate::domain::entities::{RepoState, RepoStateList};
use crate::application::errors::CiError;

/// Authenticated CI session, handed to every CI operation
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

/// CI provider trait - build state queries and mutations
#[async_trait]
pub trait CiProvider: Send + Sync {
    /// Exchange a token for a session; `None` when the token is rejected
    async fn authenticate(&self, token: &str) -> Option<Session>;

    /// Last build state of `owner/repo`
    async fn get_state(&self, session: &Session, slug: &str) -> Result<RepoState, CiError>;

    /// Build states of every repo owned by `owner` that has a build, oldest first
    async fn list_states(&self, session: &Session, owner: &str) -> Result<RepoStateList, CiError>;

    /// Restart the last build of `owner/repo`, returning its build id
    async fn restart_last_build(&self, session: &Session, slug: &str) -> Result<u64, CiError>;

    /// Link to a build page
    fn build_url(&self, slug: &str, build_id: u64) -> String;
}
