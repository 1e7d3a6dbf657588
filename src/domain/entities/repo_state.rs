use chrono::{DateTime, Utc};
use std::fmt;

/// Outcome of the last build of a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildState {
    Passed,
    Failed,
    Errored,
    Other(String),
}

impl BuildState {
    pub fn from_api(state: &str) -> Self {
        match state {
            "passed" => BuildState::Passed,
            "failed" => BuildState::Failed,
            "errored" => BuildState::Errored,
            other => BuildState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BuildState::Passed => "passed",
            BuildState::Failed => "failed",
            BuildState::Errored => "errored",
            BuildState::Other(s) => s,
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last known build outcome for one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoState {
    /// Repository slug (`owner/repo`)
    pub name: String,
    pub state: BuildState,
    /// `None` when the CI service has no finish time for the build
    pub last_finished: Option<DateTime<Utc>>,
    /// Link to the build page
    pub url: String,
}

impl RepoState {
    pub fn new(
        name: impl Into<String>,
        state: BuildState,
        last_finished: Option<DateTime<Utc>>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            state,
            last_finished,
            url: url.into(),
        }
    }
}

/// Repo states ordered by finish time, oldest first.
///
/// Entries without a finish time sort before every timestamped entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoStateList {
    states: Vec<RepoState>,
}

impl RepoStateList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping the ordering; equal timestamps keep arrival order.
    pub fn push(&mut self, state: RepoState) {
        let at = self
            .states
            .partition_point(|s| s.last_finished <= state.last_finished);
        self.states.insert(at, state);
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepoState> {
        self.states.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Most recently finished build, if any
    pub fn latest(&self) -> Option<&RepoState> {
        self.states.last()
    }
}

impl FromIterator<RepoState> for RepoStateList {
    fn from_iter<I: IntoIterator<Item = RepoState>>(iter: I) -> Self {
        let mut states: Vec<RepoState> = iter.into_iter().collect();
        states.sort_by(|a, b| a.last_finished.cmp(&b.last_finished));
        Self { states }
    }
}

impl IntoIterator for RepoStateList {
    type Item = RepoState;
    type IntoIter = std::vec::IntoIter<RepoState>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.into_iter()
    }
}
