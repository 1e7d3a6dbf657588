//! Travis CI adapter (API v2)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::application::errors::CiError;
use crate::domain::entities::{BuildState, RepoState, RepoStateList};
use crate::domain::traits::{CiProvider, Session};

const API_MEDIA_TYPE: &str = "application/vnd.travis-ci.2.1+json";

/// Repository record as returned by `/repos`
#[derive(Debug, Clone, Deserialize)]
pub struct TravisRepo {
    pub slug: String,
    #[serde(default)]
    pub last_build_id: Option<u64>,
    #[serde(default)]
    pub last_build_state: Option<String>,
    #[serde(default)]
    pub last_build_finished_at: Option<String>,
}

#[derive(Deserialize)]
struct RepoResponse {
    repo: TravisRepo,
}

#[derive(Deserialize)]
struct ReposResponse {
    repos: Vec<TravisRepo>,
}

#[derive(Deserialize)]
struct RestartResponse {
    #[serde(default = "default_true")]
    result: bool,
}

fn default_true() -> bool {
    true
}

/// Travis CI client
pub struct TravisClient {
    client: Client,
    api_base: String,
    web_base: String,
}

impl TravisClient {
    pub fn new(api_base: impl Into<String>, web_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            web_base: web_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_base, path))
            .header(reqwest::header::ACCEPT, API_MEDIA_TYPE)
            .header(reqwest::header::USER_AGENT, concat!("travis-bot/", env!("CARGO_PKG_VERSION")))
            .header(reqwest::header::AUTHORIZATION, format!("token {}", token))
    }

    /// Send a request and decode the JSON body; 404 maps to `NotFound(subject)`
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, subject: &str) -> Result<T, CiError> {
        let response = request
            .send()
            .await
            .map_err(|e| CiError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CiError::NotFound(subject.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CiError::Api {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| CiError::Parse(e.to_string()))
    }

    async fn fetch_repo(&self, session: &Session, slug: &str) -> Result<TravisRepo, CiError> {
        let request = self.request(Method::GET, &format!("/repos/{}", slug), session.token());
        let data: RepoResponse = self.send_json(request, slug).await?;
        Ok(data.repo)
    }

    /// Convert an API record; `None` when the repo has never been built
    pub fn repo_state(&self, repo: &TravisRepo) -> Option<RepoState> {
        let state = repo.last_build_state.as_deref().filter(|s| !s.is_empty())?;
        Some(self.to_repo_state(repo, state))
    }

    fn to_repo_state(&self, repo: &TravisRepo, state: &str) -> RepoState {
        let last_finished = repo
            .last_build_finished_at
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc));
        let url = self.build_url(&repo.slug, repo.last_build_id.unwrap_or_default());

        RepoState::new(repo.slug.clone(), BuildState::from_api(state), last_finished, url)
    }
}

#[async_trait]
impl CiProvider for TravisClient {
    async fn authenticate(&self, token: &str) -> Option<Session> {
        let token = token.trim();
        if token.is_empty() {
            tracing::warn!("Travis token is empty");
            return None;
        }

        let request = self.request(Method::GET, "/users", token);
        match self.send_json::<serde_json::Value>(request, "current user").await {
            Ok(_) => Some(Session::new(token)),
            Err(e) => {
                tracing::warn!("Travis authentication failed: {}", e);
                None
            }
        }
    }

    async fn get_state(&self, session: &Session, slug: &str) -> Result<RepoState, CiError> {
        let repo = self.fetch_repo(session, slug).await?;
        let state = repo.last_build_state.clone().unwrap_or_default();
        Ok(self.to_repo_state(&repo, &state))
    }

    async fn list_states(&self, session: &Session, owner: &str) -> Result<RepoStateList, CiError> {
        let request = self
            .request(Method::GET, "/repos", session.token())
            .query(&[("owner_name", owner)]);
        let data: ReposResponse = self.send_json(request, owner).await?;

        let mut states = RepoStateList::new();
        for state in data.repos.iter().filter_map(|repo| self.repo_state(repo)) {
            states.push(state);
        }
        Ok(states)
    }

    async fn restart_last_build(&self, session: &Session, slug: &str) -> Result<u64, CiError> {
        let repo = self.fetch_repo(session, slug).await?;
        let build_id = repo
            .last_build_id
            .ok_or_else(|| CiError::NoBuild(slug.to_string()))?;

        let request = self.request(
            Method::POST,
            &format!("/builds/{}/restart", build_id),
            session.token(),
        );
        let data: RestartResponse = self.send_json(request, &format!("build {}", build_id)).await?;
        if !data.result {
            return Err(CiError::Api {
                status: 200,
                body: format!("restart of build {} was rejected", build_id),
            });
        }

        Ok(build_id)
    }

    fn build_url(&self, slug: &str, build_id: u64) -> String {
        format!("{}/{}/builds/{}", self.web_base, slug, build_id)
    }
}
