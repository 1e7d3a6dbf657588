//! Message dispatcher - Routes matched commands to the CI provider

use crate::application::errors::BotError;
use crate::application::services::ReplyFormatter;
use crate::domain::entities::{Command, Reply};
use crate::domain::traits::{ChatPoster, CiProvider, Session};
use super::parser::CommandMatcher;

/// Routes chat commands for one repository to the CI provider and formats replies
pub struct CommandDispatcher<C: CiProvider> {
    matcher: CommandMatcher,
    ci: C,
    session: Session,
    slug: String,
    formatter: ReplyFormatter,
}

impl<C: CiProvider> CommandDispatcher<C> {
    pub fn new(ci: C, session: Session, slug: impl Into<String>, formatter: ReplyFormatter) -> Self {
        Self {
            matcher: CommandMatcher::new(),
            ci,
            session,
            slug: slug.into(),
            formatter,
        }
    }

    /// Build the reply for a command.
    ///
    /// A failing status lookup is an error; a failing rebuild is reported in the reply.
    pub async fn dispatch(&self, command: &Command) -> Result<Reply, BotError> {
        match command {
            Command::Help => Ok(self.formatter.help()),
            Command::Status => {
                let state = self.ci.get_state(&self.session, &self.slug).await?;
                tracing::debug!("{} is {}", state.name, state.state);
                Ok(self.formatter.status(&state))
            }
            Command::Rebuild => match self.ci.restart_last_build(&self.session, &self.slug).await {
                Ok(build_id) => {
                    tracing::info!("Restarted build {} of {}", build_id, self.slug);
                    let url = self.ci.build_url(&self.slug, build_id);
                    Ok(self.formatter.rebuild_started(&url, build_id))
                }
                Err(e) => {
                    tracing::warn!("Failed to restart last build of {}: {}", self.slug, e);
                    Ok(self.formatter.rebuild_failed(&e))
                }
            },
            Command::Unknown(word) => Ok(self.formatter.unknown(word)),
        }
    }

    /// Handle one chat message, posting at most one reply.
    ///
    /// Returns whether a reply was posted.
    pub async fn handle_message<P: ChatPoster + ?Sized>(
        &self,
        poster: &P,
        channel: &str,
        text: &str,
    ) -> Result<bool, BotError> {
        let Some(command) = self.matcher.parse(text) else {
            return Ok(false);
        };

        tracing::info!("[{}] command: {}", channel, command);
        let reply = self.dispatch(&command).await?;
        poster.post_reply(channel, &reply).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone, Utc};
    use std::sync::Mutex;
    use crate::application::errors::CiError;
    use crate::domain::entities::{BuildState, Color, RepoState, RepoStateList};

    struct FakeCi {
        state: Result<RepoState, CiError>,
        restart: Result<u64, CiError>,
    }

    impl FakeCi {
        fn passing() -> Self {
            Self {
                state: Ok(RepoState::new(
                    "octo/widgets",
                    BuildState::Passed,
                    Some(Utc.with_ymd_and_hms(2016, 5, 1, 0, 0, 0).unwrap()),
                    "https://travis-ci.org/octo/widgets/builds/7",
                )),
                restart: Ok(7),
            }
        }
    }

    #[async_trait]
    impl CiProvider for FakeCi {
        async fn authenticate(&self, token: &str) -> Option<Session> {
            Some(Session::new(token))
        }

        async fn get_state(&self, _session: &Session, _slug: &str) -> Result<RepoState, CiError> {
            self.state.clone()
        }

        async fn list_states(&self, _session: &Session, _owner: &str) -> Result<RepoStateList, CiError> {
            self.state.clone().map(|s| std::iter::once(s).collect())
        }

        async fn restart_last_build(&self, _session: &Session, _slug: &str) -> Result<u64, CiError> {
            self.restart.clone()
        }

        fn build_url(&self, slug: &str, build_id: u64) -> String {
            format!("https://travis-ci.org/{}/builds/{}", slug, build_id)
        }
    }

    #[derive(Default)]
    struct RecordingPoster {
        posted: Mutex<Vec<(String, Reply)>>,
        fail: bool,
    }

    #[async_trait]
    impl ChatPoster for RecordingPoster {
        async fn post_reply(&self, channel: &str, reply: &Reply) -> Result<String, BotError> {
            if self.fail {
                return Err(BotError::Post("channel_not_found".to_string()));
            }
            self.posted.lock().unwrap().push((channel.to_string(), reply.clone()));
            Ok("1.0".to_string())
        }
    }

    fn dispatcher(ci: FakeCi) -> CommandDispatcher<FakeCi> {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        CommandDispatcher::new(ci, Session::new("t"), "octo/widgets", ReplyFormatter::new(tz))
    }

    #[tokio::test]
    async fn test_non_matching_message_posts_nothing() {
        let poster = RecordingPoster::default();
        let d = dispatcher(FakeCi::passing());

        for text in ["hello", "bot status", "travis status", "bot travis"] {
            assert!(!d.handle_message(&poster, "C1", text).await.unwrap());
        }
        assert!(poster.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_posts_one_reply_to_origin_channel() {
        let poster = RecordingPoster::default();
        let d = dispatcher(FakeCi::passing());

        assert!(d.handle_message(&poster, "C42", "bot travis status").await.unwrap());
        let posted = poster.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].0, "C42");
        assert_eq!(posted[0].1.color(), Some(Color::Good));
    }

    #[tokio::test]
    async fn test_status_failure_is_fatal() {
        let poster = RecordingPoster::default();
        let mut ci = FakeCi::passing();
        ci.state = Err(CiError::Network("connection refused".to_string()));
        let d = dispatcher(ci);

        let err = d.handle_message(&poster, "C1", "bot travis status").await.unwrap_err();
        assert!(matches!(err, BotError::Api(CiError::Network(_))));
        assert!(poster.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_success_and_failure() {
        let d = dispatcher(FakeCi::passing());
        let reply = d.dispatch(&Command::Rebuild).await.unwrap();
        let text = reply.attachments[0].text.clone().unwrap();
        assert!(text.contains("<https://travis-ci.org/octo/widgets/builds/7|7>"));

        let mut ci = FakeCi::passing();
        ci.restart = Err(CiError::Api { status: 403, body: "forbidden".to_string() });
        let reply = dispatcher(ci).dispatch(&Command::Rebuild).await.unwrap();
        assert_eq!(reply.color(), Some(Color::Danger));
        assert_eq!(reply.attachments[0].text.as_deref(), Some("Travis API returned 403: forbidden"));
    }

    #[tokio::test]
    async fn test_unknown_command_is_a_reply() {
        let poster = RecordingPoster::default();
        let d = dispatcher(FakeCi::passing());

        assert!(d.handle_message(&poster, "C1", "bot travis frobnicate").await.unwrap());
        let posted = poster.posted.lock().unwrap();
        assert_eq!(
            posted[0].1.attachments[0].text.as_deref(),
            Some("frobnicate: no such command")
        );
    }

    #[tokio::test]
    async fn test_post_failure_propagates() {
        let poster = RecordingPoster { fail: true, ..Default::default() };
        let d = dispatcher(FakeCi::passing());

        let err = d.handle_message(&poster, "C1", "bot travis help").await.unwrap_err();
        assert!(matches!(err, BotError::Post(_)));
    }
}
