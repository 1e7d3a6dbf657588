//! Reply formatter - Turns command outcomes into chat replies

use chrono::FixedOffset;
use crate::application::errors::CiError;
use crate::domain::entities::{Attachment, AttachmentField, BuildState, Color, Command, RepoState, Reply};

const TIME_FORMAT: &str = "%Y/%m/%d %H:%M";
const SOURCE_BASE: &str = "https://github.com";

/// Builds the rich replies posted back to the channel
#[derive(Debug, Clone)]
pub struct ReplyFormatter {
    timezone: FixedOffset,
}

impl ReplyFormatter {
    pub fn new(timezone: FixedOffset) -> Self {
        Self { timezone }
    }

    pub fn color_for(state: &BuildState) -> Color {
        match state {
            BuildState::Passed => Color::Good,
            BuildState::Failed => Color::Danger,
            BuildState::Errored => Color::Warning,
            BuildState::Other(_) => Color::Neutral,
        }
    }

    pub fn help(&self) -> Reply {
        let attachment = Command::DOCUMENTED.iter().fold(
            Attachment::new().with_title("Usage:"),
            |attachment, cmd| {
                attachment.with_field(AttachmentField::new(
                    cmd.name(),
                    cmd.description().unwrap_or_default(),
                ))
            },
        );
        Reply::attachment(attachment)
    }

    pub fn status(&self, repo: &RepoState) -> Reply {
        let finished = repo
            .last_finished
            .map(|t| t.with_timezone(&self.timezone).format(TIME_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string());

        let attachment = Attachment::new()
            .with_fallback(format!("{}: {}", repo.name, repo.state))
            .with_field(
                AttachmentField::new(
                    "State",
                    format!("<{}/{}|{}>: {}", SOURCE_BASE, repo.name, repo.name, repo.state),
                )
                .short(),
            )
            .with_field(AttachmentField::new("LastFinished", format!("<{}|{}>", repo.url, finished)).short())
            .with_color(Self::color_for(&repo.state));
        Reply::attachment(attachment)
    }

    pub fn rebuild_started(&self, build_url: &str, build_id: u64) -> Reply {
        Reply::attachment(
            Attachment::new()
                .with_text(format!(
                    "Restart the last build <{}|{}> successfully",
                    build_url, build_id
                ))
                .with_color(Color::Good),
        )
    }

    pub fn rebuild_failed(&self, error: &CiError) -> Reply {
        Self::error(error.to_string())
    }

    pub fn unknown(&self, word: &str) -> Reply {
        Self::error(format!("{}: no such command", word))
    }

    fn error(text: String) -> Reply {
        Reply::attachment(
            Attachment::new()
                .with_title("Error")
                .with_text(text)
                .with_color(Color::Danger),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn repo(state: &str) -> RepoState {
        RepoState::new(
            "octo/widgets",
            BuildState::from_api(state),
            Some(Utc.with_ymd_and_hms(2016, 12, 31, 18, 5, 0).unwrap()),
            "https://travis-ci.org/octo/widgets/builds/42",
        )
    }

    #[test]
    fn test_status_colors() {
        let formatter = ReplyFormatter::new(jst());
        assert_eq!(formatter.status(&repo("passed")).color(), Some(Color::Good));
        assert_eq!(formatter.status(&repo("failed")).color(), Some(Color::Danger));
        assert_eq!(formatter.status(&repo("errored")).color(), Some(Color::Warning));
        assert_eq!(formatter.status(&repo("canceled")).color(), Some(Color::Neutral));
        assert_eq!(Color::Neutral.as_str(), "#D9D9D9");
    }

    #[test]
    fn test_status_fields_use_configured_timezone() {
        let reply = ReplyFormatter::new(jst()).status(&repo("passed"));
        let fields = &reply.attachments[0].fields;

        assert_eq!(fields[0].title, "State");
        assert_eq!(fields[0].value, "<https://github.com/octo/widgets|octo/widgets>: passed");
        assert!(fields[0].short);
        assert_eq!(fields[1].title, "LastFinished");
        assert_eq!(
            fields[1].value,
            "<https://travis-ci.org/octo/widgets/builds/42|2017/01/01 03:05>"
        );

        let utc = ReplyFormatter::new(FixedOffset::east_opt(0).unwrap()).status(&repo("passed"));
        assert!(utc.attachments[0].fields[1].value.ends_with("|2016/12/31 18:05>"));
    }

    #[test]
    fn test_status_without_finish_time() {
        let mut state = repo("started");
        state.last_finished = None;
        let reply = ReplyFormatter::new(jst()).status(&state);
        assert!(reply.attachments[0].fields[1].value.ends_with("|->"));
    }

    #[test]
    fn test_rebuild_reply_mentions_id_twice() {
        let reply = ReplyFormatter::new(jst())
            .rebuild_started("https://travis-ci.org/octo/widgets/builds/123456", 123456);
        let text = reply.attachments[0].text.clone().unwrap();

        assert_eq!(text.matches("123456").count(), 2);
        assert_eq!(
            text,
            "Restart the last build <https://travis-ci.org/octo/widgets/builds/123456|123456> successfully"
        );
        assert_eq!(reply.color(), Some(Color::Good));
    }

    #[test]
    fn test_rebuild_failure_is_danger() {
        let reply = ReplyFormatter::new(jst()).rebuild_failed(&CiError::NotFound("octo/widgets".into()));
        let attachment = &reply.attachments[0];
        assert_eq!(attachment.title.as_deref(), Some("Error"));
        assert_eq!(attachment.text.as_deref(), Some("Repository not found: octo/widgets"));
        assert_eq!(attachment.color, Some(Color::Danger));
    }

    #[test]
    fn test_unknown_command() {
        let reply = ReplyFormatter::new(jst()).unknown("frobnicate");
        assert_eq!(reply.attachments[0].text.as_deref(), Some("frobnicate: no such command"));
        assert_eq!(reply.color(), Some(Color::Danger));
    }

    #[test]
    fn test_help_lists_commands() {
        let reply = ReplyFormatter::new(jst()).help();
        let attachment = &reply.attachments[0];
        assert_eq!(attachment.title.as_deref(), Some("Usage:"));
        let names: Vec<&str> = attachment.fields.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(names, vec!["status", "rebuild"]);
    }
}
