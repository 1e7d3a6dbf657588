//! Command matcher - Extracts the command word from chat text

use once_cell::sync::Lazy;
use regex_lite::Regex;
use crate::domain::entities::Command;

static TRIGGER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bbot\s+travis\s+(\w+)").expect("trigger pattern is valid")
});

/// Matches `bot travis <word>` anywhere in a message
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandMatcher;

impl CommandMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Captured command word, or `None` when the text does not trigger the bot
    pub fn keyword<'t>(&self, text: &'t str) -> Option<&'t str> {
        TRIGGER
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Parse a message into a command
    pub fn parse(&self, text: &str) -> Option<Command> {
        self.keyword(text).map(Command::from_keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_trigger() {
        let matcher = CommandMatcher::new();
        assert_eq!(matcher.keyword("bot travis status"), Some("status"));
        assert_eq!(matcher.keyword("bot   travis\trebuild now"), Some("rebuild"));
        assert_eq!(matcher.parse("bot travis help"), Some(Command::Help));
    }

    #[test]
    fn test_ignores_surrounding_text() {
        let matcher = CommandMatcher::new();
        assert_eq!(matcher.keyword("hey, bot travis status please"), Some("status"));
        assert_eq!(matcher.keyword("bot travis rebuild!"), Some("rebuild"));
    }

    #[test]
    fn test_non_matching_text() {
        let matcher = CommandMatcher::new();
        for text in [
            "",
            "hello world",
            "bot travis",
            "bot travis   ",
            "Bot Travis status",
            "bot circle status",
            "robot travis status",
            "bot travis !!",
        ] {
            assert_eq!(matcher.keyword(text), None, "unexpected match for {:?}", text);
        }
    }

    #[test]
    fn test_unknown_word() {
        let matcher = CommandMatcher::new();
        assert_eq!(
            matcher.parse("bot travis frobnicate"),
            Some(Command::Unknown("frobnicate".to_string()))
        );
    }
}
