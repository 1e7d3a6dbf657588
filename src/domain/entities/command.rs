use std::fmt;

/// A chat command recognised after the `bot travis` trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Rebuild,
    Unknown(String),
}

impl Command {
    /// Commands listed by `help`, in display order
    pub const DOCUMENTED: [Command; 2] = [Command::Status, Command::Rebuild];

    pub fn from_keyword(word: &str) -> Self {
        match word {
            "help" => Command::Help,
            "status" => Command::Status,
            "rebuild" => Command::Rebuild,
            other => Command::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Command::Help => "help",
            Command::Status => "status",
            Command::Rebuild => "rebuild",
            Command::Unknown(word) => word,
        }
    }

    pub fn description(&self) -> Option<&'static str> {
        match self {
            Command::Status => Some("Get the `user/repo` CI state via Travis API"),
            Command::Rebuild => Some("Restart the last build"),
            Command::Help | Command::Unknown(_) => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
