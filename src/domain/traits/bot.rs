use async_trait::async_trait;
use crate::domain::entities::Reply;
use crate::application::errors::BotError;

/// Bot trait - abstraction for posting replies to a messaging platform
#[async_trait]
pub trait ChatPoster: Send + Sync {
    /// Post a reply to a channel, returning the platform message id
    async fn post_reply(&self, channel: &str, reply: &Reply) -> Result<String, BotError>;
}
