//! Application services - Reply formatting

pub mod reply_service;

pub use reply_service::ReplyFormatter;
