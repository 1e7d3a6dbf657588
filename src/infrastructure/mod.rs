//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Adapters: Messaging platform integrations (Slack)
//! - Travis: CI provider client

pub mod config;
pub mod adapters;
pub mod travis;
