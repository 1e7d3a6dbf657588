//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Services: Reply formatting
//! - Errors: Domain-specific errors
//! - Messaging: Command matching and dispatching

pub mod errors;
pub mod services;
pub mod messaging;
