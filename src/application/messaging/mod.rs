//! Message handling - Command matching and dispatching

pub mod dispatcher;
pub mod parser;

pub use dispatcher::CommandDispatcher;
