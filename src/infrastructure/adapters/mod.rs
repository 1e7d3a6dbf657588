//! Platform adapters

pub mod slack;
