pub mod config;
pub mod messages;
pub mod positioner;
pub mod runtime;
