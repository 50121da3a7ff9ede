//! CLI command implementations.

pub mod annotate;
pub mod segments;
pub mod serve;

pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;
