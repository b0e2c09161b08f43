pub mod aws;
pub mod cli;
pub mod commands;
pub mod constants;
pub mod error;
mod fsutil;
pub mod preferences;
pub mod prompt;
pub mod workflow;
