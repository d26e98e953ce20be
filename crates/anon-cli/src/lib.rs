//! The `anon` command line tool.

pub mod batch;
pub mod cli;
pub mod commands;
pub mod context;
pub mod logging;
pub mod output;
pub mod ranges;
pub mod settings;
pub mod terminal;
