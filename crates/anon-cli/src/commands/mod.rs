//! Command handlers. Each one writes its results through a [`Terminal`] so
//! it can run against in-memory input and output.

pub mod batch;
pub mod create;
pub mod job;
pub mod map;
pub mod server;
pub mod user;

use crate::cli::Command;
use crate::context::AnonContext;
use crate::terminal::Terminal;

pub fn run(
    command: Command,
    context: &mut AnonContext,
    terminal: &mut Terminal<'_>,
) -> anyhow::Result<()> {
    match command {
        Command::Server(command) => server::run(command, context, terminal),
        Command::Job(command) => job::run(command, context, terminal),
        Command::User(command) => user::run(command, context, terminal),
        Command::Batch(command) => batch::run(command, context, terminal),
        Command::Map(command) => map::run(command, context, terminal),
        Command::Create(command) => create::run(command, context, terminal),
    }
}
