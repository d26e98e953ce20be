use anon_client::RemoteServer;
use anyhow::Context;

use crate::cli::ServerCommand;
use crate::context::AnonContext;
use crate::output::job_table;
use crate::terminal::Terminal;

pub fn run(
    command: ServerCommand,
    context: &mut AnonContext,
    terminal: &mut Terminal<'_>,
) -> anyhow::Result<()> {
    match command {
        ServerCommand::Add { short_name, url } => {
            let server = RemoteServer::new(short_name, url);
            context.settings.settings.add_server(&server)?;
            context.settings.save()?;
            terminal.say(format!("added {server} to list"))?;
        }
        ServerCommand::Remove { short_name } => {
            let server = context.settings.settings.remove_server(&short_name)?;
            context.settings.save()?;
            terminal.say(format!("removed {server} from list"))?;
        }
        ServerCommand::List => {
            terminal.say("Available servers (* = active):\n")?;
            let active = context.settings.settings.active_server_name.clone();
            for server in context.settings.settings.servers() {
                let marker = if active.as_deref() == Some(server.name.as_str()) {
                    "*"
                } else {
                    " "
                };
                terminal.say(format!("{marker}{server}"))?;
            }
        }
        ServerCommand::Activate { short_name } => {
            let server = context.settings.settings.activate(&short_name)?;
            context.settings.save()?;
            terminal.say(format!("Set active server to {server}"))?;
        }
        ServerCommand::Status => {
            let server = context.active_server()?;
            let status = context
                .client_tool(&server)
                .and_then(|tool| Ok(tool.server_status()?));
            match status {
                Ok(()) => terminal.say(format!("OK: {server} is online and responsive"))?,
                Err(err) => terminal.say(format!(
                    "ERROR: {server} is not responding properly. Error:\n {err:#}"
                ))?,
            }
        }
        ServerCommand::Jobs => {
            let server = context.active_server()?;
            let jobs = context
                .client_tool(&server)?
                .get_jobs()
                .with_context(|| format!("Error getting jobs from {server}"))?;
            terminal.say(job_table(&jobs, false).to_string())?;
        }
    }
    Ok(())
}
