use anyhow::Context;

use crate::cli::JobCommand;
use crate::context::AnonContext;
use crate::output::job_table;
use crate::ranges::flatten;
use crate::terminal::Terminal;

pub fn run(
    command: JobCommand,
    context: &mut AnonContext,
    terminal: &mut Terminal<'_>,
) -> anyhow::Result<()> {
    let server = context.active_server()?;
    let tool = context.client_tool(&server)?;
    match command {
        JobCommand::Info { job_id } => {
            let info = tool
                .get_job_info(job_id)
                .with_context(|| format!("Error getting job info from {server}"))?;
            terminal.say(format!("job {job_id} on {}:\n", server.name))?;
            terminal.say(serde_yaml::to_string(&info)?)?;
        }
        JobCommand::List { job_ids, extended } => {
            let job_ids = flatten(&job_ids);
            if job_ids.is_empty() {
                terminal.say("No job ids given")?;
                return Ok(());
            }
            let infos = tool
                .get_job_info_list(&job_ids, extended)
                .with_context(|| format!("Error getting job info from {server}"))?;
            terminal.say(job_table(&infos, extended).to_string())?;
        }
        JobCommand::Reset { job_id } => {
            tool.reset_job(job_id)
                .with_context(|| format!("Error resetting job on {}", server.name))?;
            terminal.say(format!("Reset job {job_id} on {server}"))?;
        }
        JobCommand::Cancel { job_id } => {
            tool.cancel_job(job_id)
                .with_context(|| format!("Error cancelling job on {server}"))?;
            terminal.say(format!("Cancelled job {job_id} on {}", server.name))?;
        }
    }
    Ok(())
}
