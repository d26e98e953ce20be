use anon_client::{AnonClientTool, JobInfo};
use anyhow::{Context, bail};
use tracing::warn;

use crate::batch::{BatchError, JobBatch};
use crate::cli::BatchCommand;
use crate::context::AnonContext;
use crate::output::{job_table, status_summary_table};
use crate::ranges::flatten;
use crate::terminal::Terminal;

pub fn run(
    command: BatchCommand,
    context: &mut AnonContext,
    terminal: &mut Terminal<'_>,
) -> anyhow::Result<()> {
    let folder = context.batch_folder();
    match command {
        BatchCommand::Init => {
            if folder.has_batch() {
                bail!("Cannot init, a batch is already defined in this folder");
            }
            let server = context.active_server()?;
            folder.save(&JobBatch::new(server.clone()))?;
            terminal.say(format!("Initialised batch for {server} in current dir"))?;
        }
        BatchCommand::Info => match folder.load() {
            Ok(batch) => terminal.say(batch.to_string())?,
            Err(err @ BatchError::NoBatch { .. }) => {
                terminal.say(format!("{err}. You can create one with 'anon batch init'"))?;
            }
            Err(err) => return Err(err.into()),
        },
        BatchCommand::Delete => {
            folder.delete_batch()?;
            terminal.say("Removed batch in current dir")?;
        }
        BatchCommand::Add { job_ids } => {
            let job_ids = flatten(&job_ids);
            let mut batch = folder.load()?;
            batch.add(job_ids.iter().copied());
            folder.save(&batch)?;
            terminal.say(format!("Added {job_ids:?} to batch"))?;
        }
        BatchCommand::Remove { job_ids } => {
            let job_ids = flatten(&job_ids);
            let mut batch = folder.load()?;
            batch.remove(&job_ids);
            folder.save(&batch)?;
            terminal.say(format!("Removed {job_ids:?} from batch"))?;
        }
        BatchCommand::Status => {
            let batch = folder.load()?;
            let infos = job_infos(context, &batch)?;
            terminal.say(format!(
                "Job info for {} jobs on {}:",
                infos.len(),
                batch.server
            ))?;
            terminal.say(job_table(&infos, false).to_string())?;
            terminal.say(format!("Summary for all {} jobs:", batch.job_ids.len()))?;
            terminal.say(status_summary_table(&infos, batch.job_ids.len()).to_string())?;
        }
        BatchCommand::Reset(confirm) => {
            let batch = folder.load()?;
            terminal.answer_yes_if(confirm.yes);
            for_each_confirmed(context, &batch, &batch.job_ids, "reset", terminal, reset)?;
        }
        BatchCommand::Cancel(confirm) => {
            let batch = folder.load()?;
            terminal.answer_yes_if(confirm.yes);
            for_each_confirmed(context, &batch, &batch.job_ids, "cancel", terminal, cancel)?;
        }
        BatchCommand::ResetError(confirm) => {
            let batch = folder.load()?;
            let errored: Vec<u64> = job_infos(context, &batch)
                .context("Error resetting")?
                .iter()
                .filter(|info| info.has_error())
                .map(|info| info.job_id)
                .collect();
            terminal.answer_yes_if(confirm.yes);
            for_each_confirmed(context, &batch, &errored, "reset", terminal, reset)?;
        }
    }
    Ok(())
}

fn job_infos(context: &AnonContext, batch: &JobBatch) -> anyhow::Result<Vec<JobInfo>> {
    let tool = context.client_tool(&batch.server)?;
    tool.get_job_info_list(&batch.job_ids, false)
        .with_context(|| format!("Error getting job info from {}", batch.server))
}

fn reset(tool: &AnonClientTool, job_id: u64) -> anyhow::Result<String> {
    tool.reset_job(job_id)
        .with_context(|| format!("Error resetting job on {}", tool.server().name))?;
    Ok(format!("Reset job {job_id} on {}", tool.server()))
}

fn cancel(tool: &AnonClientTool, job_id: u64) -> anyhow::Result<String> {
    tool.cancel_job(job_id)
        .with_context(|| format!("Error cancelling job on {}", tool.server()))?;
    Ok(format!("Cancelled job {job_id} on {}", tool.server().name))
}

/// Ask once, then apply `action` to every id. A failing job is reported and
/// the rest still get their turn.
fn for_each_confirmed(
    context: &AnonContext,
    batch: &JobBatch,
    job_ids: &[u64],
    verb: &str,
    terminal: &mut Terminal<'_>,
    action: fn(&AnonClientTool, u64) -> anyhow::Result<String>,
) -> anyhow::Result<()> {
    let question = format!(
        "This will {verb} {} jobs on {}. Are you sure?",
        job_ids.len(),
        batch.server
    );
    if !terminal.confirm(&question)? {
        terminal.say("User cancelled")?;
        return Ok(());
    }
    let tool = context.client_tool(&batch.server)?;
    for &job_id in job_ids {
        match action(&tool, job_id) {
            Ok(message) => terminal.say(message)?,
            Err(err) => {
                warn!(job_id, error = %err, "batch action failed");
                terminal.say(format!("{err:#}"))?;
            }
        }
    }
    terminal.say("Done")?;
    Ok(())
}
