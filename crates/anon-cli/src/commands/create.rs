use std::collections::BTreeSet;

use anon_client::{AnonClientTool, RecordingClient, RemoteServer};
use anon_model::{JobParameterSet, Parameter, ParameterKind};
use anyhow::{Context, bail};
use serde_json::json;
use tracing::{info, warn};

use crate::batch::{BatchFolder, JobBatch};
use crate::cli::CreateCommand;
use crate::commands::map::load_mapping;
use crate::context::AnonContext;
use crate::terminal::Terminal;

pub fn run(
    command: CreateCommand,
    context: &mut AnonContext,
    terminal: &mut Terminal<'_>,
) -> anyhow::Result<()> {
    match command {
        CreateCommand::FromMapping { dry_run, confirm } => {
            terminal.answer_yes_if(confirm.yes);
            from_mapping(context, terminal, dry_run)
        }
        CreateCommand::SetDefaults => set_defaults(context, terminal),
        CreateCommand::ShowDefaults => {
            let defaults = &context.settings.settings.job_default_parameters;
            terminal.say(format!(
                "default IDIS project name: {}",
                defaults.project_name
            ))?;
            terminal.say(format!(
                "default job destination directory: {}",
                defaults.destination_path
            ))?;
            Ok(())
        }
    }
}

/// Every mapping row with the defaults from settings, all validated.
fn job_sets(context: &AnonContext) -> anyhow::Result<Vec<JobParameterSet>> {
    let mapping = load_mapping(&context.mapping_folder())?;
    let defaults = context.settings.settings.default_parameters();
    mapping
        .rows()
        .into_iter()
        .enumerate()
        .map(|(index, row)| -> anyhow::Result<JobParameterSet> {
            let job_set = JobParameterSet::new(row, defaults.iter().cloned());
            job_set
                .validate()
                .with_context(|| format!("Error validating parameters in row {}", index + 1))?;
            Ok(job_set)
        })
        .collect()
}

/// Distinct values of `kind` over all job sets.
fn distinct_values(job_sets: &[JobParameterSet], kind: ParameterKind) -> BTreeSet<String> {
    job_sets
        .iter()
        .filter_map(|job_set| job_set.get(kind))
        .map(Parameter::value)
        .collect()
}

/// The batch to record created ids in, if any. An existing batch for
/// another server is left alone.
fn batch_for(
    folder: &BatchFolder,
    server: &RemoteServer,
    terminal: &mut Terminal<'_>,
) -> anyhow::Result<Option<JobBatch>> {
    if !folder.has_batch() {
        return Ok(Some(JobBatch::new(server.clone())));
    }
    let batch = folder.load()?;
    if batch.server.url != server.url {
        terminal.say(
            "A batch exists in this folder, but for a different server. \
             Not saving job ids in batch",
        )?;
        return Ok(None);
    }
    Ok(Some(batch))
}

fn from_mapping(
    context: &AnonContext,
    terminal: &mut Terminal<'_>,
    dry_run: bool,
) -> anyhow::Result<()> {
    if dry_run {
        terminal.say("** Dry run, nothing will be sent to server **")?;
    }
    let server = context.active_server()?;
    let job_sets = job_sets(context)?;

    let question = format!(
        "This will create {} jobs on {}, for projects {:?}, writing data to {:?}. Are you sure?",
        job_sets.len(),
        server.name,
        distinct_values(&job_sets, ParameterKind::Project),
        distinct_values(&job_sets, ParameterKind::DestinationPath),
    );
    if !terminal.confirm(&question)? {
        terminal.say("Cancelled")?;
        return Ok(());
    }

    let recorder = RecordingClient::new(json!({"job_id": 0}));
    let tool = if dry_run {
        AnonClientTool::new(Box::new(recorder.clone()), server.clone())
    } else {
        context.client_tool(&server)?
    };
    let folder = context.batch_folder();
    let mut batch = if dry_run {
        None
    } else {
        batch_for(&folder, &server, terminal)?
    };

    let mut created = Vec::new();
    let mut failed = false;
    for job_set in &job_sets {
        match tool.create_job(job_set) {
            Ok(job) => {
                terminal.say(format!("Created job with id {}", job.job_id))?;
                created.push(job.job_id);
                if let Some(batch) = batch.as_mut() {
                    batch.add([job.job_id]);
                    folder.save(batch)?;
                }
            }
            Err(err) => {
                let source = job_set
                    .source()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                warn!(error = %err, "job creation failed");
                terminal.say(format!("Error creating job for source {source}: {err}"))?;
                terminal.say("Error will probably keep occurring. Stopping further job creation.")?;
                failed = true;
                break;
            }
        }
    }
    terminal.say(format!("created {} jobs: {created:?}", created.len()))?;

    if dry_run {
        terminal.say("Calls that would have been made:")?;
        for request in recorder.requests() {
            terminal.say(request.to_string())?;
        }
    } else if batch.is_some() && !created.is_empty() {
        info!(jobs = created.len(), "saved job ids in batch");
        terminal.say("Saved job ids in batch in current folder")?;
    }

    if failed {
        bail!(
            "job creation stopped after {} of {} jobs",
            created.len(),
            job_sets.len()
        );
    }
    terminal.say("Done")?;
    Ok(())
}

fn set_defaults(context: &mut AnonContext, terminal: &mut Terminal<'_>) -> anyhow::Result<()> {
    terminal.say(
        "Please set default values, current value shown in [brackets]. Pressing enter \
         without input will keep current value",
    )?;
    let defaults = &context.settings.settings.job_default_parameters;
    let project_name = terminal.prompt(
        "Please enter default IDIS project name",
        &defaults.project_name,
    )?;
    let destination_path = terminal.prompt(
        "Please enter default job destination directory",
        &defaults.destination_path,
    )?;

    let defaults = &mut context.settings.settings.job_default_parameters;
    defaults.project_name = project_name;
    defaults.destination_path = destination_path;
    context.settings.save()?;
    terminal.say("Saved")?;
    Ok(())
}
