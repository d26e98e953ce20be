use std::fs::File;
use std::path::{Path, PathBuf};

use anon_ingest::{ColumnType, as_tabular_file, extract_parameter_grid};
use anon_map::{JobParameterGrid, Mapping, MappingFolder, MappingList, MappingParameterSet};
use anon_model::{Parameter, SourceIdentifier, SourceKey, WinPath};
use anyhow::{Context, bail};
use tracing::{debug, info};

use crate::cli::MapCommand;
use crate::context::AnonContext;
use crate::logging::redact_value;
use crate::output::mapping_table;
use crate::terminal::Terminal;

/// Options in new mappings when there are no defaults in settings.
const EXAMPLE_PROJECT: &str = "Wetenschap-Algemeen";
const EXAMPLE_DESTINATION: &str = r"\\server\share\anonymized";

pub fn run(
    command: MapCommand,
    context: &mut AnonContext,
    terminal: &mut Terminal<'_>,
) -> anyhow::Result<()> {
    let folder = context.mapping_folder();
    match command {
        MapCommand::Init => {
            if folder.has_mapping() {
                bail!(
                    "Cannot init, a mapping already exists at {}",
                    folder.full_path().display()
                );
            }
            let mapping = example_mapping(context)?;
            folder.save_mapping(&mapping)?;
            terminal.say(format!(
                "Initialised example mapping in {}",
                folder.full_path().display()
            ))?;
        }
        MapCommand::Info => {
            let mapping = load_mapping(&folder)?;
            terminal.say(format!("Mapping in {}:\n", folder.full_path().display()))?;
            terminal.say(&mapping.description)?;
            terminal.say("")?;
            for option in &mapping.options {
                terminal.say(option.describe())?;
            }
            terminal.say(mapping_table(&mapping).to_string())?;
            terminal.say(format!("{} rows", mapping.len()))?;
        }
        MapCommand::Delete => {
            if !folder.has_mapping() {
                terminal.say("No mapping defined in current folder")?;
                return Ok(());
            }
            folder.delete_mapping()?;
            terminal.say("Removed mapping in current dir")?;
        }
        MapCommand::AddStudyFolder { paths, input_file } => {
            let mut mapping = load_mapping(&folder)?;
            let grid = match input_file {
                Some(path) => read_input_file(&path, ColumnType::Folder)?,
                None => JobParameterGrid::new(
                    paths
                        .iter()
                        .map(|path| source_row(&folder, SourceKey::Folder, path))
                        .collect::<anyhow::Result<_>>()?,
                ),
            };
            let added = add_rows(&mut mapping, grid)?;
            folder.save_mapping(&mapping)?;
            terminal.say(format!("Added {added} folders to mapping"))?;
        }
        MapCommand::AddSelection { paths } => {
            let mut mapping = load_mapping(&folder)?;
            let rows = paths
                .iter()
                .map(|path| source_row(&folder, SourceKey::FileSelection, path))
                .collect::<anyhow::Result<_>>()?;
            let added = add_rows(&mut mapping, JobParameterGrid::new(rows))?;
            folder.save_mapping(&mapping)?;
            terminal.say(format!("Added {added} file selections to mapping"))?;
        }
        MapCommand::AddAccessionNumbers {
            accession_numbers,
            input_file,
        } => {
            let mut mapping = load_mapping(&folder)?;
            let grid = match input_file {
                Some(path) => read_input_file(&path, ColumnType::AccessionNumber)?,
                None => JobParameterGrid::new(
                    accession_numbers
                        .iter()
                        .map(|number| {
                            vec![Parameter::Source(SourceIdentifier::new(
                                SourceKey::AccessionNumber,
                                number,
                            ))]
                        })
                        .collect(),
                ),
            };
            let added = add_rows(&mut mapping, grid)?;
            folder.save_mapping(&mapping)?;
            terminal.say(format!("Added {added} accession numbers to mapping"))?;
        }
        MapCommand::Migrate { path } => {
            let source = path.unwrap_or_else(|| folder.full_path());
            let file = File::open(&source)
                .with_context(|| format!("Cannot open mapping list {}", source.display()))?;
            let list = MappingList::load(file)
                .with_context(|| format!("Cannot read {} as a mapping list", source.display()))?;
            let description = format!(
                "Migrated from mapping list on {}",
                chrono::Local::now().format("%Y-%m-%d")
            );
            let mapping = list.to_mapping(&description, context.settings.settings.dialect()?);
            folder.save_mapping(&mapping)?;
            terminal.say(format!(
                "Migrated {} rows from {} to {}",
                list.len(),
                source.display(),
                folder.full_path().display()
            ))?;
        }
    }
    Ok(())
}

pub(crate) fn load_mapping(folder: &MappingFolder) -> anyhow::Result<Mapping> {
    if !folder.has_mapping() {
        bail!(
            "No mapping defined in current directory. You can create one with 'anon map init'"
        );
    }
    folder
        .get_mapping()
        .with_context(|| format!("Error loading mapping {}", folder.full_path().display()))
}

/// Example rows with the user's defaults as options.
pub fn example_mapping(context: &AnonContext) -> anyhow::Result<Mapping> {
    let settings = &context.settings.settings;
    let defaults = &settings.job_default_parameters;
    let or_example = |value: &str, example: &str| {
        if value.is_empty() {
            example.to_string()
        } else {
            value.to_string()
        }
    };
    let options = vec![
        Parameter::Project(or_example(&defaults.project_name, EXAMPLE_PROJECT)),
        Parameter::DestinationPath(WinPath::new(&or_example(
            &defaults.destination_path,
            EXAMPLE_DESTINATION,
        ))),
        Parameter::RootSourcePath(WinPath::new(&context.current_dir().display().to_string())),
    ];
    let description = format!(
        "Mapping created {} by {}",
        chrono::Local::now().format("%Y-%m-%d"),
        settings.user_name
    );
    Ok(Mapping::new(
        JobParameterGrid::example(),
        options,
        description,
        settings.dialect()?,
    ))
}

/// A row with only a source. Paths inside the mapping folder are stored
/// relative to it.
fn source_row(
    folder: &MappingFolder,
    key: SourceKey,
    path: &Path,
) -> anyhow::Result<Vec<Parameter>> {
    let relative: PathBuf = folder.make_relative(path)?;
    let identifier = SourceIdentifier::new(key, &relative.display().to_string());
    debug!(source = redact_value(&identifier.to_string()), "adding source");
    Ok(vec![Parameter::Source(identifier)])
}

/// Rows from the `source_column` of an input file, with pseudonyms when the
/// file has them.
fn read_input_file(path: &Path, source_column: ColumnType) -> anyhow::Result<JobParameterGrid> {
    let file = as_tabular_file(path)?;
    let grid = extract_parameter_grid(file.as_ref(), &[ColumnType::Pseudonym], &[source_column])
        .with_context(|| format!("Error reading {}", path.display()))?;
    info!(rows = grid.len(), file = %path.display(), "read input file");
    Ok(grid)
}

/// Append rows, filling in a generated pseudonym and description where
/// missing. Returns the number of rows added.
fn add_rows(mapping: &mut Mapping, grid: JobParameterGrid) -> anyhow::Result<usize> {
    let mut added = 0;
    for row in grid.rows() {
        let row = MappingParameterSet::new(row.iter().cloned())?;
        mapping.add_row(row.into_row());
        added += 1;
    }
    Ok(added)
}
