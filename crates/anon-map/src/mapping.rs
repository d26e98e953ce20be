//! The sectioned mapping format.
//!
//! ```text
//! ## Description ##
//! free text
//! ## Options ##
//! project,Wetenschap-Algemeen
//! ## Mapping ##
//! source,pseudo_name
//! folder:example\folder1,Patient1
//! ```
//!
//! Options apply to every grid row unless the row sets the same parameter.
//! Every line is padded with delimiters to the width of the grid so
//! spreadsheet programs keep the columns aligned.

use std::borrow::Cow;
use std::io::{Read, Write};

use anon_model::{Parameter, ParameterError, ParameterKind, ParameterSet};
use tracing::debug;

use crate::dialect::{Dialect, LINE_TERMINATOR, sniff_dialect_safe};
use crate::error::{MapperError, Result};
use crate::grid::JobParameterGrid;

/// The three sections, in the order they appear in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Description,
    Options,
    Grid,
}

impl Section {
    pub const ORDER: [Section; 3] = [Section::Description, Section::Options, Section::Grid];

    /// Header line as written on save.
    pub fn header(self) -> &'static str {
        match self {
            Self::Description => "## Description ##",
            Self::Options => "## Options ##",
            Self::Grid => "## Mapping ##",
        }
    }

    /// Header text between the `##` markers.
    fn name(self) -> &'static str {
        match self {
            Self::Description => "Description",
            Self::Options => "Options",
            Self::Grid => "Mapping",
        }
    }
}

/// Lines of a mapping file split per section, line endings removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections<'a> {
    pub description: Vec<&'a str>,
    pub options: Vec<&'a str>,
    pub grid: Vec<&'a str>,
}

impl<'a> Sections<'a> {
    fn push(&mut self, section: Section, line: &'a str) {
        match section {
            Section::Description => self.description.push(line),
            Section::Options => self.options.push(line),
            Section::Grid => self.grid.push(line),
        }
    }
}

fn strip_delimiters(line: &str) -> &str {
    line.trim_end_matches(|c: char| c == ',' || c == ';' || c.is_whitespace())
}

/// Text between the `##` markers of a header-shaped line like
/// `## Options ##` or `##options##`.
fn header_name(line: &str) -> Option<&str> {
    (line.len() >= 4 && line.starts_with("##") && line.ends_with("##"))
        .then(|| line.trim_matches('#').trim())
}

/// Split lines into the three sections.
///
/// Section headers are matched case-insensitively on the text between the
/// `##` markers and must appear in order. Text before the description
/// header is ignored, as are lines holding nothing but delimiters and
/// whitespace.
pub fn parse_sections<'a>(lines: &[&'a str]) -> Result<Sections<'a>> {
    let mut sections = Sections::default();
    let mut remaining = Section::ORDER.iter().copied().peekable();
    let mut current: Option<Section> = None;

    for raw in lines {
        let line = raw.trim_end_matches(['\r', '\n']);
        let candidate = strip_delimiters(line).trim();
        if candidate.is_empty() {
            continue;
        }
        if let Some(&expected) = remaining.peek()
            && let Some(name) = header_name(candidate)
        {
            if !name.eq_ignore_ascii_case(expected.name()) {
                return Err(MapperError::MissingSection {
                    expected: expected.header(),
                    found: Some(candidate.to_string()),
                });
            }
            debug!(section = expected.header(), "found mapping section");
            current = remaining.next();
            continue;
        }
        if let Some(section) = current {
            sections.push(section, line);
        }
    }

    match remaining.next() {
        Some(missing) => Err(MapperError::MissingSection {
            expected: missing.header(),
            found: None,
        }),
        None => Ok(sections),
    }
}

/// Cells of a single line, without the empty cells that pad it to the
/// width of the grid.
fn line_cells(line: &str, dialect: Dialect) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(dialect.delimiter())
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    let mut cells: Vec<String> = match reader.records().next() {
        Some(record) => record?.iter().map(str::to_string).collect(),
        None => Vec::new(),
    };
    while cells.len() > 1 && cells.last().is_some_and(|cell| cell.trim().is_empty()) {
        cells.pop();
    }
    Ok(cells)
}

/// `text` as one CSV cell, quoted unless it reads back unchanged as is.
fn quote_cell(text: &str) -> Cow<'_, str> {
    let plain = !text.is_empty()
        && text.trim() == text
        && !text.starts_with(['#', '"'])
        && !text.contains([',', ';', '\r', '\n']);
    if plain {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("\"{}\"", text.replace('"', "\"\"")))
    }
}

/// Text of one description line. A line starting with a quote is a single
/// quoted cell; other lines lose their trailing delimiters.
fn description_line(line: &str, dialect: Dialect) -> Result<String> {
    if line.starts_with('"')
        && let [text] = line_cells(line, dialect)?.as_slice()
    {
        return Ok(text.clone());
    }
    Ok(strip_delimiters(line).to_string())
}

/// Parse one options line into a parameter. Values may contain the
/// delimiter when quoted. A line that does not split on the file's
/// delimiter is tried with the other one.
fn parse_option(line: &str, dialect: Dialect) -> Result<Parameter> {
    let mut split = None;
    for candidate in [dialect, dialect.alternative()] {
        let cells = line_cells(line, candidate)?;
        if cells.len() >= 2 {
            split = Some((cells, candidate));
            break;
        }
    }
    let Some((cells, used)) = split else {
        return Err(MapperError::Option {
            line: line.to_string(),
            source: ParameterError::ParameterParsing {
                input: line.to_string(),
                reason: format!("expected 'field{}value'", dialect.delimiter_char()),
            },
        });
    };
    let separator = String::from(used.delimiter_char());
    let value = cells[1..].join(separator.as_str());
    Parameter::from_key_value(&cells[0], &value).map_err(|source| MapperError::Option {
        line: line.to_string(),
        source,
    })
}

/// Decode file content. UTF-8 with or without byte order mark, anything
/// else is taken to be Windows-1252, what spreadsheet programs on Windows
/// write.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            debug!("content is not UTF-8, decoding as Windows-1252");
            encoding_rs::WINDOWS_1252
                .decode_without_bom_handling(bytes)
                .0
        }
    }
}

/// Everything needed to create a batch of jobs: free text, mapping-wide
/// options and one grid row per job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    pub grid: JobParameterGrid,
    pub options: Vec<Parameter>,
    pub description: String,
    pub dialect: Dialect,
}

impl Mapping {
    pub fn new(
        grid: JobParameterGrid,
        options: Vec<Parameter>,
        description: impl Into<String>,
        dialect: Dialect,
    ) -> Self {
        Self {
            grid,
            options,
            description: description.into(),
            dialect,
        }
    }

    /// Read a mapping from a stream.
    pub fn load<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| MapperError::from_read("mapping stream", None, source))?;
        Self::parse(&decode_text(&bytes))
    }

    /// Parse mapping text. The delimiter is sniffed from the whole text.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text.lines().collect();
        let dialect = sniff_dialect_safe(&lines, Dialect::default());
        let sections = parse_sections(&lines)?;

        let description = sections
            .description
            .iter()
            .map(|line| description_line(line, dialect))
            .collect::<Result<Vec<_>>>()?
            .join("\n");
        let options = sections
            .options
            .iter()
            .map(|line| parse_option(line, dialect))
            .collect::<Result<Vec<_>>>()?;
        let grid = if sections.grid.is_empty() {
            JobParameterGrid::default()
        } else {
            JobParameterGrid::parse(&sections.grid, dialect)?
        };
        debug!(
            %dialect,
            options = options.len(),
            rows = grid.len(),
            "loaded mapping"
        );
        Ok(Self {
            grid,
            options,
            description,
            dialect,
        })
    }

    /// Write this mapping in its own dialect.
    ///
    /// Description lines and option values are quoted where needed so they
    /// read back unchanged. Grid rows without a parameter for one of the
    /// columns get an empty cell, which reads back as an empty parameter.
    pub fn save_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let delimiter = self.dialect.delimiter_char();
        let separator = String::from(delimiter);
        let width = self.grid.width().max(2);
        let mut buffer = String::new();
        let mut push_line = |cells: &[&str]| {
            let mut line = cells.join(separator.as_str());
            line.extend(std::iter::repeat_n(delimiter, width.saturating_sub(cells.len())));
            buffer.push_str(&line);
            buffer.push_str(LINE_TERMINATOR);
        };

        push_line(&[Section::Description.header()]);
        if !self.description.is_empty() {
            for line in self.description.split('\n') {
                push_line(&[quote_cell(line).as_ref()]);
            }
        }
        push_line(&[Section::Options.header()]);
        for option in &self.options {
            let value = option.value();
            push_line(&[option.field_name(), quote_cell(&value).as_ref()]);
        }
        push_line(&[Section::Grid.header()]);

        let mut bytes = buffer.into_bytes();
        self.grid.save(&mut bytes, self.dialect, width)?;
        writer.write_all(&bytes).map_err(|source| MapperError::Write {
            location: "mapping stream".to_string(),
            source,
        })
    }

    /// Every grid row with the options added. Grid values win, except empty
    /// cells where an option of that kind is set.
    pub fn rows(&self) -> Vec<ParameterSet> {
        self.grid
            .rows()
            .iter()
            .map(|row| {
                let mut set = ParameterSet::new(self.options.iter().cloned());
                let filled = row
                    .iter()
                    .filter(|param| !param.is_empty() || self.option(param.kind()).is_none())
                    .cloned();
                set.update(&ParameterSet::new(filled));
                set
            })
            .collect()
    }

    pub fn add_row(&mut self, row: Vec<Parameter>) {
        self.grid.append_row(row);
    }

    pub fn add_grid(&mut self, grid: JobParameterGrid) {
        self.grid.append_grid(grid);
    }

    /// The option of this kind, if set.
    pub fn option(&self, kind: ParameterKind) -> Option<&Parameter> {
        self.options.iter().find(|param| param.kind() == kind)
    }

    /// Add or replace an option.
    pub fn set_option(&mut self, param: Parameter) {
        match self.options.iter_mut().find(|option| option.kind() == param.kind()) {
            Some(existing) => *existing = param,
            None => self.options.push(param),
        }
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }
}

/// A row to add to a mapping. Must have a source. Pseudo name and
/// description get generated values unless given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingParameterSet {
    parameters: ParameterSet,
}

impl MappingParameterSet {
    pub fn new(parameters: impl IntoIterator<Item = Parameter>) -> Result<Self> {
        let mut set = ParameterSet::new([
            Parameter::generate_pseudo_name(),
            Parameter::generate_description(),
        ]);
        set.update(&ParameterSet::new(parameters));
        if set.source().is_none() {
            return Err(MapperError::NoSource);
        }
        Ok(Self { parameters: set })
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// The row to append to a grid, source first.
    pub fn into_row(self) -> Vec<Parameter> {
        let mut row = self.parameters.into_vec();
        row.sort_by_key(Parameter::kind);
        row
    }
}
