//! The mapping list format used before sectioned mappings existed: a plain
//! CSV file with columns `source,patient_id,patient_name,description`.

use std::io::{Read, Write};

use anon_model::{Parameter, SourceIdentifier};
use serde::{Deserialize, Serialize};

use crate::dialect::{Dialect, sniff_dialect_safe};
use crate::error::{MapperError, Result};
use crate::grid::JobParameterGrid;
use crate::mapping::{Mapping, decode_text};

/// What to set in the anonymized data for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnonymizationParameters {
    pub patient_id: String,
    pub patient_name: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct MappingListRecord {
    source: SourceIdentifier,
    #[serde(default)]
    patient_id: String,
    #[serde(default)]
    patient_name: String,
    #[serde(default)]
    description: String,
}

/// Source identifiers with the parameters to anonymize them with. Each
/// source appears once, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingList {
    entries: Vec<(SourceIdentifier, AnonymizationParameters)>,
}

impl MappingList {
    /// Set the parameters for `source`, replacing earlier ones.
    pub fn insert(&mut self, source: SourceIdentifier, parameters: AnonymizationParameters) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == source) {
            Some((_, existing)) => *existing = parameters,
            None => self.entries.push((source, parameters)),
        }
    }

    pub fn get(&self, source: &SourceIdentifier) -> Option<&AnonymizationParameters> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == source)
            .map(|(_, parameters)| parameters)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SourceIdentifier, &AnonymizationParameters)> {
        self.entries.iter().map(|(source, parameters)| (source, parameters))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn load<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| MapperError::from_read("mapping list", None, source))?;
        let text = decode_text(&bytes);
        let lines: Vec<&str> = text.lines().collect();
        let dialect = sniff_dialect_safe(&lines, Dialect::default());

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(dialect.delimiter())
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        let mut list = Self::default();
        for record in csv_reader.deserialize() {
            let record: MappingListRecord = record?;
            list.insert(
                record.source,
                AnonymizationParameters {
                    patient_id: record.patient_id,
                    patient_name: record.patient_name,
                    description: record.description,
                },
            );
        }
        Ok(list)
    }

    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for (source, parameters) in &self.entries {
            csv_writer.serialize(MappingListRecord {
                source: source.clone(),
                patient_id: parameters.patient_id.clone(),
                patient_name: parameters.patient_name.clone(),
                description: parameters.description.clone(),
            })?;
        }
        csv_writer.flush().map_err(|source| MapperError::Write {
            location: "mapping list".to_string(),
            source,
        })
    }

    /// The same content as a sectioned mapping.
    pub fn to_mapping(&self, description: &str, dialect: Dialect) -> Mapping {
        let rows = self
            .entries
            .iter()
            .map(|(source, parameters)| {
                vec![
                    Parameter::Source(source.clone()),
                    Parameter::PseudoId(parameters.patient_id.clone()),
                    Parameter::PseudoName(parameters.patient_name.clone()),
                    Parameter::Description(parameters.description.clone()),
                ]
            })
            .collect();
        Mapping::new(JobParameterGrid::new(rows), Vec::new(), description, dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "source,patient_id,patient_name,description\n\
        folder:/folder/file0,patient0,patientName0,test description\n\
        accession_number:1234.5,patient1,patientName1,second\n";

    #[test]
    fn test_load_and_save() {
        let list = MappingList::load(LIST.as_bytes()).unwrap();
        assert_eq!(list.len(), 2);
        let accession = SourceIdentifier::AccessionNumber("1234.5".to_string());
        assert_eq!(list.get(&accession).unwrap().patient_name, "patientName1");

        let mut out = Vec::new();
        list.save(&mut out).unwrap();
        let reloaded = MappingList::load(out.as_slice()).unwrap();
        assert_eq!(reloaded, list);
    }

    #[test]
    fn test_unknown_source_fails() {
        let text = "source,patient_id,patient_name,description\nshoe:1,a,b,c\n";
        let err = MappingList::load(text.as_bytes()).unwrap_err();
        assert!(err.is_load_error());
    }

    #[test]
    fn test_to_mapping() {
        let list = MappingList::load(LIST.as_bytes()).unwrap();
        let mapping = list.to_mapping("migrated", Dialect::COMMA);
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.grid.rows()[0][1], Parameter::PseudoId("patient0".to_string()));
    }
}
