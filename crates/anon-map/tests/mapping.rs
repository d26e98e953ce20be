//! Integration tests for loading and saving mappings.

use anon_map::{
    Dialect, JobParameterGrid, Mapping, MappingFolder, MappingList, sniff_dialect,
};
use anon_model::{Parameter, ParameterKind, SourceIdentifier};

const BASIC_MAPPING_LOWER: &str = r"
## description ##,,,
some comment by some person,,,
,,,,
## options ##,,,
destination_path,\\someserver\share\folder1,,
pims_key,555,,
## Mapping ##,,,
source,patient_id,patient_name,description
folder:/folder/file0,patient0,patientName0,test description
";

const COLON_SEPARATED_MAPPING: &str = r"
## Description ##;;;
Mapping created September 09 2020 by user;;;
;;;
## Options ##;;;
root_source_path;C:\temp;;
project;Wetenschap-Algemeen;;
destination_path;\\server\share\folder;;
;;;
## Mapping ##;;;
source;patient_id;patient_name;description
folder:example\folder1;1;Patient1;All files from folder1
study_instance_uid:123.12121212.12345678;2;Patient2;A study which should be retrieved from PACS, identified by StudyInstanceUID
accession_number:12345678.1234567;3;Patient3;A study which should be retrieved from PACS, identified by AccessionNumber
fileselection:folder2\fileselection.txt;4;Patient4;A selection of files in folder2
";

const MAPPING_WITH_SPACE: &str = r"
## DESCRIPTION ##,,,
Has a space under options,,,
,,,,
## OPTIONS ##,,,
 ,,,
destination_path,\\someserver\share\folder1,,
pims_key,555,,
## MAPPING ##,,,
source,patient_id,patient_name,description
folder:/folder/file0,patient0,patientName0,test description
";

const MISTYPED_DESCRIPTION: &str = r"
## Desc ##
some comment by some person
## options ##
destination_path,\\someserver\share\folder1
pims_key,555
## Mapping ##
source,patient_id,patient_name,description
folder:/folder/file0,patient0,patientName0,test description
";

fn sniff(text: &str) -> anon_map::Result<Dialect> {
    let lines: Vec<&str> = text.lines().collect();
    sniff_dialect(&lines)
}

fn sample_mapping(dialect: Dialect) -> Mapping {
    let rows = (0..5)
        .map(|index| {
            vec![
                Parameter::Source(SourceIdentifier::Folder(format!(r"folder\file{index}"))),
                Parameter::PseudoId(format!("patient{index}")),
                Parameter::Description(format!("row {index}, with comma")),
                Parameter::PimsKey(String::new()),
            ]
        })
        .collect();
    Mapping::new(
        JobParameterGrid::new(rows),
        vec![
            Parameter::parse_line(r"destination_path,\\server\share\out").unwrap(),
            Parameter::parse_line("project,Wetenschap-Algemeen").unwrap(),
            Parameter::parse_line("description,options; with semicolon").unwrap(),
        ],
        "Mapping created for testing\nsecond line",
        dialect,
    )
}

#[test]
fn test_round_trip_keeps_content_and_dialect() {
    for dialect in [Dialect::COMMA, Dialect::SEMICOLON] {
        let mapping = sample_mapping(dialect);
        let mut out = Vec::new();
        mapping.save_to(&mut out).unwrap();
        let loaded = Mapping::load(out.as_slice()).unwrap();
        assert_eq!(loaded, mapping, "round trip with {dialect}");
    }
}

#[test]
fn test_round_trip_keeps_blank_lines_and_trailing_delimiters() {
    let folder = |name: &str| Parameter::Source(SourceIdentifier::Folder(name.to_string()));
    for dialect in [Dialect::COMMA, Dialect::SEMICOLON] {
        let mapping = Mapping::new(
            JobParameterGrid::new(vec![
                vec![folder("a"), Parameter::PimsKey("1".to_string())],
                vec![folder("b")],
            ]),
            vec![
                Parameter::Description("total;".to_string()),
                Parameter::PimsKey("general,".to_string()),
            ],
            "first\n\nthird,\n## not a header ##",
            dialect,
        );
        let mut out = Vec::new();
        mapping.save_to(&mut out).unwrap();
        let loaded = Mapping::load(out.as_slice()).unwrap();

        assert_eq!(loaded.description, mapping.description, "description with {dialect}");
        assert_eq!(loaded.options, mapping.options, "options with {dialect}");
        assert_eq!(loaded.dialect, dialect);
        // a missing cell comes back as an empty value
        assert_eq!(
            loaded.grid.rows()[1],
            vec![folder("b"), Parameter::PimsKey(String::new())]
        );
        assert_eq!(loaded.rows(), mapping.rows(), "rows with {dialect}");
        assert_eq!(
            loaded.rows()[1].get(ParameterKind::PimsKey),
            Some(&Parameter::PimsKey("general,".to_string()))
        );
    }
}

#[test]
fn test_section_headers_without_spaces_or_with_extra_spaces() {
    for (description, options, mapping) in [
        ("##Description##", "##Options##", "##Mapping##"),
        ("##  description  ##", "## OPTIONS##", "###   mapping ###"),
    ] {
        let text = format!(
            "{description}\nhi\n{options}\npims_key,555\n{mapping}\nsource\nfolder:a\n"
        );
        let loaded = Mapping::parse(&text).unwrap();
        assert_eq!(loaded.description, "hi");
        assert_eq!(loaded.options, vec![Parameter::PimsKey("555".to_string())]);
        assert_eq!(loaded.len(), 1);
    }
}

#[test]
fn test_option_with_other_delimiter() {
    let text = "## Description ##\nHello, world, foo\n## Options ##\nproject;P\n\
                ## Mapping ##\nsource\nfolder:a\n";
    let loaded = Mapping::parse(text).unwrap();
    assert_eq!(loaded.dialect, Dialect::COMMA);
    assert_eq!(loaded.options, vec![Parameter::Project("P".to_string())]);
    assert_eq!(loaded.description, "Hello, world, foo");
}

#[test]
fn test_end_to_end_scenario() {
    let text = "## Description ##\nhi\n## Options ##\ndestination_path,\\\\srv\\share\npims_key,555\n## Mapping ##\nsource,patient_id,patient_name,description\nfolder:/folder/file0,patient0,patientName0,test description\n";
    let mapping = Mapping::parse(text).unwrap();
    assert_eq!(mapping.len(), 1);
    assert_eq!(mapping.description, "hi");
    assert!(mapping.option(ParameterKind::DestinationPath).is_some());
    assert_eq!(
        mapping.option(ParameterKind::PimsKey),
        Some(&Parameter::PimsKey("555".to_string()))
    );
    assert_eq!(
        mapping.grid.rows()[0][0],
        Parameter::Source(SourceIdentifier::Folder("/folder/file0".to_string()))
    );
}

#[test]
fn test_dialect_sniff_stability() {
    let short = "\ntest1,10\ntest2,20\n";
    assert_eq!(sniff(short).unwrap(), Dialect::COMMA);
    assert_eq!(sniff(short).unwrap(), sniff(short).unwrap());

    let colon = "source;patient_id;patient_name;description\n\
        folder:example\\folder1;1;Patient1;All files from folder1\n\
        study_instance_uid:123.12121212.12345678;2;Patient2;A study from PACS, identified by StudyInstanceUID\n";
    assert_eq!(sniff(colon).unwrap(), Dialect::SEMICOLON);
}

#[test]
fn test_lower_case_headers() {
    let mapping = Mapping::parse(BASIC_MAPPING_LOWER).unwrap();
    assert_eq!(mapping.description, "some comment by some person");
    assert_eq!(mapping.options.len(), 2);
    assert_eq!(mapping.len(), 1);
    assert_eq!(mapping.dialect, Dialect::COMMA);
}

#[test]
fn test_colon_separated_mapping() {
    let mapping = Mapping::parse(COLON_SEPARATED_MAPPING).unwrap();
    assert_eq!(mapping.dialect, Dialect::SEMICOLON);
    assert_eq!(mapping.options.len(), 3);
    assert_eq!(mapping.len(), 4);
    assert_eq!(
        mapping.option(ParameterKind::RootSourcePath).map(Parameter::value),
        Some(r"C:\temp".to_string())
    );
    let sources: Vec<_> = mapping
        .rows()
        .iter()
        .map(|row| row.source().map(|source| source.key()))
        .collect();
    assert!(sources.iter().all(Option::is_some));
    assert_eq!(
        mapping.grid.rows()[1][3].value(),
        "A study which should be retrieved from PACS, identified by StudyInstanceUID"
    );
}

#[test]
fn test_space_under_options_is_ignored() {
    let mapping = Mapping::parse(MAPPING_WITH_SPACE).unwrap();
    assert_eq!(mapping.options.len(), 2);
}

#[test]
fn test_mistyped_section_header_fails() {
    let err = Mapping::parse(MISTYPED_DESCRIPTION).unwrap_err();
    assert!(err.is_load_error());
    assert!(err.to_string().contains("## Description ##"));
}

#[test]
fn test_mapping_folder_read_write_delete() {
    let dir = tempfile::tempdir().unwrap();
    let folder = MappingFolder::new(dir.path());
    assert!(!folder.has_mapping());

    let mapping = sample_mapping(Dialect::SEMICOLON);
    folder.save_mapping(&mapping).unwrap();
    assert!(folder.has_mapping());

    let loaded = folder.get_mapping().unwrap();
    assert_eq!(loaded.rows(), mapping.rows());

    folder.delete_mapping().unwrap();
    assert!(!folder.has_mapping());
}

#[test]
fn test_migrate_legacy_list() {
    let text = "source,patient_id,patient_name,description\n\
        folder:/folder/file0,patient0,patientName0,test description\n";
    let list = MappingList::load(text.as_bytes()).unwrap();
    let mapping = list.to_mapping("migrated", Dialect::COMMA);

    let mut out = Vec::new();
    mapping.save_to(&mut out).unwrap();
    let loaded = Mapping::load(out.as_slice()).unwrap();
    assert_eq!(loaded, mapping);
}
