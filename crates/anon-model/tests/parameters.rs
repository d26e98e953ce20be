//! Integration tests for identifiers, parameter sets and job validation.

use anon_model::{
    JobKind, JobParameterSet, Parameter, ParameterKind, ParameterSet, SourceIdentifier,
    SourceKey,
};
use proptest::prelude::*;

fn source_key() -> impl Strategy<Value = SourceKey> {
    prop::sample::select(SourceKey::ALL.to_vec())
}

proptest! {
    #[test]
    fn test_identifier_parse_is_idempotent(
        key in source_key(),
        value in "[A-Za-z0-9:/\\\\._ -]{0,40}[A-Za-z0-9:/\\\\._-]",
    ) {
        let identifier = SourceIdentifier::new(key, &value);
        let parsed = SourceIdentifier::parse(&identifier.to_string()).unwrap();
        prop_assert_eq!(parsed, identifier);
    }
}

#[test]
fn test_first_colon_only_split() {
    let identifier = SourceIdentifier::parse(r"fileselection:\\server\share:withcolon").unwrap();
    assert_eq!(identifier.key(), SourceKey::FileSelection);
    assert_eq!(identifier.identifier(), r"\\server\share:withcolon");
}

#[test]
fn test_dedup_by_kind() {
    let set = ParameterSet::new([
        Parameter::Description("a".to_string()),
        Parameter::Description("b".to_string()),
    ]);
    assert_eq!(set.len(), 1);
    assert_eq!(
        set.get(ParameterKind::Description),
        Some(&Parameter::Description("b".to_string()))
    );
}

#[test]
fn test_fill_missing_law() {
    let mut set = ParameterSet::new([Parameter::PseudoId("x".to_string())]);
    set.fill_missing_parameters();
    assert_eq!(
        set.get(ParameterKind::PseudoId),
        Some(&Parameter::PseudoId("x".to_string()))
    );
    assert_eq!(
        set.get(ParameterKind::PseudoName),
        Some(&Parameter::PseudoName("x".to_string()))
    );

    let mut empty = ParameterSet::default();
    empty.fill_missing_parameters();
    assert!(empty.is_empty());
}

#[test]
fn test_validation_end_to_end() {
    let set = JobParameterSet::new(
        [
            Parameter::parse_line("source,folder:/data").unwrap(),
            Parameter::parse_line(r"root_source_path,\\server\share").unwrap(),
            Parameter::parse_line(r"destination_path,\\server\share\out").unwrap(),
            Parameter::parse_line("project,P").unwrap(),
        ],
        [],
    );
    set.validate().unwrap();
    assert_eq!(set.job_kind().unwrap(), JobKind::Path);

    let kwargs = set.as_job_kwargs().unwrap();
    let source_path = &kwargs["source_path"];
    assert!(source_path.starts_with(r"\\"));
    assert!(source_path.ends_with(r"\data"));
    assert_eq!(kwargs["project_name"], "P");
    assert_eq!(kwargs["destination_path"], r"\\server\share\out");
    assert!(!kwargs.contains_key("root_source_path"));
}

#[test]
fn test_job_kwargs_for_full_row() {
    let set = JobParameterSet::new(
        [
            Parameter::parse_line(r"source,fileselection:sub\fileselection.txt").unwrap(),
            Parameter::parse_line("patient_id,001").unwrap(),
            Parameter::parse_line("patient_name,Patient1").unwrap(),
            Parameter::parse_line("description,first").unwrap(),
            Parameter::parse_line("pims_key,1234").unwrap(),
        ],
        [
            Parameter::parse_line(r"root_source_path,\\server\share\root").unwrap(),
            Parameter::parse_line(r"destination_path,\\server\share\out").unwrap(),
            Parameter::parse_line("project,Wetenschap-Algemeen").unwrap(),
        ],
    );
    let kwargs = set.as_job_kwargs().unwrap();
    assert_eq!(
        kwargs["source_path"],
        r"\\server\share\root\sub\fileselection.txt"
    );
    assert_eq!(kwargs["anon_id"], "001");
    assert_eq!(kwargs["anon_name"], "Patient1");
    assert_eq!(kwargs["description"], "first");
    assert_eq!(kwargs["pims_keyfile_id"], "1234");
    assert_eq!(kwargs.len(), 7);
}

#[test]
fn test_relative_destination_resolves_against_root() {
    let set = JobParameterSet::new(
        [
            Parameter::parse_line(r"source,folder:\\server\share\in").unwrap(),
            Parameter::parse_line("destination_path,out").unwrap(),
            Parameter::parse_line(r"root_source_path,\\server\share").unwrap(),
            Parameter::parse_line("project,P").unwrap(),
        ],
        [],
    );
    let kwargs = set.as_job_kwargs().unwrap();
    assert_eq!(kwargs["destination_path"], r"\\server\share\out");
    assert_eq!(kwargs["source_path"], r"\\server\share\in");
}
