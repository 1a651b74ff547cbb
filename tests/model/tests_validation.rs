//! Structural validation.

use rstest::rstest;
use spectral::doc::{Section, SectionKind};
use spectral::{BuildOptions, DiagnosticKind, Severity, build};

use crate::helpers::document_fixtures::{attributes, cluster_document, table_section};

fn duplicate_ids(spec: &spectral::Specification) -> Vec<DiagnosticKind> {
    spec.diagnostics()
        .iter()
        .filter(|d| matches!(d.kind, DiagnosticKind::DuplicateEntityId { .. }))
        .map(|d| d.kind.clone())
        .collect()
}

#[rstest]
#[case::attributes(
    attributes(&[
        &["0x0000", "OnOff", "bool", "", "M"],
        &["0x0000", "GlobalSceneControl", "bool", "", "M"],
    ]),
    "On/Off attributes",
    &["OnOff", "GlobalSceneControl"]
)]
#[case::features(
    table_section(SectionKind::Features, "Features", &[
        &["Bit", "Code", "Feature"],
        &["0", "LT", "Lighting"],
        &["0", "DF", "DeadFrontBehavior"],
    ]),
    "On/Off features",
    &["Lighting", "DeadFrontBehavior"]
)]
#[case::events(
    table_section(SectionKind::Events, "Events", &[
        &["ID", "Name", "Priority", "Conformance"],
        &["0x00", "StartUp", "CRITICAL", "M"],
        &["0x00", "ShutDown", "CRITICAL", "M"],
    ]),
    "On/Off events",
    &["StartUp", "ShutDown"]
)]
#[case::enum_values(
    Section::new(SectionKind::DataTypes, "Data Types").with_section(table_section(
        SectionKind::Enum,
        "StartUpOnOffEnum Type",
        &[&["Value", "Name"], &["0", "Off"], &["1", "On"], &["1", "Toggle"]],
    )),
    "StartUpOnOffEnum",
    &["On", "Toggle"]
)]
fn test_duplicate_id_reported_once(
    #[case] content: Section,
    #[case] scope: &str,
    #[case] names: &[&str],
) {
    let mut documents = vec![cluster_document("OnOff.adoc", "0x0006", "On/Off", vec![content])];
    let spec = build(&mut documents, &BuildOptions::default()).unwrap();
    let found = duplicate_ids(&spec);
    assert_eq!(found.len(), 1, "{found:?}");
    match &found[0] {
        DiagnosticKind::DuplicateEntityId { scope: s, names: n, .. } => {
            assert_eq!(s, scope);
            assert_eq!(n.iter().map(|x| x.as_str()).collect::<Vec<_>>(), names);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_validation_errors_are_errors() {
    let mut documents = vec![cluster_document(
        "OnOff.adoc",
        "0x0006",
        "On/Off",
        vec![attributes(&[&["0x0000", "OnOff", "", "", "M"]])],
    )];
    let spec = build(&mut documents, &BuildOptions::default()).unwrap();
    assert!(spec.has_errors());
    let diagnostic = &spec.diagnostics()[0];
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.code(), "E0403");
    assert_eq!(diagnostic.to_string(), "error[E0403]: 'OnOff' has no data type");
}

#[test]
fn test_table_problems_are_warnings() {
    let mut documents = vec![cluster_document(
        "OnOff.adoc",
        "0x0006",
        "On/Off",
        vec![
            attributes(&[&["0x0000", "OnOff", "bool", "0 to", "M"]]),
            Section::new(SectionKind::Commands, "Commands"),
        ],
    )];
    let spec = build(&mut documents, &BuildOptions::default()).unwrap();
    assert!(!spec.has_errors(), "{:?}", spec.diagnostics());
    let codes: Vec<&str> = spec.diagnostics().iter().map(|d| d.code()).collect();
    assert_eq!(codes, vec!["W0202", "W0104"]);
}
