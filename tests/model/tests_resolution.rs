//! Reference resolution across documents.

use rstest::rstest;
use spectral::doc::{Document, Section, SectionKind, Table};
use spectral::model::{DataType, EntityData};
use spectral::{BuildOptions, DiagnosticKind, build};

use crate::helpers::document_fixtures::{attributes, cluster_document, table_section, thermostat};
use crate::helpers::spec_assertions::{assert_no_diagnostics, attribute, diagnostics_with_code};

#[test]
fn test_unresolved_identifier_is_contained() {
    let mut documents = vec![
        thermostat(),
        cluster_document(
            "Fan.adoc",
            "0x0202",
            "Fan Control",
            vec![attributes(&[
                &["0x0000", "FanMode", "uint8", "", "M"],
                &["0x0001", "FanSpeed", "uint8", "max 100", "Bogus"],
            ])],
        ),
    ];
    let spec = build(&mut documents, &BuildOptions::default()).unwrap();

    assert_eq!(spec.diagnostics().len(), 1, "{:?}", spec.diagnostics());
    let failure = &spec.diagnostics()[0];
    assert_eq!(failure.code(), "E0301");
    assert_eq!(failure.kind, DiagnosticKind::UnresolvedIdentifier { name: "Bogus".into() });
    assert_eq!(failure.entity, Some(attribute(&spec, "Fan Control", "FanSpeed")));
    assert_eq!(failure.source.unwrap().document.index(), 1);
    assert!(failure.message().starts_with("unresolved identifier 'Bogus'"));

    // The Thermostat is unaffected.
    let system_mode = attribute(&spec, "Thermostat", "SystemMode");
    assert!(spec.entity(system_mode).data_type().and_then(DataType::entity).is_some());
}

#[rstest]
#[case("Bogus", &["Bonus"])]
#[case("Spede", &["Speed"])]
#[case("Spe", &["Speed"])]
#[case("Zzzzzz", &[])]
fn test_suggestions(#[case] name: &str, #[case] expected: &[&str]) {
    let mut documents = vec![cluster_document(
        "Fan.adoc",
        "0x0202",
        "Fan Control",
        vec![attributes(&[
            &["0x0000", "Bonus", "uint8", "", "M"],
            &["0x0001", "Speed", "uint8", "", "M"],
            &["0x0002", "Level", "uint8", "", name],
        ])],
    )];
    let spec = build(&mut documents, &BuildOptions::sequential()).unwrap();
    let failures = diagnostics_with_code(&spec, "E0301");
    assert_eq!(failures.len(), 1);
    let suggestions: Vec<&str> = failures[0].suggestions.iter().map(|s| s.as_str()).collect();
    assert_eq!(suggestions, expected);
}

#[test]
fn test_global_struct_shared_by_clusters() {
    let mut documents = vec![
        Document::new("Types.adoc").with_section(table_section(
            SectionKind::Struct,
            "AtomicAttributeStatusStruct Type",
            &[
                &["ID", "Name", "Type", "Conformance"],
                &["0", "AttributeID", "attrib-id", "M"],
                &["1", "StatusCode", "status", "M"],
            ],
        )),
        cluster_document(
            "A.adoc",
            "0x0001",
            "Alpha",
            vec![attributes(&[&["0x0000", "Status", "list[AtomicAttributeStatusStruct]", "max 8", "M"]])],
        ),
        cluster_document(
            "B.adoc",
            "0x0002",
            "Beta",
            vec![attributes(&[&["0x0000", "Status", "AtomicAttributeStatusStruct", "", "M"]])],
        ),
    ];
    let spec = build(&mut documents, &BuildOptions::default()).unwrap();
    assert_no_diagnostics(&spec);

    let global = spec.global_objects()[0];
    for cluster in ["Alpha", "Beta"] {
        let status = attribute(&spec, cluster, "Status");
        let data_type = spec.entity(status).data_type().unwrap();
        assert_eq!(data_type.entity(), Some(global));
    }
    let alpha_status = attribute(&spec, "Alpha", "Status");
    assert!(spec.entity(alpha_status).data_type().unwrap().is_list());
}

#[test]
fn test_cluster_defined_type_wins_over_global() {
    let mut documents = vec![
        Document::new("Types.adoc").with_section(table_section(
            SectionKind::Enum,
            "ModeEnum Type",
            &[&["Value", "Name"], &["0", "Global"]],
        )),
        cluster_document(
            "Fan.adoc",
            "0x0202",
            "Fan",
            vec![
                Section::new(SectionKind::DataTypes, "Data Types").with_section(
                    Section::new(SectionKind::Enum, "ModeEnum Type")
                        .with_table(Table::from_rows(&[&["Value", "Name"], &["0", "Local"]])),
                ),
                attributes(&[&["0x0000", "Mode", "ModeEnum", "", "M"]]),
            ],
        ),
    ];
    let spec = build(&mut documents, &BuildOptions::default()).unwrap();
    assert_no_diagnostics(&spec);
    let mode = attribute(&spec, "Fan", "Mode");
    let target = spec.entity(mode).data_type().and_then(DataType::entity).unwrap();
    assert_eq!(spec.owning_cluster(target), spec.cluster_by_name("Fan"));
}

#[test]
fn test_derived_cluster_by_cross_reference() {
    let base = Document::new("ModeBase.adoc").with_section(
        Section::new(SectionKind::Cluster, "Mode Base Cluster")
            .with_id("ref_ModeBase")
            .with_section(table_section(
                SectionKind::ClusterIds,
                "Cluster ID",
                &[&["ID", "Name"], &["n/a", "Mode Base"]],
            ))
            .with_section(table_section(
                SectionKind::Features,
                "Features",
                &[&["Bit", "Code", "Feature"], &["0", "DEPONOFF", "OnOff"]],
            ))
            .with_section(attributes(&[&["0x0000", "SupportedModes", "uint8", "", "M"]])),
    );
    let derived = cluster_document(
        "RvcRunMode.adoc",
        "0x0054",
        "RVC Run Mode",
        vec![
            table_section(
                SectionKind::Classification,
                "Classification",
                &[&["Hierarchy", "Role"], &["<<ref_ModeBase,Mode Base Cluster>>", "Application"]],
            ),
            attributes(&[&["0x0001", "CurrentMode", "uint8", "", "DEPONOFF"]]),
        ],
    );
    let mut documents = vec![derived, base];
    let spec = build(&mut documents, &BuildOptions::default()).unwrap();
    assert_no_diagnostics(&spec);

    let run_mode = spec.cluster_by_id(0x0054).unwrap();
    let base = spec.cluster_by_name("Mode Base").unwrap();
    assert_eq!(spec.cluster(run_mode).unwrap().parent_cluster(), Some(base));

    // Features of the base cluster are visible to the derived one.
    let current = attribute(&spec, "RVC Run Mode", "CurrentMode");
    let conformance = spec.entity(current).conformance.as_ref().unwrap();
    let mut resolved = Vec::new();
    conformance.clone().for_each_reference(&mut |leaf| resolved.push(*leaf.resolution));
    let feature = resolved[0].entity().unwrap();
    assert!(matches!(spec.entity(feature).data, EntityData::Feature(_)));
    assert_eq!(spec.owning_cluster(feature), Some(base));
}

#[test]
fn test_unknown_base_cluster() {
    let mut documents = vec![cluster_document(
        "Derived.adoc",
        "0x0099",
        "Derived",
        vec![table_section(
            SectionKind::Classification,
            "Classification",
            &[&["Hierarchy", "Role"], &["Derived from Missing Base", "Application"]],
        )],
    )];
    let spec = build(&mut documents, &BuildOptions::default()).unwrap();
    assert_eq!(
        spec.diagnostics().iter().map(|d| d.kind.clone()).collect::<Vec<_>>(),
        vec![DiagnosticKind::UnknownParentCluster { name: "Missing Base".into() }]
    );
}
