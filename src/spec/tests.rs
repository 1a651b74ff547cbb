use super::*;
use crate::diagnostics::DiagnosticKind;
use crate::doc::{Document, Section, SectionKind, Table};
use crate::model::Constraint;
use crate::options::BuildOptions;
use crate::pipeline::build;

fn cluster(path: &str, id: &str, name: &str, content: Vec<Section>) -> Document {
    let mut section = Section::new(SectionKind::Cluster, format!("{name} Cluster")).with_section(
        Section::new(SectionKind::ClusterIds, "Cluster ID")
            .with_table(Table::from_rows(&[&["ID", "Name"], &[id, name]])),
    );
    for child in content {
        section = section.with_section(child);
    }
    Document::new(path).with_section(section)
}

fn attributes(rows: &[&[&str]]) -> Section {
    let mut all: Vec<&[&str]> = vec![&["ID", "Name", "Type", "Constraint", "Conformance"]];
    all.extend_from_slice(rows);
    Section::new(SectionKind::Attributes, "Attributes").with_table(Table::from_rows(&all))
}

fn build_sequential(mut documents: Vec<Document>) -> Specification {
    build(&mut documents, &BuildOptions::sequential()).unwrap()
}

fn kinds(spec: &Specification) -> Vec<DiagnosticKind> {
    spec.diagnostics().iter().map(|d| d.kind.clone()).collect()
}

#[test]
fn test_indices_span_documents() {
    let spec = build_sequential(vec![
        cluster("OnOff.adoc", "0x0006", "On/Off", vec![attributes(&[&["0x0000", "OnOff", "bool", "", "M"]])]),
        cluster("Level.adoc", "0x0008", "Level Control", vec![attributes(&[&["0x0000", "CurrentLevel", "uint8", "", "M"]])]),
        Document::new("Types.adoc").with_section(
            Section::new(SectionKind::Enum, "StatusEnum Type")
                .with_table(Table::from_rows(&[&["Value", "Name"], &["0", "Ok"]])),
        ),
    ]);
    assert!(spec.diagnostics().is_empty(), "{:?}", spec.diagnostics());
    assert_eq!(spec.documents(), &["OnOff.adoc", "Level.adoc", "Types.adoc"]);

    let on_off = spec.cluster_by_id(0x0006).unwrap();
    assert_eq!(spec.cluster_by_name("On/Off"), Some(on_off));
    let level = spec.cluster_by_name("Level Control").unwrap();
    assert_eq!(spec.clusters(), &[on_off, level]);
    assert_eq!(spec.entity(level).source.document.index(), 1);

    let named = spec.entities_named("CurrentLevel");
    assert_eq!(named.len(), 1);
    assert_eq!(named[0].1, Some(level));
    assert_eq!(spec.owning_cluster(named[0].0), Some(level));

    assert_eq!(spec.global_objects().len(), 1);
    let status = spec.global_objects()[0];
    assert_eq!(spec.kind(status), EntityKind::Enum);
    assert_eq!(spec.entities_named("StatusEnum"), vec![(status, None)]);
    assert!(spec.entities_named("Nothing").is_empty());
}

#[test]
fn test_same_names_keep_identity() {
    let spec = build_sequential(vec![
        cluster("A.adoc", "0x0001", "A", vec![attributes(&[&["0x0000", "Mode", "uint8", "", "M"]])]),
        cluster("B.adoc", "0x0002", "B", vec![attributes(&[&["0x0000", "Mode", "uint8", "", "M"]])]),
    ]);
    let modes = spec.entities_named("Mode");
    assert_eq!(modes.len(), 2);
    assert_ne!(modes[0].0, modes[1].0);
    assert_eq!(spec.entity(modes[0].0).name, spec.entity(modes[1].0).name);
    assert_ne!(modes[0].1, modes[1].1);
}

#[test]
fn test_duplicate_struct_field_id() {
    let spec = build_sequential(vec![cluster(
        "Foo.adoc",
        "0x0100",
        "Foo",
        vec![Section::new(SectionKind::DataTypes, "Data Types").with_section(
            Section::new(SectionKind::Struct, "FooStruct Type").with_table(Table::from_rows(&[
                &["ID", "Name", "Type", "Conformance"],
                &["5", "A", "uint8", "M"],
                &["5", "B", "uint8", "M"],
                &["6", "C", "uint8", "M"],
            ])),
        )],
    )]);
    assert_eq!(
        kinds(&spec),
        vec![DiagnosticKind::DuplicateEntityId {
            id: 5,
            scope: "FooStruct".into(),
            names: vec!["A".into(), "B".into()],
        }]
    );
    let diagnostic = &spec.diagnostics()[0];
    assert_eq!(diagnostic.code(), "E0401");
    assert_eq!(spec.entity(diagnostic.entity.unwrap()).name, "B");
    assert_eq!(diagnostic.related.len(), 1);
}

#[test]
fn test_duplicate_cluster_id_and_name() {
    let spec = build_sequential(vec![
        cluster("A.adoc", "0x0006", "On/Off", vec![]),
        cluster("B.adoc", "0x0006", "Switch", vec![]),
        cluster("C.adoc", "0x0007", "On/Off", vec![]),
    ]);
    assert_eq!(
        kinds(&spec),
        vec![
            DiagnosticKind::DuplicateEntityId {
                id: 6,
                scope: "cluster ids".into(),
                names: vec!["On/Off".into(), "Switch".into()],
            },
            DiagnosticKind::DuplicateClusterName { name: "On/Off".into() },
        ]
    );
    // First writer keeps the slot.
    assert_eq!(spec.entity(spec.cluster_by_id(6).unwrap()).source.document.index(), 0);
    assert_eq!(spec.entity(spec.cluster_by_name("On/Off").unwrap()).id, Some(6));
    assert_eq!(spec.cluster_by_id(7).map(|c| spec.entity(c).name.clone()), Some("On/Off".into()));
}

#[test]
fn test_request_and_response_ids_are_separate() {
    let spec = build_sequential(vec![cluster(
        "Groups.adoc",
        "0x0004",
        "Groups",
        vec![Section::new(SectionKind::Commands, "Commands").with_table(Table::from_rows(&[
            &["ID", "Name", "Direction", "Response", "Conformance"],
            &["0x00", "AddGroup", "client ⇒ server", "AddGroupResponse", "M"],
            &["0x00", "AddGroupResponse", "client ⇐ server", "N", "M"],
        ]))],
    )]);
    assert!(spec.diagnostics().is_empty(), "{:?}", spec.diagnostics());

    let groups = spec.cluster(spec.cluster_by_id(4).unwrap()).unwrap();
    match &spec.entity(groups.commands[0]).data {
        EntityData::Command(c) => match &c.response {
            Some(crate::model::CommandResponse::Command { resolution, .. }) => {
                assert_eq!(*resolution, crate::model::Resolution::Resolved(groups.commands[1]))
            }
            other => panic!("unexpected {other:?}"),
        },
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_overlapping_bits_and_missing_type() {
    let spec = build_sequential(vec![cluster(
        "Foo.adoc",
        "0x0100",
        "Foo",
        vec![
            Section::new(SectionKind::DataTypes, "Data Types").with_section(
                Section::new(SectionKind::Bitmap, "FlagsBitmap Type").with_table(Table::from_rows(&[
                    &["Bit", "Name", "Summary"],
                    &["0..2", "Low", "Low bits"],
                    &["2", "High", "High bit"],
                    &["3", "Top", "Top bit"],
                ])),
            ),
            attributes(&[&["0x0000", "Untyped", "", "", "M"]]),
        ],
    )]);
    assert_eq!(
        kinds(&spec),
        vec![
            DiagnosticKind::OverlappingBits {
                bitmap: "FlagsBitmap".into(),
                first: "Low".into(),
                second: "High".into(),
            },
            DiagnosticKind::MissingDataType { name: "Untyped".into() },
        ]
    );
}

#[test]
fn test_simplify_full_range_constraints() {
    let documents = || {
        vec![cluster(
            "Level.adoc",
            "0x0008",
            "Level Control",
            vec![attributes(&[
                &["0x0000", "CurrentLevel", "uint8", "0 to 255", "M"],
                &["0x0001", "OnLevel", "uint8", "1 to 254", "M"],
                &["0x0002", "Percent", "percent", "0 to 100", "M"],
            ])],
        )]
    };
    let constraints = |spec: &Specification| -> Vec<Constraint> {
        let level = spec.cluster(spec.cluster_by_id(8).unwrap()).unwrap();
        level
            .attributes
            .iter()
            .map(|a| spec.field(*a).unwrap().constraint.clone().unwrap())
            .collect()
    };

    let plain = build_sequential(documents());
    assert!(constraints(&plain).iter().all(|c| *c != Constraint::All));

    let options = BuildOptions {
        simplify_constraints: true,
        ..BuildOptions::sequential()
    };
    let simplified = build(&mut documents(), &options).unwrap();
    let constraints = constraints(&simplified);
    assert_eq!(constraints[0], Constraint::All);
    assert_eq!(constraints[1].to_string(), "1 to 254");
    assert_eq!(constraints[2], Constraint::All);
}

#[cfg(feature = "serde")]
#[test]
fn test_json_export() {
    let spec = build_sequential(vec![cluster(
        "OnOff.adoc",
        "0x0006",
        "On/Off",
        vec![attributes(&[&["0x0000", "OnOff", "bool", "", "M"]])],
    )]);
    let json = spec.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["documents"][0], "OnOff.adoc");
    assert_eq!(value["entities"].as_array().unwrap().len(), 2);
}
