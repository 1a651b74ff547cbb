//! Colliding anchors across documents.

use spectral::doc::{Document, Section, SectionKind, Table};
use spectral::model::DataType;
use spectral::{BuildOptions, Specification, build};

use crate::helpers::document_fixtures::{attributes, cluster_ids};
use crate::helpers::spec_assertions::{assert_no_diagnostics, attribute};

/// A cluster whose `Mode` attribute names its enum by cross-reference only.
fn cluster_with_anchored_enum(path: &str, id: &str, name: &str) -> Document {
    Document::new(path).with_section(
        Section::new(SectionKind::Cluster, format!("{name} Cluster"))
            .with_id(format!("ref_{}", name.replace(' ', "")))
            .with_section(cluster_ids(id, name))
            .with_section(
                Section::new(SectionKind::DataTypes, "Data Types").with_section(
                    Section::new(SectionKind::Enum, "ModeEnum Type")
                        .with_id("ref_ModeEnum")
                        .with_table(Table::from_rows(&[&["Value", "Name"], &["0", "Off"], &["1", "On"]])),
                ),
            )
            .with_section(attributes(&[&["0x0000", "Mode", "<<ref_ModeEnum>>", "", "M"]])),
    )
}

fn documents() -> Vec<Document> {
    vec![
        cluster_with_anchored_enum("Fan.adoc", "0x0202", "Fan"),
        cluster_with_anchored_enum("Pump.adoc", "0x0200", "Pump"),
        cluster_with_anchored_enum("Valve.adoc", "0x0081", "Valve"),
    ]
}

fn mode_enum_cluster(spec: &Specification, cluster: &str) -> String {
    let mode = attribute(spec, cluster, "Mode");
    let target = spec.entity(mode).data_type().and_then(DataType::entity).unwrap();
    let owner = spec.owning_cluster(target).unwrap();
    spec.entity(owner).name.to_string()
}

#[test]
fn test_reference_resolves_to_nearest_anchor() {
    let mut documents = documents();
    let spec = build(&mut documents, &BuildOptions::default()).unwrap();
    assert_no_diagnostics(&spec);
    for cluster in ["Fan", "Pump", "Valve"] {
        assert_eq!(mode_enum_cluster(&spec, cluster), cluster);
    }
}

#[test]
fn test_cross_references_rewritten_to_final_ids() {
    let mut documents = documents();
    let spec = build(&mut documents, &BuildOptions::sequential()).unwrap();
    assert!(spec.anchors().get("ref_ModeEnum").is_none());
    let fan_enum = spec.anchors().get("ref_Fan__data_types_ref_ModeEnum").unwrap();
    assert_eq!(fan_enum.raw_id, "ref_ModeEnum");
    assert_eq!(spec.anchor_entities(&fan_enum.id).len(), 1);

    // The attribute table now points at the renamed anchor.
    let attributes = documents[0].sections[0]
        .subsections()
        .find(|(_, s)| s.kind == SectionKind::Attributes)
        .and_then(|(_, s)| s.first_table())
        .map(|(_, t)| t.rows[1].cells[2].clone())
        .unwrap();
    assert_eq!(
        spectral::doc::render_expression_text(&attributes.content),
        "<<ref_Fan__data_types_ref_ModeEnum>>"
    );
}

#[test]
fn test_document_order_does_not_change_anchor_ids() {
    let mut forward = documents();
    let mut reversed = documents();
    reversed.reverse();
    let a = build(&mut forward, &BuildOptions::default()).unwrap();
    let b = build(&mut reversed, &BuildOptions::default()).unwrap();

    let ids = |spec: &Specification, documents: &[Document]| {
        let mut ids: Vec<(String, String)> = spec
            .anchors()
            .anchors()
            .map(|a| (documents[a.document.index()].path.to_string(), a.id.to_string()))
            .collect();
        ids.sort();
        ids
    };
    assert_eq!(ids(&a, &forward), ids(&b, &reversed));
    for cluster in ["Fan", "Pump", "Valve"] {
        assert_eq!(mode_enum_cluster(&b, cluster), cluster);
    }
}
