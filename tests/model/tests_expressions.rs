//! Expression parsing and constraint simplification through the public API.

use rstest::rstest;
use spectral::SectionKind;
use spectral::model::{BaseType, Constraint, DataType, Resolution};
use spectral::parser::{parse_conformance, parse_constraint};
use spectral::{BuildOptions, build};

use crate::helpers::document_fixtures::{attributes, cluster_document, table_section};
use crate::helpers::spec_assertions::{assert_no_diagnostics, attribute};

/// Rendering a parsed expression and parsing it again gives the same tree.
#[rstest]
#[case("LT, O")]
#[case("[HEAT].b2-")]
#[case("(HEAT | COOL) & !OCC")]
#[case("<<ref_Lighting,LT>>")]
#[case("Rev >= 0x0002")]
fn test_conformance_rendering_is_a_fixed_point(#[case] input: &str) {
    let parsed = parse_conformance(input);
    assert!(!parsed.is_generic(), "{input}");
    assert_eq!(parse_conformance(&parsed.to_string()), parsed);
}

#[rstest]
#[case("max 16[1 to 4]")]
#[case("-27.3°C to 50°C")]
#[case("min(A, B) to max(C, 10)")]
#[case("0, 2 to 4, 7")]
#[case("max 64{32}")]
fn test_constraint_rendering_is_a_fixed_point(#[case] input: &str) {
    let parsed = parse_constraint(input);
    assert!(!parsed.is_generic(), "{input}");
    assert_eq!(parse_constraint(&parsed.to_string()), parsed);
}

/// A range equal to the type's full range simplifies to `all`; anything
/// else is left alone.
#[rstest]
#[case("0 to 255", BaseType::Uint8, "all")]
#[case("0 to 254", BaseType::Uint8, "0 to 254")]
#[case("-128 to 127", BaseType::Int8, "all")]
#[case("0x0000 to 0xFFFF", BaseType::Uint16, "all")]
#[case("0 to 100", BaseType::Percent, "all")]
#[case("0 to 100", BaseType::Uint8, "0 to 100")]
#[case("max 255", BaseType::Uint8, "max 255")]
#[case("desc", BaseType::Uint8, "desc")]
fn test_simplification_law(#[case] input: &str, #[case] base: BaseType, #[case] expected: &str) {
    let data_type = DataType::Base(base);
    let simplified = parse_constraint(input).simplify(&data_type);
    assert_eq!(simplified.to_string(), expected);
    // Simplifying twice changes nothing.
    assert_eq!(simplified.simplify(&data_type), simplified);
}

#[test]
fn test_list_entry_constraint_simplifies_against_entry_type() {
    let data_type = DataType::List(Box::new(DataType::Base(BaseType::Uint8)));
    let simplified = parse_constraint("max 4[0 to 255]").simplify(&data_type);
    assert_eq!(simplified.to_string(), "max 4[all]");
}

#[test]
fn test_conformance_cross_reference_falls_back_to_label() {
    let features = table_section(
        SectionKind::Features,
        "Features",
        &[&["Bit", "Code", "Feature"], &["0", "LT", "Lighting"]],
    );
    let mut documents = vec![cluster_document(
        "OnOff.adoc",
        "0x0006",
        "On/Off",
        vec![
            features,
            attributes(&[&["0x4000", "GlobalSceneControl", "bool", "", "<<ref_Lighting,LT>>"]]),
        ],
    )];
    let spec = build(&mut documents, &BuildOptions::default()).unwrap();
    assert_no_diagnostics(&spec);

    let control = attribute(&spec, "On/Off", "GlobalSceneControl");
    let mut conformance = spec.entity(control).conformance.clone().unwrap();
    let mut found = Vec::new();
    conformance.for_each_reference(&mut |leaf| found.push(*leaf.resolution));
    let cluster = spec.cluster(spec.cluster_by_id(6).unwrap()).unwrap();
    assert_eq!(found, vec![Resolution::Resolved(cluster.features[0])]);
}

#[test]
fn test_simplify_option_applies_to_built_model() {
    let mut documents = vec![cluster_document(
        "Level.adoc",
        "0x0008",
        "Level Control",
        vec![attributes(&[&["0x0000", "CurrentLevel", "uint8", "0 to 255", "M"]])],
    )];
    let options = BuildOptions {
        simplify_constraints: true,
        ..BuildOptions::default()
    };
    let spec = build(&mut documents, &options).unwrap();
    let level = attribute(&spec, "Level Control", "CurrentLevel");
    assert_eq!(spec.field(level).unwrap().constraint, Some(Constraint::All));
}
