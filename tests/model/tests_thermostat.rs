//! The Thermostat cluster, built end to end.

use spectral::model::{
    BaseType, CommandResponse, ConformanceItem, Constraint, DataType, EntityData, Limit, Resolution,
};
use spectral::{BuildOptions, EntityKind, build};

use crate::helpers::document_fixtures::thermostat;
use crate::helpers::spec_assertions::{assert_no_diagnostics, attribute};

#[test]
fn test_thermostat_builds_without_diagnostics() {
    let mut documents = vec![thermostat()];
    let spec = build(&mut documents, &BuildOptions::default()).unwrap();
    assert_no_diagnostics(&spec);

    let id = spec.cluster_by_name("Thermostat").unwrap();
    assert_eq!(spec.cluster_by_id(0x0201), Some(id));
    let cluster = spec.cluster(id).unwrap();
    assert_eq!(cluster.revisions.len(), 2);
    assert_eq!(cluster.pics.as_deref(), Some("TSTAT"));
    assert_eq!(cluster.features.len(), 3);
    assert_eq!(cluster.enums.len(), 2);
    assert_eq!(cluster.attributes.len(), 5);
    assert_eq!(cluster.commands.len(), 1);
}

#[test]
fn test_system_mode_attribute() {
    let mut documents = vec![thermostat()];
    let spec = build(&mut documents, &BuildOptions::default()).unwrap();

    let system_mode = attribute(&spec, "Thermostat", "SystemMode");
    let entity = spec.entity(system_mode);
    let enum_id = entity.data_type().and_then(DataType::entity).unwrap();
    assert_eq!(spec.entity(enum_id).name, "SystemModeEnum");
    assert_eq!(spec.kind(enum_id), EntityKind::Enum);
    assert_eq!(
        entity.conformance.as_ref().unwrap().items(),
        &[ConformanceItem::Mandatory { condition: None }]
    );
    assert_eq!(spec.anchor_entities("ref_SystemModeEnum"), &[enum_id]);
}

#[test]
fn test_setpoint_range_refers_to_limit_attributes() {
    let mut documents = vec![thermostat()];
    let spec = build(&mut documents, &BuildOptions::default()).unwrap();

    let setpoint = attribute(&spec, "Thermostat", "OccupiedHeatingSetpoint");
    let min = attribute(&spec, "Thermostat", "MinHeatSetpointLimit");
    let max = attribute(&spec, "Thermostat", "MaxHeatSetpointLimit");
    let field = spec.field(setpoint).unwrap();
    assert_eq!(field.data_type, Some(DataType::Base(BaseType::Temperature)));
    match field.constraint.as_ref().unwrap() {
        Constraint::Range {
            min: Limit::Identifier { resolution: lo, .. },
            max: Limit::Identifier { resolution: hi, .. },
        } => {
            assert_eq!(*lo, Resolution::Resolved(min));
            assert_eq!(*hi, Resolution::Resolved(max));
        }
        other => panic!("unexpected constraint {other}"),
    }
}

#[test]
fn test_command_fields_and_response() {
    let mut documents = vec![thermostat()];
    let spec = build(&mut documents, &BuildOptions::default()).unwrap();

    let cluster = spec.cluster(spec.cluster_by_id(0x0201).unwrap()).unwrap();
    let command = spec.entity(cluster.commands[0]);
    assert_eq!(command.name, "SetpointRaiseLower");
    let EntityData::Command(data) = &command.data else {
        panic!("not a command");
    };
    assert_eq!(data.response, Some(CommandResponse::Status));
    let mode = spec.entity(data.fields[0]);
    let target = mode.data_type().and_then(DataType::entity).unwrap();
    assert_eq!(spec.entity(target).name, "SetpointRaiseLowerModeEnum");
    assert_eq!(spec.anchor_entities("ref_SetpointRaiseLower"), &[cluster.commands[0]]);
}

#[test]
fn test_rebuild_is_identical() {
    let first = build(&mut vec![thermostat()], &BuildOptions::sequential()).unwrap();
    let second = build(&mut vec![thermostat()], &BuildOptions::default()).unwrap();
    assert_eq!(first.len(), second.len());
    for ((a, x), (b, y)) in first.entities().zip(second.entities()) {
        assert_eq!(a, b);
        assert_eq!(x.name, y.name);
        assert_eq!(x.conformance, y.conformance);
        assert_eq!(x.data_type(), y.data_type());
        assert_eq!(x.constraint(), y.constraint());
    }
}
