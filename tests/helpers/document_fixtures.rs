//! Document fixtures.

use spectral::doc::Table;
use spectral::{Document, Section, SectionKind};

/// A section holding a single table.
pub fn table_section(kind: SectionKind, name: &str, rows: &[&[&str]]) -> Section {
    Section::new(kind, name).with_table(Table::from_rows(rows))
}

pub fn cluster_ids(id: &str, name: &str) -> Section {
    table_section(SectionKind::ClusterIds, "Cluster ID", &[&["ID", "Name"], &[id, name]])
}

/// A cluster document with the given subsections after its id table.
pub fn cluster_document(path: &str, id: &str, name: &str, content: Vec<Section>) -> Document {
    let section = content.into_iter().fold(
        Section::new(SectionKind::Cluster, format!("{name} Cluster")).with_section(cluster_ids(id, name)),
        Section::with_section,
    );
    Document::new(path).with_section(section)
}

pub fn attributes(rows: &[&[&str]]) -> Section {
    let mut all: Vec<&[&str]> = vec![&["ID", "Name", "Type", "Constraint", "Conformance"]];
    all.extend_from_slice(rows);
    table_section(SectionKind::Attributes, "Attributes", &all)
}

/// The Thermostat cluster: features, two enums, five attributes and a
/// command with a detail section.
pub fn thermostat() -> Document {
    Document::new("app_clusters/Thermostat.adoc").with_section(
        Section::new(SectionKind::Cluster, "Thermostat Cluster")
            .with_id("ref_Thermostat")
            .with_section(table_section(
                SectionKind::RevisionHistory,
                "Revision History",
                &[&["Rev", "Description"], &["1", "Initial release"], &["2", "Added AUTO"]],
            ))
            .with_section(table_section(
                SectionKind::Classification,
                "Classification",
                &[
                    &["Hierarchy", "Role", "Scope", "PICS Code"],
                    &["Base", "Application", "Endpoint", "TSTAT"],
                ],
            ))
            .with_section(cluster_ids("0x0201", "Thermostat"))
            .with_section(table_section(
                SectionKind::Features,
                "Features",
                &[
                    &["Bit", "Code", "Feature", "Conformance", "Summary"],
                    &["0", "HEAT", "Heating", "O", "Thermostat is capable of heating"],
                    &["1", "COOL", "Cooling", "O", "Thermostat is capable of cooling"],
                    &["5", "AUTO", "AutoMode", "[HEAT & COOL]", "Automatic switching"],
                ],
            ))
            .with_section(
                Section::new(SectionKind::DataTypes, "Data Types")
                    .with_section(
                        Section::new(SectionKind::Enum, "SystemModeEnum Type")
                            .with_id("ref_SystemModeEnum")
                            .with_table(Table::from_rows(&[
                                &["Value", "Name", "Summary", "Conformance"],
                                &["0", "Off", "The Thermostat does not generate demand", "M"],
                                &["1", "Auto", "Demand is generated automatically", "AUTO"],
                                &["3", "Cool", "Cooling only", "COOL"],
                                &["4", "Heat", "Heating only", "HEAT"],
                            ])),
                    )
                    .with_section(table_section(
                        SectionKind::Enum,
                        "SetpointRaiseLowerModeEnum Type",
                        &[
                            &["Value", "Name", "Summary", "Conformance"],
                            &["0", "Heat", "Adjust heat setpoint", "HEAT"],
                            &["1", "Cool", "Adjust cool setpoint", "COOL"],
                            &["2", "Both", "Adjust both setpoints", "HEAT | COOL"],
                        ],
                    )),
            )
            .with_section(table_section(
                SectionKind::Attributes,
                "Attributes",
                &[
                    &["ID", "Name", "Type", "Constraint", "Quality", "Default", "Access", "Conformance"],
                    &["0x0000", "LocalTemperature", "temperature", "desc", "X P", "null", "R V", "M"],
                    &[
                        "0x0012",
                        "OccupiedHeatingSetpoint",
                        "temperature",
                        "MinHeatSetpointLimit to MaxHeatSetpointLimit",
                        "N",
                        "2000",
                        "RW VO",
                        "HEAT",
                    ],
                    &["0x0015", "MinHeatSetpointLimit", "temperature", "desc", "N", "700", "RW VM", "[HEAT]"],
                    &["0x0016", "MaxHeatSetpointLimit", "temperature", "desc", "N", "3000", "RW VM", "[HEAT]"],
                    &["0x001C", "SystemMode", "<<ref_SystemModeEnum>>", "desc", "N S", "1", "RW VM", "M"],
                ],
            ))
            .with_section(
                table_section(
                    SectionKind::Commands,
                    "Commands",
                    &[
                        &["ID", "Name", "Direction", "Response", "Access", "Conformance"],
                        &[
                            "0x00",
                            "<<ref_SetpointRaiseLower,SetpointRaiseLower>>",
                            "client ⇒ server",
                            "Y",
                            "O",
                            "M",
                        ],
                    ],
                )
                .with_section(
                    table_section(
                        SectionKind::Command,
                        "SetpointRaiseLower Command",
                        &[
                            &["ID", "Name", "Type", "Constraint", "Conformance"],
                            &["0", "Mode", "SetpointRaiseLowerModeEnum", "all", "M"],
                            &["1", "Amount", "int8", "all", "M"],
                        ],
                    )
                    .with_id("ref_SetpointRaiseLower"),
                ),
            ),
    )
}
