//! Column-role vocabulary.
//!
//! Header cells are free text; this is the one place that maps header text to
//! a [`ColumnRole`].

/// What a table column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnRole {
    Id,
    Name,
    Type,
    Constraint,
    Quality,
    Default,
    Access,
    Conformance,
    Priority,
    Direction,
    Response,
    Bit,
    Value,
    Code,
    Feature,
    Summary,
    Description,
    Hierarchy,
    Role,
    Scope,
    PicsCode,
    Revision,
    DeviceName,
    Superset,
    Class,
    Cluster,
    ClientServer,
    Element,
    Condition,
}

/// Header spellings, lowercase.
const HEADERS: &[(&str, ColumnRole)] = &[
    ("id", ColumnRole::Id),
    ("identifier", ColumnRole::Id),
    ("cluster id", ColumnRole::Id),
    ("device id", ColumnRole::Id),
    ("device type id", ColumnRole::Id),
    ("tag id", ColumnRole::Id),
    ("name", ColumnRole::Name),
    ("field", ColumnRole::Name),
    ("cluster name", ColumnRole::Name),
    ("tag name", ColumnRole::Name),
    ("type", ColumnRole::Type),
    ("data type", ColumnRole::Type),
    ("constraint", ColumnRole::Constraint),
    ("quality", ColumnRole::Quality),
    ("default", ColumnRole::Default),
    ("access", ColumnRole::Access),
    ("conformance", ColumnRole::Conformance),
    ("priority", ColumnRole::Priority),
    ("direction", ColumnRole::Direction),
    ("response", ColumnRole::Response),
    ("bit", ColumnRole::Bit),
    ("value", ColumnRole::Value),
    ("code", ColumnRole::Code),
    ("feature", ColumnRole::Feature),
    ("summary", ColumnRole::Summary),
    ("description", ColumnRole::Description),
    ("hierarchy", ColumnRole::Hierarchy),
    ("role", ColumnRole::Role),
    ("scope", ColumnRole::Scope),
    ("context", ColumnRole::Scope),
    ("pics", ColumnRole::PicsCode),
    ("pics code", ColumnRole::PicsCode),
    ("revision", ColumnRole::Revision),
    ("rev", ColumnRole::Revision),
    ("device name", ColumnRole::DeviceName),
    ("device type name", ColumnRole::DeviceName),
    ("superset", ColumnRole::Superset),
    ("class", ColumnRole::Class),
    ("cluster", ColumnRole::Cluster),
    ("client/server", ColumnRole::ClientServer),
    ("element", ColumnRole::Element),
    ("condition", ColumnRole::Condition),
];

impl ColumnRole {
    /// Case-insensitive exact match of trimmed header text.
    pub fn from_header(text: &str) -> Option<ColumnRole> {
        let lower = text.trim().to_lowercase();
        HEADERS
            .iter()
            .find(|(header, _)| *header == lower)
            .map(|(_, role)| *role)
    }

    /// Every spelling that maps to some role.
    pub fn headers() -> impl Iterator<Item = (&'static str, ColumnRole)> {
        HEADERS.iter().copied()
    }
}
