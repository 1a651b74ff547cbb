//! Enum, bitmap, struct and typedef sections.

use super::{BuildContext, strip_suffix};
use crate::doc::{ElementPath, Section, SectionKind};
use crate::model::{
    Bitmap, BitmapBit, DataType, Entity, EntityData, EntityId, Enum, EnumValue, FieldKind, Struct,
    TypeDef,
};
use crate::table::ColumnRole;

const TYPE_SUFFIXES: &[&str] = &[" Data Type", " Type"];

impl<'a> BuildContext<'a> {
    /// Build a data type section. The caller sets the parent for
    /// cluster-scoped types.
    pub(super) fn data_type(&mut self, section: &'a Section, path: &ElementPath) -> Option<EntityId> {
        let name = strip_suffix(&section.name, TYPE_SUFFIXES);
        let data = match section.kind {
            SectionKind::Enum => EntityData::Enum(Enum::default()),
            SectionKind::Bitmap => EntityData::Bitmap(Bitmap::default()),
            SectionKind::Struct => EntityData::Struct(Struct::default()),
            SectionKind::TypeDef => EntityData::TypeDef(self.typedef(section, path)),
            _ => return None,
        };
        let entity = Entity::new(name, self.source(section.span), path.clone(), data);
        let id = self.add(entity);
        self.link_section(id, section, path);

        match section.kind {
            SectionKind::Enum => {
                let values = self.enum_values(id, section, path);
                if let EntityData::Enum(e) = &mut self.entity_mut(id).data {
                    e.values = values;
                }
            }
            SectionKind::Bitmap => {
                let bits = self.bitmap_bits(id, section, path);
                if let EntityData::Bitmap(b) = &mut self.entity_mut(id).data {
                    b.bits = bits;
                }
            }
            SectionKind::Struct => {
                let fields = self.field_table(id, FieldKind::StructField, section, path);
                if let EntityData::Struct(s) = &mut self.entity_mut(id).data {
                    s.fields = fields;
                }
            }
            _ => {}
        }
        Some(id)
    }

    fn enum_values(&mut self, owner: EntityId, section: &'a Section, path: &ElementPath) -> Vec<EntityId> {
        let Some(info) = self.table(section, path) else {
            return Vec::new();
        };
        let table_path = Self::table_path(section, path);
        let value_role = if info.has_column(ColumnRole::Value) {
            ColumnRole::Value
        } else {
            ColumnRole::Id
        };
        let mut values = Vec::new();
        for row in info.rows() {
            let (name, _) = row.read_name(ColumnRole::Name);
            if name.is_empty() {
                continue;
            }
            let mut entity = Entity::new(
                name,
                self.source(row.row().span),
                table_path.child(row.index()),
                EntityData::EnumValue(EnumValue {
                    summary: row.read_value(&[ColumnRole::Summary, ColumnRole::Description]),
                }),
            );
            entity.id = self.read_id(&row, value_role);
            entity.conformance = self.read_conformance(&row, ColumnRole::Conformance);
            let id = self.add_child(owner, entity);
            self.link_row(id, &row, ColumnRole::Name, &table_path);
            values.push(id);
        }
        values
    }

    fn bitmap_bits(&mut self, owner: EntityId, section: &'a Section, path: &ElementPath) -> Vec<EntityId> {
        let Some(info) = self.table(section, path) else {
            return Vec::new();
        };
        let table_path = Self::table_path(section, path);
        let mut bits = Vec::new();
        for row in info.rows() {
            let (name, _) = row.read_name(ColumnRole::Name);
            if name.is_empty() {
                continue;
            }
            let (from, to) = match row.read_bits(ColumnRole::Bit) {
                Ok(Some(range)) => range,
                Ok(None) => continue,
                Err(kind) => {
                    self.report(kind, row.row().span);
                    continue;
                }
            };
            let mut entity = Entity::new(
                name,
                self.source(row.row().span),
                table_path.child(row.index()),
                EntityData::BitmapBit(BitmapBit { from, to }),
            );
            entity.id = Some(u64::from(from));
            entity.conformance = self.read_conformance(&row, ColumnRole::Conformance);
            let id = self.add_child(owner, entity);
            self.link_row(id, &row, ColumnRole::Name, &table_path);
            bits.push(id);
        }
        bits
    }

    /// A typedef takes its type from a table's first row, or from prose of
    /// the form `derived from <type>`.
    fn typedef(&mut self, section: &'a Section, path: &ElementPath) -> TypeDef {
        if section.first_table().is_some() {
            let Some(info) = self.table(section, path) else {
                return TypeDef::default();
            };
            let Some(row) = info.rows().next() else {
                return TypeDef::default();
            };
            return TypeDef {
                data_type: row.read_data_type(ColumnRole::Type),
                constraint: self.read_constraint(&row, ColumnRole::Constraint),
            };
        }
        let text = section.paragraph_text();
        let lower = text.to_ascii_lowercase();
        let data_type = lower.find("derived from ").and_then(|start| {
            let rest = &text[start + "derived from ".len()..];
            let word = rest
                .split(|c: char| c.is_whitespace() || c == ',')
                .next()
                .unwrap_or_default()
                .trim_end_matches('.');
            DataType::parse(word)
        });
        TypeDef {
            data_type,
            constraint: None,
        }
    }
}
