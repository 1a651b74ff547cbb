//! Header detection and typed row access.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use thiserror::Error;

use super::ColumnRole;
use crate::diagnostics::DiagnosticKind;
use crate::doc::{CrossReference, Inline, Table, TableCell, TableRow, render_expression_text};
use crate::model::{Access, Conformance, Constraint, DataType, Quality};
use crate::parser::{parse_conformance, parse_constraint};

/// Minimum number of recognized header cells for a table to be trusted.
pub const MIN_RECOGNIZED_COLUMNS: usize = 2;

/// Why a table could not be read as a data table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("table has no rows")]
    Empty,
    #[error("no header row with at least {MIN_RECOGNIZED_COLUMNS} recognized columns")]
    NoHeader,
    #[error("row {row} has {found} cells, header has {expected}")]
    InconsistentCells {
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl From<&TableError> for DiagnosticKind {
    fn from(error: &TableError) -> Self {
        match error {
            TableError::Empty => DiagnosticKind::EmptyTable,
            TableError::NoHeader => DiagnosticKind::NoHeaderRow,
            TableError::InconsistentCells {
                row,
                expected,
                found,
            } => DiagnosticKind::InconsistentCells {
                row: *row,
                expected: *expected,
                found: *found,
            },
        }
    }
}

/// A header column whose text is not in the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraColumn {
    pub name: String,
    pub offset: usize,
}

/// A table with its detected header and column roles.
#[derive(Debug, Clone)]
pub struct TableInfo<'a> {
    pub table: &'a Table,
    pub header_row: usize,
    pub columns: FxHashMap<ColumnRole, usize>,
    pub extra_columns: Vec<ExtraColumn>,
}

/// Reads tables into [`TableInfo`].
pub struct TableReader;

impl TableReader {
    pub fn read(table: &Table) -> Result<TableInfo<'_>, TableError> {
        if table.rows.is_empty() {
            return Err(TableError::Empty);
        }

        let (header_row, roles) = table
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let roles: Vec<Option<ColumnRole>> = row
                    .cells
                    .iter()
                    .map(|cell| ColumnRole::from_header(&cell.text()))
                    .collect();
                (i, roles)
            })
            .find(|(_, roles)| roles.iter().flatten().count() >= MIN_RECOGNIZED_COLUMNS)
            .ok_or(TableError::NoHeader)?;

        let header = &table.rows[header_row];
        let mut columns = FxHashMap::default();
        let mut extra_columns = Vec::new();
        for (offset, role) in roles.iter().enumerate() {
            match role {
                Some(role) => {
                    columns.entry(*role).or_insert(offset);
                }
                None => extra_columns.push(ExtraColumn {
                    name: header.cells[offset].text(),
                    offset,
                }),
            }
        }

        let expected = header.cells.len();
        for (row, data) in table.rows.iter().enumerate().skip(header_row + 1) {
            if data.cells.len() != expected {
                return Err(TableError::InconsistentCells {
                    row,
                    expected,
                    found: data.cells.len(),
                });
            }
        }

        Ok(TableInfo {
            table,
            header_row,
            columns,
            extra_columns,
        })
    }
}

impl<'a> TableInfo<'a> {
    pub fn has_column(&self, role: ColumnRole) -> bool {
        self.columns.contains_key(&role)
    }

    /// Data rows following the header, with their row index.
    pub fn rows(&self) -> impl Iterator<Item = RowReader<'_>> {
        self.table
            .rows
            .iter()
            .enumerate()
            .skip(self.header_row + 1)
            .map(move |(index, row)| RowReader {
                info: self,
                row,
                index,
            })
    }
}

/// Typed access to one data row.
#[derive(Clone, Copy)]
pub struct RowReader<'t> {
    info: &'t TableInfo<'t>,
    row: &'t TableRow,
    index: usize,
}

impl<'t> RowReader<'t> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn row(&self) -> &'t TableRow {
        self.row
    }

    pub fn cell(&self, role: ColumnRole) -> Option<&'t TableCell> {
        let offset = *self.info.columns.get(&role)?;
        self.row.cells.get(offset)
    }

    pub fn read_string(&self, role: ColumnRole) -> Option<String> {
        self.cell(role)
            .map(TableCell::text)
            .filter(|text| !text.is_empty())
    }

    /// First non-empty value among `roles`, rendered to plain text.
    pub fn read_value(&self, roles: &[ColumnRole]) -> Option<String> {
        roles.iter().find_map(|role| self.read_string(*role))
    }

    pub fn read_id(&self, role: ColumnRole) -> Result<Option<u64>, DiagnosticKind> {
        match self.read_string(role) {
            Some(text) => parse_id(&text).ok_or(DiagnosticKind::InvalidId { text }),
            None => Ok(None),
        }
    }

    pub fn read_conformance(&self, role: ColumnRole) -> Option<Conformance> {
        let text = self.expression_text(role)?;
        Some(parse_conformance(&text))
    }

    pub fn read_constraint(&self, role: ColumnRole) -> Option<Constraint> {
        let text = self.expression_text(role)?;
        Some(parse_constraint(&text))
    }

    pub fn read_quality(&self, role: ColumnRole) -> Quality {
        self.read_string(role)
            .map(|text| Quality::parse(&text))
            .unwrap_or_default()
    }

    pub fn read_access(&self, role: ColumnRole) -> Access {
        self.read_string(role)
            .map(|text| Access::parse(&text))
            .unwrap_or_default()
    }

    pub fn read_data_type(&self, role: ColumnRole) -> Option<DataType> {
        self.expression_text(role)
            .and_then(|text| DataType::parse(&text))
    }

    /// A bit number (`3`) or an inclusive range (`0..3`, `0-3`).
    pub fn read_bits(&self, role: ColumnRole) -> Result<Option<(u32, u32)>, DiagnosticKind> {
        let Some(text) = self.read_string(role) else {
            return Ok(None);
        };
        parse_bits(&text)
            .map(Some)
            .ok_or(DiagnosticKind::InvalidBits { text })
    }

    /// Rendered name plus the first cross-reference in the cell.
    pub fn read_name(&self, role: ColumnRole) -> (String, Option<CrossReference>) {
        match self.cell(role) {
            Some(cell) => (cell.text(), first_reference(&cell.content)),
            None => (String::new(), None),
        }
    }

    /// First inline anchor id in the cell, `[[id]]Name` style.
    pub fn read_anchor(&self, role: ColumnRole) -> Option<SmolStr> {
        self.cell(role).and_then(|cell| first_anchor(&cell.content))
    }

    /// Values of the unrecognized columns, by header name.
    pub fn extra_values(&self) -> Vec<(SmolStr, String)> {
        self.info
            .extra_columns
            .iter()
            .filter_map(|column| {
                self.row
                    .cells
                    .get(column.offset)
                    .map(|cell| (SmolStr::from(column.name.as_str()), cell.text()))
            })
            .collect()
    }

    fn expression_text(&self, role: ColumnRole) -> Option<String> {
        self.cell(role)
            .map(|cell| render_expression_text(&cell.content))
            .filter(|text| !text.is_empty())
    }
}

fn first_reference(content: &[Inline]) -> Option<CrossReference> {
    content.iter().find_map(|inline| match inline {
        Inline::CrossReference(xref) => Some(xref.clone()),
        Inline::Formatted(inner) => first_reference(inner),
        _ => None,
    })
}

fn first_anchor(content: &[Inline]) -> Option<SmolStr> {
    content.iter().find_map(|inline| match inline {
        Inline::Anchor { id, .. } => Some(id.clone()),
        Inline::Formatted(inner) => first_anchor(inner),
        _ => None,
    })
}

/// Parse a decimal or `0x` hexadecimal id. `n/a` and empty text have no id.
pub fn parse_id(text: &str) -> Option<Option<u64>> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("n/a") {
        return Some(None);
    }
    let parsed = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => cleaned.parse::<u64>().ok(),
    };
    parsed.map(Some)
}

fn parse_bits(text: &str) -> Option<(u32, u32)> {
    let text = text.trim();
    let (from, to) = match text.split_once("..").or_else(|| text.split_once('-')) {
        Some((from, to)) => (from.trim().parse().ok()?, to.trim().parse().ok()?),
        None => {
            let bit = text.parse().ok()?;
            (bit, bit)
        }
    };
    (from <= to).then_some((from, to))
}
