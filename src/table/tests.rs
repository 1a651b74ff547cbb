use rstest::rstest;

use super::*;
use crate::diagnostics::DiagnosticKind;
use crate::doc::{ElementPath, Table};
use crate::model::{BaseType, Conformance, Constraint, DataType, Limit, Quality};

fn attributes_table() -> Table {
    Table::from_rows(&[
        &["ID", "Name", "Type", "Constraint", "Quality", "Default", "Access", "Conformance", "Notes"],
        &["0x0000", "LocalTemperature", "temperature", "desc", "X P", "null", "R V", "M", "hot"],
        &["0x0012", "OccupiedHeatingSetpoint", "<<ref_Temp,temperature>>", "1 to 100", "N", "2000", "RW VO", "HEAT", ""],
    ])
}

#[test]
fn test_header_detection_skips_title_row() {
    let table = Table::from_rows(&[
        &["Attributes of the cluster", "", ""],
        &["ID", "Name", "Type"],
        &["0x0001", "Foo", "uint8"],
    ]);
    let info = TableReader::read(&table).unwrap();
    assert_eq!(info.header_row, 1);
    assert_eq!(info.rows().count(), 1);
}

#[test]
fn test_empty_and_headerless_tables_fail() {
    let empty = Table::from_rows(&[]);
    assert_eq!(TableReader::read(&empty).unwrap_err(), TableError::Empty);

    let headerless = Table::from_rows(&[&["foo", "bar"], &["1", "2"]]);
    assert_eq!(
        TableReader::read(&headerless).unwrap_err(),
        TableError::NoHeader
    );

    let single = Table::from_rows(&[&["ID", "bar"], &["1", "2"]]);
    assert_eq!(TableReader::read(&single).unwrap_err(), TableError::NoHeader);
}

#[test]
fn test_inconsistent_row_width_fails() {
    let table = Table::from_rows(&[&["ID", "Name"], &["1", "Foo"], &["2"]]);
    assert_eq!(
        TableReader::read(&table).unwrap_err(),
        TableError::InconsistentCells {
            row: 2,
            expected: 2,
            found: 1
        }
    );
}

#[test]
fn test_first_matching_column_wins() {
    let table = Table::from_rows(&[&["Name", "ID", "Identifier"], &["Foo", "1", "2"]]);
    let info = TableReader::read(&table).unwrap();
    let row = info.rows().next().unwrap();
    assert_eq!(row.read_id(ColumnRole::Id), Ok(Some(1)));
}

#[test]
fn test_row_readers() {
    let table = attributes_table();
    let info = TableReader::read(&table).unwrap();
    let rows: Vec<_> = info.rows().collect();

    let first = rows[0];
    assert_eq!(first.read_id(ColumnRole::Id), Ok(Some(0)));
    assert_eq!(
        first.read_data_type(ColumnRole::Type),
        Some(DataType::Base(BaseType::Temperature))
    );
    assert_eq!(
        first.read_constraint(ColumnRole::Constraint),
        Some(Constraint::Described)
    );
    assert_eq!(
        first.read_quality(ColumnRole::Quality),
        Quality::NULLABLE | Quality::REPORTABLE
    );
    assert_eq!(
        first.read_conformance(ColumnRole::Conformance),
        Some(Conformance::mandatory())
    );
    assert!(first.read_access(ColumnRole::Access).read);
    assert_eq!(
        first.extra_values(),
        vec![("Notes".into(), "hot".to_string())]
    );

    let second = rows[1];
    assert_eq!(second.read_id(ColumnRole::Id), Ok(Some(0x12)));
    let (name, xref) = second.read_name(ColumnRole::Name);
    assert_eq!(name, "OccupiedHeatingSetpoint");
    assert!(xref.is_none());
    assert_eq!(
        second.read_constraint(ColumnRole::Constraint),
        Some(Constraint::Range {
            min: Limit::Int(1),
            max: Limit::Int(100)
        })
    );
    assert!(second.read_access(ColumnRole::Access).write);
    assert_eq!(second.read_string(ColumnRole::Summary), None);
    assert_eq!(
        second.read_value(&[ColumnRole::Summary, ColumnRole::Default]),
        Some("2000".to_string())
    );
}

#[test]
fn test_read_name_keeps_cross_reference() {
    let table = Table::from_rows(&[&["ID", "Name"], &["1", "<<ref_Foo,Foo>>"]]);
    let info = TableReader::read(&table).unwrap();
    let row = info.rows().next().unwrap();
    let (name, xref) = row.read_name(ColumnRole::Name);
    assert_eq!(name, "Foo");
    assert_eq!(xref.unwrap().id, "ref_Foo");
}

#[rstest]
#[case("0x0001", Some(Some(1)))]
#[case("0X00FF", Some(Some(255)))]
#[case("0x0000_0001", Some(Some(1)))]
#[case("42", Some(Some(42)))]
#[case("", Some(None))]
#[case("n/a", Some(None))]
#[case("0xZZ", None)]
#[case("abc", None)]
fn test_parse_id(#[case] text: &str, #[case] expected: Option<Option<u64>>) {
    assert_eq!(parse_id(text), expected);
}

#[rstest]
#[case("3", Ok(Some((3, 3))))]
#[case("0..3", Ok(Some((0, 3))))]
#[case("4-7", Ok(Some((4, 7))))]
#[case("7..4", Err(DiagnosticKind::InvalidBits { text: "7..4".into() }))]
#[case("x", Err(DiagnosticKind::InvalidBits { text: "x".into() }))]
fn test_read_bits(
    #[case] text: &str,
    #[case] expected: Result<Option<(u32, u32)>, DiagnosticKind>,
) {
    let table = Table::from_rows(&[&["Bit", "Name"], &[text, "Foo"]]);
    let info = TableReader::read(&table).unwrap();
    let row = info.rows().next().unwrap();
    assert_eq!(row.read_bits(ColumnRole::Bit), expected);
}

#[test]
fn test_invalid_id_is_reported() {
    let table = Table::from_rows(&[&["ID", "Name"], &["0xG1", "Foo"]]);
    let info = TableReader::read(&table).unwrap();
    let row = info.rows().next().unwrap();
    assert_eq!(
        row.read_id(ColumnRole::Id),
        Err(DiagnosticKind::InvalidId {
            text: "0xG1".into()
        })
    );
}

#[test]
fn test_every_vocabulary_spelling_is_recognized() {
    for (header, role) in ColumnRole::headers() {
        assert_eq!(ColumnRole::from_header(header), Some(role));
        assert_eq!(
            ColumnRole::from_header(&format!("  {} ", header.to_uppercase())),
            Some(role)
        );
    }
    assert_eq!(ColumnRole::from_header("Notes"), None);
}

#[test]
fn test_cache_reads_each_table_once() {
    let table = attributes_table();
    let bad = Table::from_rows(&[&["a", "b"]]);
    let mut cache = TableCache::new();
    let path = ElementPath::root(0).child(1);
    let bad_path = ElementPath::root(0).child(2);

    assert!(cache.get(&path, &table).first_read);
    let again = cache.get(&path, &table);
    assert!(!again.first_read);
    assert!(again.info.is_ok());

    assert!(cache.get(&bad_path, &bad).first_read);
    let again = cache.get(&bad_path, &bad);
    assert_eq!(again.info.unwrap_err(), TableError::NoHeader);
    assert!(!again.first_read);
    assert_eq!(cache.reads(), 2);
}
