use std::io::Write;

use report_card_server::generator::mapping::{column_letter_to_index, ColumnMapping};
use report_card_server::generator::MappingError;

fn write_mapping(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create mapping file");
    file.write_all(content.as_bytes()).expect("write mapping");
    file
}

#[test]
fn test_load_flat_mapping() {
    let file = write_mapping(r#"{"name": "A", "math": "B", "remark": "AA"}"#);
    let mapping = ColumnMapping::load(file.path()).expect("mapping loads");

    assert_eq!(mapping.len(), 3);
    assert_eq!(mapping.column_of("name"), Some(0));
    assert_eq!(mapping.column_of("math"), Some(1));
    assert_eq!(mapping.column_of("remark"), Some(26));
    assert_eq!(mapping.column_of("absent"), None);
}

#[test]
fn test_load_rejects_non_object() {
    let file = write_mapping(r#"["A", "B"]"#);
    assert!(matches!(
        ColumnMapping::load(file.path()),
        Err(MappingError::Parse(_))
    ));
}

#[test]
fn test_load_rejects_empty_object() {
    let file = write_mapping("{}");
    assert!(matches!(
        ColumnMapping::load(file.path()),
        Err(MappingError::Empty)
    ));
}

#[test]
fn test_load_rejects_bad_column_letter() {
    let file = write_mapping(r#"{"name": "A7"}"#);
    match ColumnMapping::load(file.path()) {
        Err(MappingError::InvalidColumn { key, column }) => {
            assert_eq!(key, "name");
            assert_eq!(column, "A7");
        }
        other => panic!("expected InvalidColumn, got {other:?}"),
    }
}

#[test]
fn test_load_missing_file_is_io_error() {
    let result = ColumnMapping::load(std::path::Path::new("./does-not-exist.json"));
    assert!(matches!(result, Err(MappingError::Io(_))));
}

#[test]
fn test_column_letters_round_past_z() {
    assert_eq!(column_letter_to_index("Z"), Some(25));
    assert_eq!(column_letter_to_index("AA"), Some(26));
    assert_eq!(column_letter_to_index("AZ"), Some(51));
    assert_eq!(column_letter_to_index("BA"), Some(52));
}
