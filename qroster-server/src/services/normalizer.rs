//! Record normalization
//!
//! Maps a raw spreadsheet row (header label -> cell text) onto the canonical
//! record shape. Header labels are matched case- and whitespace-insensitively
//! against an ordered alias table; the first alias with a non-blank cell wins.
//! Columns whose labels collapse to the same canonical label resolve in
//! header order, first non-blank cell first. Normalization never fails:
//! unknown columns are ignored and missing cells become empty strings.

use std::collections::HashMap;

use qroster_common::db::RecordFields;
use qroster_common::identifier;

/// One raw spreadsheet row as `(header label, cell text)` in header order
pub type RawRow = Vec<(String, String)>;

/// Canonical record fields recognized in uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Identifier,
    Name,
    Designation,
    Constituency,
    District,
    PhoneNumber,
    PhotoUrl,
}

/// Ordered `(field, aliases)` table; aliases are in canonical label form
pub const FIELD_ALIASES: &[(Field, &[&str])] = &[
    (Field::Identifier, &["unique id", "uniqueid", "identifier"]),
    (Field::Name, &["name", "full name"]),
    (Field::Designation, &["designation"]),
    (Field::Constituency, &["constituency"]),
    (Field::District, &["district"]),
    (
        Field::PhoneNumber,
        &["cell number", "phone", "phone number", "mobile"],
    ),
    (Field::PhotoUrl, &["image", "image url", "photo", "photo url"]),
];

/// A row mapped onto the canonical record shape
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub identifier: String,
    pub fields: RecordFields,
    /// True when the identifier came from the generator, not the sheet
    pub generated_identifier: bool,
}

/// Canonical form of a header label: lowercase, `_`/`-` as spaces,
/// whitespace runs collapsed
pub fn canonical_label(label: &str) -> String {
    label
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize one raw row
pub fn normalize(row: &RawRow) -> NormalizedRecord {
    let mut cells: HashMap<String, &str> = HashMap::new();
    for (label, value) in row {
        let slot = cells.entry(canonical_label(label)).or_insert("");
        if slot.trim().is_empty() {
            *slot = value.as_str();
        }
    }

    let mut record = NormalizedRecord::default();

    for (field, aliases) in FIELD_ALIASES {
        let value = aliases
            .iter()
            .filter_map(|alias| cells.get(*alias))
            .find(|value| !value.trim().is_empty())
            .map(|value| value.to_string())
            .unwrap_or_default();

        match field {
            Field::Identifier => record.identifier = value.trim().to_string(),
            Field::Name => record.fields.name = value,
            Field::Designation => record.fields.designation = value,
            Field::Constituency => record.fields.constituency = value,
            Field::District => record.fields.district = value,
            Field::PhoneNumber => record.fields.phone_number = value,
            Field::PhotoUrl => record.fields.photo_url = value,
        }
    }

    if record.identifier.is_empty() {
        record.identifier = identifier::generate();
        record.generated_identifier = true;
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> RawRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_canonical_label() {
        assert_eq!(canonical_label("  Unique   ID "), "unique id");
        assert_eq!(canonical_label("unique_id"), "unique id");
        assert_eq!(canonical_label("Cell-Number"), "cell number");
    }

    #[test]
    fn test_maps_display_headers() {
        let record = normalize(&row(&[
            ("Unique ID", "  EMP-001 "),
            ("Name", "Asha"),
            ("Designation", "Secretary"),
            ("Constituency", "North"),
            ("District", "Salem"),
            ("Cell Number", "9876543210"),
            ("Image", "https://img.example/a.png"),
        ]));

        assert_eq!(record.identifier, "EMP-001");
        assert!(!record.generated_identifier);
        assert_eq!(record.fields.name, "Asha");
        assert_eq!(record.fields.designation, "Secretary");
        assert_eq!(record.fields.constituency, "North");
        assert_eq!(record.fields.district, "Salem");
        assert_eq!(record.fields.phone_number, "9876543210");
        assert_eq!(record.fields.photo_url, "https://img.example/a.png");
    }

    #[test]
    fn test_maps_snake_case_headers() {
        let record = normalize(&row(&[
            ("unique_id", "x1"),
            ("name", "Ravi"),
            ("phone", "12345"),
        ]));

        assert_eq!(record.identifier, "x1");
        assert_eq!(record.fields.name, "Ravi");
        assert_eq!(record.fields.phone_number, "12345");
    }

    #[test]
    fn test_first_populated_alias_wins() {
        let record = normalize(&row(&[("Cell Number", ""), ("phone", "555"), ("mobile", "777")]));

        assert_eq!(record.fields.phone_number, "555");
    }

    #[test]
    fn test_colliding_headers_resolve_in_header_order() {
        let blank_first = row(&[("Name", ""), ("name", "Asha"), ("Cell Number", "1")]);
        let both_filled = row(&[("cell_number", "2"), ("Cell Number", "3"), ("Unique ID", "c1")]);

        for _ in 0..50 {
            let record = normalize(&blank_first);
            assert_eq!(record.fields.name, "Asha");
            assert_eq!(record.fields.phone_number, "1");

            let record = normalize(&both_filled);
            assert_eq!(record.fields.phone_number, "2");
            assert_eq!(record.identifier, "c1");
        }
    }

    #[test]
    fn test_blank_identifier_is_generated() {
        let record = normalize(&row(&[("Unique ID", "   "), ("Name", "Meena")]));

        assert!(record.generated_identifier);
        assert!(!record.identifier.is_empty());
        assert_eq!(record.fields.name, "Meena");
    }

    #[test]
    fn test_unknown_columns_ignored_and_missing_default_empty() {
        let record = normalize(&row(&[("Unique ID", "k9"), ("Favourite Colour", "blue")]));

        assert_eq!(record.identifier, "k9");
        assert_eq!(record.fields, RecordFields::default());
    }
}
