use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::encode::{one_hot_columns, CITY_COLUMN, FURNISHING_COLUMN};
use crate::frame::EncodedFrame;

/// Ordered column names a trained model declares as its input.
///
/// Read once when the model is loaded and held for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectedSchema {
    columns: Vec<String>,
}

impl ExpectedSchema {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { columns: columns.into_iter().map(Into::into).collect() }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Expected columns the frame lacks, in schema order.
    pub fn missing_from(&self, frame: &EncodedFrame) -> Vec<String> {
        self.columns.iter().filter(|c| !frame.contains(c)).cloned().collect()
    }

    /// Frame columns the schema does not name, in frame order.
    pub fn unexpected_in(&self, frame: &EncodedFrame) -> Vec<String> {
        let expected: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        frame
            .column_names()
            .filter(|c| !expected.contains(c))
            .map(String::from)
            .collect()
    }
}

/// Which encoding a schema points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVerdict {
    RawExpected,
    OneHotExpected,
    Unknown,
}

impl std::fmt::Display for SchemaVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RawExpected => write!(f, "raw_expected"),
            Self::OneHotExpected => write!(f, "one_hot_expected"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Infer the expected encoding from column names alone.
///
/// Literal `city` and `furnishing` columns win over indicator columns; a
/// schema carrying both is treated as raw.
pub fn sniff(schema: &ExpectedSchema) -> SchemaVerdict {
    if schema.contains(CITY_COLUMN) && schema.contains(FURNISHING_COLUMN) {
        return SchemaVerdict::RawExpected;
    }
    if one_hot_columns().iter().all(|c| schema.contains(c)) {
        return SchemaVerdict::OneHotExpected;
    }
    SchemaVerdict::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode, NUMERIC_COLUMNS};
    use crate::frame::EncodingKind;
    use griya_core::PropertyRecord;

    fn raw_schema() -> ExpectedSchema {
        ExpectedSchema::new(NUMERIC_COLUMNS.iter().copied().chain(["city", "furnishing"]))
    }

    fn one_hot_schema() -> ExpectedSchema {
        ExpectedSchema::new(
            NUMERIC_COLUMNS.iter().map(|c| c.to_string()).chain(one_hot_columns()),
        )
    }

    #[test]
    fn literal_categoricals_mean_raw() {
        assert_eq!(sniff(&raw_schema()), SchemaVerdict::RawExpected);
    }

    #[test]
    fn full_indicator_set_means_one_hot() {
        assert_eq!(sniff(&one_hot_schema()), SchemaVerdict::OneHotExpected);
    }

    #[test]
    fn only_one_literal_is_not_enough() {
        let schema = ExpectedSchema::new(["bedrooms", "city"]);
        assert_eq!(sniff(&schema), SchemaVerdict::Unknown);
    }

    #[test]
    fn partial_indicator_set_is_unknown() {
        let mut columns: Vec<String> = one_hot_schema().columns().to_vec();
        columns.retain(|c| c != "city_ Tangerang");
        assert_eq!(sniff(&ExpectedSchema::new(columns)), SchemaVerdict::Unknown);
    }

    #[test]
    fn raw_wins_when_both_patterns_present() {
        let mut columns: Vec<String> = one_hot_schema().columns().to_vec();
        columns.push("city".into());
        columns.push("furnishing".into());
        assert_eq!(sniff(&ExpectedSchema::new(columns)), SchemaVerdict::RawExpected);
    }

    #[test]
    fn missing_and_unexpected_are_ordered() {
        let schema = ExpectedSchema::new(["garages", "bedrooms", "carports"]);
        let frame = encode(&PropertyRecord::default(), EncodingKind::Raw);
        assert_eq!(schema.missing_from(&frame), ["garages", "carports"]);
        assert_eq!(
            schema.unexpected_in(&frame),
            ["bathrooms", "land_size_m2", "building_size_m2", "floors", "city", "furnishing"]
        );
    }

    #[test]
    fn deserializes_from_plain_list() {
        let schema: ExpectedSchema = serde_json::from_str(r#"["city","furnishing"]"#).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(sniff(&schema), SchemaVerdict::RawExpected);
    }
}
