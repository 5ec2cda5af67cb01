//! Record → frame encoding.
//!
//! Both encodings come out of [`encode`], which walks one field list. Adding a
//! city or a numeric attribute changes raw and one-hot frames together.

use griya_core::{City, Furnishing, PropertyRecord};

use crate::frame::{EncodedFrame, EncodingKind, Value};

pub const CITY_COLUMN: &str = "city";
pub const FURNISHING_COLUMN: &str = "furnishing";

/// Numeric attributes every form collects, in frame order.
pub const NUMERIC_COLUMNS: [&str; 5] =
    ["bedrooms", "bathrooms", "land_size_m2", "building_size_m2", "floors"];

/// Numeric attributes only the full form collects. A model expecting one of
/// these gets a zero when the submission lacks it.
pub const OPTIONAL_NUMERIC_COLUMNS: [&str; 3] = ["carports", "building_age", "garages"];

// The trained artifacts carry a space between the prefix and the city label.
const CITY_PREFIX: &str = "city_ ";
const FURNISHING_PREFIX: &str = "furnishing_";

pub fn city_indicator(city: City) -> String {
    format!("{CITY_PREFIX}{}", city.label())
}

pub fn furnishing_indicator(furnishing: Furnishing) -> String {
    format!("{FURNISHING_PREFIX}{}", furnishing.label())
}

/// All 13 indicator columns: 9 city, then 4 furnishing.
pub fn one_hot_columns() -> Vec<String> {
    City::ALL
        .iter()
        .map(|c| city_indicator(*c))
        .chain(Furnishing::ALL.iter().map(|f| furnishing_indicator(*f)))
        .collect()
}

struct Categorical {
    column: &'static str,
    prefix: &'static str,
    value: &'static str,
    labels: Vec<&'static str>,
}

fn numeric_fields(record: &PropertyRecord) -> Vec<(&'static str, Value)> {
    let int = |v: u32| Value::Int(i64::from(v));
    let mut fields = vec![
        ("bedrooms", int(record.bedrooms)),
        ("bathrooms", int(record.bathrooms)),
        ("land_size_m2", Value::Float(record.land_size_m2)),
        ("building_size_m2", Value::Float(record.building_size_m2)),
    ];
    if let Some(v) = record.carports {
        fields.push(("carports", int(v)));
    }
    fields.push(("floors", int(record.floors)));
    if let Some(v) = record.building_age {
        fields.push(("building_age", int(v)));
    }
    if let Some(v) = record.garages {
        fields.push(("garages", int(v)));
    }
    fields
}

fn categorical_fields(record: &PropertyRecord) -> [Categorical; 2] {
    [
        Categorical {
            column: CITY_COLUMN,
            prefix: CITY_PREFIX,
            value: record.city.label(),
            labels: City::ALL.iter().map(|c| c.label()).collect(),
        },
        Categorical {
            column: FURNISHING_COLUMN,
            prefix: FURNISHING_PREFIX,
            value: record.furnishing.label(),
            labels: Furnishing::ALL.iter().map(|f| f.label()).collect(),
        },
    ]
}

/// Build the `kind` encoding of `record`.
pub fn encode(record: &PropertyRecord, kind: EncodingKind) -> EncodedFrame {
    let mut frame = EncodedFrame::new(kind);
    for (name, value) in numeric_fields(record) {
        frame.push(name, value);
    }
    for field in categorical_fields(record) {
        match kind {
            EncodingKind::Raw => frame.push(field.column, Value::Text(field.value.to_string())),
            EncodingKind::OneHot => {
                for label in &field.labels {
                    let hot = i64::from(*label == field.value);
                    frame.push(format!("{}{label}", field.prefix), Value::Int(hot));
                }
            }
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_frame_has_seven_columns() {
        let frame = encode(&PropertyRecord::default(), EncodingKind::Raw);
        let names: Vec<_> = frame.column_names().collect();
        assert_eq!(
            names,
            ["bedrooms", "bathrooms", "land_size_m2", "building_size_m2", "floors", "city", "furnishing"]
        );
        assert_eq!(frame.get("city"), Some(&Value::Text("Bekasi".into())));
    }

    #[test]
    fn one_hot_frame_has_eighteen_columns() {
        let frame = encode(&PropertyRecord::default(), EncodingKind::OneHot);
        assert_eq!(frame.len(), 18);
        assert!(!frame.contains("city"));
        assert!(frame.contains("city_ Jakarta Barat"));
        assert!(frame.contains("furnishing_semi furnished"));
    }

    #[test]
    fn exactly_one_indicator_per_group() {
        for city in City::ALL {
            for furnishing in Furnishing::ALL {
                let record = PropertyRecord { city, furnishing, ..PropertyRecord::default() };
                let frame = encode(&record, EncodingKind::OneHot);

                let hot = |prefix: &str| -> Vec<String> {
                    frame
                        .iter()
                        .filter(|(n, _)| n.starts_with(prefix))
                        .filter(|(_, v)| v.as_f64() == Some(1.0))
                        .map(|(n, _)| n.to_string())
                        .collect()
                };
                let zeros = frame
                    .iter()
                    .filter(|(n, _)| n.starts_with("city_") || n.starts_with("furnishing_"))
                    .filter(|(_, v)| v.as_f64() == Some(0.0))
                    .count();

                assert_eq!(hot("city_"), [city_indicator(city)]);
                assert_eq!(hot("furnishing_"), [furnishing_indicator(furnishing)]);
                assert_eq!(zeros, 11);
            }
        }
    }

    #[test]
    fn extras_appear_in_both_encodings() {
        let record = PropertyRecord {
            carports: Some(1),
            building_age: Some(5),
            garages: Some(0),
            ..PropertyRecord::default()
        };
        for kind in [EncodingKind::Raw, EncodingKind::OneHot] {
            let frame = encode(&record, kind);
            let names: Vec<_> = frame.column_names().take(8).collect();
            assert_eq!(
                names,
                [
                    "bedrooms",
                    "bathrooms",
                    "land_size_m2",
                    "building_size_m2",
                    "carports",
                    "floors",
                    "building_age",
                    "garages"
                ]
            );
        }
    }

    #[test]
    fn numeric_values_agree_across_encodings() {
        let record = PropertyRecord { land_size_m2: 222.5, ..PropertyRecord::default() };
        let raw = encode(&record, EncodingKind::Raw);
        let oh = encode(&record, EncodingKind::OneHot);
        for name in NUMERIC_COLUMNS {
            assert_eq!(raw.get(name), oh.get(name), "{name}");
        }
    }

    #[test]
    fn one_hot_column_list_matches_encoder() {
        let frame = encode(&PropertyRecord::default(), EncodingKind::OneHot);
        let encoded: Vec<_> = frame.column_names().skip(5).map(String::from).collect();
        assert_eq!(encoded, one_hot_columns());
        assert_eq!(one_hot_columns()[0], "city_ Bekasi");
    }
}
