//! Form field declarations.
//!
//! These are the slider ranges and dropdown options a front end renders.
//! The reconciler never looks at them; the request boundary does.

use serde::{Deserialize, Serialize};

use crate::property::{City, Furnishing, PropertyRecord};
use crate::validation::ValidationFailure;

/// Which set of fields the form collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormProfile {
    /// Seven core attributes.
    #[default]
    Adaptive,
    /// Core attributes plus carports, building age and garages.
    Full,
}

impl std::fmt::Display for FormProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Adaptive => write!(f, "adaptive"),
            Self::Full => write!(f, "full"),
        }
    }
}

impl std::str::FromStr for FormProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adaptive" => Ok(Self::Adaptive),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown form profile '{other}' (expected adaptive or full)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Integer { min: u32, max: u32, default: u32 },
    Float { min: f64, max: f64, default: f64 },
    Choice { options: Vec<&'static str>, default: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
}

const fn int(name: &'static str, label: &'static str, min: u32, max: u32, default: u32) -> FieldSpec {
    FieldSpec { name, label, kind: FieldKind::Integer { min, max, default } }
}

const fn float(name: &'static str, label: &'static str, min: f64, max: f64, default: f64) -> FieldSpec {
    FieldSpec { name, label, kind: FieldKind::Float { min, max, default } }
}

pub const BEDROOMS: FieldSpec = int("bedrooms", "Bedrooms", 1, 8, 3);
pub const BATHROOMS: FieldSpec = int("bathrooms", "Bathrooms", 1, 4, 2);
pub const LAND_SIZE: FieldSpec = float("land_size_m2", "Land size (m²)", 10.0, 400.0, 100.0);
pub const BUILDING_SIZE: FieldSpec = float("building_size_m2", "Building size (m²)", 10.0, 400.0, 90.0);
pub const FLOORS: FieldSpec = int("floors", "Floors", 1, 3, 2);
pub const CARPORTS: FieldSpec = int("carports", "Carports", 0, 3, 1);
pub const BUILDING_AGE: FieldSpec = int("building_age", "Building age (years)", 0, 15, 0);
pub const GARAGES: FieldSpec = int("garages", "Garages", 0, 2, 0);

impl FormProfile {
    /// Fields in display order.
    pub fn fields(&self) -> Vec<FieldSpec> {
        let city = FieldSpec {
            name: "city",
            label: "City",
            kind: FieldKind::Choice {
                options: City::ALL.iter().map(|c| c.label()).collect(),
                default: City::Bekasi.label(),
            },
        };
        let furnishing = FieldSpec {
            name: "furnishing",
            label: "Furnishing",
            kind: FieldKind::Choice {
                options: Furnishing::ALL.iter().map(|f| f.label()).collect(),
                default: self.default_furnishing().label(),
            },
        };

        let mut fields = vec![BEDROOMS, BATHROOMS, LAND_SIZE, BUILDING_SIZE];
        if *self == FormProfile::Full {
            fields.push(CARPORTS);
        }
        fields.push(FLOORS);
        if *self == FormProfile::Full {
            fields.push(BUILDING_AGE);
            fields.push(GARAGES);
        }
        fields.push(city);
        fields.push(furnishing);
        fields
    }

    fn default_furnishing(&self) -> Furnishing {
        match self {
            Self::Adaptive => Furnishing::Baru,
            Self::Full => Furnishing::Unfurnished,
        }
    }

    /// The record a freshly opened form shows.
    pub fn default_record(&self) -> PropertyRecord {
        let mut record = PropertyRecord {
            furnishing: self.default_furnishing(),
            ..PropertyRecord::default()
        };
        if *self == FormProfile::Full {
            self.fill_extras(&mut record);
        }
        record
    }

    /// Supply defaults for full-profile attributes the caller left out.
    pub fn fill_extras(&self, record: &mut PropertyRecord) {
        if *self != FormProfile::Full {
            return;
        }
        record.carports.get_or_insert(int_default(&CARPORTS));
        record.building_age.get_or_insert(int_default(&BUILDING_AGE));
        record.garages.get_or_insert(int_default(&GARAGES));
    }

    /// Check every supplied value against its field range.
    pub fn check(&self, record: &PropertyRecord) -> Result<(), ValidationFailure> {
        check_int(&BEDROOMS, record.bedrooms)?;
        check_int(&BATHROOMS, record.bathrooms)?;
        check_float(&LAND_SIZE, record.land_size_m2)?;
        check_float(&BUILDING_SIZE, record.building_size_m2)?;
        check_int(&FLOORS, record.floors)?;
        if let Some(v) = record.carports {
            check_int(&CARPORTS, v)?;
        }
        if let Some(v) = record.building_age {
            check_int(&BUILDING_AGE, v)?;
        }
        if let Some(v) = record.garages {
            check_int(&GARAGES, v)?;
        }
        Ok(())
    }
}

fn int_default(spec: &FieldSpec) -> u32 {
    match spec.kind {
        FieldKind::Integer { default, .. } => default,
        _ => 0,
    }
}

fn check_int(spec: &FieldSpec, value: u32) -> Result<(), ValidationFailure> {
    if let FieldKind::Integer { min, max, .. } = spec.kind {
        if value < min || value > max {
            return Err(ValidationFailure::OutOfRange {
                field: spec.name,
                value: value as f64,
                min: min as f64,
                max: max as f64,
            });
        }
    }
    Ok(())
}

fn check_float(spec: &FieldSpec, value: f64) -> Result<(), ValidationFailure> {
    if let FieldKind::Float { min, max, .. } = spec.kind {
        // NaN fails both comparisons, so test containment instead
        if !(min..=max).contains(&value) {
            return Err(ValidationFailure::OutOfRange { field: spec.name, value, min, max });
        }
    }
    Ok(())
}
