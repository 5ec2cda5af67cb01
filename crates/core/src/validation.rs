use std::fmt;

use crate::property::PropertyRecord;

/// A submission rejected before any model is consulted.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    /// Building footprint larger than the land it sits on.
    BuildingExceedsLand { building_m2: f64, land_m2: f64 },
    /// A value outside the range its form field allows.
    OutOfRange { field: &'static str, value: f64, min: f64, max: f64 },
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildingExceedsLand { building_m2, land_m2 } => write!(
                f,
                "building size ({building_m2} m²) cannot exceed land size ({land_m2} m²)"
            ),
            Self::OutOfRange { field, value, min, max } => {
                write!(f, "{field} = {value} is outside the allowed range {min}..={max}")
            }
        }
    }
}

impl std::error::Error for ValidationFailure {}

/// Reject records whose building size exceeds the land size.
///
/// Equal sizes are accepted.
pub fn validate_sizes(record: &PropertyRecord) -> Result<(), ValidationFailure> {
    if record.building_size_m2 > record.land_size_m2 {
        return Err(ValidationFailure::BuildingExceedsLand {
            building_m2: record.building_size_m2,
            land_m2: record.land_size_m2,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn building_larger_than_land_rejected() {
        let record = PropertyRecord {
            land_size_m2: 100.0,
            building_size_m2: 150.0,
            ..PropertyRecord::default()
        };
        let err = validate_sizes(&record).unwrap_err();
        assert_eq!(err, ValidationFailure::BuildingExceedsLand { building_m2: 150.0, land_m2: 100.0 });
        assert!(err.to_string().contains("cannot exceed land size"));
    }

    #[test]
    fn equal_sizes_accepted() {
        let record = PropertyRecord {
            land_size_m2: 120.0,
            building_size_m2: 120.0,
            ..PropertyRecord::default()
        };
        assert!(validate_sizes(&record).is_ok());
    }
}
