use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Categorical attributes
// ---------------------------------------------------------------------------

/// City the property is located in.
///
/// Declaration order is the canonical indicator-column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum City {
    Bekasi,
    Bogor,
    Depok,
    #[serde(rename = "Jakarta Barat")]
    JakartaBarat,
    #[serde(rename = "Jakarta Pusat")]
    JakartaPusat,
    #[serde(rename = "Jakarta Selatan")]
    JakartaSelatan,
    #[serde(rename = "Jakarta Timur")]
    JakartaTimur,
    #[serde(rename = "Jakarta Utara")]
    JakartaUtara,
    Tangerang,
}

impl City {
    pub const ALL: [City; 9] = [
        City::Bekasi,
        City::Bogor,
        City::Depok,
        City::JakartaBarat,
        City::JakartaPusat,
        City::JakartaSelatan,
        City::JakartaTimur,
        City::JakartaUtara,
        City::Tangerang,
    ];

    /// Label as it appears in the form and in the training data.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bekasi => "Bekasi",
            Self::Bogor => "Bogor",
            Self::Depok => "Depok",
            Self::JakartaBarat => "Jakarta Barat",
            Self::JakartaPusat => "Jakarta Pusat",
            Self::JakartaSelatan => "Jakarta Selatan",
            Self::JakartaTimur => "Jakarta Timur",
            Self::JakartaUtara => "Jakarta Utara",
            Self::Tangerang => "Tangerang",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for City {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        City::ALL
            .iter()
            .copied()
            .find(|c| c.label() == s)
            .ok_or_else(|| ParseLabelError {
                field: "city",
                value: s.to_string(),
                expected: City::ALL.iter().map(|c| c.label()).collect(),
            })
    }
}

impl TryFrom<String> for City {
    type Error = ParseLabelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Furnishing condition of the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Furnishing {
    #[serde(rename = "baru")]
    Baru,
    #[serde(rename = "furnished")]
    Furnished,
    #[serde(rename = "semi furnished")]
    SemiFurnished,
    #[serde(rename = "unfurnished")]
    Unfurnished,
}

impl Furnishing {
    pub const ALL: [Furnishing; 4] = [
        Furnishing::Baru,
        Furnishing::Furnished,
        Furnishing::SemiFurnished,
        Furnishing::Unfurnished,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Baru => "baru",
            Self::Furnished => "furnished",
            Self::SemiFurnished => "semi furnished",
            Self::Unfurnished => "unfurnished",
        }
    }
}

impl fmt::Display for Furnishing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Furnishing {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Furnishing::ALL
            .iter()
            .copied()
            .find(|f| f.label() == s)
            .ok_or_else(|| ParseLabelError {
                field: "furnishing",
                value: s.to_string(),
                expected: Furnishing::ALL.iter().map(|f| f.label()).collect(),
            })
    }
}

impl TryFrom<String> for Furnishing {
    type Error = ParseLabelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A categorical label outside its enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLabelError {
    pub field: &'static str,
    pub value: String,
    pub expected: Vec<&'static str>,
}

impl fmt::Display for ParseLabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown {} '{}' (expected one of: {})",
            self.field,
            self.value,
            self.expected.join(", ")
        )
    }
}

impl std::error::Error for ParseLabelError {}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One form submission. Created fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub land_size_m2: f64,
    pub building_size_m2: f64,
    pub floors: u32,
    pub city: City,
    pub furnishing: Furnishing,
    /// Only collected by the full-pipeline form profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carports: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub garages: Option<u32>,
}

impl Default for PropertyRecord {
    fn default() -> Self {
        Self {
            bedrooms: 3,
            bathrooms: 2,
            land_size_m2: 100.0,
            building_size_m2: 90.0,
            floors: 2,
            city: City::Bekasi,
            furnishing: Furnishing::Unfurnished,
            carports: None,
            building_age: None,
            garages: None,
        }
    }
}

impl PropertyRecord {
    /// True when any of the full-pipeline attributes was supplied.
    pub fn has_extras(&self) -> bool {
        self.carports.is_some() || self.building_age.is_some() || self.garages.is_some()
    }
}
