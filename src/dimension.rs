use serde::{Deserialize, Serialize};
use std::fmt;

/// Demographic breakdown a series is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionKey {
    Age,
    Gender,
    Race,
}

pub const AGE_VALUES: [&str; 4] = [
    "All ages",
    "16 to 24 years",
    "25 to 54 years",
    "55 years and over",
];

pub const GENDER_VALUES: [&str; 3] = ["All genders", "Men", "Women"];

pub const RACE_VALUES: [&str; 5] = [
    "All races",
    "Asian",
    "Black or African American",
    "White",
    "Hispanic or Latino",
];

impl DimensionKey {
    pub const ALL: [DimensionKey; 3] =
        [DimensionKey::Age, DimensionKey::Gender, DimensionKey::Race];

    /// Order the filter groups are presented in.
    pub const DISPLAY_ORDER: [DimensionKey; 3] =
        [DimensionKey::Gender, DimensionKey::Race, DimensionKey::Age];

    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionKey::Age => "age",
            DimensionKey::Gender => "gender",
            DimensionKey::Race => "race",
        }
    }

    /// Column headers are matched case-insensitively ("Age", "AGE", "age").
    pub fn from_header(header: &str) -> Option<Self> {
        match header.trim().to_lowercase().as_str() {
            "age" => Some(DimensionKey::Age),
            "gender" => Some(DimensionKey::Gender),
            "race" => Some(DimensionKey::Race),
            _ => None,
        }
    }

    /// The fixed set of values this dimension may take.
    pub fn values(&self) -> &'static [&'static str] {
        match self {
            DimensionKey::Age => &AGE_VALUES,
            DimensionKey::Gender => &GENDER_VALUES,
            DimensionKey::Race => &RACE_VALUES,
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.values().contains(&value)
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
