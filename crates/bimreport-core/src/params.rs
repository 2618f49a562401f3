use serde::{Deserialize, Serialize};

pub const FLOOR_LEVELS: [&str; 8] = [
    "Ground Floor",
    "First Floor",
    "Second Floor",
    "Third Floor",
    "Fourth Floor",
    "Fifth Floor",
    "Basement",
    "Mezzanine",
];

pub const MIN_COLUMN_WIDTHS: [&str; 7] = [
    "200mm", "250mm", "300mm", "350mm", "400mm", "450mm", "500mm",
];

pub const MAX_DISTANCES: [&str; 8] = [
    "3.0m", "4.0m", "5.0m", "6.0m", "7.0m", "8.0m", "9.0m", "10.0m",
];

pub const DEVIATION_TOLERANCES: [&str; 7] = [
    "±1mm", "±1.5mm", "±2mm", "±2.5mm", "±3mm", "±3.5mm", "±4mm",
];

/// Form values for one analysis run. An empty string means "not selected".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParameters {
    pub floor_level: String,
    pub min_column_width: String,
    pub max_distance: String,
    pub deviation_tolerance: String,
}

impl AnalysisParameters {
    pub fn has_floor_level(&self) -> bool {
        !self.floor_level.trim().is_empty()
    }

    /// Optional fields forwarded to the analysis service as multipart text
    /// parts, skipping the ones left unselected.
    pub fn optional_fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("deviation_tolerance", self.deviation_tolerance.as_str()),
            ("min_column_width", self.min_column_width.as_str()),
            ("max_distance", self.max_distance.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .collect()
    }
}
