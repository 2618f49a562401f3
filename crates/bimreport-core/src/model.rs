use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Column,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Column => "column",
        }
    }
}

/// Per-column measurements reported by the analysis service, in the order the
/// service's feature extractor emits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    BaseZ,
    TopZ,
    CentroidZ,
    BaseX,
    BaseY,
    TopX,
    TopY,
    MinX,
    MinY,
    MinZ,
    MaxX,
    MaxY,
    MaxZ,
    ColumnHeightMm,
    WidthMm,
    LengthMm,
    CrossSectionAreaMm2,
    AspectRatio,
    HeightToWidthRatio,
    HeightAboveGround,
}

impl Feature {
    pub const COUNT: usize = 20;

    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::BaseZ,
        Feature::TopZ,
        Feature::CentroidZ,
        Feature::BaseX,
        Feature::BaseY,
        Feature::TopX,
        Feature::TopY,
        Feature::MinX,
        Feature::MinY,
        Feature::MinZ,
        Feature::MaxX,
        Feature::MaxY,
        Feature::MaxZ,
        Feature::ColumnHeightMm,
        Feature::WidthMm,
        Feature::LengthMm,
        Feature::CrossSectionAreaMm2,
        Feature::AspectRatio,
        Feature::HeightToWidthRatio,
        Feature::HeightAboveGround,
    ];

    /// Field name used on the wire and in the report.
    pub fn name(self) -> &'static str {
        match self {
            Feature::BaseZ => "base_z",
            Feature::TopZ => "top_z",
            Feature::CentroidZ => "centroid_z",
            Feature::BaseX => "base_x",
            Feature::BaseY => "base_y",
            Feature::TopX => "top_x",
            Feature::TopY => "top_y",
            Feature::MinX => "min_x",
            Feature::MinY => "min_y",
            Feature::MinZ => "min_z",
            Feature::MaxX => "max_x",
            Feature::MaxY => "max_y",
            Feature::MaxZ => "max_z",
            Feature::ColumnHeightMm => "column_height_mm",
            Feature::WidthMm => "width_mm",
            Feature::LengthMm => "length_mm",
            Feature::CrossSectionAreaMm2 => "cross_section_area_mm2",
            Feature::AspectRatio => "aspect_ratio",
            Feature::HeightToWidthRatio => "height_to_width_ratio",
            Feature::HeightAboveGround => "height_above_ground",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurements {
    values: [Option<f64>; Feature::COUNT],
}

impl Measurements {
    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values[feature.index()]
    }

    pub fn set(&mut self, feature: Feature, value: Option<f64>) {
        self.values[feature.index()] = value;
    }

    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        self.set(feature, Some(value));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, Option<f64>)> + '_ {
        Feature::ALL.iter().map(|&f| (f, self.get(f)))
    }
}

impl Serialize for Measurements {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Feature::COUNT))?;
        for (feature, value) in self.iter() {
            map.serialize_entry(feature.name(), &value)?;
        }
        map.end()
    }
}

/// Normalized, display-ready view of one column returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnElement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub prediction: Option<f64>,
    pub leaning_status: Option<String>,
    pub tilt_ratio: Option<f64>,
    pub tilt_class: Option<String>,
    #[serde(flatten)]
    pub measurements: Measurements,
    pub source_file: Option<String>,
}

impl ColumnElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ElementKind::Column,
            prediction: None,
            leaning_status: None,
            tilt_ratio: None,
            tilt_class: None,
            measurements: Measurements::default(),
            source_file: None,
        }
    }
}
