use crate::model::{ColumnElement, Feature};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt::Write as _;

pub const REPORT_TITLE: &str = "SMART CONSTRUCTION - BIM ANALYSIS REPORT";
pub const NO_ELEMENTS_PLACEHOLDER: &str = "(no elements found)";
const NOT_AVAILABLE: &str = "N/A";
const FOOTER: &str =
    "Report generated by Smart Construction AI Analysis Engine (Backend IFC extractor)";

/// Everything about the run that is not part of the service response.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub file_name: &'a str,
    pub floor_level: &'a str,
    pub generated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportSummary {
    pub columns_detected: usize,
    pub average_column_height_mm: f64,
    pub average_width_mm: f64,
    pub average_length_mm: f64,
    pub average_cross_section_area_mm2: f64,
    pub average_aspect_ratio: f64,
}

impl ReportSummary {
    pub fn from_elements(elements: &[ColumnElement]) -> Self {
        Self {
            columns_detected: elements.len(),
            average_column_height_mm: mean_of(elements, Feature::ColumnHeightMm),
            average_width_mm: mean_of(elements, Feature::WidthMm),
            average_length_mm: mean_of(elements, Feature::LengthMm),
            average_cross_section_area_mm2: mean_of(elements, Feature::CrossSectionAreaMm2),
            average_aspect_ratio: mean_of(elements, Feature::AspectRatio),
        }
    }

    pub fn compliance_status(&self) -> &'static str {
        if self.columns_detected > 0 {
            "DATA GENERATED"
        } else {
            "NO DATA"
        }
    }
}

/// Mean over the elements where `feature` is a finite number; 0 when none are.
pub fn mean_of(elements: &[ColumnElement], feature: Feature) -> f64 {
    let (sum, count) = elements
        .iter()
        .filter_map(|e| e.measurements.get(feature))
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub fn render_report(elements: &[ColumnElement], ctx: &ReportContext<'_>) -> String {
    let summary = ReportSummary::from_elements(elements);
    let mut out = String::new();

    let _ = writeln!(out, "{REPORT_TITLE}");
    let _ = writeln!(out, "Generated: {}", ctx.generated_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "File: {}", ctx.file_name);
    let _ = writeln!(out, "Floor Level: {}", ctx.floor_level);
    out.push('\n');

    let _ = writeln!(out, "=== COLUMN ANALYSIS SUMMARY ===");
    out.push('\n');
    let _ = writeln!(out, "Columns Detected: {}", summary.columns_detected);
    let _ = writeln!(
        out,
        "Average Column Height: {:.2} mm",
        summary.average_column_height_mm
    );
    let _ = writeln!(out, "Average Width: {:.2} mm", summary.average_width_mm);
    let _ = writeln!(out, "Average Length: {:.2} mm", summary.average_length_mm);
    let _ = writeln!(
        out,
        "Average Cross-section Area: {:.2} mm²",
        summary.average_cross_section_area_mm2
    );
    let _ = writeln!(out, "Average Aspect Ratio: {:.2}", summary.average_aspect_ratio);
    out.push('\n');

    let _ = writeln!(out, "=== DETAILED ELEMENTS INFORMATION ===");
    if elements.is_empty() {
        let _ = writeln!(out, "{NO_ELEMENTS_PLACEHOLDER}");
    }
    for (idx, element) in elements.iter().enumerate() {
        out.push('\n');
        write_element(&mut out, idx + 1, element);
    }
    out.push('\n');

    let _ = writeln!(out, "Compliance Status: {}", summary.compliance_status());
    out.push('\n');
    let _ = write!(out, "{FOOTER}");

    out
}

fn write_element(out: &mut String, ordinal: usize, element: &ColumnElement) {
    let tilt_ratio = element
        .tilt_ratio
        .map(|v| format!("{v:.3}"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let _ = writeln!(out, "ELEMENT {ordinal}:");
    let _ = writeln!(out, "ID: {}", element.id);
    let _ = writeln!(out, "Type: {}", element.kind.as_str());
    let _ = writeln!(out, "Tilt Ratio: {tilt_ratio}");
    let _ = writeln!(out, "Tilt Class: {}", text_or_na(element.tilt_class.as_deref()));
    let _ = writeln!(
        out,
        "Leaning Status: {}",
        text_or_na(element.leaning_status.as_deref())
    );
    for (feature, value) in element.measurements.iter() {
        let _ = writeln!(out, "{}: {}", feature.name(), fixed2_or_na(value));
    }
}

fn text_or_na(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_AVAILABLE)
}

fn fixed2_or_na(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}
