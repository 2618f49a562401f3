use crate::error::SchemaError;
use crate::layout::{layout_text, PageSetup, ReportDocument};
use crate::metrics::Helvetica;
use crate::model::ColumnElement;
use crate::normalize::normalize_all;
use crate::report::{render_report, ReportContext, ReportSummary};
use crate::schema::parse_results;
use chrono::NaiveDate;
use serde_json::Value;

pub struct RenderedReport {
    pub elements: Vec<ColumnElement>,
    pub summary: ReportSummary,
    pub text: String,
    pub document: ReportDocument,
}

/// Suggested name for the saved report, e.g. `BIM_Analysis_Report_2024-05-01.pdf`.
pub fn report_file_name(date: NaiveDate) -> String {
    format!("BIM_Analysis_Report_{}.pdf", date.format("%Y-%m-%d"))
}

/// Schema check, normalization, report text and page layout for one
/// service response.
pub fn render_response(
    body: &Value,
    ctx: &ReportContext<'_>,
    setup: &PageSetup,
) -> Result<RenderedReport, SchemaError> {
    let records = parse_results(body)?;
    let elements = normalize_all(&records);
    let summary = ReportSummary::from_elements(&elements);
    let text = render_report(&elements, ctx);
    let document = layout_text(&text, setup, &Helvetica::new(setup.font_size_pt));
    Ok(RenderedReport {
        elements,
        summary,
        text,
        document,
    })
}
