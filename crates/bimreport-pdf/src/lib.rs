//! PDF output for laid-out reports.

use bimreport_core::error::EmissionError;
use bimreport_core::layout::{DocumentSink, Page, PageSetup, ReportDocument};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, StringFormat};
use std::path::{Path, PathBuf};
use thiserror::Error;

const POINTS_PER_MM: f64 = 72.0 / 25.4;
const FONT_KEY: &str = "F1";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("encode page content: {0}")]
    Content(String),
    #[error("serialize pdf: {0}")]
    Save(String),
}

/// Renders every page as left-aligned Helvetica text at the positions
/// computed by the layout engine.
pub fn render_pdf(document: &ReportDocument, title: &str) -> Result<Vec<u8>, PdfError> {
    let setup = &document.setup;
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { FONT_KEY => font_id },
    });

    let mut kids = Vec::with_capacity(document.pages.len());
    for page in &document.pages {
        let content = page_content(page, setup)
            .encode()
            .map_err(|e| PdfError::Content(e.to_string()))?;
        let content_id = doc.add_object(lopdf::Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            Object::Real(to_points(setup.page_width) as f32),
            Object::Real(to_points(setup.page_height) as f32),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = info_dictionary(&mut doc, title);
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfError::Save(e.to_string()))?;
    Ok(buffer)
}

fn info_dictionary(doc: &mut Document, title: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Title" => Object::String(win_ansi(title), StringFormat::Literal),
        "Producer" => Object::string_literal("bimreport"),
    })
}

fn page_content(page: &Page, setup: &PageSetup) -> Content {
    let mut operations = Vec::with_capacity(page.lines.len() * 5);
    for line in page.lines.iter().filter(|l| !l.text.is_empty()) {
        let x = to_points(line.x);
        let y = to_points(setup.page_height - line.y);
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![
                Object::Name(FONT_KEY.as_bytes().to_vec()),
                Object::Real(setup.font_size_pt as f32),
            ],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Real(x as f32), Object::Real(y as f32)],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(win_ansi(&line.text), StringFormat::Literal)],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
}

fn to_points(mm: f64) -> f64 {
    mm * POINTS_PER_MM
}

/// WinAnsi agrees with Latin-1 for ASCII and U+00A0..=U+00FF, which covers
/// everything the report prints (`±`, `²`). Anything else becomes `?`.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ 0x20..=0x7E | code @ 0xA0..=0xFF => code as u8,
            _ => b'?',
        })
        .collect()
}

/// Writes reports as PDF files into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct PdfDirectorySink {
    dir: PathBuf,
    last_written: Option<PathBuf>,
}

impl PdfDirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_written: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }
}

impl DocumentSink for PdfDirectorySink {
    fn emit(&mut self, document: &ReportDocument, file_name: &str) -> Result<(), EmissionError> {
        let bytes =
            render_pdf(document, file_name).map_err(|e| EmissionError::new(file_name, e))?;
        std::fs::create_dir_all(&self.dir).map_err(|e| EmissionError::new(file_name, e))?;

        let path = self.dir.join(file_name);
        std::fs::write(&path, &bytes).map_err(|e| EmissionError::new(file_name, e))?;
        tracing::info!(path = %path.display(), pages = document.page_count(), "report written");
        self.last_written = Some(path);
        Ok(())
    }
}
