//! Plain-text extraction for uploaded PDF and DOCX documents.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use pdfium_render::prelude::*;
use quick_xml::{Reader, events::Event};
use serde::{Deserialize, Serialize};
use tracing::info;
use zip::ZipArchive;

use crate::error::ExtractionError;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Resolve the upload type from its MIME type, falling back to the file
    /// extension when the client sent a generic or missing type.
    pub fn detect(content_type: Option<&str>, filename: Option<&str>) -> Result<Self, ExtractionError> {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());

        match mime.as_deref() {
            Some(PDF_MIME) => return Ok(Self::Pdf),
            Some(DOCX_MIME) => return Ok(Self::Docx),
            Some("application/octet-stream") | None => {}
            Some(other) => return Err(ExtractionError::UnsupportedType(other.to_string())),
        }

        let extension = filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("docx") => Ok(Self::Docx),
            _ => Err(ExtractionError::UnsupportedType(
                filename.unwrap_or("unnamed upload").to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    pdfium_library_dir: Option<PathBuf>,
}

impl TextExtractor {
    pub fn new(pdfium_library_dir: Option<PathBuf>) -> Self {
        Self { pdfium_library_dir }
    }

    pub async fn extract(&self, kind: DocumentKind, bytes: Vec<u8>) -> Result<String, ExtractionError> {
        let library_dir = self.pdfium_library_dir.clone();
        let text = tokio::task::spawn_blocking(move || match kind {
            DocumentKind::Pdf => pdf_text(&bytes, library_dir.as_deref()),
            DocumentKind::Docx => docx_text(&bytes),
        })
        .await??;

        info!(?kind, characters = text.chars().count(), "Extracted document text");
        Ok(text)
    }
}

fn pdf_text(bytes: &[u8], library_dir: Option<&Path>) -> Result<String, ExtractionError> {
    let bindings = match library_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ExtractionError::Pdf(format!("pdfium library unavailable: {}", e)))?;
    let pdfium = Pdfium::new(bindings);

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    let mut text = String::new();
    for page in document.pages().iter() {
        let page_text = page
            .text()
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?;
        text.push_str(&page_text.all());
        if !text.ends_with('\n') {
            text.push('\n');
        }
    }
    Ok(text)
}

fn docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::Docx(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;

    document_xml_text(&xml)
}

/// Paragraph text of a WordprocessingML body, one line per paragraph
fn document_xml_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractionError::Docx(e.to_string()))?;
        match event {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" | b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_run_text => {
                let unescaped = t.unescape().map_err(|e| ExtractionError::Docx(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}
