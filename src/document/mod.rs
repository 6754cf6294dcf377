//! Document I/O adapter
//!
//! Converts uploaded plain-text and Word (`.docx`) documents into the single
//! UTF-8 string the editor works on, and renders edited text back into
//! either format.
//!
//! - Plain text is decoded leniently: invalid UTF-8 sequences are dropped.
//! - A `.docx` is read paragraph by paragraph (`w:p`), paragraphs joined by
//!   `\n`. Writing produces one paragraph per non-blank line, so blank lines
//!   do not survive a round trip.

mod docx;

use crate::types::{AppError, Result};
use std::path::Path;

pub use docx::{read_docx_paragraphs, write_docx};

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Docx,
}

impl DocumentFormat {
    /// Determine the format from a file name's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Result<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("txt") => Ok(DocumentFormat::PlainText),
            Some("docx") => Ok(DocumentFormat::Docx),
            _ => Err(AppError::InvalidInput(format!(
                "Cannot upload '{}': file must be '.txt' or '.docx'",
                name
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "txt",
            DocumentFormat::Docx => "docx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "text/plain; charset=utf-8",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(DocumentFormat::PlainText),
            "docx" => Ok(DocumentFormat::Docx),
            other => Err(AppError::InvalidInput(format!(
                "Unknown document type '{}', expected 'txt' or 'docx'",
                other
            ))),
        }
    }
}

/// A file received from the user.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Decode bytes, dropping invalid UTF-8 sequences rather than replacing them.
pub fn decode_text_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// Decode a document into text.
pub fn decode(bytes: &[u8], format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::PlainText => Ok(decode_text_lossy(bytes)),
        DocumentFormat::Docx => Ok(read_docx_paragraphs(bytes)?.join("\n")),
    }
}

/// Encode text into a document.
pub fn encode(text: &str, format: DocumentFormat) -> Result<Vec<u8>> {
    match format {
        DocumentFormat::PlainText => Ok(text.as_bytes().to_vec()),
        DocumentFormat::Docx => {
            let paragraphs: Vec<&str> = text
                .split('\n')
                .filter(|line| !line.trim().is_empty())
                .collect();
            write_docx(&paragraphs)
        }
    }
}

/// Decode every upload and join the texts with a newline.
///
/// All files are validated before any is decoded, so one bad extension
/// rejects the whole submission.
pub fn combine_uploads(uploads: &[Upload]) -> Result<String> {
    if uploads.is_empty() {
        return Err(AppError::InvalidInput("Must upload a file".to_string()));
    }

    let formats = uploads
        .iter()
        .map(|upload| {
            if upload.file_name.trim().is_empty() {
                return Err(AppError::InvalidInput("Must upload a file".to_string()));
            }
            DocumentFormat::from_file_name(&upload.file_name)
        })
        .collect::<Result<Vec<_>>>()?;

    let texts = uploads
        .iter()
        .zip(formats)
        .map(|(upload, format)| {
            decode(&upload.bytes, format).map_err(|e| match e {
                AppError::Document(msg) => {
                    AppError::Document(format!("{}: {}", upload.file_name, msg))
                }
                other => other,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(texts.join("\n"))
}

/// Name offered for the edited version of a file: `report.docx` becomes
/// `report_edited.docx`.
pub fn output_file_name(input_name: &str) -> String {
    let path = Path::new(input_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document");

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_edited.{}", stem, ext),
        None => format!("{}_edited", stem),
    }
}

/// Name for the edited document in `format`: after its source file when
/// there is one (`report.docx` as txt gives `report_edited.txt`), otherwise
/// `edited.{ext}`. Characters unsafe in a `Content-Disposition` value are
/// replaced with `_`.
pub fn edited_file_name(source: Option<&str>, format: DocumentFormat) -> String {
    let name = match source {
        Some(source) => Path::new(&output_file_name(source))
            .with_extension(format.extension())
            .to_string_lossy()
            .into_owned(),
        None => format!("edited.{}", format.extension()),
    };

    name.chars()
        .map(|c| {
            if c == '"' || c == '\\' || !c.is_ascii() || c.is_ascii_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}
