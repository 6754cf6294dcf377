use crate::types::{AppError, Result};
use docx_rs::{Docx, Paragraph, Run};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::io::{Cursor, Read};

const DOCUMENT_PART: &str = "word/document.xml";

/// Elements that may sit between a paragraph and its runs without hiding
/// the text (links, tracked insertions, simple fields and the like).
const RUN_CONTAINERS: &[&[u8]] = &[
    b"w:r",
    b"w:hyperlink",
    b"w:ins",
    b"w:smartTag",
    b"w:fldSimple",
    b"w:customXml",
];

/// Extract the text of every top-level paragraph of a `.docx`, in order.
///
/// Only paragraphs directly under `w:body` count, and only the text of their
/// own runs. Paragraphs nested in text boxes, drawings or tables are skipped
/// without disturbing the paragraph that hosts them. Empty paragraphs are
/// kept as empty strings. Tabs and line breaks inside a run become `\t` and
/// `\n`.
pub fn read_docx_paragraphs(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::Document(format!("Not a valid .docx archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| AppError::Document(format!("Missing {}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| AppError::Document(format!("Failed to read {}: {}", DOCUMENT_PART, e)))?;

    paragraphs_from_xml(&xml)
}

fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    // Names of the currently open elements, outermost first
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                if name == b"w:p" && is_body_level(&open) {
                    current = Some(String::new());
                }
                open.push(name);
            }
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:p" if is_body_level(&open) => paragraphs.push(String::new()),
                b"w:tab" if in_body_run(&open) => push_char(&mut current, '\t'),
                b"w:br" | b"w:cr" if in_body_run(&open) => push_char(&mut current, '\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_body_text(&open) => {
                let text = t
                    .unescape()
                    .map_err(|e| AppError::Document(format!("Bad text in document: {}", e)))?;
                if let Some(paragraph) = current.as_mut() {
                    paragraph.push_str(&text);
                }
            }
            Ok(Event::End(_)) => {
                let closed = open.pop();
                if closed.as_deref() == Some(b"w:p".as_slice()) && is_body_level(&open) {
                    if let Some(paragraph) = current.take() {
                        paragraphs.push(paragraph);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AppError::Document(format!(
                    "Malformed document XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_char(current: &mut Option<String>, c: char) {
    if let Some(paragraph) = current.as_mut() {
        paragraph.push(c);
    }
}

fn is_body_level(open: &[Vec<u8>]) -> bool {
    open.last().is_some_and(|name| name == b"w:body")
}

/// The innermost open element is a run belonging to a body paragraph.
fn in_body_run(open: &[Vec<u8>]) -> bool {
    let Some(body) = open.iter().rposition(|name| name == b"w:body") else {
        return false;
    };
    match &open[body + 1..] {
        [paragraph, inner @ ..] if paragraph == b"w:p" => {
            inner.last().is_some_and(|name| name == b"w:r")
                && inner
                    .iter()
                    .all(|name| RUN_CONTAINERS.contains(&name.as_slice()))
        }
        _ => false,
    }
}

/// The innermost open element is a `w:t` of a body paragraph's run.
fn in_body_text(open: &[Vec<u8>]) -> bool {
    match open.split_last() {
        Some((last, parents)) => last == b"w:t" && in_body_run(parents),
        None => false,
    }
}

/// Build a `.docx` with one paragraph per entry.
pub fn write_docx(paragraphs: &[&str]) -> Result<Vec<u8>> {
    let docx = paragraphs.iter().fold(Docx::new(), |docx, text| {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)))
    });

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| AppError::Document(format!("Failed to write .docx: {}", e)))?;

    Ok(buffer.into_inner())
}
