//! Plain text out of document files.

use anyhow::{bail, Context};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "txt" | "md" | "text" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }
}

pub fn load_text(path: &Path) -> anyhow::Result<String> {
    let Some(format) = DocumentFormat::from_path(path) else {
        bail!("unsupported file format: {}", path.display());
    };
    let text = match format {
        DocumentFormat::Text => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        DocumentFormat::Pdf => pdf_text(path)?,
        DocumentFormat::Docx => docx_text(path)?,
    };
    tracing::debug!(path = %path.display(), ?format, chars = text.chars().count(), "loaded document");
    Ok(text)
}

#[cfg(feature = "pdf")]
fn pdf_text(path: &Path) -> anyhow::Result<String> {
    pdf_extract::extract_text(path).with_context(|| format!("extracting pdf {}", path.display()))
}

#[cfg(not(feature = "pdf"))]
fn pdf_text(path: &Path) -> anyhow::Result<String> {
    bail!("pdf support not enabled (build with --features pdf): {}", path.display())
}

/// Paragraph text of `word/document.xml`, one paragraph per line.
#[cfg(feature = "office")]
fn docx_text(path: &Path) -> anyhow::Result<String> {
    use quick_xml::events::Event;
    use quick_xml::Reader;
    use std::io::Read;

    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("docx without word/document.xml")?
        .read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n"))
}

#[cfg(not(feature = "office"))]
fn docx_text(path: &Path) -> anyhow::Result<String> {
    bail!("docx support not enabled (build with --features office): {}", path.display())
}
