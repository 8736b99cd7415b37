//! Text extraction from uploaded CV documents.

use std::io::{Cursor, Read};

use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Doc,
    Docx,
    PlainText,
}

impl DocumentFormat {
    pub const PDF_MIME: &'static str = "application/pdf";
    pub const DOC_MIME: &'static str = "application/msword";
    pub const DOCX_MIME: &'static str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
    pub const TEXT_MIME: &'static str = "text/plain";

    /// Maps an upload content type to a supported format. Parameters such as
    /// `; charset=utf-8` are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            Self::PDF_MIME => Some(DocumentFormat::Pdf),
            Self::DOC_MIME => Some(DocumentFormat::Doc),
            Self::DOCX_MIME => Some(DocumentFormat::Docx),
            Self::TEXT_MIME => Some(DocumentFormat::PlainText),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => Self::PDF_MIME,
            DocumentFormat::Doc => Self::DOC_MIME,
            DocumentFormat::Docx => Self::DOCX_MIME,
            DocumentFormat::PlainText => Self::TEXT_MIME,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Doc => "doc",
            DocumentFormat::Docx => "docx",
            DocumentFormat::PlainText => "txt",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),

    #[error("no text extractor for {0}")]
    Unsupported(&'static str),

    #[error("extractor aborted: {0}")]
    Aborted(String),
}

/// Extracts plain text from a document. PDF and DOCX parsing run on the
/// blocking pool; a panic inside a parser is reported as `Aborted`.
/// Legacy binary `.doc` has no extractor.
pub async fn extract_text(bytes: Bytes, format: DocumentFormat) -> Result<String, ExtractionError> {
    match format {
        DocumentFormat::PlainText => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        DocumentFormat::Pdf => tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractionError::Pdf(e.to_string()))
        })
        .await
        .map_err(|e| ExtractionError::Aborted(e.to_string()))?,
        DocumentFormat::Docx => tokio::task::spawn_blocking(move || docx_text(&bytes))
            .await
            .map_err(|e| ExtractionError::Aborted(e.to_string()))?,
        DocumentFormat::Doc => Err(ExtractionError::Unsupported(format.mime())),
    }
}

const DOCX_BODY_PART: &str = "word/document.xml";

/// Text runs (`w:t`) of the main document part, one line per paragraph.
fn docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Docx(format!("not a DOCX container: {e}")))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY_PART)
        .map_err(|e| ExtractionError::Docx(format!("missing {DOCX_BODY_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run_text = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_run_text => {
                let unescaped = t.unescape().map_err(|e| ExtractionError::Docx(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::Docx(format!(
                    "malformed document XML at {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mime_accepts_supported_types() {
        assert_eq!(DocumentFormat::from_mime("application/pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(
            DocumentFormat::from_mime(DocumentFormat::DOCX_MIME),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(
            DocumentFormat::from_mime("text/plain; charset=utf-8"),
            Some(DocumentFormat::PlainText)
        );
        assert_eq!(DocumentFormat::from_mime("Application/PDF"), Some(DocumentFormat::Pdf));
    }

    #[test]
    fn test_from_mime_rejects_others() {
        assert_eq!(DocumentFormat::from_mime("image/png"), None);
        assert_eq!(DocumentFormat::from_mime(""), None);
    }

    #[tokio::test]
    async fn test_plain_text_is_decoded_lossily() {
        let bytes = Bytes::from_static(b"Go engineer \xff");
        let text = extract_text(bytes, DocumentFormat::PlainText).await.unwrap();
        assert!(text.starts_with("Go engineer"));
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_an_error_not_a_panic() {
        let bytes = Bytes::from_static(b"definitely not a pdf");
        assert!(extract_text(bytes, DocumentFormat::Pdf).await.is_err());
    }

    #[tokio::test]
    async fn test_docx_paragraphs_become_lines() {
        let bytes = crate::testing::docx_fixture(&["Senior Rust engineer", "Go & Kubernetes"]);
        let text = extract_text(bytes, DocumentFormat::Docx).await.unwrap();
        assert_eq!(text.trim_end(), "Senior Rust engineer\nGo & Kubernetes");
    }

    #[tokio::test]
    async fn test_docx_that_is_not_a_zip_is_an_error() {
        let err = extract_text(Bytes::from_static(b"PK"), DocumentFormat::Docx)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(_)));
    }

    #[tokio::test]
    async fn test_legacy_doc_is_unsupported() {
        let err = extract_text(Bytes::from_static(b"\xd0\xcf"), DocumentFormat::Doc)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Unsupported(_)));
    }
}
