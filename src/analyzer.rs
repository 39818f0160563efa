use crate::pdf_utils;
use crate::xmp::XmpMetadata;
use crate::{Result, StripError};
use lopdf::Document;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

// ── PdfAnalyzer ───────────────────────────────────────────────────────────────

/// Read-only view over a loaded PDF: its XMP packet, its document-info
/// dictionary and its page tree.
///
/// # Creating an analyzer
///
/// ```no_run
/// use stripxmppdf::PdfAnalyzer;
///
/// // From a file path
/// let a = PdfAnalyzer::from_path("report.pdf").unwrap();
///
/// // From an in-memory buffer
/// let bytes = std::fs::read("report.pdf").unwrap();
/// let a = PdfAnalyzer::from_bytes(&bytes).unwrap();
/// ```
pub struct PdfAnalyzer {
    document: Document,
}

impl PdfAnalyzer {
    // ── Constructors ──────────────────────────────────────────────────────────

    /// Load a PDF from the file system.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            document: Document::load(path)?,
        })
    }

    /// Load a PDF from an in-memory byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self {
            document: Document::load_mem(data)?,
        })
    }

    // ── XMP ───────────────────────────────────────────────────────────────────

    /// Returns the raw XMP packet, or `None` when the catalog has no
    /// `/Metadata` entry.
    ///
    /// The entry is normally an indirect reference to a stream; an inline
    /// value that is not a stream is reported as [`StripError::InvalidPdf`].
    /// Streams declaring a `/Filter` are decoded first.
    pub fn xmp_packet(&self) -> Result<Option<String>> {
        let catalog = self
            .document
            .catalog()
            .map_err(|e| StripError::InvalidPdf(format!("cannot read catalog: {e}")))?;

        let meta_obj = match catalog.get(b"Metadata") {
            Ok(obj) => obj,
            Err(_) => return Ok(None),
        };

        let meta_object = match meta_obj.as_reference() {
            Ok(id) => self.document.get_object(id).map_err(|e| {
                StripError::InvalidPdf(format!("cannot resolve /Metadata object: {e}"))
            })?,
            Err(_) => meta_obj,
        };

        let stream = meta_object
            .as_stream()
            .map_err(|_| StripError::InvalidPdf("/Metadata object is not a stream".into()))?;

        let bytes = if stream.dict.has(b"Filter") {
            stream.decompressed_content()?
        } else {
            stream.content.clone()
        };

        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Parse the XMP packet into an [`XmpMetadata`].
    pub fn xmp_metadata(&self) -> Result<XmpMetadata> {
        Ok(match self.xmp_packet()? {
            Some(packet) => XmpMetadata::from_packet(&packet),
            None => XmpMetadata::Absent,
        })
    }

    // ── Document info ─────────────────────────────────────────────────────────

    /// Read the trailer `/Info` dictionary. Entries that are not strings
    /// (rare, but allowed for custom keys) are skipped.
    pub fn document_info(&self) -> DocumentInfo {
        let mut entries = BTreeMap::new();

        let info = self
            .document
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|value| pdf_utils::resolve_dict(&self.document, value));

        if let Some(info) = info {
            for (key, _) in info.iter() {
                if let Some(value) = pdf_utils::extract_string_from_dict(&self.document, info, key) {
                    entries.insert(String::from_utf8_lossy(key).into_owned(), value);
                }
            }
        }

        DocumentInfo { entries }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Returns a reference to the underlying [`lopdf::Document`].
    pub fn document(&self) -> &Document {
        &self.document
    }
}

// ── DocumentInfo ──────────────────────────────────────────────────────────────

/// The legacy document-information dictionary (`/Title`, `/Author`, …) with
/// its text strings decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DocumentInfo {
    pub entries: BTreeMap<String, String>,
}

impl DocumentInfo {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("Title")
    }

    pub fn author(&self) -> Option<&str> {
        self.get("Author")
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
