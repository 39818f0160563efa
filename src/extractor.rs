//! Metadata extraction for uploaded files.
//!
//! Extraction never fails from the caller's point of view: an unreadable
//! document is reported as [`XmpMetadata::Absent`], a broken packet as
//! [`XmpMetadata::Malformed`].

use crate::analyzer::PdfAnalyzer;
use crate::xmp::XmpMetadata;
use std::collections::BTreeMap;
use std::path::Path;

/// Read and parse the XMP packet of the PDF at `path`.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn extract<P: AsRef<Path>>(path: P) -> XmpMetadata {
    let metadata = PdfAnalyzer::from_path(path.as_ref()).and_then(|analyzer| analyzer.xmp_metadata());

    match metadata {
        Ok(metadata) => {
            if let XmpMetadata::Malformed(reason) = &metadata {
                tracing::warn!(%reason, "XMP packet is not well-formed");
            }
            metadata
        }
        Err(e) => {
            tracing::warn!(error = %e, "Error reading XMP metadata");
            XmpMetadata::Absent
        }
    }
}

/// The flat `tag → value` mapping returned to clients.
///
/// Empty when the document has no packet or cannot be read; a single
/// `error` entry when the packet is malformed.
pub fn get_xmp_metadata<P: AsRef<Path>>(path: P) -> BTreeMap<String, String> {
    extract(path).into_mapping()
}
