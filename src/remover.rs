//! XMP removal.
//!
//! The packet is removed by omission: a new document is assembled from the
//! source page tree and `/Info` dictionary under a fresh catalog, and only
//! objects reachable from that catalog are written. Nothing of the old
//! catalog, including its `/Metadata` stream, survives re-serialisation.

use crate::{Result, StripError};
use lopdf::{dictionary, Document, Object};
use std::path::Path;
use tempfile::NamedTempFile;

/// Summary of one successful removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalReport {
    pub page_count: usize,
    /// `true` when the source catalog carried a `/Metadata` entry.
    pub xmp_dropped: bool,
    pub info_copied: bool,
    pub bytes_written: u64,
}

/// Build the XMP-free copy of `source`.
///
/// Returns the new document and whether a packet was dropped.
pub fn rebuild_without_xmp(source: &Document) -> Result<(Document, bool)> {
    let catalog = source
        .catalog()
        .map_err(|e| StripError::InvalidPdf(format!("cannot read catalog: {e}")))?;

    let pages_ref = catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| StripError::InvalidPdf("catalog has no /Pages reference".into()))?;

    let xmp_dropped = catalog.has(b"Metadata");

    let mut document = Document::with_version(source.version.clone());
    document.objects = source.objects.clone();
    document.max_id = source.max_id;

    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_ref,
    });
    document.trailer.set("Root", catalog_id);

    if let Ok(info) = source.trailer.get(b"Info") {
        document.trailer.set("Info", info.clone());
    }

    // The old catalog, and with it the /Metadata stream, is now unreachable.
    document.prune_objects();
    document.renumber_objects();

    Ok((document, xmp_dropped))
}

/// Write a copy of `input` to `output` with the XMP packet left out.
///
/// The page tree and the document-info dictionary are copied unchanged.
/// The output is written to a temporary file next to `output` and renamed
/// into place, so an existing `output` is only replaced on success.
#[tracing::instrument(skip_all, fields(input = %input.as_ref().display(), output = %output.as_ref().display()))]
pub fn strip_xmp<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<RemovalReport> {
    let source = Document::load(input.as_ref())?;
    let (mut document, xmp_dropped) = rebuild_without_xmp(&source)?;

    let page_count = document.get_pages().len();
    let info_copied = document.trailer.has(b"Info");

    let output = output.as_ref();
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    document.save_to(&mut tmp)?;
    tmp.as_file().sync_all()?;
    let bytes_written = tmp.as_file().metadata()?.len();
    tmp.persist(output).map_err(|e| StripError::Io(e.error))?;

    tracing::debug!(page_count, xmp_dropped, info_copied, bytes_written, "Wrote XMP-free copy");

    Ok(RemovalReport {
        page_count,
        xmp_dropped,
        info_copied,
        bytes_written,
    })
}

/// Success/failure wrapper around [`strip_xmp`] for callers that only need
/// to know whether `output` can be served. Errors are logged, never raised.
pub fn remove_xmp_metadata<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> bool {
    match strip_xmp(input, output) {
        Ok(_) => true,
        Err(e) => {
            tracing::error!(error = %e, "Error processing file");
            false
        }
    }
}
