//! # stripxmppdf
//!
//! Removes the XMP metadata packet from PDF documents while keeping the
//! document-info dictionary, and serves that as a small upload service.
//!
//! ## What this crate does
//!
//! 1. **Extract XMP**: reads the catalog `/Metadata` stream and flattens the
//!    XML packet into `local tag name → text` pairs.
//! 2. **Strip XMP**: rebuilds the document from its page tree and `/Info`
//!    dictionary, so the packet is never written to the output.
//! 3. **Sweep**: deletes uploads older than the retention window.
//! 4. **Serve**: `POST /upload`, `POST /process`, `GET /download/{name}`.
//!
//! ## Quick example
//!
//! ```no_run
//! use stripxmppdf::{extractor, remover};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! for (tag, value) in extractor::get_xmp_metadata("report.pdf") {
//!     println!("{tag} = {value}");
//! }
//!
//! let report = remover::strip_xmp("report.pdf", "report.clean.pdf")?;
//! println!("{} page(s) written, XMP dropped: {}", report.page_count, report.xmp_dropped);
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

mod analyzer;
mod pdf_utils;

pub mod config;
pub mod extractor;
pub mod remover;
pub mod server;
pub mod storage;
pub mod sweeper;
pub mod telemetry;
pub mod xmp;

pub use analyzer::{DocumentInfo, PdfAnalyzer};
pub use config::Config;
pub use remover::RemovalReport;
pub use storage::UploadDir;
pub use sweeper::{SweepReport, Sweeper};
pub use xmp::XmpMetadata;

// ── Error type ───────────────────────────────────────────────────────────────

/// Every error the PDF side of this crate can produce.
#[derive(Error, Debug)]
pub enum StripError {
    /// A filesystem I/O error occurred while loading or saving a document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The underlying lopdf parser or writer returned an error.
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),

    /// The document parsed but is missing something this crate needs
    /// (e.g. a catalog without `/Pages`).
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// The XMP packet is present but is not well-formed XML.
    #[error("Malformed XMP packet: {0}")]
    Xml(String),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, StripError>;
