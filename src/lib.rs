//! Photo-evidence audit for tree-pruning (poda) inspection reports
//!
//! This crate provides:
//! - Layout extraction (text spans and image placements) from PDF pages
//! - Field extraction from the report text
//! - Proximity matching of photo captions against placed images
//! - Batch processing of PDFs and ZIP archives with XLSX export

pub mod batch;
pub mod classify;
pub mod fields;
pub mod layout;
pub mod matcher;
pub mod report;
pub mod tounicode;
pub mod workbook;

pub use batch::{run_batch, BatchReport, DocumentOutcome, Upload};
pub use classify::{classify_filename, ReportKind};
pub use layout::{extract_layout, extract_layout_mem, DocumentLayout, LayoutPrimitive, PageLayout};
pub use matcher::{ItemCode, MatchConfig, MissingPhotos, PhotoCategory};
pub use report::{ExecutionSummary, PhotoStatus, ProjectSummary, ResultBlock};
pub use workbook::Workbook;

use std::path::Path;

/// Audit the photos of a single project report on disk
pub fn audit_pdf<P: AsRef<Path>>(path: P, config: &MatchConfig) -> Result<ProjectSummary, AuditError> {
    let path = path.as_ref();
    let layout = extract_layout(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(report::analyze_photos(&layout, &file_name, config))
}

/// Audit the photos of a project report held in memory
pub fn audit_pdf_mem(buffer: &[u8], file_name: &str, config: &MatchConfig) -> Result<ProjectSummary, AuditError> {
    let layout = extract_layout_mem(buffer)?;
    Ok(report::analyze_photos(&layout, file_name, config))
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("unsupported upload {0}: expected a .pdf or .zip file")]
    UnsupportedUpload(String),
    #[error("no rows to export")]
    EmptyWorkbook,
}

impl From<lopdf::Error> for AuditError {
    fn from(e: lopdf::Error) -> Self {
        AuditError::Parse(e.to_string())
    }
}
