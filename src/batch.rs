//! Batch driver: uploads in, one outcome per PDF out
//!
//! Each upload is a PDF or a ZIP of PDFs. Every PDF is written to its own
//! temporary file, analyzed, and the temporary file removed before the next
//! one is processed. Outcomes are plain values folded into a [`BatchReport`].

use crate::classify::{self, Route};
use crate::layout;
use crate::matcher::MatchConfig;
use crate::report::{self, ExecutionSummary, PhotoStatus, ProjectSummary, ResultBlock, Row};
use crate::workbook::{Workbook, SHEET_ABSENT, SHEET_EXECUTION, SHEET_PRESENT};
use crate::AuditError;
use log::{debug, info};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::ZipArchive;

/// A user-supplied file
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AuditError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self::new(name, std::fs::read(path)?))
    }
}

/// A PDF ready for analysis
#[derive(Debug, Clone)]
pub struct PdfEntry {
    /// Base file name, without any archive directories
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Upper bound on the preallocation for one archive member
const MAX_SIZE_HINT: u64 = 16 * 1024 * 1024;

/// Preallocation for a member whose header declares `declared` bytes
fn size_hint(declared: u64) -> usize {
    declared.min(MAX_SIZE_HINT) as usize
}

fn extension(name: &str) -> String {
    name.rsplit('.').next().unwrap_or_default().to_lowercase()
}

fn base_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// The PDFs an upload contributes
pub fn expand_upload(upload: &Upload) -> Result<Vec<PdfEntry>, AuditError> {
    match extension(&upload.name).as_str() {
        "pdf" => Ok(vec![PdfEntry {
            file_name: upload.name.clone(),
            data: upload.data.clone(),
        }]),
        "zip" => extract_pdfs(&upload.data),
        _ => Err(AuditError::UnsupportedUpload(upload.name.clone())),
    }
}

/// Every `.pdf` member of a ZIP archive, in archive order
pub fn extract_pdfs(archive_bytes: &[u8]) -> Result<Vec<PdfEntry>, AuditError> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))?;
    let mut entries = Vec::new();

    for i in 0..archive.len() {
        let mut member = archive.by_index(i)?;
        if member.is_dir() || !member.name().to_lowercase().ends_with(".pdf") {
            continue;
        }

        let file_name = base_name(member.name()).to_string();
        let mut data = Vec::with_capacity(size_hint(member.size()));
        member.read_to_end(&mut data)?;
        debug!("archive member {} ({} bytes)", file_name, data.len());
        entries.push(PdfEntry { file_name, data });
    }

    Ok(entries)
}

/// Result of analyzing one PDF
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Photos {
        file_name: String,
        summary: ProjectSummary,
    },
    Execution {
        file_name: String,
        summary: ExecutionSummary,
    },
}

impl DocumentOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            DocumentOutcome::Photos { file_name, .. } | DocumentOutcome::Execution { file_name, .. } => file_name,
        }
    }

    pub fn result_block(&self) -> ResultBlock {
        match self {
            DocumentOutcome::Photos { summary, .. } => summary.result_block(),
            DocumentOutcome::Execution { summary, .. } => summary.result_block(),
        }
    }
}

/// Persist one PDF to a scoped temporary file and analyze it
pub fn process_entry(entry: &PdfEntry, config: &MatchConfig) -> Result<DocumentOutcome, AuditError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("poda-")
        .suffix(".pdf")
        .tempfile()?;
    tmp.write_all(&entry.data)?;
    tmp.flush()?;

    // On error the temporary file is removed when `tmp` drops
    let layout = layout::extract_layout(tmp.path())?;
    tmp.close()?;

    let kind = classify::classify_filename(&entry.file_name);
    let outcome = match classify::resolve(&entry.file_name, kind, &layout.full_text()) {
        Route::Execution => DocumentOutcome::Execution {
            file_name: entry.file_name.clone(),
            summary: report::analyze_execution(&layout),
        },
        Route::PhotoAudit => DocumentOutcome::Photos {
            file_name: entry.file_name.clone(),
            summary: report::analyze_photos(&layout, &entry.file_name, config),
        },
    };
    Ok(outcome)
}

/// All outcomes of one batch, in processing order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
}

impl BatchReport {
    /// Fold one more outcome into the report
    pub fn with(mut self, outcome: DocumentOutcome) -> Self {
        self.outcomes.push(outcome);
        self
    }

    fn photo_rows(&self, status: PhotoStatus) -> Vec<Row> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                DocumentOutcome::Photos { summary, .. } if summary.status() == status => Some(summary.row()),
                _ => None,
            })
            .collect()
    }

    pub fn present_rows(&self) -> Vec<Row> {
        self.photo_rows(PhotoStatus::Complete)
    }

    pub fn absent_rows(&self) -> Vec<Row> {
        self.photo_rows(PhotoStatus::Incomplete)
    }

    pub fn execution_rows(&self) -> Vec<Row> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                DocumentOutcome::Execution { summary, .. } => Some(summary.row()),
                _ => None,
            })
            .collect()
    }

    /// Workbook with one sheet per non-empty row collection
    pub fn workbook(&self) -> Workbook {
        let mut workbook = Workbook::new();
        workbook.add_rows(SHEET_PRESENT, &self.present_rows());
        workbook.add_rows(SHEET_ABSENT, &self.absent_rows());
        workbook.add_rows(SHEET_EXECUTION, &self.execution_rows());
        workbook
    }
}

/// Process every upload; the first failure aborts the batch
pub fn run_batch(uploads: &[Upload], config: &MatchConfig) -> Result<BatchReport, AuditError> {
    let mut report = BatchReport::default();
    for upload in uploads {
        let entries = expand_upload(upload)?;
        info!("{}: {} PDF(s)", upload.name, entries.len());
        report = entries
            .iter()
            .try_fold(report, |acc, entry| Ok::<_, AuditError>(acc.with(process_entry(entry, config)?)))?;
    }
    Ok(report)
}
