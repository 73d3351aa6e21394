//! Out-of-band bulk import for the voter roll.
//!
//! Spreadsheet rows (already exported to a JSON array, one object per row,
//! keyed by column heading) are validated into [`ImportedVoter`] records and
//! handed to a [`VoterSink`] in fixed-size batches. Rows that fail
//! validation are reported, never silently dropped.

pub mod error;
pub mod row;
pub mod sink;

pub use error::{ImportError, RowError};
pub use row::{ImportedVoter, SheetRow};
pub use sink::{NdjsonSink, VoterSink};

use std::path::Path;

/// Records per sink write.
pub const BATCH_SIZE: usize = 1000;

/// A row that was not imported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowRejection {
    /// Zero-based position in the input array.
    pub index: usize,
    pub reason: RowError,
}

/// Summary of one import run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub total_rows: usize,
    pub inserted: usize,
    pub batches: usize,
    pub rejected: Vec<RowRejection>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Parse a JSON array of spreadsheet rows.
pub fn parse_rows(json: &str) -> Result<Vec<SheetRow>, ImportError> {
    Ok(serde_json::from_str(json)?)
}

/// Validate `rows` and write the accepted ones to `sink`, [`BATCH_SIZE`] at a time.
pub fn import_rows<S: VoterSink>(
    rows: Vec<SheetRow>,
    sink: &mut S,
) -> Result<ImportReport, ImportError> {
    let mut report = ImportReport {
        total_rows: rows.len(),
        ..ImportReport::default()
    };
    let mut batch = Vec::with_capacity(BATCH_SIZE.min(rows.len()));

    for (index, row) in rows.into_iter().enumerate() {
        match row.validate() {
            Ok(voter) => batch.push(voter),
            Err(reason) => {
                tracing::warn!(index, "skipping row: {reason}");
                report.rejected.push(RowRejection { index, reason });
            }
        }
        if batch.len() == BATCH_SIZE {
            write_batch(sink, &mut batch, &mut report)?;
        }
    }
    if !batch.is_empty() {
        write_batch(sink, &mut batch, &mut report)?;
    }
    sink.finish()?;

    tracing::info!(
        total = report.total_rows,
        inserted = report.inserted,
        rejected = report.rejected.len(),
        "import finished"
    );
    Ok(report)
}

fn write_batch<S: VoterSink>(
    sink: &mut S,
    batch: &mut Vec<ImportedVoter>,
    report: &mut ImportReport,
) -> Result<(), ImportError> {
    let written = sink.write_batch(batch)?;
    report.inserted += written;
    report.batches += 1;
    tracing::debug!(batch = report.batches, written, "batch written");
    batch.clear();
    Ok(())
}

/// Read a JSON rows file and import it into `sink`.
pub fn import_file<S: VoterSink>(path: &Path, sink: &mut S) -> Result<ImportReport, ImportError> {
    let text = std::fs::read_to_string(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    import_rows(parse_rows(&text)?, sink)
}
