//! Destinations for validated records.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ImportError;
use crate::row::ImportedVoter;

/// Where imported voters are written. The rest of the importer depends
/// only on this trait.
pub trait VoterSink {
    /// Insert one batch. Returns how many records were written.
    fn write_batch(&mut self, batch: &[ImportedVoter]) -> Result<usize, ImportError>;

    /// Called once after the last batch.
    fn finish(&mut self) -> Result<(), ImportError> {
        Ok(())
    }
}

/// Writes one JSON object per line.
pub struct NdjsonSink<W: Write> {
    out: W,
}

impl NdjsonSink<BufWriter<File>> {
    /// Create (or truncate) `path`.
    pub fn create(path: &Path) -> Result<Self, ImportError> {
        let file = File::create(path).map_err(|e| ImportError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> NdjsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> VoterSink for NdjsonSink<W> {
    fn write_batch(&mut self, batch: &[ImportedVoter]) -> Result<usize, ImportError> {
        for voter in batch {
            serde_json::to_writer(&mut self.out, voter)
                .map_err(|e| ImportError::Sink(e.to_string()))?;
            self.out
                .write_all(b"\n")
                .map_err(|e| ImportError::Sink(e.to_string()))?;
        }
        Ok(batch.len())
    }

    fn finish(&mut self) -> Result<(), ImportError> {
        self.out.flush().map_err(|e| ImportError::Sink(e.to_string()))
    }
}
