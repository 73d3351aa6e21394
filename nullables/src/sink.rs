//! Nullable import sink: keeps batches in memory and fails on demand.

use std::collections::VecDeque;

use pollcheck_import::{ImportError, ImportedVoter, VoterSink};

/// A `VoterSink` that records every batch it is handed.
#[derive(Default)]
pub struct NullSink {
    pub batches: Vec<Vec<ImportedVoter>>,
    failures: VecDeque<ImportError>,
    finished: bool,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `write_batch` fail with `error`. Queued failures are
    /// consumed in order.
    pub fn fail_next(&mut self, error: ImportError) {
        self.failures.push_back(error);
    }

    pub fn voters(&self) -> impl Iterator<Item = &ImportedVoter> {
        self.batches.iter().flatten()
    }

    /// Whether `finish` was called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl VoterSink for NullSink {
    fn write_batch(&mut self, batch: &[ImportedVoter]) -> Result<usize, ImportError> {
        if let Some(error) = self.failures.pop_front() {
            return Err(error);
        }
        self.batches.push(batch.to_vec());
        Ok(batch.len())
    }

    fn finish(&mut self) -> Result<(), ImportError> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollcheck_types::Gender;

    fn voter(id: &str) -> ImportedVoter {
        ImportedVoter {
            voter_id: id.to_string(),
            name_marathi: None,
            name_english: None,
            relation_marathi: None,
            relation_english: None,
            house_no: None,
            age: None,
            gender: Gender::Unreadable,
            confidence: None,
            has_voted: false,
            voted_at: None,
        }
    }

    #[test]
    fn queued_failure_skips_one_batch() {
        let mut sink = NullSink::new();
        sink.fail_next(ImportError::Sink("disk full".into()));
        assert!(sink.write_batch(&[voter("A")]).is_err());
        assert_eq!(sink.write_batch(&[voter("B")]).unwrap(), 1);
        let ids: Vec<&str> = sink.voters().map(|v| v.voter_id.as_str()).collect();
        assert_eq!(ids, vec!["B"]);
    }
}
