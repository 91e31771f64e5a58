//! Accumulation of results across analyses.
//!
//! An [`AnalysisSession`] is the one place results from separate runs meet.
//! It is created by whoever drives the analyses, shared by reference, and
//! cleared on demand.

use parking_lot::Mutex;

use crate::aggregate::aggregate;
use crate::issue::AnalysisResult;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No analysis results recorded; run a static or dynamic analysis first")]
    NoResults,
}

#[derive(Debug, Default)]
pub struct AnalysisSession {
    results: Mutex<Vec<AnalysisResult>>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: AnalysisResult) {
        self.results.lock().push(result);
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.lock().is_empty()
    }

    /// Snapshot of every recorded result, in recording order.
    pub fn results(&self) -> Vec<AnalysisResult> {
        self.results.lock().clone()
    }

    pub fn clear(&self) {
        self.results.lock().clear();
    }

    /// Aggregate of everything recorded so far. Empty when nothing was.
    pub fn aggregate(&self) -> AnalysisResult {
        aggregate(&self.results.lock())
    }

    /// Like [`aggregate`](Self::aggregate), but an empty session is an error.
    pub fn report(&self) -> Result<AnalysisResult, SessionError> {
        let results = self.results.lock();
        if results.is_empty() {
            return Err(SessionError::NoResults);
        }
        Ok(aggregate(&results))
    }
}
