use serde::{Deserialize, Serialize};

use super::domain::UserId;
use super::evaluation::ScoreResult;

/// Stored assessment together with its position in the borrower's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub sequence: u64,
    pub result: ScoreResult,
}

impl AssessmentRecord {
    pub fn user_id(&self) -> &UserId {
        &self.result.user_id
    }
}

/// Storage abstraction for published score results.
pub trait ScoreRepository: Send + Sync {
    fn record(&self, result: ScoreResult) -> Result<AssessmentRecord, RepositoryError>;
    fn latest(&self, user_id: &UserId) -> Result<Option<AssessmentRecord>, RepositoryError>;
    /// Most recent result per borrower, limited to `limit` borrowers.
    fn latest_results(&self, limit: usize) -> Result<Vec<ScoreResult>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
