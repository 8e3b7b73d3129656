use std::sync::Arc;

use tracing::{info, warn};

use super::compliance::{ComplianceResult, LoanRequest};
use super::domain::{BorrowerProfile, ProfileError, ScoreChange, TransactionEvent, UserId};
use super::evaluation::{ScoreResult, ScoringEngine, ScoringRules};
use super::features::FeatureExtractor;
use super::portfolio::PortfolioSummary;
use super::repository::{RepositoryError, ScoreRepository};
use super::rescoring::{DynamicRescorer, RescoreError, RescoringPolicy, TransactionOutcome};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_TRANSACTION_LIMIT: usize = 20;

/// Service composing the scoring engine, the rescorer, and result storage.
pub struct CreditAssessmentService<R> {
    engine: Arc<ScoringEngine>,
    rescorer: Arc<DynamicRescorer>,
    repository: Arc<R>,
    history_limit: usize,
}

impl<R> CreditAssessmentService<R>
where
    R: ScoreRepository + 'static,
{
    pub fn new(repository: Arc<R>, rules: ScoringRules, policy: RescoringPolicy) -> Self {
        let engine = Arc::new(ScoringEngine::new(rules));
        let rescorer = Arc::new(DynamicRescorer::new(Arc::clone(&engine), policy));

        Self {
            engine,
            rescorer,
            repository,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit.max(1);
        self
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Score a profile and store the result as the borrower's latest. The profile
    /// also becomes the rescoring baseline, so later transactions move from the
    /// score published here.
    pub fn score(&self, profile: BorrowerProfile) -> Result<ScoreResult, CreditServiceError> {
        let profile = prepare(profile)?;
        let result = self.rescorer.enroll(profile)?;
        self.repository.record(result.clone())?;
        Ok(result)
    }

    /// Score every profile, skipping the ones that fail validation.
    pub fn score_batch(
        &self,
        profiles: Vec<BorrowerProfile>,
    ) -> Result<Vec<ScoreResult>, CreditServiceError> {
        let mut results = Vec::with_capacity(profiles.len());
        for profile in profiles {
            match self.score(profile) {
                Ok(result) => results.push(result),
                Err(CreditServiceError::Profile(error)) => {
                    warn!(%error, "skipping borrower that failed validation");
                }
                Err(other) => return Err(other),
            }
        }

        info!(scored = results.len(), "scored borrower batch");
        Ok(results)
    }

    pub fn check_compliance(
        &self,
        profile: BorrowerProfile,
        request: &LoanRequest,
    ) -> Result<ComplianceResult, CreditServiceError> {
        let profile = prepare(profile)?;
        Ok(self.engine.check_compliance(&profile, request))
    }

    /// Register a borrower's baseline snapshot for incremental rescoring.
    pub fn enroll(&self, profile: BorrowerProfile) -> Result<ScoreResult, CreditServiceError> {
        let result = self.rescorer.enroll(profile)?;
        self.repository.record(result.clone())?;
        Ok(result)
    }

    pub fn apply_transaction(
        &self,
        user_id: &UserId,
        event: TransactionEvent,
    ) -> Result<TransactionOutcome, CreditServiceError> {
        let outcome = self.rescorer.apply_transaction(user_id, event)?;
        self.repository.record(outcome.result.clone())?;
        Ok(outcome)
    }

    pub fn clear_transactions(&self, user_id: &UserId) -> Result<ScoreResult, CreditServiceError> {
        let result = self.rescorer.clear_transactions(user_id)?;
        self.repository.record(result.clone())?;
        Ok(result)
    }

    /// Score changes for the borrower, newest first. Falls back to the configured
    /// history limit.
    pub fn history(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<ScoreChange>, CreditServiceError> {
        let limit = limit.unwrap_or(self.history_limit);
        Ok(self.rescorer.history(user_id, limit)?)
    }

    /// Transactions still counted in the borrower's window, newest first.
    pub fn transactions(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<TransactionEvent>, CreditServiceError> {
        let limit = limit.unwrap_or(DEFAULT_TRANSACTION_LIMIT);
        Ok(self.rescorer.transactions(user_id, limit)?)
    }

    /// Latest stored result for the borrower.
    pub fn current(&self, user_id: &UserId) -> Result<ScoreResult, CreditServiceError> {
        let record = self
            .repository
            .latest(user_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record.result)
    }

    /// Aggregate the latest result of every stored borrower.
    pub fn portfolio_summary(&self, top_n: usize) -> Result<PortfolioSummary, CreditServiceError> {
        let results = self.repository.latest_results(usize::MAX)?;
        Ok(PortfolioSummary::from_results(&results, top_n))
    }
}

fn prepare(profile: BorrowerProfile) -> Result<BorrowerProfile, ProfileError> {
    let profile = FeatureExtractor::derive(profile);
    profile.validate()?;
    Ok(profile)
}

/// Error raised by the credit assessment service.
#[derive(Debug, thiserror::Error)]
pub enum CreditServiceError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Rescore(#[from] RescoreError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
