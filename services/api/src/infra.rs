use credit_lens::underwriting::{
    AssessmentRecord, RepositoryError, ScoreRepository, ScoreResult, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Keeps every published result, keyed by borrower, oldest first.
#[derive(Default, Clone)]
pub(crate) struct InMemoryScoreRepository {
    records: Arc<Mutex<BTreeMap<UserId, Vec<AssessmentRecord>>>>,
    sequence: Arc<Mutex<u64>>,
}

fn poisoned() -> RepositoryError {
    RepositoryError::Unavailable("in-memory store mutex poisoned".to_string())
}

impl ScoreRepository for InMemoryScoreRepository {
    fn record(&self, result: ScoreResult) -> Result<AssessmentRecord, RepositoryError> {
        let sequence = {
            let mut guard = self.sequence.lock().map_err(|_| poisoned())?;
            *guard += 1;
            *guard
        };

        let record = AssessmentRecord { sequence, result };
        let mut guard = self.records.lock().map_err(|_| poisoned())?;
        guard
            .entry(record.result.user_id.clone())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    fn latest(&self, user_id: &UserId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        let guard = self.records.lock().map_err(|_| poisoned())?;
        Ok(guard
            .get(user_id)
            .and_then(|records| records.last())
            .cloned())
    }

    fn latest_results(&self, limit: usize) -> Result<Vec<ScoreResult>, RepositoryError> {
        let guard = self.records.lock().map_err(|_| poisoned())?;
        Ok(guard
            .values()
            .filter_map(|records| records.last())
            .take(limit)
            .map(|record| record.result.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credit_lens::underwriting::{FeatureExtractor, ScoringEngine};

    fn result_for(id: &str) -> ScoreResult {
        let profile = FeatureExtractor::default_profile(UserId::new(id));
        ScoringEngine::default().score(&profile)
    }

    #[test]
    fn latest_results_return_one_entry_per_borrower() {
        let repository = InMemoryScoreRepository::default();
        repository.record(result_for("b")).expect("records");
        repository.record(result_for("a")).expect("records");
        let last = repository.record(result_for("a")).expect("records");

        assert_eq!(last.sequence, 3);
        let latest = repository.latest_results(10).expect("reads");
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].user_id, UserId::new("a"));
        assert_eq!(
            repository
                .latest(&UserId::new("a"))
                .expect("reads")
                .map(|record| record.sequence),
            Some(3)
        );
    }
}
