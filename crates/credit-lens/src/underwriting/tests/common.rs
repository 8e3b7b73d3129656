use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};

use crate::underwriting::domain::{
    BorrowerProfile, IncomeType, TransactionEvent, TransactionKind, TransactionStatus, UserId,
};
use crate::underwriting::evaluation::{ScoreResult, ScoringEngine, ScoringRules};
use crate::underwriting::features::FeatureExtractor;
use crate::underwriting::repository::{AssessmentRecord, RepositoryError, ScoreRepository};
use crate::underwriting::rescoring::{DynamicRescorer, RescoringPolicy};
use crate::underwriting::{credit_router, CreditAssessmentService};

/// Salaried borrower with clean bills and an active digital footprint.
pub(super) fn steady_earner(id: &str) -> BorrowerProfile {
    let mut profile = FeatureExtractor::default_profile(UserId::new(id));
    profile.monthly_income = 15_000.0;
    profile.income_type = IncomeType::Salary;
    profile.income_stability_months = 24.0;
    profile.years_of_employment = 3.0;
    profile.savings_rate = 20.0;
    profile.emergency_savings = 50_000.0;
    profile.monthly_expenses = 9_000.0;
    profile.electricity_bill_payment_pct = 95.0;
    profile.mobile_bill_payment_pct = 95.0;
    profile.internet_bill_payment_pct = 95.0;
    profile.rent_payment_pct = 95.0;
    profile.previous_loan_defaults = 0;
    profile.existing_loan_emi = 0.0;
    profile.credit_card_outstanding = 0.0;
    profile.upi_transactions_per_month = 40.0;
    profile.digital_wallet_usage = 6.0;
    profile.online_bill_payments = 80.0;
    FeatureExtractor::derive(profile)
}

/// Daily-wage borrower with a thin file, one past default and patchy bills.
pub(super) fn thin_file(id: &str) -> BorrowerProfile {
    let mut profile = FeatureExtractor::default_profile(UserId::new(id));
    profile.monthly_income = 8_000.0;
    profile.income_type = IncomeType::DailyWage;
    profile.income_stability_months = 3.0;
    profile.years_of_employment = 0.0;
    profile.savings_rate = 5.0;
    profile.emergency_savings = 2_000.0;
    profile.monthly_expenses = 7_500.0;
    profile.electricity_bill_payment_pct = 60.0;
    profile.mobile_bill_payment_pct = 60.0;
    profile.internet_bill_payment_pct = 60.0;
    profile.rent_payment_pct = 60.0;
    profile.previous_loan_defaults = 1;
    profile.existing_loan_emi = 2_500.0;
    profile.credit_card_outstanding = 0.0;
    profile.upi_transactions_per_month = 5.0;
    profile.digital_wallet_usage = 1.0;
    profile.online_bill_payments = 10.0;
    FeatureExtractor::derive(profile)
}

pub(super) fn steady_earner_json(id: &str) -> Value {
    json!({
        "user_id": id,
        "monthly_income": 15000,
        "income_type": "salary",
        "income_stability_months": 24,
        "years_of_employment": 3,
        "savings_rate": 20,
        "emergency_savings": 50000,
        "monthly_expenses": 9000,
        "electricity_bill_payment": 95,
        "dth_bill_payment": 95,
        "internet_bill_payment": 95,
        "rent_payment": 95,
        "previous_loan_defaults": 0,
        "existing_loan_emi": 0,
        "credit_card_outstanding": 0,
        "upi_transactions_per_month": 40,
        "mobile_recharge_frequency": 6,
        "online_bill_payments": 80,
    })
}

pub(super) fn engine() -> ScoringEngine {
    ScoringEngine::new(ScoringRules::default())
}

pub(super) fn rescorer() -> DynamicRescorer {
    DynamicRescorer::new(Arc::new(engine()), RescoringPolicy::default())
}

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn event(
    kind: TransactionKind,
    amount: f64,
    status: TransactionStatus,
    day: i64,
) -> TransactionEvent {
    TransactionEvent {
        kind,
        amount,
        status,
        provider: "Test Provider".to_string(),
        description: format!("{} payment", kind.label()),
        days_late: if status == TransactionStatus::PaidLate { 7 } else { 0 },
        timestamp: base_time() + Duration::days(day),
    }
}

pub(super) fn build_service() -> (
    CreditAssessmentService<MemoryRepository>,
    Arc<MemoryRepository>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let service = CreditAssessmentService::new(
        repository.clone(),
        ScoringRules::default(),
        RescoringPolicy::default(),
    );
    (service, repository)
}

pub(super) fn router_with_service(
    service: CreditAssessmentService<MemoryRepository>,
) -> axum::Router {
    credit_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<Vec<AssessmentRecord>>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl ScoreRepository for MemoryRepository {
    fn record(&self, result: ScoreResult) -> Result<AssessmentRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = AssessmentRecord {
            sequence: guard.len() as u64 + 1,
            result,
        };
        guard.push(record.clone());
        Ok(record)
    }

    fn latest(&self, user_id: &UserId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .rev()
            .find(|record| record.user_id() == user_id)
            .cloned())
    }

    fn latest_results(&self, limit: usize) -> Result<Vec<ScoreResult>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut latest = BTreeMap::new();
        for record in guard.iter() {
            latest.insert(record.user_id().clone(), record.result.clone());
        }
        Ok(latest.into_values().take(limit).collect())
    }
}

pub(super) struct UnavailableRepository;

impl ScoreRepository for UnavailableRepository {
    fn record(&self, _result: ScoreResult) -> Result<AssessmentRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest(&self, _user_id: &UserId) -> Result<Option<AssessmentRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn latest_results(&self, _limit: usize) -> Result<Vec<ScoreResult>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
