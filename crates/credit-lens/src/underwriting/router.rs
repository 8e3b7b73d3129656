use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::compliance::LoanRequest;
use super::domain::{TransactionEvent, UserId};
use super::features::FeatureExtractor;
use super::portfolio::PortfolioSummary;
use super::repository::{RepositoryError, ScoreRepository};
use super::rescoring::RescoreError;
use super::service::{CreditAssessmentService, CreditServiceError, DEFAULT_TOP_N};

/// Id for compliance profiles, which are never stored.
const ANONYMOUS_BORROWER: &str = "anonymous";

#[derive(Debug, Deserialize)]
pub struct ComplianceCheckRequest {
    pub profile: Map<String, Value>,
    #[serde(flatten)]
    pub loan: LoanRequest,
}

/// `?limit=` paging shared by the history and transaction listings.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PortfolioRequest {
    /// Profiles to score before summarizing; empty means summarize stored results.
    #[serde(default)]
    pub profiles: Vec<Map<String, Value>>,
    pub top_n: Option<usize>,
}

/// Router builder exposing scoring, compliance, rescoring, and portfolio endpoints.
pub fn credit_router<R>(service: Arc<CreditAssessmentService<R>>) -> Router
where
    R: ScoreRepository + 'static,
{
    Router::new()
        .route("/api/v1/credit/score", post(score_handler::<R>))
        .route("/api/v1/credit/compliance", post(compliance_handler::<R>))
        .route("/api/v1/borrowers", post(enroll_handler::<R>))
        .route("/api/v1/borrowers/:user_id/score", get(current_score_handler::<R>))
        .route(
            "/api/v1/borrowers/:user_id/transactions",
            post(transaction_handler::<R>)
                .get(transactions_handler::<R>)
                .delete(clear_handler::<R>),
        )
        .route(
            "/api/v1/borrowers/:user_id/history",
            get(history_handler::<R>),
        )
        .route("/api/v1/portfolio/summary", post(portfolio_handler::<R>))
        .with_state(service)
}

pub(crate) async fn score_handler<R>(
    State(service): State<Arc<CreditAssessmentService<R>>>,
    axum::Json(payload): axum::Json<Map<String, Value>>,
) -> Response
where
    R: ScoreRepository + 'static,
{
    let profile = FeatureExtractor::from_json(&payload, "");
    match service.score(profile) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn compliance_handler<R>(
    State(service): State<Arc<CreditAssessmentService<R>>>,
    axum::Json(request): axum::Json<ComplianceCheckRequest>,
) -> Response
where
    R: ScoreRepository + 'static,
{
    let profile = FeatureExtractor::from_json(&request.profile, ANONYMOUS_BORROWER);
    match service.check_compliance(profile, &request.loan) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn enroll_handler<R>(
    State(service): State<Arc<CreditAssessmentService<R>>>,
    axum::Json(payload): axum::Json<Map<String, Value>>,
) -> Response
where
    R: ScoreRepository + 'static,
{
    let profile = FeatureExtractor::from_json(&payload, "");
    match service.enroll(profile) {
        Ok(result) => (StatusCode::CREATED, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn transaction_handler<R>(
    State(service): State<Arc<CreditAssessmentService<R>>>,
    Path(user_id): Path<String>,
    axum::Json(event): axum::Json<TransactionEvent>,
) -> Response
where
    R: ScoreRepository + 'static,
{
    match service.apply_transaction(&UserId(user_id), event) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn current_score_handler<R>(
    State(service): State<Arc<CreditAssessmentService<R>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: ScoreRepository + 'static,
{
    match service.current(&UserId(user_id)) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn transactions_handler<R>(
    State(service): State<Arc<CreditAssessmentService<R>>>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response
where
    R: ScoreRepository + 'static,
{
    let id = UserId(user_id);
    match service.transactions(&id, query.limit) {
        Ok(transactions) => {
            let payload = json!({
                "user_id": id,
                "transactions": transactions,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn clear_handler<R>(
    State(service): State<Arc<CreditAssessmentService<R>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: ScoreRepository + 'static,
{
    match service.clear_transactions(&UserId(user_id)) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_handler<R>(
    State(service): State<Arc<CreditAssessmentService<R>>>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response
where
    R: ScoreRepository + 'static,
{
    let id = UserId(user_id);
    match service.history(&id, query.limit) {
        Ok(changes) => {
            let payload = json!({
                "user_id": id,
                "changes": changes,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn portfolio_handler<R>(
    State(service): State<Arc<CreditAssessmentService<R>>>,
    axum::Json(request): axum::Json<PortfolioRequest>,
) -> Response
where
    R: ScoreRepository + 'static,
{
    let top_n = request.top_n.unwrap_or(DEFAULT_TOP_N);

    let summary = if request.profiles.is_empty() {
        service.portfolio_summary(top_n)
    } else {
        let profiles = request
            .profiles
            .iter()
            .enumerate()
            .map(|(index, payload)| {
                FeatureExtractor::from_json(payload, &format!("row-{:04}", index + 1))
            })
            .collect();
        service
            .score_batch(profiles)
            .map(|results| PortfolioSummary::from_results(&results, top_n))
    };

    match summary {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: CreditServiceError) -> Response {
    let status = match &error {
        CreditServiceError::Profile(_)
        | CreditServiceError::Rescore(RescoreError::Profile(_))
        | CreditServiceError::Rescore(RescoreError::InvalidAmount(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CreditServiceError::Rescore(RescoreError::UnknownBorrower(_))
        | CreditServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
