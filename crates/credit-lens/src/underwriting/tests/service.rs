use std::sync::Arc;

use super::common::*;
use crate::underwriting::compliance::LoanRequest;
use crate::underwriting::domain::{TransactionKind, TransactionStatus, UserId};
use crate::underwriting::evaluation::{Decision, ScoringRules};
use crate::underwriting::repository::RepositoryError;
use crate::underwriting::rescoring::{RescoreError, RescoringPolicy};
use crate::underwriting::{CreditAssessmentService, CreditServiceError};

#[test]
fn score_stores_the_latest_result() {
    let (service, repository) = build_service();

    let result = service.score(steady_earner("stored")).expect("scores");

    assert_eq!(result.decision, Decision::Approve);
    assert_eq!(repository.len(), 1);
    let current = service.current(&UserId::new("stored")).expect("current");
    assert_eq!(current.credit_score, result.credit_score);
}

#[test]
fn score_rejects_non_positive_income() {
    let (service, repository) = build_service();
    let mut profile = steady_earner("zero");
    profile.monthly_income = 0.0;

    match service.score(profile) {
        Err(CreditServiceError::Profile(_)) => {}
        other => panic!("expected profile error, got {other:?}"),
    }
    assert_eq!(repository.len(), 0);
}

#[test]
fn batch_skips_invalid_profiles() {
    let (service, _) = build_service();
    let mut broken = thin_file("broken");
    broken.monthly_income = -1.0;

    let results = service
        .score_batch(vec![steady_earner("a"), broken, thin_file("b")])
        .expect("batch scores");

    assert_eq!(results.len(), 2);
}

#[test]
fn rescoring_flow_records_every_published_result() {
    let (service, repository) = build_service();
    let user = UserId::new("flow");

    service.enroll(steady_earner("flow")).expect("enrolls");
    let outcome = service
        .apply_transaction(
            &user,
            event(TransactionKind::Bnpl, 5_000.0, TransactionStatus::Failed, 0),
        )
        .expect("applies");
    let cleared = service.clear_transactions(&user).expect("clears");

    assert!(outcome.change.delta < 0);
    assert_eq!(cleared.credit_score, 842);
    assert_eq!(repository.len(), 3);
    assert_eq!(service.history(&user, None).expect("history").len(), 1);
    assert_eq!(
        service.current(&user).expect("current").credit_score,
        cleared.credit_score
    );
}

#[test]
fn transactions_after_scoring_move_from_the_published_score() {
    let (service, _) = build_service();
    let user = UserId::new("p1");

    let scored = service.score(steady_earner("p1")).expect("scores");
    let outcome = service
        .apply_transaction(
            &user,
            event(TransactionKind::Electricity, 900.0, TransactionStatus::PaidOnTime, 0),
        )
        .expect("applies");

    assert_eq!(scored.credit_score, 842);
    assert_eq!(outcome.change.old_score, scored.credit_score);
    assert!(outcome.change.new_score >= scored.credit_score);
    assert_eq!(
        service.current(&user).expect("current").credit_score,
        outcome.result.credit_score
    );
    assert_eq!(service.transactions(&user, None).expect("transactions").len(), 1);
}

#[test]
fn history_limit_defaults_to_configured_value() {
    let repository = Arc::new(MemoryRepository::default());
    let service = CreditAssessmentService::new(
        repository,
        ScoringRules::default(),
        RescoringPolicy::default(),
    )
    .with_history_limit(2);
    let user = UserId::new("limited");

    for day in 0..4 {
        service
            .apply_transaction(
                &user,
                event(TransactionKind::Mobile, 199.0, TransactionStatus::PaidOnTime, day),
            )
            .expect("applies");
    }

    assert_eq!(service.history(&user, None).expect("history").len(), 2);
    assert_eq!(service.history(&user, Some(10)).expect("history").len(), 4);
}

#[test]
fn check_compliance_validates_the_profile_first() {
    let (service, _) = build_service();

    let result = service
        .check_compliance(steady_earner("ok"), &LoanRequest::new(130_000.0, 18.0, 24))
        .expect("checks");
    assert!(!result.is_compliant);

    let mut broke = steady_earner("broke");
    broke.monthly_income = 0.0;
    assert!(matches!(
        service.check_compliance(broke, &LoanRequest::new(10_000.0, 18.0, 12)),
        Err(CreditServiceError::Profile(_))
    ));
}

#[test]
fn portfolio_uses_latest_result_per_borrower() {
    let (service, _) = build_service();
    let user = UserId::new("repeat");

    service.enroll(steady_earner("repeat")).expect("enrolls");
    service
        .apply_transaction(
            &user,
            event(TransactionKind::Bnpl, 5_000.0, TransactionStatus::Failed, 0),
        )
        .expect("applies");
    service.score(thin_file("other")).expect("scores");

    let summary = service.portfolio_summary(3).expect("summary");

    assert_eq!(summary.total_borrowers, 2);
    assert_eq!(summary.average_score, 675.5);
}

#[test]
fn unknown_borrower_and_repository_failures_surface() {
    let (service, _) = build_service();
    match service.history(&UserId::new("nobody"), None) {
        Err(CreditServiceError::Rescore(RescoreError::UnknownBorrower(_))) => {}
        other => panic!("expected unknown borrower, got {other:?}"),
    }
    match service.current(&UserId::new("nobody")) {
        Err(CreditServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }

    let offline = CreditAssessmentService::new(
        Arc::new(UnavailableRepository),
        ScoringRules::default(),
        RescoringPolicy::default(),
    );
    match offline.score(steady_earner("offline")) {
        Err(CreditServiceError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected unavailable repository, got {other:?}"),
    }
}
