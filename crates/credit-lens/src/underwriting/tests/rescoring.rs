use std::sync::Arc;
use std::thread;

use super::common::*;
use crate::underwriting::domain::{TransactionEvent, TransactionKind, TransactionStatus, UserId};
use crate::underwriting::rescoring::{
    DynamicRescorer, RescoreError, RescoringPolicy, DEFAULT_PRIOR_WEIGHT, MAX_WINDOW_DAYS,
};

#[test]
fn failed_bnpl_payment_lowers_the_score() {
    let rescorer = rescorer();
    let baseline = rescorer.enroll(steady_earner("bnpl")).expect("enrolls");
    assert_eq!(baseline.credit_score, 842);

    let outcome = rescorer
        .apply_transaction(
            &UserId::new("bnpl"),
            event(TransactionKind::Bnpl, 5_000.0, TransactionStatus::Failed, 0),
        )
        .expect("applies");

    assert_eq!(outcome.change.old_score, 842);
    assert_eq!(outcome.change.new_score, 826);
    assert_eq!(outcome.change.delta, -16);
    assert_eq!(outcome.change.reason, "Bnpl payment (₹5000) failed -> -16 points");
    assert_eq!(outcome.result.credit_score, 826);

    let profile = rescorer
        .effective_profile(&UserId::new("bnpl"))
        .expect("profile");
    assert_eq!(profile.credit_card_outstanding, 5_000.0);
    assert!((profile.loan_repayment_history_score - 540.0 / 7.0).abs() < 1e-9);
}

#[test]
fn on_time_payments_never_lower_the_score() {
    let rescorer = rescorer();
    rescorer.enroll(steady_earner("punctual")).expect("enrolls");
    let user = UserId::new("punctual");

    for day in 0..6 {
        let outcome = rescorer
            .apply_transaction(
                &user,
                event(TransactionKind::Electricity, 1_200.0, TransactionStatus::PaidOnTime, day),
            )
            .expect("applies");
        assert!(outcome.change.delta >= 0, "{:?}", outcome.change);
    }

    let profile = rescorer.effective_profile(&user).expect("profile");
    assert!(profile.electricity_bill_payment_pct > 95.0);
    assert!(profile.upi_transactions_per_month > 40.0);
}

#[test]
fn late_payment_reason_mentions_days_late() {
    let rescorer = rescorer();
    rescorer.enroll(thin_file("late")).expect("enrolls");

    let outcome = rescorer
        .apply_transaction(
            &UserId::new("late"),
            event(TransactionKind::Paylater, 800.0, TransactionStatus::PaidLate, 0),
        )
        .expect("applies");

    match outcome.change.delta {
        delta if delta < 0 => assert!(outcome.change.reason.contains("7 days late")),
        0 => assert!(outcome.change.reason.contains("no score impact")),
        _ => assert!(outcome.change.reason.contains("added")),
    }
}

#[test]
fn unknown_borrowers_are_enrolled_with_the_default_profile() {
    let rescorer = rescorer();
    let user = UserId::new("walk-in");

    rescorer
        .apply_transaction(
            &user,
            event(TransactionKind::Mobile, 299.0, TransactionStatus::PaidOnTime, 0),
        )
        .expect("applies");

    assert_eq!(rescorer.results(&user).expect("results").len(), 2);
    assert_eq!(rescorer.history(&user, 10).expect("history").len(), 1);
}

#[test]
fn history_is_newest_first_and_limited() {
    let rescorer = rescorer();
    rescorer.enroll(steady_earner("paged")).expect("enrolls");
    let user = UserId::new("paged");

    for day in 0..5 {
        rescorer
            .apply_transaction(
                &user,
                event(TransactionKind::Rent, 4_000.0, TransactionStatus::PaidOnTime, day),
            )
            .expect("applies");
    }

    let history = rescorer.history(&user, 3).expect("history");
    assert_eq!(history.len(), 3);
    assert!(history[0].timestamp > history[1].timestamp);
    assert!(history[1].timestamp > history[2].timestamp);
}

#[test]
fn events_outside_the_window_are_evicted() {
    let rescorer = rescorer();
    rescorer.enroll(steady_earner("window")).expect("enrolls");
    let user = UserId::new("window");

    rescorer
        .apply_transaction(
            &user,
            event(TransactionKind::Bnpl, 2_000.0, TransactionStatus::Failed, 0),
        )
        .expect("applies");
    assert_eq!(rescorer.window_len(&user).expect("window"), 1);

    rescorer
        .apply_transaction(
            &user,
            event(TransactionKind::Internet, 700.0, TransactionStatus::PaidOnTime, 200),
        )
        .expect("applies");

    assert_eq!(rescorer.window_len(&user).expect("window"), 1);
    let profile = rescorer.effective_profile(&user).expect("profile");
    assert_eq!(profile.credit_card_outstanding, 0.0);
    assert_eq!(profile.loan_repayment_history_score, 90.0);
}

#[test]
fn shorter_policy_window_evicts_sooner() {
    let rescorer = DynamicRescorer::new(
        Arc::new(engine()),
        RescoringPolicy::with_window_days(30),
    );
    rescorer.enroll(steady_earner("short")).expect("enrolls");
    let user = UserId::new("short");

    for day in [0, 20, 45] {
        rescorer
            .apply_transaction(
                &user,
                event(TransactionKind::Electricity, 900.0, TransactionStatus::PaidOnTime, day),
            )
            .expect("applies");
    }

    assert_eq!(rescorer.window_len(&user).expect("window"), 2);
}

#[test]
fn oversized_window_is_clamped_and_ledger_stays_usable() {
    let rescorer = DynamicRescorer::new(
        Arc::new(engine()),
        RescoringPolicy::with_window_days(200_000_000),
    );
    assert_eq!(rescorer.policy().window_days, MAX_WINDOW_DAYS);
    let user = UserId::new("w");

    for day in [0, 400] {
        rescorer
            .apply_transaction(
                &user,
                event(TransactionKind::Rent, 4_000.0, TransactionStatus::PaidOnTime, day),
            )
            .expect("applies");
    }

    assert_eq!(rescorer.window_len(&user).expect("window"), 2);
}

#[test]
fn window_beyond_the_calendar_keeps_every_event() {
    let policy = RescoringPolicy {
        window_days: i64::MAX,
        prior_weight: DEFAULT_PRIOR_WEIGHT,
    };
    let rescorer = DynamicRescorer::new(Arc::new(engine()), policy);
    let user = UserId::new("unbounded");

    for day in [0, 5_000] {
        rescorer
            .apply_transaction(
                &user,
                event(TransactionKind::Mobile, 199.0, TransactionStatus::PaidOnTime, day),
            )
            .expect("applies without panicking");
    }

    assert_eq!(rescorer.window_len(&user).expect("window"), 2);
    assert_eq!(rescorer.history(&user, 10).expect("history").len(), 2);
}

#[test]
fn transactions_are_listed_newest_first() {
    let rescorer = rescorer();
    rescorer.enroll(steady_earner("listed")).expect("enrolls");
    let user = UserId::new("listed");

    for (day, kind) in [
        (3, TransactionKind::Rent),
        (1, TransactionKind::Mobile),
        (7, TransactionKind::Salary),
    ] {
        rescorer
            .apply_transaction(&user, event(kind, 1_000.0, TransactionStatus::PaidOnTime, day))
            .expect("applies");
    }

    let listed = rescorer.transactions(&user, 2).expect("transactions");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].kind, TransactionKind::Salary);
    assert_eq!(listed[1].kind, TransactionKind::Rent);
    assert_eq!(rescorer.transactions(&user, 10).expect("transactions").len(), 3);
}

#[test]
fn clearing_transactions_restores_the_baseline_and_keeps_history() {
    let rescorer = rescorer();
    rescorer.enroll(steady_earner("reset")).expect("enrolls");
    let user = UserId::new("reset");

    rescorer
        .apply_transaction(
            &user,
            event(TransactionKind::Bnpl, 5_000.0, TransactionStatus::Failed, 0),
        )
        .expect("applies");

    let fresh = rescorer.clear_transactions(&user).expect("clears");

    assert_eq!(fresh.credit_score, 842);
    assert_eq!(rescorer.window_len(&user).expect("window"), 0);
    assert_eq!(rescorer.history(&user, 10).expect("history").len(), 1);
    assert_eq!(rescorer.results(&user).expect("results").len(), 3);
    assert_eq!(
        rescorer.current(&user).expect("current").map(|result| result.credit_score),
        Some(842)
    );
}

#[test]
fn rejects_non_positive_amounts_and_unknown_lookups() {
    let rescorer = rescorer();
    let user = UserId::new("ghost");

    match rescorer.apply_transaction(
        &user,
        event(TransactionKind::Rent, 0.0, TransactionStatus::PaidOnTime, 0),
    ) {
        Err(RescoreError::InvalidAmount(amount)) => assert_eq!(amount, 0.0),
        other => panic!("expected invalid amount, got {other:?}"),
    }

    match rescorer.history(&user, 5) {
        Err(RescoreError::UnknownBorrower(id)) => assert_eq!(id, user),
        other => panic!("expected unknown borrower, got {other:?}"),
    }
    assert!(matches!(
        rescorer.clear_transactions(&user),
        Err(RescoreError::UnknownBorrower(_))
    ));
}

#[test]
fn enrolling_requires_positive_income() {
    let rescorer = rescorer();
    let mut profile = steady_earner("broke");
    profile.monthly_income = 0.0;

    assert!(matches!(
        rescorer.enroll(profile),
        Err(RescoreError::Profile(_))
    ));
}

#[test]
fn concurrent_events_for_one_borrower_are_serialized() {
    let rescorer = Arc::new(rescorer());
    rescorer.enroll(steady_earner("busy")).expect("enrolls");
    let user = UserId::new("busy");

    thread::scope(|scope| {
        for worker in 0..4 {
            let rescorer = Arc::clone(&rescorer);
            let user = user.clone();
            scope.spawn(move || {
                for step in 0..5 {
                    let status = if (worker + step) % 3 == 0 {
                        TransactionStatus::PaidLate
                    } else {
                        TransactionStatus::PaidOnTime
                    };
                    rescorer
                        .apply_transaction(
                            &user,
                            event(TransactionKind::Electricity, 1_000.0, status, step),
                        )
                        .expect("applies");
                }
            });
        }
    });

    let history = rescorer.history(&user, 100).expect("history");
    assert_eq!(history.len(), 20);
    // Newest first: each change starts where the previous one ended.
    for pair in history.windows(2) {
        assert_eq!(pair[0].old_score, pair[1].new_score);
    }
}

#[test]
fn events_accept_type_field_names() {
    for key in ["kind", "type", "transaction_type"] {
        let mut payload = serde_json::json!({
            "amount": 450.0,
            "status": "paid_late",
            "days_late": 3,
        });
        payload[key] = serde_json::json!("internet");

        let event: TransactionEvent = serde_json::from_value(payload).expect("event parses");
        assert_eq!(event.kind, TransactionKind::Internet, "field {key}");
    }
}
