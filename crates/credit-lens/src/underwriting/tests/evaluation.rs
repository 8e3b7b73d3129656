use super::common::*;
use crate::underwriting::evaluation::{
    credit_score_from_weighted, decide, ComponentScores, ComponentWeights, Decision,
    DecisionRules, PercentileRules, RiskBand, ScoreComponentKind, ScoringEngine, ScoringRules,
    MAX_CREDIT_SCORE, MIN_CREDIT_SCORE,
};
use crate::underwriting::features::FeatureExtractor;

#[test]
fn steady_earner_is_approved_as_excellent() {
    let profile = steady_earner("steady");

    let result = engine().score(&profile);

    assert_eq!(result.credit_score, 842);
    assert_eq!(result.risk_band, RiskBand::Excellent);
    assert_eq!(result.default_probability, 5);
    assert_eq!(result.decision, Decision::Approve);
    assert!(result.rbi_compliant);
    assert_eq!(result.compliance_adjustment, 5);
    assert_eq!(result.percentile_rank, 95);
    assert!(result.peer_comparison.contains("₹15,000-25,000"));
    assert!(result.improvement_suggestions.is_empty());
}

#[test]
fn component_breakdown_matches_the_weighted_formula() {
    let result = engine().score(&steady_earner("components"));

    let expect = |kind: ScoreComponentKind, score: f64, weight: f64| {
        let component = result.component(kind).expect("component present");
        assert!(
            (component.score - score).abs() < 1e-9,
            "{} expected {score}, got {}",
            kind.label(),
            component.score
        );
        assert_eq!(component.weight, weight);
    };

    expect(ScoreComponentKind::PaymentHistory, 93.0, 40.0);
    expect(ScoreComponentKind::CreditUtilization, 82.0, 25.0);
    expect(ScoreComponentKind::IncomeStability, 100.0, 20.0);
    expect(ScoreComponentKind::DigitalBehavior, 84.0, 15.0);
}

#[test]
fn thin_file_with_default_is_rejected() {
    let result = engine().score(&thin_file("thin"));

    assert_eq!(result.credit_score, 525);
    assert_eq!(result.risk_band, RiskBand::Poor);
    assert_eq!(result.default_probability, 54);
    assert_eq!(result.decision, Decision::Reject);
    assert!(!result.eligible);
    assert_eq!(result.optimal_tenure_months, None);
    assert_eq!(result.recommended_emi, 0.0);
}

#[test]
fn every_score_maps_to_exactly_one_band() {
    for score in MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE {
        let band = RiskBand::from_score(score);
        let expected = match score {
            750..=900 => RiskBand::Excellent,
            650..=749 => RiskBand::Good,
            550..=649 => RiskBand::Fair,
            450..=549 => RiskBand::Poor,
            _ => RiskBand::VeryPoor,
        };
        assert_eq!(band, expected, "score {score}");
    }

    assert_eq!(RiskBand::from_score(749), RiskBand::Good);
    assert_eq!(RiskBand::from_score(750), RiskBand::Excellent);
    assert_eq!(RiskBand::from_score(449), RiskBand::VeryPoor);
}

#[test]
fn named_signals_alone_still_approve_without_emergency_savings() {
    let payload = serde_json::json!({
        "user_id": "minimal",
        "monthly_income": 15000,
        "electricity_bill_payment": 95,
        "dth_bill_payment": 95,
        "internet_bill_payment": 95,
        "rent_payment": 95,
        "upi_transactions_per_month": 40,
        "mobile_recharge_frequency": 6,
        "previous_loan_defaults": 0,
    });
    let object = payload.as_object().cloned().expect("object payload");
    let profile = FeatureExtractor::from_json(&object, "fallback");
    assert_eq!(profile.emergency_savings, 0.0);
    assert_eq!(profile.monthly_expenses, 9_000.0);

    let result = engine().score(&profile);

    assert_eq!(result.credit_score, 834);
    assert_eq!(result.default_probability, 14);
    assert_eq!(result.risk_band, RiskBand::Excellent);
    assert_eq!(result.decision, Decision::Approve);
    assert!(result.rbi_compliant);
}

#[test]
fn decision_depends_only_on_score_and_probability() {
    let rules = DecisionRules::default();
    assert_eq!(decide(&rules, 650, 20), Decision::Approve);
    assert_eq!(decide(&rules, 650, 21), Decision::Review);
    assert_eq!(decide(&rules, 649, 5), Decision::Review);
    assert_eq!(decide(&rules, 550, 35), Decision::Review);
    assert_eq!(decide(&rules, 550, 36), Decision::Reject);
    assert_eq!(decide(&rules, 549, 1), Decision::Reject);

    for result in [
        engine().score(&steady_earner("a")),
        engine().score(&thin_file("b")),
    ] {
        assert_eq!(
            result.decision,
            decide(&rules, result.credit_score, result.default_probability)
        );
    }
}

#[test]
fn decision_and_percentile_tables_come_from_injected_rules() {
    let percentiles = PercentileRules::default();
    assert_eq!(percentiles.rank(900), 95);
    assert_eq!(percentiles.rank(799), 85);
    assert_eq!(percentiles.rank(550), 25);
    assert_eq!(percentiles.rank(549), 10);

    let mut rules = ScoringRules::default();
    rules.decisions.approve_min_score = 850;
    rules.percentiles.floor = 1;
    rules.percentiles.steps.retain(|step| step.min_score >= 900);
    let strict = ScoringEngine::new(rules);

    let result = strict.score(&steady_earner("strict"));

    assert_eq!(result.credit_score, 842);
    assert_eq!(result.decision, Decision::Review);
    assert_eq!(result.percentile_rank, 1);
}

#[test]
fn weights_sum_to_one_hundred_and_composite_is_monotone() {
    let weights = ComponentWeights::default();
    assert_eq!(weights.total(), 100.0);

    let base = ComponentScores {
        payment_history: 50.0,
        credit_utilization: 50.0,
        income_stability: 50.0,
        digital_behavior: 50.0,
    };
    let baseline = base.weighted(&weights);

    let bumped = [
        ComponentScores {
            payment_history: 60.0,
            ..base
        },
        ComponentScores {
            credit_utilization: 60.0,
            ..base
        },
        ComponentScores {
            income_stability: 60.0,
            ..base
        },
        ComponentScores {
            digital_behavior: 60.0,
            ..base
        },
    ];
    for scores in bumped {
        assert!(scores.weighted(&weights) > baseline);
    }
}

#[test]
fn score_and_probability_stay_in_range_for_extremes() {
    let mut worst = thin_file("worst");
    worst.previous_loan_defaults = 5;
    worst.electricity_bill_payment_pct = 0.0;
    worst.mobile_bill_payment_pct = 0.0;
    worst.internet_bill_payment_pct = 0.0;
    worst.rent_payment_pct = 0.0;
    worst.existing_loan_emi = 20_000.0;
    worst.upi_transactions_per_month = 0.0;
    worst.digital_wallet_usage = 0.0;
    worst.online_bill_payments = 0.0;
    let worst = FeatureExtractor::derive(worst);

    let mut best = steady_earner("best");
    best.electricity_bill_payment_pct = 100.0;
    best.mobile_bill_payment_pct = 100.0;
    best.internet_bill_payment_pct = 100.0;
    best.rent_payment_pct = 100.0;
    best.monthly_expenses = 0.0;
    best.years_of_employment = 10.0;
    let best = FeatureExtractor::derive(best);

    for profile in [worst, best] {
        let result = engine().score(&profile);
        assert!((300..=900).contains(&result.credit_score));
        assert!((1..=95).contains(&result.default_probability));
    }

    assert_eq!(credit_score_from_weighted(-10.0), 300);
    assert_eq!(credit_score_from_weighted(250.0), 900);
    assert_eq!(credit_score_from_weighted(f64::NAN), 300);
}

#[test]
fn rescoring_an_unchanged_profile_is_byte_identical() {
    let engine = engine();
    let profile = thin_file("repeat");

    let first = serde_json::to_vec(&engine.score(&profile)).expect("serialize");
    let second = serde_json::to_vec(&engine.score(&profile)).expect("serialize");

    assert_eq!(first, second);
}
