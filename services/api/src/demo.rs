use crate::infra::InMemoryScoreRepository;
use chrono::{Duration, Utc};
use clap::Args;
use credit_lens::config::ScoringConfig;
use credit_lens::error::AppError;
use credit_lens::underwriting::{
    BorrowerCsvImporter, BorrowerProfile, CreditAssessmentService, FeatureExtractor, IncomeType,
    LoanRequest, PortfolioSummary, ScoreResult, ScoringRules, TransactionEvent, TransactionKind,
    TransactionStatus, UserId,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Borrower CSV export to score
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Number of violations and suggestions listed in the portfolio summary
    #[arg(long, default_value_t = 5)]
    pub(crate) top: usize,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Borrower id used for the walkthrough
    #[arg(long)]
    pub(crate) user_id: Option<String>,
    /// Loan amount checked against the regulatory limits at the end of the demo
    #[arg(long)]
    pub(crate) requested_amount: Option<f64>,
}

fn build_service() -> CreditAssessmentService<InMemoryScoreRepository> {
    let scoring = ScoringConfig::default();
    CreditAssessmentService::new(
        Arc::new(InMemoryScoreRepository::default()),
        ScoringRules::default(),
        scoring.rescoring_policy(),
    )
    .with_history_limit(scoring.history_limit)
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs { csv, top } = args;

    let profiles = BorrowerCsvImporter::from_path(&csv)?;
    let service = build_service();
    let results = service.score_batch(profiles)?;

    println!("Scored {} borrowers from {}", results.len(), csv.display());
    for result in &results {
        render_result_line(result);
    }

    let summary = PortfolioSummary::from_results(&results, top);
    render_portfolio(&summary);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        user_id,
        requested_amount,
    } = args;

    let user_id = UserId::new(user_id.unwrap_or_else(|| "demo-borrower".to_string()));
    let service = build_service();

    println!("Alternative-data credit scoring demo");
    let baseline = service.enroll(sample_profile(user_id.clone()))?;
    render_result(&baseline);

    let start = Utc::now() - Duration::days(30);
    let events = [
        sample_event(TransactionKind::Bnpl, 5_000.0, TransactionStatus::Failed, start),
        sample_event(
            TransactionKind::Electricity,
            1_200.0,
            TransactionStatus::PaidOnTime,
            start + Duration::days(5),
        ),
        sample_event(
            TransactionKind::Mobile,
            399.0,
            TransactionStatus::PaidLate,
            start + Duration::days(9),
        ),
        sample_event(
            TransactionKind::Salary,
            15_000.0,
            TransactionStatus::PaidOnTime,
            start + Duration::days(28),
        ),
    ];

    println!("\nApplying transactions");
    for event in events {
        let outcome = service.apply_transaction(&user_id, event)?;
        println!(
            "- {} ({} -> {})",
            outcome.change.reason, outcome.change.old_score, outcome.change.new_score
        );
    }

    println!("\nRecent score history (newest first)");
    for change in service.history(&user_id, None)? {
        println!(
            "- {} {:+} {}",
            change.timestamp.format("%Y-%m-%d"),
            change.delta,
            change.reason
        );
    }

    let amount = requested_amount.unwrap_or(130_000.0);
    let request = LoanRequest::new(amount, 18.0, 24);
    let compliance = service.check_compliance(sample_profile(user_id.clone()), &request)?;
    println!(
        "\nCompliance check for ₹{:.0} over {} months: {}",
        request.amount,
        request.tenure_months,
        if compliance.is_compliant {
            "compliant"
        } else {
            "non-compliant"
        }
    );
    for message in &compliance.messages {
        println!("- {message}");
    }
    println!(
        "Score adjustment: {:+} (EMI/income {:.2}%)",
        compliance.score_adjustment, compliance.emi_to_income_ratio
    );

    let restored = service.clear_transactions(&user_id)?;
    println!(
        "\nCleared transactions; score restored to {} ({})",
        restored.credit_score,
        restored.risk_band.label()
    );

    render_portfolio(&service.portfolio_summary(5)?);
    Ok(())
}

fn sample_profile(user_id: UserId) -> BorrowerProfile {
    let mut profile = FeatureExtractor::default_profile(user_id);
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
    profile.upi_transactions_per_month = 40.0;
    profile.digital_wallet_usage = 6.0;
    profile.online_bill_payments = 80.0;
    profile
}

fn sample_event(
    kind: TransactionKind,
    amount: f64,
    status: TransactionStatus,
    timestamp: chrono::DateTime<Utc>,
) -> TransactionEvent {
    TransactionEvent {
        kind,
        amount,
        status,
        provider: String::new(),
        description: String::new(),
        days_late: if status == TransactionStatus::PaidLate { 4 } else { 0 },
        timestamp,
    }
}

fn render_result_line(result: &ScoreResult) {
    println!(
        "- {}: {} ({}, default risk {}%) -> {}",
        result.user_id,
        result.credit_score,
        result.risk_band.label(),
        result.default_probability,
        result.decision.label()
    );
}

fn render_result(result: &ScoreResult) {
    render_result_line(result);
    for component in &result.score_components {
        println!(
            "  {:<22} {:>5.1} (weight {:.0}%)",
            component.component.label(),
            component.score,
            component.weight
        );
    }

    if result.eligible {
        println!(
            "  Eligible for up to ₹{:.0}; recommended ₹{:.0} at {:.1}% (EMI ₹{:.0})",
            result.max_eligible_amount,
            result.recommended_amount,
            result.interest_rate,
            result.recommended_emi
        );
    } else {
        println!("  Not currently eligible for a loan");
    }
    println!(
        "  Percentile {}: {}",
        result.percentile_rank, result.peer_comparison
    );
    for suggestion in &result.improvement_suggestions {
        println!("  * {suggestion}");
    }
}

fn render_portfolio(summary: &PortfolioSummary) {
    println!("\nPortfolio summary");
    println!(
        "- {} borrowers, average score {:.1}, average default risk {:.1}%",
        summary.total_borrowers, summary.average_score, summary.average_default_probability
    );
    println!(
        "- Compliance rate {:.1}%, {} eligible (average recommended ₹{:.0})",
        summary.compliance_rate, summary.eligible_count, summary.average_recommended_amount
    );
    for band in summary.bands.iter().filter(|band| band.count > 0) {
        println!("  {:<10} {}", band.band_label, band.count);
    }
    for decision in summary.decisions.iter().filter(|decision| decision.count > 0) {
        println!("  {:<10} {}", decision.decision.label(), decision.count);
    }
    if !summary.top_violations.is_empty() {
        println!("Top violations");
        for entry in &summary.top_violations {
            println!("  {} ({})", entry.label, entry.count);
        }
    }
    if !summary.top_suggestions.is_empty() {
        println!("Top suggestions");
        for entry in &summary.top_suggestions {
            println!("  {} ({})", entry.label, entry.count);
        }
    }
}
