use serde::{Deserialize, Serialize};

use super::super::domain::{BorrowerProfile, IncomeType};
use super::config::ComponentWeights;
use super::ScoreComponent;

/// The four weighted sub-scores, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub payment_history: f64,
    pub credit_utilization: f64,
    pub income_stability: f64,
    pub digital_behavior: f64,
}

/// Named sub-score in the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreComponentKind {
    PaymentHistory,
    CreditUtilization,
    IncomeStability,
    DigitalBehavior,
}

impl ScoreComponentKind {
    pub const fn label(self) -> &'static str {
        match self {
            ScoreComponentKind::PaymentHistory => "Payment History",
            ScoreComponentKind::CreditUtilization => "Credit Utilization",
            ScoreComponentKind::IncomeStability => "Income Stability",
            ScoreComponentKind::DigitalBehavior => "Digital Behavior",
        }
    }
}

impl ComponentScores {
    pub fn from_profile(profile: &BorrowerProfile) -> Self {
        Self {
            payment_history: payment_history(profile),
            credit_utilization: credit_utilization(profile),
            income_stability: income_stability(profile),
            digital_behavior: digital_behavior(profile),
        }
    }

    /// Weighted average on the 0-100 pre-scale.
    pub fn weighted(&self, weights: &ComponentWeights) -> f64 {
        let total = weights.total();
        if total <= 0.0 {
            return 0.0;
        }

        (weights.payment_history * self.payment_history
            + weights.credit_utilization * self.credit_utilization
            + weights.income_stability * self.income_stability
            + weights.digital_behavior * self.digital_behavior)
            / total
    }

    pub(crate) fn to_components(
        self,
        profile: &BorrowerProfile,
        weights: &ComponentWeights,
    ) -> Vec<ScoreComponent> {
        vec![
            ScoreComponent {
                component: ScoreComponentKind::PaymentHistory,
                score: self.payment_history,
                weight: weights.payment_history,
                notes: format!(
                    "bill punctuality {:.1}%, {} prior default(s)",
                    profile.overall_bill_payment_score, profile.previous_loan_defaults
                ),
            },
            ScoreComponent {
                component: ScoreComponentKind::CreditUtilization,
                score: self.credit_utilization,
                weight: weights.credit_utilization,
                notes: format!(
                    "debt-to-income {:.2}, expense-to-income {:.2}",
                    profile.debt_to_income(),
                    profile.expense_to_income()
                ),
            },
            ScoreComponent {
                component: ScoreComponentKind::IncomeStability,
                score: self.income_stability,
                weight: weights.income_stability,
                notes: format!(
                    "{} income, {:.0} stable month(s), savings rate {:.0}%",
                    profile.income_type.label(),
                    profile.income_stability_months,
                    profile.savings_rate
                ),
            },
            ScoreComponent {
                component: ScoreComponentKind::DigitalBehavior,
                score: self.digital_behavior,
                weight: weights.digital_behavior,
                notes: format!(
                    "{:.0} UPI transactions/month, activity score {:.0}",
                    profile.upi_transactions_per_month, profile.digital_financial_activity_score
                ),
            },
        ]
    }
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

pub(crate) fn payment_history(profile: &BorrowerProfile) -> f64 {
    let bills = 0.3 * profile.electricity_bill_payment_pct
        + 0.2 * profile.mobile_bill_payment_pct
        + 0.2 * profile.internet_bill_payment_pct
        + 0.3 * profile.rent_payment_pct;

    clamp_score(
        0.6 * bills + 0.4 * profile.loan_repayment_history_score
            - 20.0 * profile.previous_loan_defaults as f64,
    )
}

pub(crate) fn credit_utilization(profile: &BorrowerProfile) -> f64 {
    let debt_component = (100.0 - 200.0 * profile.debt_to_income()).max(0.0);
    let expense_component = (100.0 - 100.0 * profile.expense_to_income()).max(0.0);

    clamp_score(0.7 * debt_component + 0.3 * expense_component)
}

pub(crate) fn income_base(income_type: IncomeType) -> f64 {
    match income_type {
        IncomeType::Salary => 90.0,
        IncomeType::Business => 70.0,
        IncomeType::Freelance => 60.0,
        IncomeType::DailyWage => 40.0,
    }
}

pub(crate) fn income_stability(profile: &BorrowerProfile) -> f64 {
    let score = income_base(profile.income_type)
        + (2.0 * profile.income_stability_months).min(20.0)
        + (5.0 * profile.years_of_employment).min(30.0)
        + (2.5 * profile.savings_rate).min(25.0);

    clamp_score(score)
}

pub(crate) fn digital_behavior(profile: &BorrowerProfile) -> f64 {
    let score = (2.0 * profile.upi_transactions_per_month).min(30.0)
        + (2.5 * profile.digital_wallet_usage).min(25.0)
        + 0.3 * profile.online_bill_payments
        + 0.15 * profile.digital_financial_activity_score;

    clamp_score(score)
}
