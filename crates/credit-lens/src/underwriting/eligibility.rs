use serde::{Deserialize, Serialize};

use super::domain::BorrowerProfile;
use super::evaluation::{EligibilityRules, RegulatoryLimits};

/// Repayment schedule for one candidate tenure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmiOption {
    pub tenure_months: u32,
    pub emi: f64,
    pub total_payable: f64,
    pub total_interest: f64,
}

/// Loan envelope derived from the credit score and cash flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanEligibility {
    pub eligible: bool,
    pub max_emi_capacity: f64,
    pub max_amount: f64,
    pub recommended_amount: f64,
    pub interest_rate: f64,
    pub emi_options: Vec<EmiOption>,
    pub optimal_tenure_months: Option<u32>,
    pub recommended_emi: f64,
    /// Existing plus recommended EMI as a percentage of income.
    pub emi_to_income_ratio: f64,
}

/// Standard amortizing instalment for `principal` at `annual_rate` percent.
pub fn amortized_emi(principal: f64, annual_rate: f64, tenure_months: u32) -> f64 {
    if principal <= 0.0 || tenure_months == 0 {
        return 0.0;
    }

    let n = tenure_months as f64;
    let r = annual_rate / 1200.0;
    if r <= 0.0 {
        return principal / n;
    }

    let growth = (1.0 + r).powf(n);
    principal * r * growth / (growth - 1.0)
}

fn round_rupees(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct EligibilityCalculator<'a> {
    rules: &'a EligibilityRules,
    limits: &'a RegulatoryLimits,
}

impl<'a> EligibilityCalculator<'a> {
    pub fn new(rules: &'a EligibilityRules, limits: &'a RegulatoryLimits) -> Self {
        Self { rules, limits }
    }

    pub fn calculate(&self, profile: &BorrowerProfile, credit_score: u16) -> LoanEligibility {
        let max_emi_capacity =
            self.rules.emi_capacity_share * profile.monthly_income - profile.existing_loan_emi;
        let base_amount =
            (self.rules.income_multiple * profile.monthly_income).min(self.limits.max_loan_amount);

        let tier = self.rules.tier_for(credit_score);
        let max_amount = (base_amount * tier.amount_multiplier)
            .round()
            .min(self.limits.max_loan_amount);
        let recommended_amount = (self.rules.recommended_share * max_amount).round();
        let interest_rate = tier.annual_rate.min(self.limits.max_annual_rate);

        let emi_options: Vec<EmiOption> = self
            .rules
            .tenures_months
            .iter()
            .filter_map(|&tenure_months| {
                let emi = amortized_emi(recommended_amount, interest_rate, tenure_months);
                (emi > 0.0 && emi <= max_emi_capacity).then(|| {
                    let total_payable = emi * tenure_months as f64;
                    EmiOption {
                        tenure_months,
                        emi: round_rupees(emi),
                        total_payable: round_rupees(total_payable),
                        total_interest: round_rupees(total_payable - recommended_amount),
                    }
                })
            })
            .collect();

        let optimal = self.optimal_option(&emi_options, recommended_amount);
        let optimal_tenure_months = optimal.map(|option| option.tenure_months);
        let recommended_emi = optimal.map(|option| option.emi.round()).unwrap_or(0.0);
        let emi_to_income_ratio = round_rupees(
            (profile.existing_loan_emi + recommended_emi) / profile.monthly_income * 100.0,
        );

        let eligible =
            max_amount > self.rules.minimum_eligible_amount && !emi_options.is_empty();

        LoanEligibility {
            eligible,
            max_emi_capacity: round_rupees(max_emi_capacity),
            max_amount,
            recommended_amount,
            interest_rate,
            emi_options,
            optimal_tenure_months,
            recommended_emi,
            emi_to_income_ratio,
        }
    }

    /// Shortest affordable tenure that also meets the regulatory minimum, falling
    /// back to the longest affordable tenure.
    fn optimal_option(&self, options: &[EmiOption], amount: f64) -> Option<EmiOption> {
        let required = self.limits.required_tenure(amount).unwrap_or(0);

        options
            .iter()
            .filter(|option| option.tenure_months >= required)
            .min_by_key(|option| option.tenure_months)
            .or_else(|| options.iter().max_by_key(|option| option.tenure_months))
            .copied()
    }
}
