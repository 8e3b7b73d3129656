use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{BorrowerProfile, LoanPurpose};
use super::eligibility::amortized_emi;
use super::evaluation::{RegulatoryLimits, ScoringRules};

/// Loan terms checked against the regulatory rule set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub amount: f64,
    pub annual_rate: f64,
    pub tenure_months: u32,
    #[serde(default = "default_purpose")]
    pub purpose: LoanPurpose,
    #[serde(default = "default_collateral_free")]
    pub collateral_free: bool,
}

fn default_purpose() -> LoanPurpose {
    LoanPurpose::Personal
}

fn default_collateral_free() -> bool {
    true
}

impl LoanRequest {
    pub fn new(amount: f64, annual_rate: f64, tenure_months: u32) -> Self {
        Self {
            amount,
            annual_rate,
            tenure_months,
            purpose: LoanPurpose::Personal,
            collateral_free: true,
        }
    }

    pub fn with_purpose(mut self, purpose: LoanPurpose) -> Self {
        self.purpose = purpose;
        self
    }

    pub fn secured(mut self) -> Self {
        self.collateral_free = false;
        self
    }
}

/// One failed regulatory rule. Variants are listed in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ComplianceViolation {
    LoanAmountCeiling { max: f64, requested: f64 },
    TotalOutstandingCeiling { max: f64, total: f64 },
    MinimumIncome { min: f64, monthly_income: f64 },
    InterestRateCap { cap: f64, rate: f64 },
    MinimumTenure { min_months: u32, tenure_months: u32, amount: f64 },
    EmiToIncomeCap { max_pct: f64, actual_pct: f64 },
    CollateralRequired,
}

impl ComplianceViolation {
    pub const fn code(&self) -> &'static str {
        match self {
            ComplianceViolation::LoanAmountCeiling { .. } => "loan_amount_ceiling",
            ComplianceViolation::TotalOutstandingCeiling { .. } => "total_outstanding_ceiling",
            ComplianceViolation::MinimumIncome { .. } => "minimum_income",
            ComplianceViolation::InterestRateCap { .. } => "interest_rate_cap",
            ComplianceViolation::MinimumTenure { .. } => "minimum_tenure",
            ComplianceViolation::EmiToIncomeCap { .. } => "emi_to_income_cap",
            ComplianceViolation::CollateralRequired => "collateral_required",
        }
    }
}

impl fmt::Display for ComplianceViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceViolation::LoanAmountCeiling { max, requested } => write!(
                f,
                "loan amount {} exceeds the {} microfinance ceiling",
                rupees(*requested),
                rupees(*max)
            ),
            ComplianceViolation::TotalOutstandingCeiling { max, total } => write!(
                f,
                "total outstanding {} exceeds the {} household indebtedness limit",
                rupees(*total),
                rupees(*max)
            ),
            ComplianceViolation::MinimumIncome {
                min,
                monthly_income,
            } => write!(
                f,
                "monthly income {} is below the {} minimum",
                rupees(*monthly_income),
                rupees(*min)
            ),
            ComplianceViolation::InterestRateCap { cap, rate } => {
                write!(f, "interest rate {rate:.1}% exceeds the {cap:.0}% cap")
            }
            ComplianceViolation::MinimumTenure {
                min_months,
                tenure_months,
                amount,
            } => write!(
                f,
                "tenure of {tenure_months} months is below the {min_months} month minimum for loans of {}",
                rupees(*amount)
            ),
            ComplianceViolation::EmiToIncomeCap {
                max_pct,
                actual_pct,
            } => write!(
                f,
                "EMI-to-income ratio {actual_pct:.1}% exceeds the {max_pct:.0}% limit"
            ),
            ComplianceViolation::CollateralRequired => {
                write!(f, "microfinance loans must be collateral-free")
            }
        }
    }
}

/// Format a rupee amount with thousands separators, e.g. `₹125,000`.
pub fn rupees(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-₹{grouped}")
    } else {
        format!("₹{grouped}")
    }
}

/// Outcome of a compliance check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub is_compliant: bool,
    pub violations: Vec<ComplianceViolation>,
    pub messages: Vec<String>,
    pub score_adjustment: i32,
    pub emi_to_income_ratio: f64,
}

/// Applies the fixed regulatory rule set to a borrower and loan request.
#[derive(Debug, Clone, Default)]
pub struct ComplianceValidator {
    limits: RegulatoryLimits,
}

impl From<&ScoringRules> for ComplianceValidator {
    fn from(rules: &ScoringRules) -> Self {
        Self::new(rules.limits)
    }
}

impl ComplianceValidator {
    pub fn new(limits: RegulatoryLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &RegulatoryLimits {
        &self.limits
    }

    pub fn check(&self, profile: &BorrowerProfile, request: &LoanRequest) -> ComplianceResult {
        let limits = &self.limits;
        let mut violations = Vec::new();
        let mut adjustment = 0;

        if request.amount > limits.max_loan_amount {
            violations.push(ComplianceViolation::LoanAmountCeiling {
                max: limits.max_loan_amount,
                requested: request.amount,
            });
            adjustment += limits.loan_amount_penalty;
        }

        let total_outstanding = profile.existing_outstanding() + request.amount;
        if total_outstanding > limits.max_total_outstanding {
            violations.push(ComplianceViolation::TotalOutstandingCeiling {
                max: limits.max_total_outstanding,
                total: total_outstanding,
            });
            adjustment += limits.outstanding_penalty;
        }

        if profile.monthly_income < limits.min_monthly_income {
            violations.push(ComplianceViolation::MinimumIncome {
                min: limits.min_monthly_income,
                monthly_income: profile.monthly_income,
            });
            adjustment += limits.income_penalty;
        }

        if request.annual_rate > limits.max_annual_rate {
            violations.push(ComplianceViolation::InterestRateCap {
                cap: limits.max_annual_rate,
                rate: request.annual_rate,
            });
            adjustment += limits.rate_penalty;
        }

        if let Some(min_months) = limits.required_tenure(request.amount) {
            if request.tenure_months < min_months {
                violations.push(ComplianceViolation::MinimumTenure {
                    min_months,
                    tenure_months: request.tenure_months,
                    amount: request.amount,
                });
                adjustment += limits.tenure_penalty;
            }
        }

        let emi = amortized_emi(request.amount, request.annual_rate, request.tenure_months);
        let emi_to_income_ratio = if profile.monthly_income > 0.0 {
            (profile.existing_loan_emi + emi) / profile.monthly_income * 100.0
        } else {
            f64::INFINITY
        };
        if emi_to_income_ratio > limits.max_emi_to_income_pct {
            violations.push(ComplianceViolation::EmiToIncomeCap {
                max_pct: limits.max_emi_to_income_pct,
                actual_pct: emi_to_income_ratio,
            });
            adjustment += limits.emi_ratio_penalty;
        } else if emi_to_income_ratio < limits.healthy_emi_to_income_pct {
            adjustment += limits.healthy_emi_bonus;
        }

        if !request.collateral_free {
            violations.push(ComplianceViolation::CollateralRequired);
            adjustment += limits.collateral_penalty;
        }

        if request.purpose.is_productive() {
            adjustment += limits.productive_purpose_bonus;
        }

        let messages = violations.iter().map(ToString::to_string).collect();

        ComplianceResult {
            is_compliant: violations.is_empty(),
            violations,
            messages,
            score_adjustment: adjustment.clamp(limits.min_adjustment, limits.max_adjustment),
            emi_to_income_ratio: if emi_to_income_ratio.is_finite() {
                (emi_to_income_ratio * 10.0).round() / 10.0
            } else {
                0.0
            },
        }
    }
}
