use serde::{Deserialize, Serialize};

use super::compliance::rupees;
use super::domain::BorrowerProfile;

const BILL_SCORE_TARGET: f64 = 80.0;
const EMI_RESTRUCTURE_RATIO: f64 = 0.4;
const UPI_ACTIVITY_TARGET: f64 = 20.0;
const EMERGENCY_FUND_MONTHS: f64 = 3.0;
const EMERGENCY_BUILD_MONTHS: f64 = 6.0;
const SAVINGS_RATE_TARGET: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachingPriority {
    High,
    Medium,
    Low,
}

/// Structured coaching action with a plain-language impact estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachingEntry {
    pub priority: CoachingPriority,
    pub action: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Recommendations {
    pub immediate: Vec<String>,
    pub coaching: Vec<CoachingEntry>,
}

impl Recommendations {
    fn push(
        &mut self,
        immediate: String,
        priority: CoachingPriority,
        action: String,
        impact: &str,
    ) {
        self.immediate.push(immediate);
        self.coaching.push(CoachingEntry {
            priority,
            action,
            impact: impact.to_string(),
        });
    }
}

/// Threshold-triggered advice. Rule order is fixed and determines output order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationGenerator;

impl RecommendationGenerator {
    pub fn generate(profile: &BorrowerProfile) -> Recommendations {
        let mut recommendations = Recommendations::default();

        if profile.overall_bill_payment_score < BILL_SCORE_TARGET {
            recommendations.push(
                "Set up auto-pay for electricity, mobile and rent bills".to_string(),
                CoachingPriority::High,
                format!(
                    "Enable auto-pay so your bill payment score rises from {:.0}% above {:.0}%",
                    profile.overall_bill_payment_score, BILL_SCORE_TARGET
                ),
                "Can raise your credit score by 30-50 points within 3 months",
            );
        }

        if profile.emi_to_income() > EMI_RESTRUCTURE_RATIO {
            recommendations.push(
                "Restructure existing loans to bring EMIs under 40% of income".to_string(),
                CoachingPriority::High,
                format!(
                    "Existing EMIs take {:.0}% of income; consolidate or extend tenure to reduce them",
                    profile.emi_to_income() * 100.0
                ),
                "Lowers default risk and unlocks larger loan amounts",
            );
        }

        if profile.upi_transactions_per_month < UPI_ACTIVITY_TARGET {
            recommendations.push(
                "Use UPI for daily purchases to build a digital payment trail".to_string(),
                CoachingPriority::Medium,
                format!(
                    "Increase UPI payments from {:.0} to at least {:.0} per month",
                    profile.upi_transactions_per_month, UPI_ACTIVITY_TARGET
                ),
                "Can add 10-20 points through a stronger digital behavior score",
            );
        }

        let emergency_target = EMERGENCY_FUND_MONTHS * profile.monthly_expenses;
        if profile.emergency_savings < emergency_target {
            let shortfall = emergency_target - profile.emergency_savings;
            let monthly = (shortfall / EMERGENCY_BUILD_MONTHS).ceil();
            recommendations.push(
                format!(
                    "Save {} per month for {:.0} months to build an emergency fund of {}",
                    rupees(monthly),
                    EMERGENCY_BUILD_MONTHS,
                    rupees(emergency_target)
                ),
                CoachingPriority::Medium,
                format!(
                    "Keep 3 months of expenses aside; the current shortfall is {}",
                    rupees(shortfall)
                ),
                "Reduces estimated default probability by up to 8 points",
            );
        }

        if profile.savings_rate < SAVINGS_RATE_TARGET {
            recommendations.push(
                "Save at least 20% of monthly income".to_string(),
                CoachingPriority::Low,
                format!(
                    "Raise your savings rate from {:.0}% to {:.0}% with a recurring deposit",
                    profile.savings_rate, SAVINGS_RATE_TARGET
                ),
                "Strengthens income stability and long-term eligibility",
            );
        }

        recommendations
    }
}
