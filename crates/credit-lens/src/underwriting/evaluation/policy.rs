use serde::{Deserialize, Serialize};

use super::super::domain::BorrowerProfile;
use super::config::{DecisionRules, PercentileRules};

pub const MIN_CREDIT_SCORE: u16 = 300;
pub const MAX_CREDIT_SCORE: u16 = 900;
pub const MIN_DEFAULT_PROBABILITY: u8 = 1;
pub const MAX_DEFAULT_PROBABILITY: u8 = 95;

/// Named bucket partitioning the 300-900 score range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl RiskBand {
    /// Lower bounds are inclusive, upper bounds exclusive.
    pub const fn from_score(credit_score: u16) -> Self {
        match credit_score {
            750.. => RiskBand::Excellent,
            650..=749 => RiskBand::Good,
            550..=649 => RiskBand::Fair,
            450..=549 => RiskBand::Poor,
            _ => RiskBand::VeryPoor,
        }
    }

    pub const fn ordered() -> [RiskBand; 5] {
        [
            RiskBand::Excellent,
            RiskBand::Good,
            RiskBand::Fair,
            RiskBand::Poor,
            RiskBand::VeryPoor,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            RiskBand::Excellent => "Excellent",
            RiskBand::Good => "Good",
            RiskBand::Fair => "Fair",
            RiskBand::Poor => "Poor",
            RiskBand::VeryPoor => "Very Poor",
        }
    }
}

/// Lending decision derived from score and default probability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Review,
    Reject,
}

impl Decision {
    pub const fn ordered() -> [Decision; 3] {
        [Decision::Approve, Decision::Review, Decision::Reject]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Review => "review",
            Decision::Reject => "reject",
        }
    }
}

pub fn decide(rules: &DecisionRules, credit_score: u16, default_probability: u8) -> Decision {
    if credit_score >= rules.approve_min_score
        && default_probability <= rules.approve_max_default_probability
    {
        return Decision::Approve;
    }

    if credit_score >= rules.review_min_score
        && default_probability <= rules.review_max_default_probability
    {
        return Decision::Review;
    }

    Decision::Reject
}

/// Map the 0-100 weighted composite onto the 300-900 scale.
pub fn credit_score_from_weighted(weighted: f64) -> u16 {
    let raw = (MIN_CREDIT_SCORE as f64 + 6.0 * weighted).round();
    if !raw.is_finite() {
        return MIN_CREDIT_SCORE;
    }
    raw.clamp(MIN_CREDIT_SCORE as f64, MAX_CREDIT_SCORE as f64) as u16
}

pub fn default_probability(credit_score: u16, profile: &BorrowerProfile) -> u8 {
    let base = (50.0 - (credit_score as f64 - MIN_CREDIT_SCORE as f64) / 12.0).max(1.0);
    let mut probability = base + 15.0 * profile.previous_loan_defaults as f64;

    if profile.emi_to_income() > 0.5 {
        probability += 10.0;
    }
    if profile.emergency_savings < profile.monthly_expenses {
        probability += 8.0;
    }

    probability.round().clamp(
        MIN_DEFAULT_PROBABILITY as f64,
        MAX_DEFAULT_PROBABILITY as f64,
    ) as u8
}

pub fn percentile_rank(rules: &PercentileRules, credit_score: u16) -> u8 {
    rules.rank(credit_score)
}

fn income_bracket(monthly_income: f64) -> &'static str {
    if monthly_income >= 50_000.0 {
        "₹50,000+"
    } else if monthly_income >= 25_000.0 {
        "₹25,000-50,000"
    } else if monthly_income >= 15_000.0 {
        "₹15,000-25,000"
    } else if monthly_income >= 10_000.0 {
        "₹10,000-15,000"
    } else {
        "under ₹10,000"
    }
}

pub fn peer_comparison(percentile: u8, profile: &BorrowerProfile) -> String {
    format!(
        "Your score is higher than {}% of borrowers earning {} per month",
        percentile,
        income_bracket(profile.monthly_income)
    )
}
