use serde::{Deserialize, Serialize};

/// Complete rule set injected into the scoring engine.
///
/// `Default` yields the production tables; tests and alternative products swap
/// individual sections without touching the algorithms.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringRules {
    pub weights: ComponentWeights,
    pub decisions: DecisionRules,
    pub percentiles: PercentileRules,
    pub eligibility: EligibilityRules,
    pub limits: RegulatoryLimits,
}

/// Composite weights, expressed in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub payment_history: f64,
    pub credit_utilization: f64,
    pub income_stability: f64,
    pub digital_behavior: f64,
}

impl ComponentWeights {
    pub fn total(&self) -> f64 {
        self.payment_history
            + self.credit_utilization
            + self.income_stability
            + self.digital_behavior
    }
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            payment_history: 40.0,
            credit_utilization: 25.0,
            income_stability: 20.0,
            digital_behavior: 15.0,
        }
    }
}

/// Score and default-probability gates for each lending decision. Anything that
/// clears neither gate is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionRules {
    pub approve_min_score: u16,
    pub approve_max_default_probability: u8,
    pub review_min_score: u16,
    pub review_max_default_probability: u8,
}

impl Default for DecisionRules {
    fn default() -> Self {
        Self {
            approve_min_score: 650,
            approve_max_default_probability: 20,
            review_min_score: 550,
            review_max_default_probability: 35,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileStep {
    pub min_score: u16,
    pub percentile: u8,
}

/// Score-to-percentile lookup against the reference borrower population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileRules {
    /// Ordered from the highest `min_score` down.
    pub steps: Vec<PercentileStep>,
    /// Percentile for scores below every step.
    pub floor: u8,
}

impl PercentileRules {
    pub fn rank(&self, credit_score: u16) -> u8 {
        self.steps
            .iter()
            .find(|step| credit_score >= step.min_score)
            .map(|step| step.percentile)
            .unwrap_or(self.floor)
    }
}

impl Default for PercentileRules {
    fn default() -> Self {
        let step = |min_score, percentile| PercentileStep {
            min_score,
            percentile,
        };
        Self {
            steps: vec![
                step(800, 95),
                step(750, 85),
                step(700, 70),
                step(650, 55),
                step(600, 40),
                step(550, 25),
            ],
            floor: 10,
        }
    }
}

/// Pricing and sizing applied from a minimum credit score upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreTier {
    pub min_score: u16,
    pub amount_multiplier: f64,
    pub annual_rate: f64,
}

/// Loan sizing dials for the eligibility calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityRules {
    /// Share of monthly income that may go to EMIs in total.
    pub emi_capacity_share: f64,
    /// Income multiple used for the base amount before the regulatory ceiling.
    pub income_multiple: f64,
    pub recommended_share: f64,
    /// Ordered from the highest `min_score` down; the last tier must start at 0.
    pub tiers: Vec<ScoreTier>,
    pub tenures_months: Vec<u32>,
    pub minimum_eligible_amount: f64,
}

impl EligibilityRules {
    pub fn tier_for(&self, credit_score: u16) -> ScoreTier {
        self.tiers
            .iter()
            .copied()
            .find(|tier| credit_score >= tier.min_score)
            .or_else(|| self.tiers.last().copied())
            .unwrap_or(ScoreTier {
                min_score: 0,
                amount_multiplier: 0.4,
                annual_rate: 26.0,
            })
    }
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            emi_capacity_share: 0.4,
            income_multiple: 10.0,
            recommended_share: 0.7,
            tiers: vec![
                ScoreTier {
                    min_score: 750,
                    amount_multiplier: 1.0,
                    annual_rate: 18.0,
                },
                ScoreTier {
                    min_score: 650,
                    amount_multiplier: 0.8,
                    annual_rate: 22.0,
                },
                ScoreTier {
                    min_score: 550,
                    amount_multiplier: 0.6,
                    annual_rate: 24.0,
                },
                ScoreTier {
                    min_score: 0,
                    amount_multiplier: 0.4,
                    annual_rate: 26.0,
                },
            ],
            tenures_months: vec![12, 18, 24, 36],
            minimum_eligible_amount: 10_000.0,
        }
    }
}

/// Microfinance lending limits and the score adjustments attached to each rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryLimits {
    pub max_loan_amount: f64,
    pub max_total_outstanding: f64,
    pub min_monthly_income: f64,
    pub max_annual_rate: f64,
    pub min_tenure_months: u32,
    /// Amount above which `min_tenure_months` applies.
    pub min_tenure_amount_threshold: f64,
    pub max_emi_to_income_pct: f64,
    pub healthy_emi_to_income_pct: f64,
    pub loan_amount_penalty: i32,
    pub outstanding_penalty: i32,
    pub income_penalty: i32,
    pub rate_penalty: i32,
    pub tenure_penalty: i32,
    pub emi_ratio_penalty: i32,
    pub healthy_emi_bonus: i32,
    pub collateral_penalty: i32,
    pub productive_purpose_bonus: i32,
    pub min_adjustment: i32,
    pub max_adjustment: i32,
}

impl RegulatoryLimits {
    /// Minimum tenure required for a loan of `amount`, if any.
    pub fn required_tenure(&self, amount: f64) -> Option<u32> {
        (amount > self.min_tenure_amount_threshold).then_some(self.min_tenure_months)
    }
}

impl Default for RegulatoryLimits {
    fn default() -> Self {
        Self {
            max_loan_amount: 125_000.0,
            max_total_outstanding: 100_000.0,
            min_monthly_income: 5_000.0,
            max_annual_rate: 26.0,
            min_tenure_months: 24,
            min_tenure_amount_threshold: 15_000.0,
            max_emi_to_income_pct: 50.0,
            healthy_emi_to_income_pct: 30.0,
            loan_amount_penalty: -15,
            outstanding_penalty: -10,
            income_penalty: -20,
            rate_penalty: -5,
            tenure_penalty: -5,
            emi_ratio_penalty: -10,
            healthy_emi_bonus: 5,
            collateral_penalty: -5,
            productive_purpose_bonus: 3,
            min_adjustment: -20,
            max_adjustment: 10,
        }
    }
}
