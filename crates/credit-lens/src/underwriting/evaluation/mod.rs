mod components;
mod config;
mod policy;

pub use components::{ComponentScores, ScoreComponentKind};
pub use config::{
    ComponentWeights, DecisionRules, EligibilityRules, PercentileRules, PercentileStep,
    RegulatoryLimits, ScoreTier, ScoringRules,
};
pub use policy::{
    credit_score_from_weighted, decide, default_probability, percentile_rank, Decision, RiskBand,
    MAX_CREDIT_SCORE, MAX_DEFAULT_PROBABILITY, MIN_CREDIT_SCORE, MIN_DEFAULT_PROBABILITY,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::compliance::{ComplianceResult, ComplianceValidator, ComplianceViolation, LoanRequest};
use super::domain::{BorrowerProfile, UserId};
use super::eligibility::{EligibilityCalculator, EmiOption, LoanEligibility};
use super::recommendations::{CoachingEntry, RecommendationGenerator};

/// Tenure assumed for the default compliance request when no EMI option is affordable.
const FALLBACK_TENURE_MONTHS: u32 = 36;

/// Stateless pipeline applying the injected rule set to a derived profile.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    rules: ScoringRules,
    compliance: ComplianceValidator,
}

impl ScoringEngine {
    pub fn new(rules: ScoringRules) -> Self {
        let compliance = ComplianceValidator::from(&rules);
        Self { rules, compliance }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    pub fn compliance(&self) -> &ComplianceValidator {
        &self.compliance
    }

    /// Score a profile whose derived fields are current and whose income has been
    /// validated as positive.
    pub fn score(&self, profile: &BorrowerProfile) -> ScoreResult {
        let components = ComponentScores::from_profile(profile);
        let weighted = components.weighted(&self.rules.weights);
        let credit_score = credit_score_from_weighted(weighted);
        let risk_band = RiskBand::from_score(credit_score);
        let default_probability = default_probability(credit_score, profile);
        let decision = decide(&self.rules.decisions, credit_score, default_probability);

        let eligibility = EligibilityCalculator::new(&self.rules.eligibility, &self.rules.limits)
            .calculate(profile, credit_score);
        let request = self.default_request(profile, &eligibility);
        let compliance = self.compliance.check(profile, &request);
        let recommendations = RecommendationGenerator::generate(profile);
        let percentile = percentile_rank(&self.rules.percentiles, credit_score);

        debug!(
            user_id = %profile.user_id,
            credit_score,
            default_probability,
            decision = decision.label(),
            rbi_compliant = compliance.is_compliant,
            "scored borrower profile"
        );

        let LoanEligibility {
            eligible,
            max_amount,
            recommended_amount,
            interest_rate,
            emi_options,
            optimal_tenure_months,
            recommended_emi,
            emi_to_income_ratio,
            ..
        } = eligibility;
        let ComplianceResult {
            is_compliant,
            violations,
            score_adjustment,
            ..
        } = compliance;

        ScoreResult {
            user_id: profile.user_id.clone(),
            credit_score,
            risk_band,
            default_probability,
            decision,
            score_components: components.to_components(profile, &self.rules.weights),
            eligible,
            max_eligible_amount: max_amount,
            recommended_amount,
            interest_rate,
            recommended_emi,
            optimal_tenure_months,
            emi_to_income_ratio,
            emi_options,
            requested_amount: request.amount,
            rbi_compliant: is_compliant,
            violations,
            compliance_adjustment: score_adjustment,
            improvement_suggestions: recommendations.immediate,
            financial_coaching: recommendations.coaching,
            percentile_rank: percentile,
            peer_comparison: policy::peer_comparison(percentile, profile),
        }
    }

    /// Check an explicit loan request against the regulatory rules.
    pub fn check_compliance(
        &self,
        profile: &BorrowerProfile,
        request: &LoanRequest,
    ) -> ComplianceResult {
        self.compliance.check(profile, request)
    }

    /// Request implied by the profile: the declared amount if any, otherwise the
    /// recommended amount, priced at the tier rate over the optimal tenure.
    fn default_request(
        &self,
        profile: &BorrowerProfile,
        eligibility: &LoanEligibility,
    ) -> LoanRequest {
        let amount = profile
            .requested_amount
            .unwrap_or(eligibility.recommended_amount);
        let tenure = eligibility
            .optimal_tenure_months
            .unwrap_or(FALLBACK_TENURE_MONTHS);

        let request = LoanRequest::new(amount, eligibility.interest_rate, tenure)
            .with_purpose(profile.loan_purpose);
        if profile.collateral_offered {
            request.secured()
        } else {
            request
        }
    }
}

/// Discrete contribution to the composite, kept for transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub component: ScoreComponentKind,
    pub score: f64,
    pub weight: f64,
    pub notes: String,
}

/// Immutable output of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub user_id: UserId,
    pub credit_score: u16,
    pub risk_band: RiskBand,
    pub default_probability: u8,
    pub decision: Decision,
    pub score_components: Vec<ScoreComponent>,

    pub eligible: bool,
    pub max_eligible_amount: f64,
    pub recommended_amount: f64,
    pub interest_rate: f64,
    pub recommended_emi: f64,
    pub optimal_tenure_months: Option<u32>,
    pub emi_to_income_ratio: f64,
    pub emi_options: Vec<EmiOption>,

    /// Amount the compliance verdict was evaluated for.
    pub requested_amount: f64,
    pub rbi_compliant: bool,
    pub violations: Vec<ComplianceViolation>,
    pub compliance_adjustment: i32,

    pub improvement_suggestions: Vec<String>,
    pub financial_coaching: Vec<CoachingEntry>,
    pub percentile_rank: u8,
    pub peer_comparison: String,
}

impl ScoreResult {
    pub fn component(&self, kind: ScoreComponentKind) -> Option<&ScoreComponent> {
        self.score_components
            .iter()
            .find(|component| component.component == kind)
    }
}
