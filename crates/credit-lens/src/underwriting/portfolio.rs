use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::evaluation::{Decision, RiskBand, ScoreResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandCount {
    pub band: RiskBand,
    pub band_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionCount {
    pub decision: Decision,
    pub count: usize,
}

/// Occurrence count for a violation code or suggestion text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub label: String,
    pub count: usize,
}

/// Aggregate view over a batch of score results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub total_borrowers: usize,
    pub average_score: f64,
    pub average_default_probability: f64,
    /// Share of compliant results, as a percentage.
    pub compliance_rate: f64,
    pub eligible_count: usize,
    pub average_recommended_amount: f64,
    pub bands: Vec<BandCount>,
    pub decisions: Vec<DecisionCount>,
    pub top_violations: Vec<RankedEntry>,
    pub top_suggestions: Vec<RankedEntry>,
}

impl PortfolioSummary {
    pub fn from_results(results: &[ScoreResult], top_n: usize) -> Self {
        let total = results.len();
        let mut band_counts: HashMap<RiskBand, usize> = HashMap::new();
        let mut decision_counts: HashMap<Decision, usize> = HashMap::new();
        let mut violations: HashMap<String, usize> = HashMap::new();
        let mut suggestions: HashMap<String, usize> = HashMap::new();

        let mut score_total = 0.0;
        let mut pd_total = 0.0;
        let mut compliant = 0usize;
        let mut eligible_count = 0usize;
        let mut recommended_total = 0.0;

        for result in results {
            *band_counts.entry(result.risk_band).or_default() += 1;
            *decision_counts.entry(result.decision).or_default() += 1;
            score_total += f64::from(result.credit_score);
            pd_total += f64::from(result.default_probability);
            recommended_total += result.recommended_amount;
            if result.rbi_compliant {
                compliant += 1;
            }
            if result.eligible {
                eligible_count += 1;
            }
            for violation in &result.violations {
                *violations.entry(violation.code().to_string()).or_default() += 1;
            }
            for suggestion in &result.improvement_suggestions {
                *suggestions.entry(suggestion.clone()).or_default() += 1;
            }
        }

        let average = |sum: f64| {
            if total == 0 {
                0.0
            } else {
                round_one(sum / total as f64)
            }
        };

        let bands = RiskBand::ordered()
            .into_iter()
            .map(|band| BandCount {
                band,
                band_label: band.label(),
                count: band_counts.get(&band).copied().unwrap_or(0),
            })
            .collect();

        let decisions = Decision::ordered()
            .into_iter()
            .map(|decision| DecisionCount {
                decision,
                count: decision_counts.get(&decision).copied().unwrap_or(0),
            })
            .collect();

        Self {
            total_borrowers: total,
            average_score: average(score_total),
            average_default_probability: average(pd_total),
            compliance_rate: average(compliant as f64 * 100.0),
            eligible_count,
            average_recommended_amount: average(recommended_total),
            bands,
            decisions,
            top_violations: ranked(violations, top_n),
            top_suggestions: ranked(suggestions, top_n),
        }
    }

    pub fn band_count(&self, band: RiskBand) -> usize {
        self.bands
            .iter()
            .find(|entry| entry.band == band)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    pub fn decision_count(&self, decision: Decision) -> usize {
        self.decisions
            .iter()
            .find(|entry| entry.decision == decision)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Highest counts first; ties broken alphabetically so output is stable.
fn ranked(counts: HashMap<String, usize>, top_n: usize) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = counts
        .into_iter()
        .map(|(label, count)| RankedEntry { label, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    entries.truncate(top_n);
    entries
}
