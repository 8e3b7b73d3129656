//! Alternative-data underwriting: feature extraction, composite scoring, loan
//! eligibility, regulatory compliance, coaching, and event-driven re-scoring.
//!
//! The scoring core is pure: [`ScoringEngine::score`] depends only on the derived
//! profile and the injected [`ScoringRules`]. State lives in the
//! [`DynamicRescorer`] ledgers and behind the [`ScoreRepository`] trait.

pub mod compliance;
pub mod domain;
pub mod eligibility;
pub mod evaluation;
pub mod features;
pub mod ingest;
pub mod portfolio;
pub mod recommendations;
pub mod repository;
pub mod rescoring;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use compliance::{ComplianceResult, ComplianceValidator, ComplianceViolation, LoanRequest};
pub use domain::{
    BorrowerProfile, IncomeType, LoanPurpose, ProfileError, ScoreChange, TransactionEvent,
    TransactionKind, TransactionStatus, UserId,
};
pub use eligibility::{EligibilityCalculator, EmiOption, LoanEligibility};
pub use evaluation::{
    Decision, RiskBand, ScoreComponent, ScoreComponentKind, ScoreResult, ScoringEngine,
    ScoringRules,
};
pub use features::{FeatureExtractor, RawBorrowerRow};
pub use ingest::{BorrowerCsvImporter, IngestError};
pub use portfolio::PortfolioSummary;
pub use recommendations::{CoachingEntry, CoachingPriority, RecommendationGenerator};
pub use repository::{AssessmentRecord, RepositoryError, ScoreRepository};
pub use rescoring::{DynamicRescorer, RescoreError, RescoringPolicy, TransactionOutcome};
pub use router::credit_router;
pub use service::{CreditAssessmentService, CreditServiceError};
