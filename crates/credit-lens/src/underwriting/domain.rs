use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for borrowers scored by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the borrower's primary income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeType {
    Salary,
    Business,
    Freelance,
    DailyWage,
}

impl IncomeType {
    pub const fn label(self) -> &'static str {
        match self {
            IncomeType::Salary => "salary",
            IncomeType::Business => "business",
            IncomeType::Freelance => "freelance",
            IncomeType::DailyWage => "daily_wage",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "salary" | "salaried" => Some(Self::Salary),
            "business" | "self_employed" => Some(Self::Business),
            "freelance" | "freelancer" | "gig" => Some(Self::Freelance),
            "daily_wage" | "daily" | "wage" => Some(Self::DailyWage),
            _ => None,
        }
    }
}

/// Declared use of the requested loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanPurpose {
    Business,
    Agriculture,
    Livestock,
    Education,
    Healthcare,
    Personal,
}

impl LoanPurpose {
    /// Purposes treated as productive lending for priority-sector credit.
    pub const fn is_productive(self) -> bool {
        !matches!(self, LoanPurpose::Personal)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "business" => Some(Self::Business),
            "agriculture" | "farming" => Some(Self::Agriculture),
            "livestock" => Some(Self::Livestock),
            "education" => Some(Self::Education),
            "healthcare" | "medical" | "health" => Some(Self::Healthcare),
            "personal" => Some(Self::Personal),
            _ => None,
        }
    }
}

/// Monthly expense split used for coaching and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpenseCategories {
    pub essentials: f64,
    pub discretionary: f64,
    pub investments: f64,
}

/// Fully populated applicant record consumed by the scoring pipeline.
///
/// Derived fields (`overall_bill_payment_score`, `loan_repayment_history_score`,
/// `digital_financial_activity_score`, `expense_categories`) are owned by
/// [`FeatureExtractor`](super::features::FeatureExtractor) and recomputed whenever the
/// raw signals change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowerProfile {
    pub user_id: UserId,

    pub monthly_income: f64,
    pub income_type: IncomeType,
    pub income_stability_months: f64,
    pub years_of_employment: f64,
    pub savings_rate: f64,
    pub emergency_savings: f64,
    pub monthly_expenses: f64,
    pub city_tier: u8,

    pub electricity_bill_payment_pct: f64,
    pub mobile_bill_payment_pct: f64,
    pub internet_bill_payment_pct: f64,
    pub rent_payment_pct: f64,
    pub overall_bill_payment_score: f64,
    pub loan_repayment_history_score: f64,
    pub previous_loan_defaults: u32,

    pub existing_loan_emi: f64,
    pub credit_card_outstanding: f64,
    #[serde(default)]
    pub outstanding_loan_balance: f64,

    pub upi_transactions_per_month: f64,
    pub digital_wallet_usage: f64,
    pub online_bill_payments: f64,
    pub digital_financial_activity_score: f64,
    pub expense_categories: ExpenseCategories,

    pub loan_purpose: LoanPurpose,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_amount: Option<f64>,
    #[serde(default)]
    pub collateral_offered: bool,
}

impl BorrowerProfile {
    /// Reject profiles whose ratios would be undefined.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !self.monthly_income.is_finite() || self.monthly_income <= 0.0 {
            return Err(ProfileError::NonPositiveIncome {
                user_id: self.user_id.clone(),
                monthly_income: self.monthly_income,
            });
        }

        if self.user_id.0.trim().is_empty() {
            return Err(ProfileError::MissingUserId);
        }

        Ok(())
    }

    pub fn debt_to_income(&self) -> f64 {
        (self.existing_loan_emi + 0.05 * self.credit_card_outstanding) / self.monthly_income
    }

    pub fn expense_to_income(&self) -> f64 {
        self.monthly_expenses / self.monthly_income
    }

    /// Existing EMI obligations as a fraction of monthly income.
    pub fn emi_to_income(&self) -> f64 {
        self.existing_loan_emi / self.monthly_income
    }

    pub fn existing_outstanding(&self) -> f64 {
        self.credit_card_outstanding + self.outstanding_loan_balance
    }
}

/// Precondition failures raised before a profile enters the pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("monthly income for {user_id} must be positive (found {monthly_income})")]
    NonPositiveIncome { user_id: UserId, monthly_income: f64 },
    #[error("borrower profile is missing a user id")]
    MissingUserId,
}

/// Category of an incoming transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Electricity,
    Mobile,
    Internet,
    Rent,
    Salary,
    Bnpl,
    Paylater,
    #[serde(other)]
    Other,
}

impl TransactionKind {
    pub const fn label(self) -> &'static str {
        match self {
            TransactionKind::Electricity => "electricity",
            TransactionKind::Mobile => "mobile",
            TransactionKind::Internet => "internet",
            TransactionKind::Rent => "rent",
            TransactionKind::Salary => "salary",
            TransactionKind::Bnpl => "bnpl",
            TransactionKind::Paylater => "paylater",
            TransactionKind::Other => "other",
        }
    }

    pub const fn is_credit_repayment(self) -> bool {
        matches!(self, TransactionKind::Bnpl | TransactionKind::Paylater)
    }
}

/// Settlement outcome reported for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    PaidOnTime,
    PaidLate,
    Failed,
}

impl TransactionStatus {
    /// Punctuality credit contributed to a rolling percentage.
    pub const fn punctuality_credit(self) -> f64 {
        match self {
            TransactionStatus::PaidOnTime => 100.0,
            TransactionStatus::PaidLate => 50.0,
            TransactionStatus::Failed => 0.0,
        }
    }
}

/// Single bill, income or credit event applied by the rescorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    #[serde(alias = "type", alias = "transaction_type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub status: TransactionStatus,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub days_late: u32,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Append-only record of a score movement caused by a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreChange {
    pub old_score: u16,
    pub new_score: u16,
    pub delta: i32,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}
