use std::collections::HashMap;

use serde_json::{Map, Value};

use super::domain::{BorrowerProfile, ExpenseCategories, IncomeType, LoanPurpose, UserId};

/// Values substituted when a raw record is missing or cannot be parsed.
pub mod defaults {
    pub const MONTHLY_INCOME: f64 = 25_000.0;
    pub const INCOME_STABILITY_MONTHS: f64 = 12.0;
    pub const YEARS_OF_EMPLOYMENT: f64 = 2.0;
    pub const SAVINGS_RATE: f64 = 15.0;
    pub const EMERGENCY_SAVINGS: f64 = 0.0;
    /// Share of income assumed as monthly expenses when none is reported.
    pub const EXPENSE_SHARE: f64 = 0.6;
    pub const CITY_TIER: u8 = 2;
    pub const ELECTRICITY_PCT: f64 = 85.0;
    pub const MOBILE_PCT: f64 = 80.0;
    pub const INTERNET_PCT: f64 = 75.0;
    pub const RENT_PCT: f64 = 90.0;
    pub const UPI_TRANSACTIONS: f64 = 15.0;
    pub const DIGITAL_WALLET_USAGE: f64 = 5.0;
    pub const ONLINE_BILL_PAYMENTS: f64 = 50.0;
}

/// Raw CSV/form row keyed by lower-case column name.
pub type RawBorrowerRow = HashMap<String, String>;

/// Turns raw or partially populated records into fully derived borrower profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Profile used when nothing is known about a borrower beyond their id.
    pub fn default_profile(user_id: UserId) -> BorrowerProfile {
        let profile = BorrowerProfile {
            user_id,
            monthly_income: defaults::MONTHLY_INCOME,
            income_type: IncomeType::Salary,
            income_stability_months: defaults::INCOME_STABILITY_MONTHS,
            years_of_employment: defaults::YEARS_OF_EMPLOYMENT,
            savings_rate: defaults::SAVINGS_RATE,
            emergency_savings: defaults::EMERGENCY_SAVINGS,
            monthly_expenses: defaults::MONTHLY_INCOME * defaults::EXPENSE_SHARE,
            city_tier: defaults::CITY_TIER,
            electricity_bill_payment_pct: defaults::ELECTRICITY_PCT,
            mobile_bill_payment_pct: defaults::MOBILE_PCT,
            internet_bill_payment_pct: defaults::INTERNET_PCT,
            rent_payment_pct: defaults::RENT_PCT,
            overall_bill_payment_score: 0.0,
            loan_repayment_history_score: 0.0,
            previous_loan_defaults: 0,
            existing_loan_emi: 0.0,
            credit_card_outstanding: 0.0,
            outstanding_loan_balance: 0.0,
            upi_transactions_per_month: defaults::UPI_TRANSACTIONS,
            digital_wallet_usage: defaults::DIGITAL_WALLET_USAGE,
            online_bill_payments: defaults::ONLINE_BILL_PAYMENTS,
            digital_financial_activity_score: 0.0,
            expense_categories: ExpenseCategories::default(),
            loan_purpose: LoanPurpose::Personal,
            requested_amount: None,
            collateral_offered: false,
        };

        Self::derive(profile)
    }

    /// Build a profile from a raw row, substituting defaults for every missing or
    /// malformed cell. Never fails.
    pub fn from_row(row: &RawBorrowerRow, fallback_id: &str) -> BorrowerProfile {
        let user_id = lookup(row, &["user_id", "id", "borrower_id"])
            .map(str::to_string)
            .unwrap_or_else(|| fallback_id.to_string());

        let mut profile = Self::default_profile(UserId(user_id));

        let income = number(row, &["monthly_income", "income"]);
        if let Some(income) = income {
            profile.monthly_income = income;
        }
        if let Some(income_type) =
            lookup(row, &["income_type", "employment_type"]).and_then(IncomeType::parse)
        {
            profile.income_type = income_type;
        }
        set_number(
            row,
            &["income_stability_months", "income_stability"],
            &mut profile.income_stability_months,
        );
        set_number(
            row,
            &["years_of_employment", "years_employed"],
            &mut profile.years_of_employment,
        );
        set_percent(row, &["savings_rate"], &mut profile.savings_rate);
        set_number(row, &["emergency_savings", "emergency_fund"], &mut profile.emergency_savings);

        // Expenses default relative to the resolved income, not the default income.
        profile.monthly_expenses = number(row, &["monthly_expenses", "expenses"])
            .unwrap_or(profile.monthly_income * defaults::EXPENSE_SHARE);

        if let Some(tier) = number(row, &["city_tier"]) {
            profile.city_tier = tier.round().clamp(1.0, 3.0) as u8;
        }

        set_percent(
            row,
            &["electricity_bill_payment", "electricity_bill_payment_pct"],
            &mut profile.electricity_bill_payment_pct,
        );
        set_percent(
            row,
            &["dth_bill_payment", "mobile_bill_payment", "mobile_bill_payment_pct"],
            &mut profile.mobile_bill_payment_pct,
        );
        set_percent(
            row,
            &["internet_bill_payment", "internet_bill_payment_pct"],
            &mut profile.internet_bill_payment_pct,
        );
        set_percent(
            row,
            &["rent_payment", "rent_payment_pct", "rent_payment_history"],
            &mut profile.rent_payment_pct,
        );

        if let Some(defaults) = number(row, &["previous_loan_defaults", "loan_defaults"]) {
            profile.previous_loan_defaults = defaults.max(0.0).round() as u32;
        }
        set_number(row, &["existing_loan_emi", "existing_emi"], &mut profile.existing_loan_emi);
        set_number(row, &["credit_card_outstanding"], &mut profile.credit_card_outstanding);
        set_number(
            row,
            &["outstanding_loan_balance", "existing_debt"],
            &mut profile.outstanding_loan_balance,
        );
        set_number(
            row,
            &["upi_transactions_per_month", "upi_transactions", "upi_txn"],
            &mut profile.upi_transactions_per_month,
        );
        set_number(
            row,
            &["digital_wallet_usage", "mobile_recharge_frequency"],
            &mut profile.digital_wallet_usage,
        );
        set_percent(row, &["online_bill_payments"], &mut profile.online_bill_payments);

        if let Some(purpose) =
            lookup(row, &["loan_purpose", "purpose"]).and_then(LoanPurpose::parse)
        {
            profile.loan_purpose = purpose;
        }
        profile.requested_amount = number(row, &["requested_amount", "loan_amount"]);
        profile.collateral_offered = lookup(row, &["collateral_offered", "collateral"])
            .map(parse_flag)
            .unwrap_or(false);

        Self::derive(profile)
    }

    /// Build a profile from a loosely typed JSON object. Numbers, strings and booleans
    /// are read like CSV cells; nested values are ignored.
    pub fn from_json(object: &Map<String, Value>, fallback_id: &str) -> BorrowerProfile {
        let row: RawBorrowerRow = object
            .iter()
            .filter_map(|(key, value)| {
                let cell = match value {
                    Value::String(text) => text.clone(),
                    Value::Number(number) => number.to_string(),
                    Value::Bool(flag) => flag.to_string(),
                    _ => return None,
                };
                Some((key.to_ascii_lowercase(), cell))
            })
            .collect();

        Self::from_row(&row, fallback_id)
    }

    /// Clamp raw signals and recompute every derived field.
    pub fn derive(mut profile: BorrowerProfile) -> BorrowerProfile {
        profile.income_stability_months = non_negative(profile.income_stability_months);
        profile.years_of_employment = non_negative(profile.years_of_employment);
        profile.savings_rate = percent(profile.savings_rate);
        profile.emergency_savings = non_negative(profile.emergency_savings);
        profile.monthly_expenses = non_negative(profile.monthly_expenses);
        profile.city_tier = profile.city_tier.clamp(1, 3);

        profile.electricity_bill_payment_pct = percent(profile.electricity_bill_payment_pct);
        profile.mobile_bill_payment_pct = percent(profile.mobile_bill_payment_pct);
        profile.internet_bill_payment_pct = percent(profile.internet_bill_payment_pct);
        profile.rent_payment_pct = percent(profile.rent_payment_pct);

        profile.existing_loan_emi = non_negative(profile.existing_loan_emi);
        profile.credit_card_outstanding = non_negative(profile.credit_card_outstanding);
        profile.outstanding_loan_balance = non_negative(profile.outstanding_loan_balance);
        profile.upi_transactions_per_month = non_negative(profile.upi_transactions_per_month);
        profile.digital_wallet_usage = non_negative(profile.digital_wallet_usage);
        profile.online_bill_payments = percent(profile.online_bill_payments);
        profile.requested_amount = profile
            .requested_amount
            .filter(|amount| amount.is_finite() && *amount > 0.0);

        profile.overall_bill_payment_score = overall_bill_payment_score(&profile);
        profile.loan_repayment_history_score =
            loan_repayment_history_score(profile.previous_loan_defaults);
        profile.digital_financial_activity_score = percent(
            2.0 * profile.upi_transactions_per_month
                + 1.5 * profile.digital_wallet_usage
                + 0.5 * profile.online_bill_payments,
        );
        profile.expense_categories = ExpenseCategories {
            essentials: 0.7 * profile.monthly_expenses,
            discretionary: 0.2 * profile.monthly_expenses,
            investments: 0.1 * profile.monthly_expenses,
        };

        profile
    }
}

pub(crate) fn overall_bill_payment_score(profile: &BorrowerProfile) -> f64 {
    percent(
        0.3 * profile.electricity_bill_payment_pct
            + 0.2 * profile.mobile_bill_payment_pct
            + 0.2 * profile.internet_bill_payment_pct
            + 0.3 * profile.rent_payment_pct,
    )
}

pub(crate) fn loan_repayment_history_score(previous_loan_defaults: u32) -> f64 {
    (90.0 - 30.0 * previous_loan_defaults as f64).max(0.0)
}

pub(crate) fn percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

fn lookup<'a>(row: &'a RawBorrowerRow, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

/// Parse an amount or percentage cell. Accepts a trailing `%`, thousands separators
/// and a leading rupee sign.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('₹')
        .trim_end_matches('%')
        .chars()
        .filter(|ch| *ch != ',' && !ch.is_whitespace())
        .collect();

    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn number(row: &RawBorrowerRow, keys: &[&str]) -> Option<f64> {
    lookup(row, keys).and_then(parse_number)
}

fn set_number(row: &RawBorrowerRow, keys: &[&str], target: &mut f64) {
    if let Some(value) = number(row, keys) {
        *target = value;
    }
}

fn set_percent(row: &RawBorrowerRow, keys: &[&str], target: &mut f64) {
    if let Some(value) = number(row, keys) {
        *target = percent(value);
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}
