//! Event-driven re-scoring.
//!
//! Each borrower owns a [`BorrowerLedger`]: the enrolled profile snapshot, a trailing
//! window of transaction events, every score produced so far and the append-only
//! change history. A ledger is only touched while its own mutex is held, so two
//! events for the same borrower are applied one after the other while different
//! borrowers proceed in parallel.
//!
//! Aggregation policy: the enrolled snapshot counts as `prior_weight` observations
//! (six months of history by default). Each punctuality percentage becomes
//! `(prior_weight * baseline + sum(credits)) / (prior_weight + n)` over the events
//! in the window, where a credit is 100 on time, 50 late and 0 failed. The window
//! spans `window_days` back from the newest event timestamp.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Duration;
use serde::Serialize;
use tracing::info;

use super::domain::{
    BorrowerProfile, ProfileError, ScoreChange, TransactionEvent, TransactionKind,
    TransactionStatus, UserId,
};
use super::evaluation::{ScoreResult, ScoringEngine};
use super::features::{percent, FeatureExtractor};

pub const DEFAULT_WINDOW_DAYS: i64 = 180;
pub const DEFAULT_PRIOR_WEIGHT: f64 = 6.0;
/// Ten years; longer windows are clamped.
pub const MAX_WINDOW_DAYS: i64 = 3_650;

/// Window and weighting used when folding events into a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescoringPolicy {
    pub window_days: i64,
    pub prior_weight: f64,
}

impl RescoringPolicy {
    pub fn with_window_days(window_days: i64) -> Self {
        Self {
            window_days: window_days.clamp(1, MAX_WINDOW_DAYS),
            ..Self::default()
        }
    }

    fn window_months(&self) -> f64 {
        (self.window_days as f64 / 30.0).max(1.0)
    }
}

impl Default for RescoringPolicy {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            prior_weight: DEFAULT_PRIOR_WEIGHT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RescoreError {
    #[error("transaction amount must be positive (found {0})")]
    InvalidAmount(f64),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error("borrower {0} has not been enrolled")]
    UnknownBorrower(UserId),
    #[error("ledger for borrower {0} is poisoned by a failed update")]
    LedgerPoisoned(UserId),
}

/// Result of applying one transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionOutcome {
    pub result: ScoreResult,
    pub change: ScoreChange,
}

#[derive(Debug)]
struct BorrowerLedger {
    baseline: BorrowerProfile,
    /// Sorted by timestamp, oldest first.
    events: Vec<TransactionEvent>,
    results: Vec<ScoreResult>,
    changes: Vec<ScoreChange>,
}

impl BorrowerLedger {
    fn new(baseline: BorrowerProfile) -> Self {
        Self {
            baseline,
            events: Vec::new(),
            results: Vec::new(),
            changes: Vec::new(),
        }
    }

    fn current_score(&self) -> Option<u16> {
        self.results.last().map(|result| result.credit_score)
    }

    fn insert_event(&mut self, event: TransactionEvent, policy: &RescoringPolicy) {
        let position = self
            .events
            .partition_point(|existing| existing.timestamp <= event.timestamp);
        self.events.insert(position, event);

        // A window that does not fit the calendar keeps every event.
        let cutoff = self.events.last().and_then(|newest| {
            Duration::try_days(policy.window_days)
                .and_then(|window| newest.timestamp.checked_sub_signed(window))
        });
        if let Some(cutoff) = cutoff {
            self.events.retain(|event| event.timestamp >= cutoff);
        }
    }
}

/// Per-borrower incremental scoring with serialized updates.
pub struct DynamicRescorer {
    engine: Arc<ScoringEngine>,
    policy: RescoringPolicy,
    ledgers: Mutex<HashMap<UserId, Arc<Mutex<BorrowerLedger>>>>,
}

impl DynamicRescorer {
    pub fn new(engine: Arc<ScoringEngine>, policy: RescoringPolicy) -> Self {
        Self {
            engine,
            policy,
            ledgers: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &RescoringPolicy {
        &self.policy
    }

    /// Register (or replace) the borrower's baseline snapshot and score it. Events
    /// already in the window are folded onto the new baseline.
    pub fn enroll(&self, profile: BorrowerProfile) -> Result<ScoreResult, RescoreError> {
        let profile = FeatureExtractor::derive(profile);
        profile.validate()?;

        let user_id = profile.user_id.clone();
        let slot = self.slot(&user_id, || profile.clone())?;
        let mut ledger = slot
            .lock()
            .map_err(|_| RescoreError::LedgerPoisoned(user_id.clone()))?;

        ledger.baseline = profile;
        let effective = fold_events(&ledger.baseline, &ledger.events, &self.policy);
        let result = self.engine.score(&effective);
        ledger.results.push(result.clone());

        info!(%user_id, credit_score = result.credit_score, "enrolled borrower baseline");
        Ok(result)
    }

    /// Fold a new event into the borrower's rolling aggregates, re-score, and record
    /// the change. Borrowers seen for the first time start from the default profile.
    pub fn apply_transaction(
        &self,
        user_id: &UserId,
        event: TransactionEvent,
    ) -> Result<TransactionOutcome, RescoreError> {
        if !event.amount.is_finite() || event.amount <= 0.0 {
            return Err(RescoreError::InvalidAmount(event.amount));
        }

        let slot = self.slot(user_id, || FeatureExtractor::default_profile(user_id.clone()))?;
        let mut ledger = slot
            .lock()
            .map_err(|_| RescoreError::LedgerPoisoned(user_id.clone()))?;

        let old_score = match ledger.current_score() {
            Some(score) => score,
            None => {
                let baseline = fold_events(&ledger.baseline, &ledger.events, &self.policy);
                let result = self.engine.score(&baseline);
                let score = result.credit_score;
                ledger.results.push(result);
                score
            }
        };

        let timestamp = event.timestamp;
        let reason_event = event.clone();
        ledger.insert_event(event, &self.policy);

        let effective = fold_events(&ledger.baseline, &ledger.events, &self.policy);
        let result = self.engine.score(&effective);
        let delta = result.credit_score as i32 - old_score as i32;
        let change = ScoreChange {
            old_score,
            new_score: result.credit_score,
            delta,
            reason: change_reason(&reason_event, delta),
            timestamp,
        };

        ledger.results.push(result.clone());
        ledger.changes.push(change.clone());

        info!(
            %user_id,
            kind = reason_event.kind.label(),
            old_score,
            new_score = result.credit_score,
            delta,
            "rescored borrower after transaction"
        );

        Ok(TransactionOutcome { result, change })
    }

    /// Drop every event in the window and publish a fresh baseline score. Past
    /// results and changes are retained.
    pub fn clear_transactions(&self, user_id: &UserId) -> Result<ScoreResult, RescoreError> {
        let slot = self.existing_slot(user_id)?;
        let mut ledger = slot
            .lock()
            .map_err(|_| RescoreError::LedgerPoisoned(user_id.clone()))?;

        let cleared = ledger.events.len();
        ledger.events.clear();
        let result = self.engine.score(&ledger.baseline);
        ledger.results.push(result.clone());

        info!(
            %user_id,
            cleared,
            credit_score = result.credit_score,
            "cleared borrower transactions"
        );
        Ok(result)
    }

    pub fn current(&self, user_id: &UserId) -> Result<Option<ScoreResult>, RescoreError> {
        self.read(user_id, |ledger| ledger.results.last().cloned())
    }

    /// Every result produced for the borrower, oldest first.
    pub fn results(&self, user_id: &UserId) -> Result<Vec<ScoreResult>, RescoreError> {
        self.read(user_id, |ledger| ledger.results.clone())
    }

    /// Score changes, newest first.
    pub fn history(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ScoreChange>, RescoreError> {
        self.read(user_id, |ledger| {
            ledger.changes.iter().rev().take(limit).cloned().collect()
        })
    }

    /// Events still inside the window, newest first.
    pub fn transactions(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<TransactionEvent>, RescoreError> {
        self.read(user_id, |ledger| {
            ledger.events.iter().rev().take(limit).cloned().collect()
        })
    }

    /// Profile currently used for scoring, after folding the event window.
    pub fn effective_profile(&self, user_id: &UserId) -> Result<BorrowerProfile, RescoreError> {
        self.read(user_id, |ledger| {
            fold_events(&ledger.baseline, &ledger.events, &self.policy)
        })
    }

    pub fn window_len(&self, user_id: &UserId) -> Result<usize, RescoreError> {
        self.read(user_id, |ledger| ledger.events.len())
    }

    fn read<T>(
        &self,
        user_id: &UserId,
        f: impl FnOnce(&BorrowerLedger) -> T,
    ) -> Result<T, RescoreError> {
        let slot = self.existing_slot(user_id)?;
        let ledger = slot
            .lock()
            .map_err(|_| RescoreError::LedgerPoisoned(user_id.clone()))?;
        Ok(f(&ledger))
    }

    fn existing_slot(&self, user_id: &UserId) -> Result<Arc<Mutex<BorrowerLedger>>, RescoreError> {
        let ledgers = self
            .ledgers
            .lock()
            .map_err(|_| RescoreError::LedgerPoisoned(user_id.clone()))?;
        ledgers
            .get(user_id)
            .cloned()
            .ok_or_else(|| RescoreError::UnknownBorrower(user_id.clone()))
    }

    fn slot(
        &self,
        user_id: &UserId,
        baseline: impl FnOnce() -> BorrowerProfile,
    ) -> Result<Arc<Mutex<BorrowerLedger>>, RescoreError> {
        let mut ledgers = self
            .ledgers
            .lock()
            .map_err(|_| RescoreError::LedgerPoisoned(user_id.clone()))?;
        Ok(ledgers
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(BorrowerLedger::new(baseline()))))
            .clone())
    }
}

#[derive(Default)]
struct RollingAverage {
    total: f64,
    count: usize,
}

impl RollingAverage {
    fn push(&mut self, credit: f64) {
        self.total += credit;
        self.count += 1;
    }

    fn blend(&self, baseline: f64, prior_weight: f64) -> f64 {
        if self.count == 0 {
            return baseline;
        }
        percent((prior_weight * baseline + self.total) / (prior_weight + self.count as f64))
    }
}

/// Apply the window of events to the baseline snapshot.
pub(crate) fn fold_events(
    baseline: &BorrowerProfile,
    events: &[TransactionEvent],
    policy: &RescoringPolicy,
) -> BorrowerProfile {
    let mut electricity = RollingAverage::default();
    let mut mobile = RollingAverage::default();
    let mut internet = RollingAverage::default();
    let mut rent = RollingAverage::default();
    let mut repayment = RollingAverage::default();
    let mut unpaid_credit = 0.0;
    let mut salary_credits = 0.0;
    let mut settled = 0.0;

    for event in events {
        let credit = event.status.punctuality_credit();
        match event.kind {
            TransactionKind::Electricity => electricity.push(credit),
            TransactionKind::Mobile => mobile.push(credit),
            TransactionKind::Internet => internet.push(credit),
            TransactionKind::Rent => rent.push(credit),
            kind if kind.is_credit_repayment() => {
                repayment.push(credit);
                if event.status == TransactionStatus::Failed {
                    unpaid_credit += event.amount;
                }
            }
            TransactionKind::Salary => {
                if event.status == TransactionStatus::PaidOnTime {
                    salary_credits += 1.0;
                }
            }
            _ => {}
        }

        if event.status != TransactionStatus::Failed {
            settled += 1.0;
        }
    }

    let weight = policy.prior_weight;
    let mut profile = baseline.clone();
    profile.electricity_bill_payment_pct =
        electricity.blend(baseline.electricity_bill_payment_pct, weight);
    profile.mobile_bill_payment_pct = mobile.blend(baseline.mobile_bill_payment_pct, weight);
    profile.internet_bill_payment_pct = internet.blend(baseline.internet_bill_payment_pct, weight);
    profile.rent_payment_pct = rent.blend(baseline.rent_payment_pct, weight);
    profile.credit_card_outstanding += unpaid_credit;
    profile.income_stability_months += salary_credits;
    profile.upi_transactions_per_month += settled / policy.window_months();

    let mut derived = FeatureExtractor::derive(profile);
    derived.loan_repayment_history_score =
        repayment.blend(derived.loan_repayment_history_score, weight);
    derived
}

fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Human-readable explanation of a score movement.
pub(crate) fn change_reason(event: &TransactionEvent, delta: i32) -> String {
    let kind = title_case(event.kind.label());
    let amount = event.amount;

    if delta > 0 {
        match event.status {
            TransactionStatus::PaidOnTime => {
                format!("{kind} bill (₹{amount:.0}) paid on time -> +{delta} points")
            }
            _ => format!("{kind} transaction added -> +{delta} points"),
        }
    } else if delta < 0 {
        match event.status {
            TransactionStatus::PaidLate => format!(
                "{kind} bill (₹{amount:.0}) paid {} days late -> {delta} points",
                event.days_late
            ),
            TransactionStatus::Failed => {
                format!("{kind} payment (₹{amount:.0}) failed -> {delta} points")
            }
            TransactionStatus::PaidOnTime => format!("{kind} transaction impact -> {delta} points"),
        }
    } else {
        format!("{kind} transaction added (no score impact)")
    }
}
