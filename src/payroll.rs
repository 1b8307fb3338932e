// ⚖️ Payroll Bookkeeping
// Staff pay items with the invariant:
//   pending_amount = total_pay - paid_amount
// Status moves DRAFT → PARTIAL → PAID as payments accrue and is never
// reversed except by the explicit reopen action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PayrollStatus {
    Draft,
    Partial,
    Paid,
}

impl PayrollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayrollStatus::Draft => "DRAFT",
            PayrollStatus::Partial => "PARTIAL",
            PayrollStatus::Paid => "PAID",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "DRAFT" => Some(PayrollStatus::Draft),
            "PARTIAL" => Some(PayrollStatus::Partial),
            "PAID" => Some(PayrollStatus::Paid),
            _ => None,
        }
    }
}

// ============================================================================
// PAYMENT ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentError {
    NonPositiveAmount { amount: f64 },
    Overpayment { amount: f64, pending: f64 },
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentError::NonPositiveAmount { amount } => {
                write!(f, "Payment amount must be positive, got {:.2}", amount)
            }
            PaymentError::Overpayment { amount, pending } => {
                write!(
                    f,
                    "Payment of {:.2} exceeds pending amount {:.2}",
                    amount, pending
                )
            }
        }
    }
}

impl std::error::Error for PaymentError {}

// ============================================================================
// PAYROLL ITEM
// ============================================================================

/// One recorded payout against a payroll item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollPayment {
    pub id: String,
    pub amount: f64,
    pub paid_at: DateTime<Utc>,
    pub method: String,
    pub note: Option<String>,
}

/// A staff member's pay for one period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollItem {
    pub id: String,
    pub staff_name: String,
    /// Pay period, e.g. "2024-03"
    pub period: String,
    pub total_pay: f64,
    pub paid_amount: f64,
    pub status: PayrollStatus,
    pub payments: Vec<PayrollPayment>,
}

/// Amounts within half a cent are considered settled.
const SETTLE_EPSILON: f64 = 0.005;

impl PayrollItem {
    pub fn new(staff_name: String, period: String, total_pay: f64) -> Self {
        PayrollItem {
            id: uuid::Uuid::new_v4().to_string(),
            staff_name,
            period,
            total_pay,
            paid_amount: 0.0,
            status: PayrollStatus::Draft,
            payments: Vec::new(),
        }
    }

    /// What is still owed. Derived, never stored independently.
    pub fn pending_amount(&self) -> f64 {
        self.total_pay - self.paid_amount
    }

    pub fn is_settled(&self) -> bool {
        self.pending_amount().abs() < SETTLE_EPSILON
    }

    /// Status implied by the amounts alone.
    fn derived_status(&self) -> PayrollStatus {
        if self.is_settled() && self.total_pay > 0.0 {
            PayrollStatus::Paid
        } else if self.paid_amount > 0.0 {
            PayrollStatus::Partial
        } else {
            PayrollStatus::Draft
        }
    }

    /// Record a payout. Accrues `paid_amount`, appends to `payments`,
    /// and advances the status; the status never moves backwards here.
    pub fn record_payment(
        &mut self,
        amount: f64,
        method: String,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(), PaymentError> {
        if amount <= 0.0 {
            return Err(PaymentError::NonPositiveAmount { amount });
        }
        let pending = self.pending_amount();
        if amount > pending + SETTLE_EPSILON {
            return Err(PaymentError::Overpayment { amount, pending });
        }

        self.payments.push(PayrollPayment {
            id: uuid::Uuid::new_v4().to_string(),
            amount,
            paid_at: at,
            method,
            note,
        });
        self.paid_amount += amount;

        // Monotonic: payments only ever advance the status
        let derived = self.derived_status();
        if derived > self.status {
            self.status = derived;
        }

        Ok(())
    }

    /// The one sanctioned reversal: drop a settled or advanced item
    /// back for correction. Amounts are untouched; the status returns
    /// to what the payments justify at most, floored at Partial when
    /// any payment exists.
    pub fn reopen(&mut self) {
        self.status = if self.payments.is_empty() {
            PayrollStatus::Draft
        } else {
            PayrollStatus::Partial
        };
    }
}

// ============================================================================
// RECONCILIATION
// ============================================================================

/// Difference below this is a rounding artifact, not a discrepancy.
const BALANCE_EPSILON: f64 = 0.005;

/// Discrepancies under this many currency units are minor.
const MINOR_TOLERANCE: f64 = 10.0;

/// Outcome of checking a stored payroll item against its own payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReconcileOutcome {
    /// Stored amounts and status agree with the payment trail
    Balanced,

    /// Amounts off by less than the minor tolerance
    MinorDiscrepancy {
        expected_paid: f64,
        stored_paid: f64,
        difference: f64,
    },

    /// Amounts off by the minor tolerance or more
    MajorDiscrepancy {
        expected_paid: f64,
        stored_paid: f64,
        difference: f64,
    },

    /// Amounts agree but the stored status does not match them
    StatusMismatch {
        stored: PayrollStatus,
        expected: PayrollStatus,
    },
}

impl ReconcileOutcome {
    pub fn is_balanced(&self) -> bool {
        matches!(self, ReconcileOutcome::Balanced)
    }
}

/// Validate that `paid_amount` equals the sum of recorded payments and
/// that the status matches the amounts. Run after import and before
/// serving the staff dashboard.
pub fn verify(item: &PayrollItem) -> ReconcileOutcome {
    let expected_paid: f64 = item.payments.iter().map(|p| p.amount).sum();
    let difference = (item.paid_amount - expected_paid).abs();

    if difference >= BALANCE_EPSILON {
        if difference < MINOR_TOLERANCE {
            return ReconcileOutcome::MinorDiscrepancy {
                expected_paid,
                stored_paid: item.paid_amount,
                difference,
            };
        }
        return ReconcileOutcome::MajorDiscrepancy {
            expected_paid,
            stored_paid: item.paid_amount,
            difference,
        };
    }

    let expected_status = if item.is_settled() && item.total_pay > 0.0 {
        PayrollStatus::Paid
    } else if item.paid_amount > 0.0 {
        PayrollStatus::Partial
    } else {
        PayrollStatus::Draft
    };

    // A reopened Paid item legitimately sits at Partial
    let reopened = expected_status == PayrollStatus::Paid && item.status == PayrollStatus::Partial;
    if item.status != expected_status && !reopened {
        return ReconcileOutcome::StatusMismatch {
            stored: item.status,
            expected: expected_status,
        };
    }

    ReconcileOutcome::Balanced
}

// ============================================================================
// FILTERING & PAGINATION
// ============================================================================

/// One page of the staff payroll table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub offset: usize,
    pub limit: usize,
    pub total: usize,
}

pub fn filter_status(items: &[PayrollItem], status: Option<PayrollStatus>) -> Vec<&PayrollItem> {
    items
        .iter()
        .filter(|item| status.map_or(true, |s| item.status == s))
        .collect()
}

/// Slice a page out of the filtered list. An offset past the end
/// yields an empty page, not an error.
pub fn paginate<T: Clone>(items: &[T], offset: usize, limit: usize) -> Page<T> {
    let total = items.len();
    let start = offset.min(total);
    let end = start.saturating_add(limit).min(total);

    Page {
        items: items[start..end].to_vec(),
        offset,
        limit,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(total: f64) -> PayrollItem {
        PayrollItem::new("Ana Torres".to_string(), "2024-03".to_string(), total)
    }

    fn pay(item: &mut PayrollItem, amount: f64) {
        item.record_payment(amount, "CASH".to_string(), None, Utc::now())
            .unwrap();
    }

    #[test]
    fn test_pending_invariant_after_payments() {
        let mut it = item(1000.0);
        assert_eq!(it.pending_amount(), 1000.0);

        pay(&mut it, 250.0);
        pay(&mut it, 250.0);
        assert_eq!(it.pending_amount(), 500.0);
        assert_eq!(it.paid_amount, 500.0);
        assert_eq!(it.total_pay - it.paid_amount, it.pending_amount());
    }

    #[test]
    fn test_status_monotonic_draft_partial_paid() {
        let mut it = item(1000.0);
        assert_eq!(it.status, PayrollStatus::Draft);

        pay(&mut it, 400.0);
        assert_eq!(it.status, PayrollStatus::Partial);

        pay(&mut it, 600.0);
        assert_eq!(it.status, PayrollStatus::Paid);
        assert!(it.is_settled());
    }

    #[test]
    fn test_rejects_overpayment_and_non_positive() {
        let mut it = item(100.0);

        let err = it
            .record_payment(150.0, "CASH".to_string(), None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, PaymentError::Overpayment { .. }));

        let err = it
            .record_payment(0.0, "CASH".to_string(), None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, PaymentError::NonPositiveAmount { .. }));

        // Failed attempts leave no trace
        assert_eq!(it.paid_amount, 0.0);
        assert!(it.payments.is_empty());
        assert_eq!(it.status, PayrollStatus::Draft);
    }

    #[test]
    fn test_reopen_is_the_only_reversal() {
        let mut it = item(500.0);
        pay(&mut it, 500.0);
        assert_eq!(it.status, PayrollStatus::Paid);

        it.reopen();
        assert_eq!(it.status, PayrollStatus::Partial);
        // Amounts untouched by reopen
        assert_eq!(it.paid_amount, 500.0);

        let mut untouched = item(500.0);
        untouched.reopen();
        assert_eq!(untouched.status, PayrollStatus::Draft);
    }

    #[test]
    fn test_settles_through_cent_rounding() {
        let mut it = item(99.99);
        pay(&mut it, 33.33);
        pay(&mut it, 33.33);
        pay(&mut it, 33.33);

        assert!(it.is_settled());
        assert_eq!(it.status, PayrollStatus::Paid);
    }

    #[test]
    fn test_verify_balanced_and_reopened() {
        let mut it = item(800.0);
        pay(&mut it, 300.0);
        assert!(verify(&it).is_balanced());

        pay(&mut it, 500.0);
        assert!(verify(&it).is_balanced());

        it.reopen();
        // Reopened Paid item at Partial still verifies
        assert!(verify(&it).is_balanced());
    }

    #[test]
    fn test_verify_detects_tampered_amounts() {
        let mut it = item(800.0);
        pay(&mut it, 300.0);

        it.paid_amount = 305.0;
        assert!(matches!(
            verify(&it),
            ReconcileOutcome::MinorDiscrepancy { .. }
        ));

        it.paid_amount = 700.0;
        match verify(&it) {
            ReconcileOutcome::MajorDiscrepancy {
                expected_paid,
                stored_paid,
                ..
            } => {
                assert_eq!(expected_paid, 300.0);
                assert_eq!(stored_paid, 700.0);
            }
            other => panic!("expected major discrepancy, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_detects_status_mismatch() {
        let mut it = item(800.0);
        pay(&mut it, 300.0);

        it.status = PayrollStatus::Paid;
        assert_eq!(
            verify(&it),
            ReconcileOutcome::StatusMismatch {
                stored: PayrollStatus::Paid,
                expected: PayrollStatus::Partial,
            }
        );
    }

    #[test]
    fn test_filter_status() {
        let mut a = item(100.0);
        let mut b = item(100.0);
        b.staff_name = "Luis Vega".to_string();
        let c = item(100.0);

        pay(&mut a, 100.0);
        pay(&mut b, 50.0);

        let items = vec![a, b, c];

        assert_eq!(filter_status(&items, None).len(), 3);
        assert_eq!(filter_status(&items, Some(PayrollStatus::Paid)).len(), 1);
        assert_eq!(filter_status(&items, Some(PayrollStatus::Partial)).len(), 1);
        assert_eq!(filter_status(&items, Some(PayrollStatus::Draft)).len(), 1);
    }

    #[test]
    fn test_paginate_clamps() {
        let items: Vec<i32> = (0..25).collect();

        let first = paginate(&items, 0, 10);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total, 25);

        let last = paginate(&items, 20, 10);
        assert_eq!(last.items, vec![20, 21, 22, 23, 24]);

        let past_end = paginate(&items, 100, 10);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 25);
    }
}
