// ✅ Boundary Validation
// Imported/fetched records are checked and defaulted HERE, never
// inside the aggregators. Aggregators downstream assume well-formed
// numerics and dates and are not expected to fail on anything that
// passed this layer.

use crate::catalog::{is_known_category, is_known_payment_method};
use crate::db::{BiometricLog, SessionLog, Transaction};
use crate::payroll::{self, PayrollItem};
use serde::{Deserialize, Serialize};

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // Record is unusable for reporting
    Warning,  // Record is questionable or incomplete
    Info,     // Record is valid but could be improved
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub rule_name: String,
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationResult {
    pub fn pass(rule_name: &str, field: &str, message: &str) -> Self {
        ValidationResult {
            passed: true,
            rule_name: rule_name.to_string(),
            field: field.to_string(),
            message: message.to_string(),
            severity: Severity::Info,
        }
    }

    pub fn fail(rule_name: &str, field: &str, message: &str, severity: Severity) -> Self {
        ValidationResult {
            passed: false,
            rule_name: rule_name.to_string(),
            field: field.to_string(),
            message: message.to_string(),
            severity,
        }
    }
}

// ============================================================================
// RECORD REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordReport {
    pub record_id: String,
    pub validations: Vec<ValidationResult>,
    pub passed_count: usize,
    pub failed_count: usize,
    pub needs_review: bool,
}

impl RecordReport {
    fn from_validations(record_id: String, validations: Vec<ValidationResult>) -> Self {
        let passed_count = validations.iter().filter(|v| v.passed).count();
        let failed_count = validations.len() - passed_count;
        let needs_review = validations
            .iter()
            .any(|v| !v.passed && v.severity == Severity::Critical)
            || failed_count >= 2;

        RecordReport {
            record_id,
            validations,
            passed_count,
            failed_count,
            needs_review,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed_count == 0
    }

    pub fn has_critical(&self) -> bool {
        self.validations
            .iter()
            .any(|v| !v.passed && v.severity == Severity::Critical)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} passed, {} failed{}",
            self.record_id,
            self.passed_count,
            self.failed_count,
            if self.needs_review { " (needs review)" } else { "" }
        )
    }
}

/// Counts over a whole imported batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub clean: usize,
    pub with_warnings: usize,
    pub with_critical: usize,
}

pub fn summarize_batch(reports: &[RecordReport]) -> BatchSummary {
    let mut summary = BatchSummary {
        total: reports.len(),
        ..Default::default()
    };

    for report in reports {
        if report.is_clean() {
            summary.clean += 1;
        } else if report.has_critical() {
            summary.with_critical += 1;
        } else {
            summary.with_warnings += 1;
        }
    }

    summary
}

// ============================================================================
// BOUNDS
// ============================================================================

// Plausible human measurement ranges; outside them the value is noise
// from a mistyped form, not a reading.
const WEIGHT_RANGE_KG: (f64, f64) = (20.0, 400.0);
const HEIGHT_RANGE_CM: (f64, f64) = (50.0, 250.0);
const BODY_FAT_RANGE_PCT: (f64, f64) = (1.0, 75.0);
const MUSCLE_RANGE_KG: (f64, f64) = (5.0, 120.0);

fn in_range(value: f64, range: (f64, f64)) -> bool {
    value.is_finite() && value >= range.0 && value <= range.1
}

// ============================================================================
// TRANSACTIONS
// ============================================================================

pub fn validate_transaction(tx: &Transaction) -> RecordReport {
    let mut validations = Vec::new();

    // Rule 1: amount is finite and non-negative (direction lives in `kind`)
    if tx.amount.is_finite() && tx.amount >= 0.0 {
        validations.push(ValidationResult::pass("amount_valid", "amount", "OK"));
    } else {
        validations.push(ValidationResult::fail(
            "amount_valid",
            "amount",
            &format!("Amount must be a non-negative number, got {}", tx.amount),
            Severity::Critical,
        ));
    }

    // Rule 2: category is one of the catalog tables
    if is_known_category(&tx.category) {
        validations.push(ValidationResult::pass("category_known", "category", "OK"));
    } else {
        validations.push(ValidationResult::fail(
            "category_known",
            "category",
            &format!("Unknown category: {:?}", tx.category),
            Severity::Warning,
        ));
    }

    // Rule 3: payment method is known when present
    if tx.payment_method.is_empty() || is_known_payment_method(&tx.payment_method) {
        validations.push(ValidationResult::pass(
            "payment_method_known",
            "payment_method",
            "OK",
        ));
    } else {
        validations.push(ValidationResult::fail(
            "payment_method_known",
            "payment_method",
            &format!("Unknown payment method: {:?}", tx.payment_method),
            Severity::Warning,
        ));
    }

    // Rule 4: description present
    if tx.description.trim().is_empty() {
        validations.push(ValidationResult::fail(
            "description_present",
            "description",
            "Description is empty",
            Severity::Info,
        ));
    } else {
        validations.push(ValidationResult::pass(
            "description_present",
            "description",
            "OK",
        ));
    }

    RecordReport::from_validations(tx.id.clone(), validations)
}

// ============================================================================
// BIOMETRICS
// ============================================================================

pub fn validate_biometric(log: &BiometricLog) -> RecordReport {
    let mut validations = Vec::new();

    let checks: [(&str, Option<f64>, (f64, f64)); 4] = [
        ("weight_kg", log.weight_kg, WEIGHT_RANGE_KG),
        ("height_cm", log.height_cm, HEIGHT_RANGE_CM),
        ("body_fat_pct", log.body_fat_pct, BODY_FAT_RANGE_PCT),
        ("muscle_mass_kg", log.muscle_mass_kg, MUSCLE_RANGE_KG),
    ];

    let mut any_present = false;
    for (field, value, range) in checks {
        match value {
            None => {
                // Absence is legal; the series builder drops the point
                validations.push(ValidationResult::pass("metric_optional", field, "absent"));
            }
            Some(v) if in_range(v, range) => {
                any_present = true;
                validations.push(ValidationResult::pass("metric_in_range", field, "OK"));
            }
            Some(v) => {
                validations.push(ValidationResult::fail(
                    "metric_in_range",
                    field,
                    &format!("Value {} outside plausible range {:?}", v, range),
                    Severity::Warning,
                ));
            }
        }
    }

    if !any_present {
        validations.push(ValidationResult::fail(
            "any_metric_present",
            "*",
            "Log carries no measurement at all",
            Severity::Warning,
        ));
    }

    RecordReport::from_validations(format!("{}@{}", log.member_id, log.date), validations)
}

/// Clear implausible or non-finite measurements to None so the series
/// builder drops them instead of charting noise.
pub fn sanitize_biometric(log: &mut BiometricLog) {
    fn keep(value: Option<f64>, range: (f64, f64)) -> Option<f64> {
        value.filter(|v| in_range(*v, range))
    }

    log.weight_kg = keep(log.weight_kg, WEIGHT_RANGE_KG);
    log.height_cm = keep(log.height_cm, HEIGHT_RANGE_CM);
    log.body_fat_pct = keep(log.body_fat_pct, BODY_FAT_RANGE_PCT);
    log.muscle_mass_kg = keep(log.muscle_mass_kg, MUSCLE_RANGE_KG);
}

// ============================================================================
// SESSIONS
// ============================================================================

pub fn validate_session(session: &SessionLog) -> RecordReport {
    let mut validations = Vec::new();

    if session.entries.is_empty() {
        validations.push(ValidationResult::fail(
            "entries_present",
            "entries",
            "Session has no entries",
            Severity::Warning,
        ));
    } else {
        validations.push(ValidationResult::pass("entries_present", "entries", "OK"));
    }

    for (i, entry) in session.entries.iter().enumerate() {
        let field = format!("entries[{}]", i);

        if entry.sets_completed == 0 || entry.reps_completed == 0 {
            validations.push(ValidationResult::fail(
                "work_recorded",
                &field,
                "Zero sets or reps; entry contributes no volume",
                Severity::Info,
            ));
        } else {
            validations.push(ValidationResult::pass("work_recorded", &field, "OK"));
        }

        match entry.weight_kg {
            Some(w) if !w.is_finite() || w < 0.0 => {
                validations.push(ValidationResult::fail(
                    "weight_valid",
                    &field,
                    &format!("Weight {} is not a usable load", w),
                    Severity::Warning,
                ));
            }
            _ => validations.push(ValidationResult::pass("weight_valid", &field, "OK")),
        }
    }

    RecordReport::from_validations(session.id.clone(), validations)
}

/// Clear unusable entry weights so volume and PR aggregation treat the
/// entry as bodyweight work rather than folding garbage into sums.
pub fn sanitize_session(session: &mut SessionLog) {
    for entry in &mut session.entries {
        if let Some(w) = entry.weight_kg {
            if !w.is_finite() || w < 0.0 {
                entry.weight_kg = None;
            }
        }
    }
}

// ============================================================================
// PAYROLL
// ============================================================================

pub fn validate_payroll(item: &PayrollItem) -> RecordReport {
    let mut validations = Vec::new();

    if item.total_pay.is_finite() && item.total_pay >= 0.0 {
        validations.push(ValidationResult::pass("total_valid", "total_pay", "OK"));
    } else {
        validations.push(ValidationResult::fail(
            "total_valid",
            "total_pay",
            &format!("Total pay must be non-negative, got {}", item.total_pay),
            Severity::Critical,
        ));
    }

    if item.paid_amount > item.total_pay + 0.005 {
        validations.push(ValidationResult::fail(
            "paid_within_total",
            "paid_amount",
            &format!(
                "Paid {:.2} exceeds total {:.2}",
                item.paid_amount, item.total_pay
            ),
            Severity::Critical,
        ));
    } else {
        validations.push(ValidationResult::pass(
            "paid_within_total",
            "paid_amount",
            "OK",
        ));
    }

    match payroll::verify(item) {
        outcome if outcome.is_balanced() => {
            validations.push(ValidationResult::pass("reconciled", "payments", "OK"));
        }
        payroll::ReconcileOutcome::MinorDiscrepancy { difference, .. } => {
            validations.push(ValidationResult::fail(
                "reconciled",
                "payments",
                &format!("Paid amount off by {:.2} against payment trail", difference),
                Severity::Warning,
            ));
        }
        payroll::ReconcileOutcome::MajorDiscrepancy { difference, .. } => {
            validations.push(ValidationResult::fail(
                "reconciled",
                "payments",
                &format!("Paid amount off by {:.2} against payment trail", difference),
                Severity::Critical,
            ));
        }
        payroll::ReconcileOutcome::StatusMismatch { stored, expected } => {
            validations.push(ValidationResult::fail(
                "status_consistent",
                "status",
                &format!("Stored {:?} but amounts imply {:?}", stored, expected),
                Severity::Warning,
            ));
        }
        _ => {}
    }

    RecordReport::from_validations(item.id.clone(), validations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{parse_timestamp, SessionEntry, TransactionKind};
    use chrono::NaiveDate;

    fn tx(amount: f64, category: &str) -> Transaction {
        Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            date: parse_timestamp("2024-01-01").unwrap(),
            amount,
            kind: TransactionKind::Income,
            category: category.to_string(),
            description: "monthly fee".to_string(),
            payment_method: "CASH".to_string(),
        }
    }

    fn bio(weight: Option<f64>, height: Option<f64>) -> BiometricLog {
        BiometricLog {
            member_id: "m-1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            weight_kg: weight,
            height_cm: height,
            body_fat_pct: None,
            muscle_mass_kg: None,
        }
    }

    #[test]
    fn test_clean_transaction_passes() {
        let report = validate_transaction(&tx(50.0, "Membership"));
        assert!(report.is_clean());
        assert!(!report.needs_review);
    }

    #[test]
    fn test_negative_amount_is_critical() {
        let report = validate_transaction(&tx(-50.0, "Membership"));
        assert!(report.has_critical());
        assert!(report.needs_review);
    }

    #[test]
    fn test_unknown_category_is_warning_only() {
        let report = validate_transaction(&tx(50.0, "Mystery"));
        assert!(!report.is_clean());
        assert!(!report.has_critical());
    }

    #[test]
    fn test_biometric_out_of_range_flagged_and_sanitized() {
        let mut log = bio(Some(8000.0), Some(180.0));

        let report = validate_biometric(&log);
        assert!(!report.is_clean());

        sanitize_biometric(&mut log);
        // Implausible weight cleared to absent, plausible height kept
        assert_eq!(log.weight_kg, None);
        assert_eq!(log.height_cm, Some(180.0));
    }

    #[test]
    fn test_empty_biometric_log_warns() {
        let report = validate_biometric(&bio(None, None));
        assert!(!report.is_clean());
        assert!(!report.has_critical());
    }

    #[test]
    fn test_session_sanitize_clears_bad_weights() {
        let mut session = SessionLog {
            id: "s-1".to_string(),
            member_id: "m-1".to_string(),
            performed_at: parse_timestamp("2024-01-01T10:00:00Z").unwrap(),
            entries: vec![
                SessionEntry {
                    exercise_name: "Squat".to_string(),
                    sets_completed: 3,
                    reps_completed: 5,
                    weight_kg: Some(-10.0),
                },
                SessionEntry {
                    exercise_name: "Bench".to_string(),
                    sets_completed: 3,
                    reps_completed: 5,
                    weight_kg: Some(60.0),
                },
            ],
        };

        assert!(!validate_session(&session).is_clean());

        sanitize_session(&mut session);
        assert_eq!(session.entries[0].weight_kg, None);
        assert_eq!(session.entries[1].weight_kg, Some(60.0));
    }

    #[test]
    fn test_payroll_tamper_detected() {
        let mut item = PayrollItem::new("Ana".to_string(), "2024-01".to_string(), 500.0);
        item.record_payment(100.0, "CASH".to_string(), None, chrono::Utc::now())
            .unwrap();

        assert!(validate_payroll(&item).is_clean());

        item.paid_amount = 400.0;
        let report = validate_payroll(&item);
        assert!(report.has_critical());
    }

    #[test]
    fn test_batch_summary_buckets() {
        let reports = vec![
            validate_transaction(&tx(50.0, "Membership")),
            validate_transaction(&tx(50.0, "Mystery")),
            validate_transaction(&tx(f64::NAN, "Membership")),
        ];

        let summary = summarize_batch(&reports);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.clean, 1);
        assert_eq!(summary.with_warnings, 1);
        assert_eq!(summary.with_critical, 1);
    }
}
