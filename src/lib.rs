// Gympulse - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod db;
pub mod catalog;     // Immutable configuration data - categories, caps, badges
pub mod finance;     // Financial summary aggregator
pub mod progress;    // Biometric metric time series
pub mod training;    // Session volume + personal records
pub mod payroll;     // Staff payroll bookkeeping
pub mod validate;    // Boundary validation and sanitization
pub mod locale;      // Locale resource map for the dashboard pages

// Re-export commonly used types
pub use db::{
    Transaction, TransactionKind, BiometricLog, SessionLog, SessionEntry,
    setup_database, parse_timestamp,
    load_transactions_csv, load_biometrics_csv, load_sessions_json, load_payroll_csv,
    insert_transactions, insert_biometrics, insert_sessions, insert_payroll_items,
    get_all_transactions, get_biometrics_for_member, get_sessions_for_member,
    get_payroll_items, get_payroll_item, update_payroll_item,
    list_member_ids, count_transactions, count_biometrics, count_sessions,
};
pub use finance::{DateWindow, FinanceSummary, filter_window, summarize};
pub use progress::{MetricKey, MetricPoint, TrailingWindow, build_series};
pub use training::{DailyVolume, ExerciseRecord, daily_volume, personal_records};
pub use payroll::{
    PayrollItem, PayrollPayment, PayrollStatus, PaymentError, Page, ReconcileOutcome,
    filter_status, paginate, verify,
};
pub use validate::{
    BatchSummary, RecordReport, Severity, ValidationResult,
    sanitize_biometric, sanitize_session, summarize_batch,
    validate_biometric, validate_payroll, validate_session, validate_transaction,
};
pub use locale::{Locale, TextKey, text};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
