// 🗂️ Catalog - immutable configuration data
// Category tables, payment methods, window presets and display caps
// live here as data, not as literals scattered through the pages.

use crate::db::TransactionKind;

// ============================================================================
// FINANCE CATEGORIES
// ============================================================================

pub const INCOME_CATEGORIES: &[&str] = &[
    "Membership",
    "Personal Training",
    "Day Pass",
    "Supplements",
    "Merchandise",
    "Other Income",
];

pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Equipment",
    "Maintenance",
    "Rent",
    "Utilities",
    "Salaries",
    "Supplements",
    "Marketing",
    "Other Expense",
];

/// Default direction for a known category name, if it is one-sided.
/// "Supplements" appears on both sides (sales vs. restock) and stays
/// undetermined.
pub fn default_kind_for_category(category: &str) -> Option<TransactionKind> {
    let name = category.trim();
    let income = INCOME_CATEGORIES.contains(&name);
    let expense = EXPENSE_CATEGORIES.contains(&name);

    match (income, expense) {
        (true, false) => Some(TransactionKind::Income),
        (false, true) => Some(TransactionKind::Expense),
        _ => None,
    }
}

pub fn is_known_category(category: &str) -> bool {
    let name = category.trim();
    INCOME_CATEGORIES.contains(&name) || EXPENSE_CATEGORIES.contains(&name)
}

// ============================================================================
// PAYMENT METHODS
// ============================================================================

pub const PAYMENT_METHODS: &[&str] = &["CASH", "CARD", "TRANSFER", "ONLINE"];

pub fn is_known_payment_method(method: &str) -> bool {
    PAYMENT_METHODS.contains(&method.trim().to_uppercase().as_str())
}

// ============================================================================
// WINDOW PRESETS & DISPLAY CAPS
// ============================================================================

/// Trailing-window presets offered by the progress page selector.
pub const TRAILING_WINDOW_DAYS: [u32; 3] = [7, 30, 90];

/// The PR table shows at most this many exercises.
pub const PR_TABLE_CAP: usize = 12;

/// The volume chart keeps at most this many grouped days.
pub const VOLUME_DAY_CAP: usize = 90;

/// Placeholder for entries logged without an exercise name.
pub const GENERIC_EXERCISE: &str = "Exercise";

// ============================================================================
// ACHIEVEMENT BADGES
// ============================================================================

/// Badge names shown on the member progress page.
pub const ACHIEVEMENT_BADGES: &[&str] = &[
    "First Session",
    "7-Day Streak",
    "30-Day Streak",
    "50 Sessions",
    "100 Sessions",
    "New Weight PR",
    "New Reps PR",
    "First Biometric Log",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_classification() {
        assert_eq!(
            default_kind_for_category("Membership"),
            Some(TransactionKind::Income)
        );
        assert_eq!(
            default_kind_for_category("Rent"),
            Some(TransactionKind::Expense)
        );
        // Two-sided category stays undetermined
        assert_eq!(default_kind_for_category("Supplements"), None);
        assert_eq!(default_kind_for_category("Unheard Of"), None);
    }

    #[test]
    fn test_known_lookups_trim() {
        assert!(is_known_category(" Membership "));
        assert!(!is_known_category("membership"));
        assert!(is_known_payment_method("cash"));
        assert!(!is_known_payment_method("CRYPTO"));
    }

    #[test]
    fn test_caps_match_dashboard_contract() {
        assert_eq!(TRAILING_WINDOW_DAYS, [7, 30, 90]);
        assert_eq!(PR_TABLE_CAP, 12);
        assert_eq!(VOLUME_DAY_CAP, 90);
    }
}
