// 🌐 Locale resource map
// One parameterized string table for the dashboard pages instead of
// per-page inline dictionaries. Missing translations fall back to
// English.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Es,
}

impl Locale {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "en" => Some(Locale::En),
            "es" => Some(Locale::Es),
            _ => None,
        }
    }
}

/// Every user-visible heading the dashboard pages share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    DashboardTitle,
    FinanceLedger,
    MemberProgress,
    Payroll,
    TotalIncome,
    TotalExpenses,
    NetProfit,
    Transactions,
    Sessions,
    Volume,
    PersonalRecords,
    BestWeight,
    BestReps,
    Weight,
    BodyFat,
    MuscleMass,
    StatusDraft,
    StatusPartial,
    StatusPaid,
    Pending,
    PaidAmount,
    TotalPay,
    NoData,
}

fn english(key: TextKey) -> &'static str {
    match key {
        TextKey::DashboardTitle => "Club Dashboard",
        TextKey::FinanceLedger => "Finance Ledger",
        TextKey::MemberProgress => "Member Progress",
        TextKey::Payroll => "Payroll",
        TextKey::TotalIncome => "Total Income",
        TextKey::TotalExpenses => "Total Expenses",
        TextKey::NetProfit => "Net Profit",
        TextKey::Transactions => "Transactions",
        TextKey::Sessions => "Sessions",
        TextKey::Volume => "Volume",
        TextKey::PersonalRecords => "Personal Records",
        TextKey::BestWeight => "Best Weight",
        TextKey::BestReps => "Best Reps",
        TextKey::Weight => "Weight",
        TextKey::BodyFat => "Body Fat",
        TextKey::MuscleMass => "Muscle Mass",
        TextKey::StatusDraft => "Draft",
        TextKey::StatusPartial => "Partial",
        TextKey::StatusPaid => "Paid",
        TextKey::Pending => "Pending",
        TextKey::PaidAmount => "Paid",
        TextKey::TotalPay => "Total Pay",
        TextKey::NoData => "No data for this period",
    }
}

fn spanish(key: TextKey) -> Option<&'static str> {
    match key {
        TextKey::DashboardTitle => Some("Panel del Club"),
        TextKey::FinanceLedger => Some("Libro de Finanzas"),
        TextKey::MemberProgress => Some("Progreso del Socio"),
        TextKey::Payroll => Some("Nómina"),
        TextKey::TotalIncome => Some("Ingresos Totales"),
        TextKey::TotalExpenses => Some("Gastos Totales"),
        TextKey::NetProfit => Some("Beneficio Neto"),
        TextKey::Transactions => Some("Transacciones"),
        TextKey::Sessions => Some("Sesiones"),
        TextKey::Volume => Some("Volumen"),
        TextKey::PersonalRecords => Some("Récords Personales"),
        TextKey::BestWeight => Some("Mejor Peso"),
        TextKey::BestReps => Some("Mejores Repeticiones"),
        TextKey::Weight => Some("Peso"),
        TextKey::BodyFat => Some("Grasa Corporal"),
        TextKey::MuscleMass => Some("Masa Muscular"),
        TextKey::StatusDraft => Some("Borrador"),
        TextKey::StatusPartial => Some("Parcial"),
        TextKey::StatusPaid => Some("Pagado"),
        TextKey::Pending => Some("Pendiente"),
        TextKey::PaidAmount => Some("Pagado"),
        TextKey::TotalPay => Some("Pago Total"),
        TextKey::NoData => Some("Sin datos para este período"),
    }
}

/// Resolve a heading for the requested locale, falling back to
/// English when the translation is missing.
pub fn text(locale: Locale, key: TextKey) -> &'static str {
    match locale {
        Locale::En => english(key),
        Locale::Es => spanish(key).unwrap_or_else(|| english(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KEYS: &[TextKey] = &[
        TextKey::DashboardTitle,
        TextKey::FinanceLedger,
        TextKey::MemberProgress,
        TextKey::Payroll,
        TextKey::TotalIncome,
        TextKey::TotalExpenses,
        TextKey::NetProfit,
        TextKey::Transactions,
        TextKey::Sessions,
        TextKey::Volume,
        TextKey::PersonalRecords,
        TextKey::BestWeight,
        TextKey::BestReps,
        TextKey::Weight,
        TextKey::BodyFat,
        TextKey::MuscleMass,
        TextKey::StatusDraft,
        TextKey::StatusPartial,
        TextKey::StatusPaid,
        TextKey::Pending,
        TextKey::PaidAmount,
        TextKey::TotalPay,
        TextKey::NoData,
    ];

    #[test]
    fn test_every_key_has_english_text() {
        for key in ALL_KEYS {
            assert!(!text(Locale::En, *key).is_empty());
        }
    }

    #[test]
    fn test_spanish_resolves_or_falls_back() {
        for key in ALL_KEYS {
            assert!(!text(Locale::Es, *key).is_empty());
        }
        assert_eq!(text(Locale::Es, TextKey::Payroll), "Nómina");
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!(Locale::parse("ES"), Some(Locale::Es));
        assert_eq!(Locale::parse(" en "), Some(Locale::En));
        assert_eq!(Locale::parse("fr"), None);
    }
}
