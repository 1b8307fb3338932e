use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::payroll::{PayrollItem, PayrollPayment, PayrollStatus};

// ============================================================================
// TRANSACTION
// ============================================================================

/// Direction of money movement for a club transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "INCOME",
            TransactionKind::Expense => "EXPENSE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "INCOME" => Some(TransactionKind::Income),
            "EXPENSE" => Some(TransactionKind::Expense),
            _ => None,
        }
    }
}

/// Club finance transaction - a read-only snapshot once imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Stable identity (UUID) - never changes after import
    #[serde(default = "default_uuid")]
    pub id: String,

    /// When the money moved (full timestamp; reports truncate to date)
    pub date: DateTime<Utc>,

    /// Always non-negative; direction comes from `kind`
    pub amount: f64,

    pub kind: TransactionKind,

    pub category: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub payment_method: String,
}

fn default_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Transaction {
    /// Calendar date of the transaction, used by window filters.
    pub fn date_only(&self) -> NaiveDate {
        self.date.date_naive()
    }

    /// Compute idempotency hash for duplicate detection on re-import.
    /// Identity = id (UUID), deduplication = hash.
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}{}{}{}",
            self.date.to_rfc3339(),
            self.amount,
            self.kind.as_str(),
            self.category
        ));
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// BIOMETRIC LOG
// ============================================================================

/// Dated snapshot of a member's body measurements.
/// Any numeric field may be absent; absence is preserved, never zeroed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiometricLog {
    pub member_id: String,
    pub date: NaiveDate,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub muscle_mass_kg: Option<f64>,
}

// ============================================================================
// WORKOUT SESSION LOG
// ============================================================================

/// One exercise block inside a workout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    #[serde(default)]
    pub exercise_name: String,
    pub sets_completed: u32,
    pub reps_completed: u32,
    pub weight_kg: Option<f64>,
}

/// A logged workout session with its entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    #[serde(default = "default_uuid")]
    pub id: String,
    pub member_id: String,
    pub performed_at: DateTime<Utc>,
    #[serde(default)]
    pub entries: Vec<SessionEntry>,
}

impl SessionLog {
    /// Calendar day the session belongs to, regardless of time-of-day.
    pub fn day(&self) -> NaiveDate {
        self.performed_at.date_naive()
    }

    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}{}{}",
            self.member_id,
            self.performed_at.to_rfc3339(),
            self.entries.len()
        ));
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// TIMESTAMP PARSING
// ============================================================================

/// Parse an export timestamp: RFC 3339, or a bare calendar date
/// (interpreted as midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()?;
    Some(DateTime::from_naive_utc_and_offset(
        date.and_hms_opt(0, 0, 0)?,
        Utc,
    ))
}

// ============================================================================
// DATABASE SETUP
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            idempotency_hash TEXT UNIQUE NOT NULL,
            tx_uuid TEXT UNIQUE NOT NULL,
            date TEXT NOT NULL,
            amount REAL NOT NULL,
            kind TEXT NOT NULL,
            category TEXT NOT NULL,
            description TEXT,
            payment_method TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS biometrics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id TEXT NOT NULL,
            date TEXT NOT NULL,
            weight_kg REAL,
            height_cm REAL,
            body_fat_pct REAL,
            muscle_mass_kg REAL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(member_id, date)
        )",
        [],
    )?;

    // Session entries ride along as a JSON column; the aggregators
    // always consume whole sessions, never individual entry rows.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS session_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            idempotency_hash TEXT UNIQUE NOT NULL,
            session_uuid TEXT UNIQUE NOT NULL,
            member_id TEXT NOT NULL,
            performed_at TEXT NOT NULL,
            entries TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS payroll_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_uuid TEXT UNIQUE NOT NULL,
            staff_name TEXT NOT NULL,
            period TEXT NOT NULL,
            total_pay REAL NOT NULL,
            paid_amount REAL NOT NULL DEFAULT 0,
            status TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(staff_name, period)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS payroll_payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            payment_uuid TEXT UNIQUE NOT NULL,
            item_uuid TEXT NOT NULL,
            amount REAL NOT NULL,
            paid_at TEXT NOT NULL,
            method TEXT NOT NULL,
            note TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tx_date ON transactions(date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tx_kind ON transactions(kind)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bio_member ON biometrics(member_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_member ON session_logs(member_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_payments_item ON payroll_payments(item_uuid)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// CSV / JSON IMPORT
// ============================================================================

/// CSV row shape of the finance export.
#[derive(Debug, Deserialize)]
struct TransactionRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Amount")]
    amount: f64,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Description", default)]
    description: String,
    #[serde(rename = "Payment_Method", default)]
    payment_method: String,
}

impl TransactionRow {
    fn into_transaction(self) -> Result<Transaction> {
        let date = parse_timestamp(&self.date)
            .with_context(|| format!("Unparseable transaction date: {:?}", self.date))?;
        let kind = TransactionKind::parse(&self.kind)
            .with_context(|| format!("Unknown transaction type: {:?}", self.kind))?;

        Ok(Transaction {
            id: default_uuid(),
            date,
            amount: self.amount,
            kind,
            category: self.category,
            description: self.description,
            payment_method: self.payment_method,
        })
    }
}

pub fn load_transactions_csv(csv_path: &Path) -> Result<Vec<Transaction>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open transactions CSV")?;

    let mut transactions = Vec::new();
    for result in rdr.deserialize() {
        let row: TransactionRow = result.context("Failed to deserialize transaction row")?;
        transactions.push(row.into_transaction()?);
    }

    Ok(transactions)
}

/// CSV row shape of the biometrics export. Empty cells become None.
#[derive(Debug, Deserialize)]
struct BiometricRow {
    #[serde(rename = "Member_ID")]
    member_id: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Weight_Kg")]
    weight_kg: Option<f64>,
    #[serde(rename = "Height_Cm")]
    height_cm: Option<f64>,
    #[serde(rename = "Body_Fat_Pct")]
    body_fat_pct: Option<f64>,
    #[serde(rename = "Muscle_Mass_Kg")]
    muscle_mass_kg: Option<f64>,
}

pub fn load_biometrics_csv(csv_path: &Path) -> Result<Vec<BiometricLog>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open biometrics CSV")?;

    let mut logs = Vec::new();
    for result in rdr.deserialize() {
        let row: BiometricRow = result.context("Failed to deserialize biometric row")?;
        let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d")
            .with_context(|| format!("Unparseable biometric date: {:?}", row.date))?;

        logs.push(BiometricLog {
            member_id: row.member_id,
            date,
            weight_kg: row.weight_kg,
            height_cm: row.height_cm,
            body_fat_pct: row.body_fat_pct,
            muscle_mass_kg: row.muscle_mass_kg,
        });
    }

    Ok(logs)
}

/// Session logs arrive as the JSON export of the trainer app:
/// an array of sessions, each with its entries inline.
pub fn load_sessions_json(json_path: &Path) -> Result<Vec<SessionLog>> {
    let content = std::fs::read_to_string(json_path).context("Failed to read session logs JSON")?;
    let sessions: Vec<SessionLog> =
        serde_json::from_str(&content).context("Failed to parse session logs JSON")?;
    Ok(sessions)
}

/// CSV row shape of the payroll export.
#[derive(Debug, Deserialize)]
struct PayrollRow {
    #[serde(rename = "Staff_Name")]
    staff_name: String,
    #[serde(rename = "Period")]
    period: String,
    #[serde(rename = "Total_Pay")]
    total_pay: f64,
}

pub fn load_payroll_csv(csv_path: &Path) -> Result<Vec<PayrollItem>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open payroll CSV")?;

    let mut items = Vec::new();
    for result in rdr.deserialize() {
        let row: PayrollRow = result.context("Failed to deserialize payroll row")?;
        items.push(PayrollItem::new(row.staff_name, row.period, row.total_pay));
    }

    Ok(items)
}

// ============================================================================
// INSERTS (idempotent - duplicates are skipped, not errors)
// ============================================================================

pub fn insert_transactions(conn: &Connection, transactions: &[Transaction]) -> Result<usize> {
    let mut inserted = 0;
    let mut duplicates = 0;

    for tx in transactions {
        let hash = tx.compute_idempotency_hash();

        let result = conn.execute(
            "INSERT INTO transactions (
                idempotency_hash, tx_uuid, date, amount, kind,
                category, description, payment_method
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                hash,
                tx.id,
                tx.date.to_rfc3339(),
                tx.amount,
                tx.kind.as_str(),
                tx.category,
                tx.description,
                tx.payment_method,
            ],
        );

        match result {
            Ok(_) => inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("✓ Inserted: {} transactions", inserted);
    println!("✓ Skipped duplicates: {}", duplicates);

    Ok(inserted)
}

pub fn insert_biometrics(conn: &Connection, logs: &[BiometricLog]) -> Result<usize> {
    let mut inserted = 0;
    let mut duplicates = 0;

    for log in logs {
        let result = conn.execute(
            "INSERT INTO biometrics (
                member_id, date, weight_kg, height_cm, body_fat_pct, muscle_mass_kg
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                log.member_id,
                log.date.format("%Y-%m-%d").to_string(),
                log.weight_kg,
                log.height_cm,
                log.body_fat_pct,
                log.muscle_mass_kg,
            ],
        );

        match result {
            Ok(_) => inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("✓ Inserted: {} biometric logs", inserted);
    println!("✓ Skipped duplicates: {}", duplicates);

    Ok(inserted)
}

pub fn insert_sessions(conn: &Connection, sessions: &[SessionLog]) -> Result<usize> {
    let mut inserted = 0;
    let mut duplicates = 0;

    for session in sessions {
        let hash = session.compute_idempotency_hash();
        let entries_json = serde_json::to_string(&session.entries)?;

        let result = conn.execute(
            "INSERT INTO session_logs (
                idempotency_hash, session_uuid, member_id, performed_at, entries
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                hash,
                session.id,
                session.member_id,
                session.performed_at.to_rfc3339(),
                entries_json,
            ],
        );

        match result {
            Ok(_) => inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("✓ Inserted: {} session logs", inserted);
    println!("✓ Skipped duplicates: {}", duplicates);

    Ok(inserted)
}

pub fn insert_payroll_items(conn: &Connection, items: &[PayrollItem]) -> Result<usize> {
    let mut inserted = 0;
    let mut duplicates = 0;

    for item in items {
        let result = conn.execute(
            "INSERT INTO payroll_items (
                item_uuid, staff_name, period, total_pay, paid_amount, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                item.id,
                item.staff_name,
                item.period,
                item.total_pay,
                item.paid_amount,
                item.status.as_str(),
            ],
        );

        match result {
            Ok(_) => inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("✓ Inserted: {} payroll items", inserted);
    println!("✓ Skipped duplicates: {}", duplicates);

    Ok(inserted)
}

// ============================================================================
// QUERIES
// ============================================================================

pub fn get_all_transactions(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT tx_uuid, date, amount, kind, category, description, payment_method
         FROM transactions
         ORDER BY date DESC",
    )?;

    let transactions = stmt
        .query_map([], |row| {
            let date_str: String = row.get(1)?;
            let kind_str: String = row.get(3)?;

            Ok(Transaction {
                id: row.get(0)?,
                date: parse_timestamp(&date_str).ok_or(rusqlite::Error::InvalidQuery)?,
                amount: row.get(2)?,
                kind: TransactionKind::parse(&kind_str).ok_or(rusqlite::Error::InvalidQuery)?,
                category: row.get(4)?,
                description: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                payment_method: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transactions)
}

pub fn get_biometrics_for_member(conn: &Connection, member_id: &str) -> Result<Vec<BiometricLog>> {
    let mut stmt = conn.prepare(
        "SELECT member_id, date, weight_kg, height_cm, body_fat_pct, muscle_mass_kg
         FROM biometrics
         WHERE member_id = ?1
         ORDER BY date ASC",
    )?;

    let logs = stmt
        .query_map(params![member_id], |row| {
            let date_str: String = row.get(1)?;
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|_| rusqlite::Error::InvalidQuery)?;

            Ok(BiometricLog {
                member_id: row.get(0)?,
                date,
                weight_kg: row.get(2)?,
                height_cm: row.get(3)?,
                body_fat_pct: row.get(4)?,
                muscle_mass_kg: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(logs)
}

pub fn get_sessions_for_member(conn: &Connection, member_id: &str) -> Result<Vec<SessionLog>> {
    let mut stmt = conn.prepare(
        "SELECT session_uuid, member_id, performed_at, entries
         FROM session_logs
         WHERE member_id = ?1
         ORDER BY performed_at ASC",
    )?;

    let sessions = stmt
        .query_map(params![member_id], |row| {
            let performed_str: String = row.get(2)?;
            let entries_json: String = row.get(3)?;

            Ok(SessionLog {
                id: row.get(0)?,
                member_id: row.get(1)?,
                performed_at: parse_timestamp(&performed_str)
                    .ok_or(rusqlite::Error::InvalidQuery)?,
                entries: serde_json::from_str(&entries_json)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(sessions)
}

pub fn get_payroll_items(conn: &Connection) -> Result<Vec<PayrollItem>> {
    let mut stmt = conn.prepare(
        "SELECT item_uuid, staff_name, period, total_pay, paid_amount, status
         FROM payroll_items
         ORDER BY period DESC, staff_name ASC",
    )?;

    let mut items = stmt
        .query_map([], |row| {
            let status_str: String = row.get(5)?;

            Ok(PayrollItem {
                id: row.get(0)?,
                staff_name: row.get(1)?,
                period: row.get(2)?,
                total_pay: row.get(3)?,
                paid_amount: row.get(4)?,
                status: PayrollStatus::parse(&status_str).ok_or(rusqlite::Error::InvalidQuery)?,
                payments: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for item in &mut items {
        item.payments = get_payments_for_item(conn, &item.id)?;
    }

    Ok(items)
}

pub fn get_payroll_item(conn: &Connection, item_uuid: &str) -> Result<Option<PayrollItem>> {
    let mut items = get_payroll_items(conn)?;
    Ok(items
        .iter()
        .position(|item| item.id == item_uuid)
        .map(|idx| items.swap_remove(idx)))
}

fn get_payments_for_item(conn: &Connection, item_uuid: &str) -> Result<Vec<PayrollPayment>> {
    let mut stmt = conn.prepare(
        "SELECT payment_uuid, amount, paid_at, method, note
         FROM payroll_payments
         WHERE item_uuid = ?1
         ORDER BY paid_at ASC",
    )?;

    let payments = stmt
        .query_map(params![item_uuid], |row| {
            let paid_at_str: String = row.get(2)?;

            Ok(PayrollPayment {
                id: row.get(0)?,
                amount: row.get(1)?,
                paid_at: parse_timestamp(&paid_at_str).ok_or(rusqlite::Error::InvalidQuery)?,
                method: row.get(3)?,
                note: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(payments)
}

/// Persist the outcome of `PayrollItem::record_payment` / `reopen`:
/// updated amounts and status on the item row, new payment rows appended.
pub fn update_payroll_item(conn: &Connection, item: &PayrollItem) -> Result<()> {
    conn.execute(
        "UPDATE payroll_items
         SET total_pay = ?1, paid_amount = ?2, status = ?3
         WHERE item_uuid = ?4",
        params![
            item.total_pay,
            item.paid_amount,
            item.status.as_str(),
            item.id
        ],
    )?;

    for payment in &item.payments {
        let result = conn.execute(
            "INSERT INTO payroll_payments (
                payment_uuid, item_uuid, amount, paid_at, method, note
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                payment.id,
                item.id,
                payment.amount,
                payment.paid_at.to_rfc3339(),
                payment.method,
                payment.note,
            ],
        );

        match result {
            Ok(_) => {}
            // Already-persisted payments keep their UNIQUE payment_uuid
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Members that appear in either the session or biometric tables.
pub fn list_member_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT member_id FROM session_logs
         UNION
         SELECT DISTINCT member_id FROM biometrics
         ORDER BY member_id",
    )?;

    let members = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    Ok(members)
}

pub fn count_transactions(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_biometrics(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM biometrics", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_sessions(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM session_logs", [], |row| row.get(0))?;
    Ok(count)
}
