// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use rusqlite::Connection;
use std::env;
use std::path::PathBuf;

use gympulse::{
    count_biometrics, count_sessions, count_transactions, insert_biometrics,
    insert_payroll_items, insert_sessions, insert_transactions, load_biometrics_csv,
    load_payroll_csv, load_sessions_json, load_transactions_csv, setup_database,
    summarize_batch, validate_transaction,
};

/// Data directory: GYMPULSE_DATA_DIR, or ./data next to the binary.
fn data_dir() -> PathBuf {
    env::var("GYMPULSE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn db_path() -> PathBuf {
    data_dir().join("gympulse.db")
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "import" {
        run_import()?;
    } else {
        run_ui_mode()?;
    }

    Ok(())
}

fn run_import() -> Result<()> {
    println!("🗄️  Gympulse Import - club exports → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let dir = data_dir();
    std::fs::create_dir_all(&dir)?;

    println!("\n🔧 Setting up database...");
    let conn = Connection::open(db_path())?;
    setup_database(&conn)?;
    println!("✓ Database initialized with WAL mode");

    // Each export is optional; import whichever files are present.
    let transactions_csv = dir.join("transactions.csv");
    if transactions_csv.exists() {
        println!("\n📂 Loading transactions...");
        let transactions = load_transactions_csv(&transactions_csv)?;
        println!("✓ Loaded {} transactions from CSV", transactions.len());

        let reports: Vec<_> = transactions.iter().map(validate_transaction).collect();
        let batch = summarize_batch(&reports);
        println!(
            "✓ Validated: {} clean, {} warnings, {} critical",
            batch.clean, batch.with_warnings, batch.with_critical
        );

        println!("\n💾 Inserting transactions...");
        insert_transactions(&conn, &transactions)?;
    } else {
        println!("\n⏭  No transactions.csv, skipping");
    }

    let biometrics_csv = dir.join("biometrics.csv");
    if biometrics_csv.exists() {
        println!("\n📂 Loading biometric logs...");
        let logs = load_biometrics_csv(&biometrics_csv)?;
        println!("✓ Loaded {} biometric logs from CSV", logs.len());

        println!("\n💾 Inserting biometric logs...");
        insert_biometrics(&conn, &logs)?;
    } else {
        println!("\n⏭  No biometrics.csv, skipping");
    }

    let sessions_json = dir.join("sessions.json");
    if sessions_json.exists() {
        println!("\n📂 Loading session logs...");
        let sessions = load_sessions_json(&sessions_json)?;
        println!("✓ Loaded {} session logs from JSON", sessions.len());

        println!("\n💾 Inserting session logs...");
        insert_sessions(&conn, &sessions)?;
    } else {
        println!("\n⏭  No sessions.json, skipping");
    }

    let payroll_csv = dir.join("payroll.csv");
    if payroll_csv.exists() {
        println!("\n📂 Loading payroll items...");
        let items = load_payroll_csv(&payroll_csv)?;
        println!("✓ Loaded {} payroll items from CSV", items.len());

        println!("\n💾 Inserting payroll items...");
        insert_payroll_items(&conn, &items)?;
    } else {
        println!("\n⏭  No payroll.csv, skipping");
    }

    println!("\n🔍 Verifying database...");
    println!("✓ {} transactions", count_transactions(&conn)?);
    println!("✓ {} biometric logs", count_biometrics(&conn)?);
    println!("✓ {} session logs", count_sessions(&conn)?);

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🎉 Import complete");

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    use gympulse::{get_all_transactions, get_payroll_items};

    println!("🖥️  Loading Gympulse dashboard...\n");

    let path = db_path();
    if !path.exists() {
        eprintln!("❌ Database not found!");
        eprintln!("   Run: cargo run import");
        eprintln!("   to import club exports first.");
        std::process::exit(1);
    }

    let conn = Connection::open(&path)?;

    println!("📊 Loading records...");
    let transactions = get_all_transactions(&conn)?;
    let payroll = get_payroll_items(&conn)?;

    println!("✓ Loaded {} transactions\n", transactions.len());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(transactions, payroll, conn);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin gympulse-server --features server");
    std::process::exit(1);
}
