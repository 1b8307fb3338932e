// Gympulse - Web Server
// REST API with Axum: finance, fitness and payroll dashboards

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use gympulse::{
    build_series, daily_volume, filter_status, get_all_transactions, get_biometrics_for_member,
    get_payroll_item, get_payroll_items, get_sessions_for_member, paginate, personal_records,
    setup_database, summarize, update_payroll_item, BiometricLog, DailyVolume, DateWindow,
    ExerciseRecord, FinanceSummary, MetricKey, MetricPoint, Page, PayrollItem, PayrollStatus,
    TrailingWindow, Transaction,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn fail(data: T, error: String) -> Self {
        Self {
            success: false,
            data,
            error: Some(error),
        }
    }
}

/// Transaction response (simplified for API)
#[derive(Serialize)]
struct TransactionResponse {
    id: String,
    date: String,
    amount: f64,
    kind: &'static str,
    category: String,
    description: String,
    payment_method: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            date: tx.date.to_rfc3339(),
            amount: tx.amount,
            kind: tx.kind.as_str(),
            category: tx.category,
            description: tx.description,
            payment_method: tx.payment_method,
        }
    }
}

// ============================================================================
// Query parameters
// ============================================================================

/// start / end as ISO calendar dates, both optional, both inclusive
#[derive(Deserialize)]
struct WindowQuery {
    start: Option<String>,
    end: Option<String>,
}

impl WindowQuery {
    fn to_window(&self) -> DateWindow {
        let parse = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        };
        DateWindow {
            start: parse(&self.start),
            end: parse(&self.end),
        }
    }
}

#[derive(Deserialize)]
struct SeriesQuery {
    metric: Option<String>,
    days: Option<u32>,
}

#[derive(Deserialize)]
struct TrailingQuery {
    days: Option<u32>,
}

fn trailing_window(days: Option<u32>) -> TrailingWindow {
    TrailingWindow::new(days.unwrap_or(90))
}

#[derive(Deserialize)]
struct PayrollQuery {
    status: Option<String>,
    offset: Option<usize>,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct PaymentRequest {
    amount: f64,
    method: String,
    note: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/finance/transactions - Windowed transaction list
async fn finance_transactions(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();
    let window = query.to_window();

    match get_all_transactions(&conn) {
        Ok(transactions) => {
            let response: Vec<TransactionResponse> = transactions
                .into_iter()
                .filter(|tx| window.contains(tx.date_only()))
                .map(|tx| tx.into())
                .collect();

            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Err(e) => {
            eprintln!("Error getting transactions: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(Vec::<TransactionResponse>::new())),
            )
                .into_response()
        }
    }
}

/// GET /api/finance/summary - Income / expenses / net for the window
async fn finance_summary(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();
    let window = query.to_window();

    match get_all_transactions(&conn) {
        Ok(transactions) => {
            let summary = summarize(&transactions, &window);
            (StatusCode::OK, Json(ApiResponse::ok(summary))).into_response()
        }
        Err(e) => {
            eprintln!("Error summarizing transactions: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(FinanceSummary::zero())),
            )
                .into_response()
        }
    }
}

/// GET /api/fitness/biometrics/:member - Raw biometric logs
async fn fitness_biometrics(
    State(state): State<AppState>,
    Path(member): Path<String>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();
    let member_id = decode_member(&member);

    match get_biometrics_for_member(&conn, &member_id) {
        Ok(logs) => (StatusCode::OK, Json(ApiResponse::ok(logs))).into_response(),
        Err(e) => {
            eprintln!("Error getting biometrics for {}: {}", member_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(Vec::<BiometricLog>::new())),
            )
                .into_response()
        }
    }
}

/// GET /api/fitness/metrics/:member - Chart series for one metric
async fn fitness_metrics(
    State(state): State<AppState>,
    Path(member): Path<String>,
    Query(query): Query<SeriesQuery>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();
    let member_id = decode_member(&member);

    let Some(key) = query
        .metric
        .as_deref()
        .map_or(Some(MetricKey::WeightKg), MetricKey::parse)
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::fail(
                Vec::<MetricPoint>::new(),
                format!("Unknown metric: {:?}", query.metric),
            )),
        )
            .into_response();
    };

    match get_biometrics_for_member(&conn, &member_id) {
        Ok(logs) => {
            let series = build_series(
                &logs,
                key,
                trailing_window(query.days),
                Utc::now().date_naive(),
            );
            (StatusCode::OK, Json(ApiResponse::ok(series))).into_response()
        }
        Err(e) => {
            eprintln!("Error building series for {}: {}", member_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(Vec::<MetricPoint>::new())),
            )
                .into_response()
        }
    }
}

/// GET /api/fitness/volume/:member - Per-day session volume
async fn fitness_volume(
    State(state): State<AppState>,
    Path(member): Path<String>,
    Query(query): Query<TrailingQuery>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();
    let member_id = decode_member(&member);

    match get_sessions_for_member(&conn, &member_id) {
        Ok(sessions) => {
            let groups = daily_volume(
                &sessions,
                trailing_window(query.days),
                Utc::now().date_naive(),
            );
            (StatusCode::OK, Json(ApiResponse::ok(groups))).into_response()
        }
        Err(e) => {
            eprintln!("Error aggregating volume for {}: {}", member_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(Vec::<DailyVolume>::new())),
            )
                .into_response()
        }
    }
}

/// GET /api/fitness/records/:member - PR table
async fn fitness_records(
    State(state): State<AppState>,
    Path(member): Path<String>,
    Query(query): Query<TrailingQuery>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();
    let member_id = decode_member(&member);

    match get_sessions_for_member(&conn, &member_id) {
        Ok(sessions) => {
            let records = personal_records(
                &sessions,
                trailing_window(query.days),
                Utc::now().date_naive(),
            );
            (StatusCode::OK, Json(ApiResponse::ok(records))).into_response()
        }
        Err(e) => {
            eprintln!("Error building PR table for {}: {}", member_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(Vec::<ExerciseRecord>::new())),
            )
                .into_response()
        }
    }
}

/// GET /api/payroll - Filtered, paginated payroll items
async fn payroll_list(
    State(state): State<AppState>,
    Query(query): Query<PayrollQuery>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    let status = match query.status.as_deref() {
        None | Some("all") => None,
        Some(raw) => match PayrollStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::fail(
                        empty_page(),
                        format!("Unknown payroll status: {:?}", raw),
                    )),
                )
                    .into_response();
            }
        },
    };

    match get_payroll_items(&conn) {
        Ok(items) => {
            let filtered: Vec<PayrollItem> =
                filter_status(&items, status).into_iter().cloned().collect();
            let page = paginate(
                &filtered,
                query.offset.unwrap_or(0),
                query.limit.unwrap_or(20),
            );
            (StatusCode::OK, Json(ApiResponse::ok(page))).into_response()
        }
        Err(e) => {
            eprintln!("Error getting payroll items: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::ok(empty_page())),
            )
                .into_response()
        }
    }
}

fn empty_page() -> Page<PayrollItem> {
    Page {
        items: Vec::new(),
        offset: 0,
        limit: 0,
        total: 0,
    }
}

/// POST /api/payroll/:id/payments - Record a payout against an item
async fn payroll_record_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PaymentRequest>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    let mut item = match get_payroll_item(&conn, &id) {
        Ok(Some(item)) => item,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::fail(
                    None::<PayrollItem>,
                    format!("No payroll item {}", id),
                )),
            )
                .into_response();
        }
        Err(e) => {
            eprintln!("Error loading payroll item {}: {}", id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::fail(None::<PayrollItem>, e.to_string())),
            )
                .into_response();
        }
    };

    if let Err(e) = item.record_payment(request.amount, request.method, request.note, Utc::now()) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::fail(None::<PayrollItem>, e.to_string())),
        )
            .into_response();
    }

    match update_payroll_item(&conn, &item) {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::ok(Some(item)))).into_response(),
        Err(e) => {
            eprintln!("Error persisting payment for {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::fail(None::<PayrollItem>, e.to_string())),
            )
                .into_response()
        }
    }
}

/// Member ids may arrive URL-encoded (emails, names with spaces)
fn decode_member(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 Gympulse - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let data_dir = std::env::var("GYMPULSE_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let db_path = std::path::Path::new(&data_dir).join("gympulse.db");

    if !db_path.exists() {
        eprintln!("❌ Database not found at {:?}", db_path);
        eprintln!("   Run: cargo run --release import");
        eprintln!("   to import club exports first.");
        std::process::exit(1);
    }

    let conn = Connection::open(&db_path).expect("Failed to open database");
    setup_database(&conn).expect("Failed to prepare database");
    println!("✓ Database opened: {:?}", db_path);

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/finance/transactions", get(finance_transactions))
        .route("/finance/summary", get(finance_summary))
        .route("/fitness/biometrics/:member", get(fitness_biometrics))
        .route("/fitness/metrics/:member", get(fitness_metrics))
        .route("/fitness/volume/:member", get(fitness_volume))
        .route("/fitness/records/:member", get(fitness_records))
        .route("/payroll", get(payroll_list))
        .route("/payroll/:id/payments", post(payroll_record_payment))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   API: http://localhost:3000/api/finance/summary");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
