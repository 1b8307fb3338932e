use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gympulse::{
    build_series, daily_volume, get_biometrics_for_member, get_sessions_for_member,
    list_member_ids, personal_records, summarize, text, DateWindow, FinanceSummary, Locale,
    MetricKey, PayrollItem, PayrollStatus, TextKey, TrailingWindow, Transaction, TransactionKind,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rusqlite::Connection;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    FinanceLedger,
    MemberProgress,
    Payroll,
    Views,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::FinanceLedger => Page::MemberProgress,
            Page::MemberProgress => Page::Payroll,
            Page::Payroll => Page::Views,
            Page::Views => Page::FinanceLedger,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::FinanceLedger => Page::Views,
            Page::MemberProgress => Page::FinanceLedger,
            Page::Payroll => Page::MemberProgress,
            Page::Views => Page::Payroll,
        }
    }

    pub fn title(&self, lang: Locale) -> &'static str {
        match self {
            Page::FinanceLedger => text(lang, TextKey::FinanceLedger),
            Page::MemberProgress => text(lang, TextKey::MemberProgress),
            Page::Payroll => text(lang, TextKey::Payroll),
            Page::Views => "Views",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterType {
    None,
    AllTransactions,
    Income,
    Expenses,
}

/// One row of the member progress page, precomputed from the
/// aggregators over the trailing quarter.
pub struct MemberSnapshot {
    pub member_id: String,
    pub sessions: usize,
    pub volume: f64,
    pub exercises_tracked: usize,
    pub latest_weight: Option<f64>,
    pub weight_delta: Option<f64>,
}

pub struct App {
    pub transactions: Vec<Transaction>,
    pub filtered_transactions: Vec<Transaction>,
    pub state: TableState,
    pub payroll: Vec<PayrollItem>,
    pub payroll_state: TableState,
    pub members: Vec<MemberSnapshot>,
    pub members_state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub active_filter: FilterType,
    pub lang: Locale,
}

impl App {
    pub fn new(transactions: Vec<Transaction>, payroll: Vec<PayrollItem>, conn: Connection) -> Self {
        let lang = std::env::var("GYMPULSE_LANG")
            .ok()
            .and_then(|raw| Locale::parse(&raw))
            .unwrap_or(Locale::En);

        let members = build_member_snapshots(&conn);

        let mut state = TableState::default();
        if !transactions.is_empty() {
            state.select(Some(0));
        }

        let mut payroll_state = TableState::default();
        payroll_state.select(Some(0));
        let mut members_state = TableState::default();
        members_state.select(Some(0));

        let filtered_transactions = transactions.clone();

        Self {
            transactions,
            filtered_transactions,
            state,
            payroll,
            payroll_state,
            members,
            members_state,
            current_page: Page::FinanceLedger,
            show_detail: false,
            active_filter: FilterType::None,
            lang,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_transaction(&self) -> Option<&Transaction> {
        self.state
            .selected()
            .and_then(|i| self.filtered_transactions.get(i))
    }

    pub fn apply_filter(&mut self, filter: FilterType) {
        self.active_filter = filter.clone();

        self.filtered_transactions = match filter {
            FilterType::None | FilterType::AllTransactions => self.transactions.clone(),
            FilterType::Income => self
                .transactions
                .iter()
                .filter(|tx| tx.kind == TransactionKind::Income)
                .cloned()
                .collect(),
            FilterType::Expenses => self
                .transactions
                .iter()
                .filter(|tx| tx.kind == TransactionKind::Expense)
                .cloned()
                .collect(),
        };

        if !self.filtered_transactions.is_empty() {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(FilterType::None);
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    /// Summary of the transactions currently in view.
    pub fn finance_summary(&self) -> FinanceSummary {
        summarize(&self.filtered_transactions, &DateWindow::unbounded())
    }

    fn active_table_len(&self) -> usize {
        match self.current_page {
            Page::FinanceLedger | Page::Views => self.filtered_transactions.len(),
            Page::MemberProgress => self.members.len(),
            Page::Payroll => self.payroll.len(),
        }
    }

    fn active_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::FinanceLedger | Page::Views => &mut self.state,
            Page::MemberProgress => &mut self.members_state,
            Page::Payroll => &mut self.payroll_state,
        }
    }

    pub fn next(&mut self) {
        let len = self.active_table_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.active_table_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.active_table_len();
        if len == 0 {
            return;
        }
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let state = self.active_state();
        let i = match state.selected() {
            Some(i) => i.saturating_sub(20),
            None => 0,
        };
        state.select(Some(i));
    }
}

fn build_member_snapshots(conn: &Connection) -> Vec<MemberSnapshot> {
    let today = Utc::now().date_naive();
    let window = TrailingWindow::last_quarter();

    let Ok(member_ids) = list_member_ids(conn) else {
        return Vec::new();
    };

    member_ids
        .into_iter()
        .map(|member_id| {
            let sessions = get_sessions_for_member(conn, &member_id).unwrap_or_default();
            let biometrics = get_biometrics_for_member(conn, &member_id).unwrap_or_default();

            let volume_groups = daily_volume(&sessions, window, today);
            let records = personal_records(&sessions, window, today);
            let weight_series = build_series(&biometrics, MetricKey::WeightKg, window, today);

            MemberSnapshot {
                member_id,
                sessions: volume_groups.iter().map(|g| g.sessions).sum(),
                volume: volume_groups.iter().map(|g| g.volume).sum(),
                exercises_tracked: records.len(),
                latest_weight: weight_series.last().map(|p| p.value),
                weight_delta: weight_series.last().and_then(|p| p.delta),
            }
        })
        .collect()
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::Char('c') => {
                    app.clear_filter();
                    app.current_page = Page::FinanceLedger;
                }
                KeyCode::Char('1') if app.current_page == Page::Views => {
                    app.apply_filter(FilterType::AllTransactions);
                    app.current_page = Page::FinanceLedger;
                }
                KeyCode::Char('2') if app.current_page == Page::Views => {
                    app.apply_filter(FilterType::Income);
                    app.current_page = Page::FinanceLedger;
                }
                KeyCode::Char('3') if app.current_page == Page::Views => {
                    app.apply_filter(FilterType::Expenses);
                    app.current_page = Page::FinanceLedger;
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.active_state().select(Some(0)),
                KeyCode::End => {
                    let len = app.active_table_len();
                    if len > 0 {
                        app.active_state().select(Some(len - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail && app.current_page == Page::FinanceLedger {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_ledger(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::FinanceLedger => render_ledger(f, chunks[1], app),
            Page::MemberProgress => render_members(f, chunks[1], app),
            Page::Payroll => render_payroll(f, chunks[1], app),
            Page::Views => render_views(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let summary = app.finance_summary();

    let pages = [
        Page::FinanceLedger,
        Page::MemberProgress,
        Page::Payroll,
        Page::Views,
    ];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(app.lang), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("↑ {:.2}", summary.total_income),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("↓ {:.2}", summary.total_expenses),
        Style::default().fg(Color::Red),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("= {:.2}", summary.net_profit),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", text(app.lang, TextKey::DashboardTitle))),
    );

    f.render_widget(header, area);
}

fn render_ledger(f: &mut Frame, area: Rect, app: &mut App) {
    let lang = app.lang;

    let header_cells = ["Date", "Category", "Description", "Amount", "Type", "Method"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered_transactions.iter().map(|tx| {
        let color = match tx.kind {
            TransactionKind::Income => Color::Green,
            TransactionKind::Expense => Color::Red,
        };

        let cells = vec![
            Cell::from(tx.date_only().format("%Y-%m-%d").to_string()),
            Cell::from(truncate(&tx.category, 20)),
            Cell::from(truncate(&tx.description, 30)),
            Cell::from(format!("{:.2}", tx.amount)).style(Style::default().fg(color)),
            Cell::from(tx.kind.as_str()).style(Style::default().fg(color)),
            Cell::from(truncate(&tx.payment_method, 10)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(22),
            Constraint::Length(32),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ", text(lang, TextKey::Transactions))),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let lines = if let Some(tx) = app.selected_transaction() {
        vec![
            Line::from(""),
            detail_line("ID", &tx.id),
            detail_line("Date", &tx.date.to_rfc3339()),
            detail_line("Amount", &format!("{:.2}", tx.amount)),
            detail_line("Type", tx.kind.as_str()),
            detail_line("Category", &tx.category),
            detail_line("Method", &tx.payment_method),
            Line::from(""),
            Line::from(Span::styled(
                "  Description",
                Style::default().fg(Color::Yellow),
            )),
            Line::from(format!("  {}", tx.description)),
        ]
    } else {
        vec![Line::from(""), Line::from("  No transaction selected")]
    };

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Detail "),
    );

    f.render_widget(panel, area);
}

fn detail_line<'a>(label: &'a str, value: &str) -> Line<'a> {
    Line::from(vec![
        Span::styled(
            format!("  {:<10}", label),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw(value.to_string()),
    ])
}

fn render_members(f: &mut Frame, area: Rect, app: &mut App) {
    let lang = app.lang;

    let header_cells = [
        "Member",
        text(lang, TextKey::Sessions),
        text(lang, TextKey::Volume),
        "Exercises",
        text(lang, TextKey::Weight),
        "Δ",
    ]
    .into_iter()
    .map(|h| {
        Cell::from(h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.members.iter().map(|m| {
        let delta_text = m
            .weight_delta
            .map(|d| format!("{:+.1}", d))
            .unwrap_or_else(|| "-".to_string());
        let weight_text = m
            .latest_weight
            .map(|w| format!("{:.1}", w))
            .unwrap_or_else(|| "-".to_string());

        let cells = vec![
            Cell::from(truncate(&m.member_id, 20)),
            Cell::from(format!("{}", m.sessions)),
            Cell::from(format!("{:.0}", m.volume)),
            Cell::from(format!("{}", m.exercises_tracked)),
            Cell::from(weight_text),
            Cell::from(delta_text),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(22),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(11),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(
                " {} (90d) ",
                text(lang, TextKey::MemberProgress)
            )),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.members_state);
}

fn render_payroll(f: &mut Frame, area: Rect, app: &mut App) {
    let lang = app.lang;

    let header_cells = [
        "Staff",
        "Period",
        text(lang, TextKey::TotalPay),
        text(lang, TextKey::PaidAmount),
        text(lang, TextKey::Pending),
        "Status",
    ]
    .into_iter()
    .map(|h| {
        Cell::from(h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.payroll.iter().map(|item| {
        let (status_text, color) = match item.status {
            PayrollStatus::Draft => (text(lang, TextKey::StatusDraft), Color::DarkGray),
            PayrollStatus::Partial => (text(lang, TextKey::StatusPartial), Color::Yellow),
            PayrollStatus::Paid => (text(lang, TextKey::StatusPaid), Color::Green),
        };

        let cells = vec![
            Cell::from(truncate(&item.staff_name, 24)),
            Cell::from(item.period.clone()),
            Cell::from(format!("{:.2}", item.total_pay)),
            Cell::from(format!("{:.2}", item.paid_amount)),
            Cell::from(format!("{:.2}", item.pending_amount())),
            Cell::from(status_text).style(Style::default().fg(color)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ", text(lang, TextKey::Payroll))),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.payroll_state);
}

fn render_views(f: &mut Frame, area: Rect, app: &App) {
    let lang = app.lang;
    let summary = summarize(&app.transactions, &DateWindow::unbounded());
    let income_count = app
        .transactions
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Income)
        .count();
    let expense_count = app.transactions.len() - income_count;

    let marker = |filter: FilterType| {
        if app.active_filter == filter {
            Span::styled(
                "→",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw(" ")
        }
    };

    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Quick Views & Filters",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            marker(FilterType::AllTransactions),
            Span::styled(" 1", Style::default().fg(Color::Yellow)),
            Span::raw(format!(
                ". {} ({})",
                text(lang, TextKey::Transactions),
                app.transactions.len()
            )),
        ]),
        Line::from(vec![
            Span::raw("  "),
            marker(FilterType::Income),
            Span::styled(" 2", Style::default().fg(Color::Yellow)),
            Span::raw(format!(
                ". {} ({})",
                text(lang, TextKey::TotalIncome),
                income_count
            )),
        ]),
        Line::from(vec![
            Span::raw("  "),
            marker(FilterType::Expenses),
            Span::styled(" 3", Style::default().fg(Color::Yellow)),
            Span::raw(format!(
                ". {} ({})",
                text(lang, TextKey::TotalExpenses),
                expense_count
            )),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  Summary",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw(format!("  {}: ", text(lang, TextKey::TotalIncome))),
            Span::styled(
                format!("{:.2}", summary.total_income),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(vec![
            Span::raw(format!("  {}: ", text(lang, TextKey::TotalExpenses))),
            Span::styled(
                format!("{:.2}", summary.total_expenses),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(vec![
            Span::raw(format!("  {}: ", text(lang, TextKey::NetProfit))),
            Span::styled(
                format!("{:.2}", summary.net_profit),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    let views = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Views "),
    );

    f.render_widget(views, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.filtered_transactions.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if app.active_filter != FilterType::None && app.active_filter != FilterType::AllTransactions {
        let filter_name = match &app.active_filter {
            FilterType::Income => "INCOME",
            FilterType::Expenses => "EXPENSE",
            _ => "CUSTOM",
        };
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", filter_name),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
