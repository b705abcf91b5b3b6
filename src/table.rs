//! Price table presentation: display rows, HTTP routes, record sources.

use std::sync::{Arc, Mutex, RwLock};

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::feeds::{
    fetch_market, fetch_official, normalize_market, normalize_metadata, FeedConfig, FeedHttp,
    RawMarketRecord, RawMetadataRecord, ReqwestBlockingFeed,
};
use crate::join::{join_records, CombinedRecord};
use crate::query::{run_query, QueryState, SortDirection, VisibilityMode};
use crate::visibility::VisibilityStore;

pub const TABLE_HEADERS: [&str; 12] = [
    "Id",
    "Name",
    "Members",
    "Limit",
    "Price",
    "Volume",
    "Market High",
    "High Time",
    "Market Low",
    "Low Time",
    "Difference",
    "Price %",
];

pub const TABLE_COLUMN_KEYS: [&str; 12] = [
    "id",
    "name",
    "members",
    "limit",
    "price",
    "volume",
    "market_high",
    "high_time",
    "market_low",
    "low_time",
    "difference",
    "price_percentage",
];

/// One rendered row: every cell already a display string, plus the raw id
/// for the toggle route and the hidden flag for styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub id: i64,
    pub name: String,
    pub members: String,
    pub limit: String,
    pub price: String,
    pub volume: String,
    pub market_high: String,
    pub high_time: String,
    pub market_low: String,
    pub low_time: String,
    pub difference: String,
    pub price_percentage: String,
    pub hidden: bool,
}

impl TableRow {
    pub fn from_record(record: &CombinedRecord, hidden: bool) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            members: record.members.to_string(),
            limit: record.limit.to_string(),
            price: record.price.to_string(),
            volume: record.volume.to_string(),
            market_high: display_or_none(record.market_high),
            high_time: display_time_or_none(record.high_time),
            market_low: display_or_none(record.market_low),
            low_time: display_time_or_none(record.low_time),
            difference: display_or_none(record.difference),
            price_percentage: display_percentage_or_none(record.price_percentage),
            hidden,
        }
    }

    pub fn to_cell_text_values(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.members.clone(),
            self.limit.clone(),
            self.price.clone(),
            self.volume.clone(),
            self.market_high.clone(),
            self.high_time.clone(),
            self.market_low.clone(),
            self.low_time.clone(),
            self.difference.clone(),
            self.price_percentage.clone(),
        ]
    }
}

fn display_or_none(value: Option<i64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "none".to_string())
}

fn display_percentage_or_none(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.2}%"))
        .unwrap_or_else(|| "none".to_string())
}

fn display_time_or_none(ts: Option<i64>) -> String {
    ts.and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "none".to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayPage {
    pub rows: Vec<TableRow>,
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
}

/// Runs the pipeline and converts the surviving page into display rows.
pub fn build_display_page(
    records: &[CombinedRecord],
    visibility: &VisibilityStore,
    state: &mut QueryState,
) -> DisplayPage {
    let page = run_query(records, visibility.map(), state);
    DisplayPage {
        rows: page
            .rows
            .iter()
            .map(|record| TableRow::from_record(record, visibility.is_hidden(record.id)))
            .collect(),
        page: page.page,
        total_pages: page.total_pages,
        total_rows: page.total_rows,
    }
}

/// Query-param surface of the snapshot and page routes: one optional filter
/// per column plus sort/visibility/paging controls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableQuery {
    pub id: Option<String>,
    pub name: Option<String>,
    pub members: Option<String>,
    pub limit: Option<String>,
    pub price: Option<String>,
    pub volume: Option<String>,
    pub market_high: Option<String>,
    pub high_time: Option<String>,
    pub market_low: Option<String>,
    pub low_time: Option<String>,
    pub difference: Option<String>,
    pub price_percentage: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub visibility: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl TableQuery {
    pub fn to_query_state(&self) -> QueryState {
        let mut state = QueryState::default();

        let filter_params: [(&str, &Option<String>); 12] = [
            ("id", &self.id),
            ("name", &self.name),
            ("members", &self.members),
            ("limit", &self.limit),
            ("price", &self.price),
            ("volume", &self.volume),
            ("market_high", &self.market_high),
            ("high_time", &self.high_time),
            ("market_low", &self.market_low),
            ("low_time", &self.low_time),
            ("difference", &self.difference),
            ("price_percentage", &self.price_percentage),
        ];
        for (field, raw) in filter_params {
            if let Some(raw) = raw {
                state.set_filter(field, raw.clone());
            }
        }

        state.sort_key = self.sort.clone().filter(|key| !key.is_empty());
        state.sort_dir = match self.dir.as_deref() {
            Some("desc") => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        state.visibility = match self.visibility.as_deref() {
            Some("all") => VisibilityMode::All,
            Some("hidden") => VisibilityMode::HiddenOnly,
            _ => VisibilityMode::VisibleOnly,
        };
        if let Some(page_size) = self.page_size {
            state.set_page_size(page_size);
        }
        if let Some(page) = self.page {
            state.set_page(page);
        }

        state
    }
}

pub trait RecordSource: Send + Sync + 'static {
    fn records(&self) -> Vec<CombinedRecord>;
}

#[derive(Clone)]
pub struct InMemoryRecordSource {
    inner: Arc<RwLock<Vec<CombinedRecord>>>,
}

impl InMemoryRecordSource {
    pub fn new(records: Vec<CombinedRecord>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(records)),
        }
    }

    pub fn demo() -> Self {
        Self::new(demo_records())
    }

    pub fn replace_records(&self, records: Vec<CombinedRecord>) {
        let mut guard = self
            .inner
            .write()
            .expect("record snapshot lock should not be poisoned");
        *guard = records;
    }
}

impl RecordSource for InMemoryRecordSource {
    fn records(&self) -> Vec<CombinedRecord> {
        self.inner
            .read()
            .expect("record snapshot lock should not be poisoned")
            .clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveFeedConfig {
    pub feed: FeedConfig,
    pub refresh_interval_ms: u64,
}

impl Default for LiveFeedConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            refresh_interval_ms: 60_000,
        }
    }
}

/// Polls both upstream feeds on a background thread. The two fetches fail
/// independently; a failed side keeps its last good normalized sequence, so
/// one stale feed never blanks the other's data.
pub struct LiveFeedSource {
    inner: Arc<RwLock<Vec<CombinedRecord>>>,
}

impl LiveFeedSource {
    /// The blocking HTTP client lives entirely on the polling thread, so this
    /// is safe to call from async context.
    pub fn spawn(cfg: LiveFeedConfig) -> Self {
        let inner = Arc::new(RwLock::new(Vec::new()));
        let shared = Arc::clone(&inner);

        std::thread::spawn(move || {
            let http = match ReqwestBlockingFeed::new(&cfg.feed) {
                Ok(http) => http,
                Err(err) => {
                    warn!(
                        component = "table",
                        event = "feed.client.error",
                        error = %err
                    );
                    return;
                }
            };
            let mut metadata: Vec<RawMetadataRecord> = Vec::new();
            let mut market: Vec<RawMarketRecord> = Vec::new();

            loop {
                let joined = refresh_cycle(&http, &cfg.feed, &mut metadata, &mut market);
                {
                    let mut guard = shared
                        .write()
                        .expect("record snapshot lock should not be poisoned");
                    *guard = joined;
                }
                std::thread::sleep(std::time::Duration::from_millis(cfg.refresh_interval_ms));
            }
        });

        Self { inner }
    }
}

impl RecordSource for LiveFeedSource {
    fn records(&self) -> Vec<CombinedRecord> {
        self.inner
            .read()
            .expect("record snapshot lock should not be poisoned")
            .clone()
    }
}

/// One refresh: fetch each feed, replace that side's last good records on
/// success, log and keep the previous ones on failure, then rejoin.
fn refresh_cycle(
    http: &dyn FeedHttp,
    cfg: &FeedConfig,
    metadata: &mut Vec<RawMetadataRecord>,
    market: &mut Vec<RawMarketRecord>,
) -> Vec<CombinedRecord> {
    match fetch_official(http, cfg) {
        Ok(payload) => *metadata = normalize_metadata(&payload).records,
        Err(err) => warn!(
            component = "table",
            event = "feed.fetch.error",
            feed = "official",
            error = %err
        ),
    }

    match fetch_market(http, cfg) {
        Ok(payload) => *market = normalize_market(&payload).records,
        Err(err) => warn!(
            component = "table",
            event = "feed.fetch.error",
            feed = "market",
            error = %err
        ),
    }

    let joined = join_records(metadata, market);
    info!(
        component = "table",
        event = "feed.refresh",
        metadata_rows = metadata.len(),
        market_rows = market.len(),
        joined_rows = joined.len()
    );
    joined
}

pub fn demo_records() -> Vec<CombinedRecord> {
    let metadata = vec![
        demo_meta(2, "Cannonball", Some(11_000), 150, 2_000_000, true),
        demo_meta(6, "Cannon base", Some(8), 190_000, 120, true),
        demo_meta(314, "Feather", Some(30_000), 2, 4_500_000, false),
        demo_meta(526, "Bones", Some(3_000), 98, 800_000, false),
        demo_meta(536, "Dragon bones", Some(13_000), 2_750, 650_000, false),
        demo_meta(4151, "Abyssal whip", Some(70), 1_650_000, 3_100, true),
    ];
    let market = vec![
        demo_market(2, Some(160), Some(140)),
        demo_market(314, Some(3), Some(1)),
        demo_market(536, Some(2_600), Some(2_450)),
        demo_market(4151, Some(1_700_000), Some(1_620_000)),
    ];
    join_records(&metadata, &market)
}

fn demo_meta(
    id: i64,
    name: &str,
    limit: Option<i64>,
    price: i64,
    volume: i64,
    members: bool,
) -> RawMetadataRecord {
    RawMetadataRecord {
        id,
        name: name.to_string(),
        limit,
        price,
        volume,
        examine: None,
        members,
        lowalch: None,
        highalch: None,
        icon: None,
    }
}

fn demo_market(id: i64, high: Option<i64>, low: Option<i64>) -> RawMarketRecord {
    RawMarketRecord {
        id,
        high,
        high_time: high.map(|_| 1_735_689_600),
        low,
        low_time: low.map(|_| 1_735_689_500),
    }
}

#[derive(Clone)]
struct TableAppState {
    source: Arc<dyn RecordSource>,
    visibility: Arc<Mutex<VisibilityStore>>,
}

pub fn table_router(
    source: Arc<dyn RecordSource>,
    visibility: Arc<Mutex<VisibilityStore>>,
) -> Router {
    Router::new()
        .route("/table", get(get_table_html))
        .route("/table/snapshot", get(get_table_snapshot))
        .route("/table/toggle/{id}", post(post_toggle_visibility))
        .with_state(TableAppState { source, visibility })
}

async fn get_table_html(
    State(state): State<TableAppState>,
    Query(query): Query<TableQuery>,
) -> impl IntoResponse {
    let records = state.source.records();
    let mut query_state = query.to_query_state();
    let page = {
        let visibility = state
            .visibility
            .lock()
            .expect("visibility lock should not be poisoned");
        build_display_page(&records, &visibility, &mut query_state)
    };
    Html(render_table_html(&page, &query_state))
}

async fn get_table_snapshot(
    State(state): State<TableAppState>,
    Query(query): Query<TableQuery>,
) -> impl IntoResponse {
    let records = state.source.records();
    let mut query_state = query.to_query_state();
    let page = {
        let visibility = state
            .visibility
            .lock()
            .expect("visibility lock should not be poisoned");
        build_display_page(&records, &visibility, &mut query_state)
    };

    info!(
        component = "table",
        event = "http.snapshot.request",
        rows = page.rows.len(),
        page = page.page,
        total_pages = page.total_pages
    );
    Json(page)
}

async fn post_toggle_visibility(
    State(state): State<TableAppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let hidden = state
        .visibility
        .lock()
        .expect("visibility lock should not be poisoned")
        .toggle(id);

    info!(component = "table", event = "table.toggle", id, hidden);
    Json(json!({ "id": id, "hidden": hidden }))
}

pub fn render_table_html(page: &DisplayPage, state: &QueryState) -> String {
    let now_utc = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>Coffer Price Table</title>\n");
    out.push_str("<style>:root{--bg:#f4efe4;--card:#ffffff;--ink:#221d16;--muted:#6b6156;--line:#ddd4c4;--head:#3b2f1f;--btn:#7a5c1e}*{box-sizing:border-box}body{margin:0;color:var(--ink);font-family:\"Segoe UI\",sans-serif;background:var(--bg);min-height:100vh}.shell{max-width:1400px;margin:0 auto;padding:24px 18px}.hero{background:linear-gradient(135deg,#2d2415,#54431f);color:#f6f1e3;border-radius:14px;padding:16px 20px}.hero h1{margin:0 0 6px;font-size:1.5rem}.hero-meta{display:flex;gap:16px;flex-wrap:wrap;font-size:.9rem;color:#e4dcc6}.card{margin-top:14px;background:var(--card);border:1px solid var(--line);border-radius:14px;overflow:hidden}.filters{display:flex;gap:8px;flex-wrap:wrap;padding:12px 14px;border-bottom:1px solid var(--line)}.filters input{width:120px;padding:5px 7px;border:1px solid var(--line);border-radius:7px;font-size:.8rem}.table-wrap{overflow:auto;max-height:75vh}table{width:100%;border-collapse:collapse;min-width:1100px}thead th{position:sticky;top:0;background:var(--head);color:#f4efe4;font-size:.78rem;text-transform:uppercase;padding:9px 10px}thead th a{color:inherit;text-decoration:none}tbody td{font-size:.84rem;padding:8px 10px;border-bottom:1px solid var(--line);white-space:nowrap}tbody tr.row-hidden{opacity:.45}.toggle-btn{background:var(--btn);color:#fff;border:0;border-radius:7px;padding:5px 9px;font-size:.74rem;cursor:pointer}.pager{padding:10px 14px;font-size:.84rem;color:var(--muted)}.pager a{color:var(--btn);margin:0 6px}</style>\n");
    out.push_str("</head><body><main class=\"shell\">\n");
    out.push_str("<section class=\"hero\"><h1>Coffer Price Table</h1>");
    out.push_str("<div class=\"hero-meta\">");
    out.push_str(&format!(
        "<span>Rows: {} (page {} of {})</span>",
        page.total_rows, page.page, page.total_pages
    ));
    out.push_str(&format!("<span>Generated: {}</span>", escape_html(&now_utc)));
    out.push_str("</div></section>\n");

    out.push_str("<section class=\"card\">");
    out.push_str("<form class=\"filters\" id=\"filters-form\" method=\"get\" action=\"/table\">");
    for key in TABLE_COLUMN_KEYS {
        let value = state.filters.get(key).cloned().unwrap_or_default();
        out.push_str(&format!(
            "<input name=\"{key}\" placeholder=\"{key}\" value=\"{}\">",
            escape_html(&value)
        ));
    }
    if let Some(sort) = &state.sort_key {
        out.push_str(&format!(
            "<input type=\"hidden\" name=\"sort\" value=\"{}\">",
            escape_html(sort)
        ));
        out.push_str(&format!(
            "<input type=\"hidden\" name=\"dir\" value=\"{}\">",
            sort_dir_param(state.sort_dir)
        ));
    }
    out.push_str(&format!(
        "<select name=\"visibility\">{}{}{}</select>",
        visibility_option("visible", "Visible", state.visibility, VisibilityMode::VisibleOnly),
        visibility_option("hidden", "Hidden", state.visibility, VisibilityMode::HiddenOnly),
        visibility_option("all", "All", state.visibility, VisibilityMode::All),
    ));
    out.push_str(&format!(
        "<input name=\"page_size\" type=\"number\" min=\"1\" value=\"{}\">",
        state.page_size
    ));
    out.push_str("<button type=\"submit\" class=\"toggle-btn\">Apply</button>");
    out.push_str("</form>");

    out.push_str("<div class=\"table-wrap\"><table id=\"price-table\"><thead><tr>");
    for (idx, header) in TABLE_HEADERS.iter().enumerate() {
        let key = TABLE_COLUMN_KEYS[idx];
        let dir = if state.sort_key.as_deref() == Some(key)
            && state.sort_dir == SortDirection::Ascending
        {
            "desc"
        } else {
            "asc"
        };
        out.push_str(&format!(
            "<th><a href=\"{}\">{}</a></th>",
            escape_html(&page_link(state, Some((key, dir)), page.page)),
            escape_html(header)
        ));
    }
    out.push_str("<th>Visibility</th></tr></thead><tbody>\n");

    for row in &page.rows {
        let class = if row.hidden { "row-hidden" } else { "" };
        out.push_str(&format!("<tr class=\"{class}\" data-item=\"{}\">", row.id));
        for value in row.to_cell_text_values() {
            out.push_str("<td>");
            out.push_str(&escape_html(&value));
            out.push_str("</td>");
        }
        out.push_str(&format!(
            "<td><form method=\"post\" action=\"/table/toggle/{}\"><button class=\"toggle-btn\" type=\"submit\">{}</button></form></td>",
            row.id,
            if row.hidden { "Show" } else { "Hide" }
        ));
        out.push_str("</tr>\n");
    }

    out.push_str("</tbody></table></div>");
    out.push_str("<div class=\"pager\">");
    if page.page > 1 {
        out.push_str(&format!(
            "<a href=\"{}\">&laquo; Prev</a>",
            escape_html(&page_link(state, None, page.page - 1))
        ));
    }
    out.push_str(&format!("Page {} of {}", page.page, page.total_pages));
    if page.page < page.total_pages {
        out.push_str(&format!(
            "<a href=\"{}\">Next &raquo;</a>",
            escape_html(&page_link(state, None, page.page + 1))
        ));
    }
    out.push_str("</div></section></main></body></html>\n");
    out
}

fn sort_dir_param(dir: SortDirection) -> &'static str {
    match dir {
        SortDirection::Ascending => "asc",
        SortDirection::Descending => "desc",
    }
}

fn visibility_param(mode: VisibilityMode) -> &'static str {
    match mode {
        VisibilityMode::All => "all",
        VisibilityMode::VisibleOnly => "visible",
        VisibilityMode::HiddenOnly => "hidden",
    }
}

fn visibility_option(
    value: &str,
    label: &str,
    current: VisibilityMode,
    this: VisibilityMode,
) -> String {
    let selected = if current == this { " selected" } else { "" };
    format!("<option value=\"{value}\"{selected}>{label}</option>")
}

/// Link back into the table preserving the full query state, optionally
/// overriding the sort column.
fn page_link(state: &QueryState, sort: Option<(&str, &str)>, page: usize) -> String {
    let mut params: Vec<String> = Vec::new();
    for (field, raw) in &state.filters {
        params.push(format!("{field}={}", urlencode(raw)));
    }
    match sort {
        Some((key, dir)) => {
            params.push(format!("sort={key}"));
            params.push(format!("dir={dir}"));
        }
        None => {
            if let Some(key) = &state.sort_key {
                params.push(format!("sort={key}"));
                params.push(format!("dir={}", sort_dir_param(state.sort_dir)));
            }
        }
    }
    params.push(format!("visibility={}", visibility_param(state.visibility)));
    params.push(format!("page_size={}", state.page_size));
    params.push(format!("page={page}"));
    format!("/table?{}", params.join("&"))
}

fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::InMemoryKvStore;

    #[test]
    fn header_and_key_arrays_stay_in_lockstep() {
        assert_eq!(TABLE_HEADERS.len(), TABLE_COLUMN_KEYS.len());
        assert_eq!(TABLE_COLUMN_KEYS[0], "id");
        assert_eq!(TABLE_COLUMN_KEYS[11], "price_percentage");
    }

    #[test]
    fn display_row_renders_none_for_absent_market_fields() {
        let records = demo_records();
        let base = records.iter().find(|r| r.id == 6).unwrap();
        let row = TableRow::from_record(base, false);

        assert_eq!(row.market_high, "none");
        assert_eq!(row.high_time, "none");
        assert_eq!(row.difference, "none");
        assert_eq!(row.price_percentage, "none");
    }

    #[test]
    fn display_row_formats_percentage_with_two_decimals() {
        let records = demo_records();
        let whip = records.iter().find(|r| r.id == 4151).unwrap();
        let row = TableRow::from_record(whip, false);

        assert_eq!(row.difference, "-50000");
        assert_eq!(row.price_percentage, "-2.94%");
        assert!(row.high_time.starts_with("2025-01-01"));
    }

    #[test]
    fn query_params_build_the_expected_state() {
        let query = TableQuery {
            name: Some("drag".to_string()),
            price: Some(">100".to_string()),
            sort: Some("price".to_string()),
            dir: Some("desc".to_string()),
            visibility: Some("all".to_string()),
            page: Some(3),
            page_size: Some(10),
            ..TableQuery::default()
        };

        let state = query.to_query_state();
        assert_eq!(state.filters.len(), 2);
        assert_eq!(state.filters["name"], "drag");
        assert_eq!(state.sort_key.as_deref(), Some("price"));
        assert_eq!(state.sort_dir, SortDirection::Descending);
        assert_eq!(state.visibility, VisibilityMode::All);
        assert_eq!(state.page, 3);
        assert_eq!(state.page_size, 10);
    }

    #[test]
    fn empty_query_params_impose_no_filters() {
        let state = TableQuery::default().to_query_state();
        assert!(state.filters.is_empty());
        assert_eq!(state.sort_key, None);
        assert_eq!(state.visibility, VisibilityMode::VisibleOnly);
    }

    #[test]
    fn build_display_page_marks_hidden_rows() {
        let records = demo_records();
        let mut visibility = VisibilityStore::load(Box::new(InMemoryKvStore::default()));
        visibility.toggle(2);

        let mut state = QueryState {
            visibility: VisibilityMode::All,
            ..QueryState::default()
        };
        let page = build_display_page(&records, &visibility, &mut state);

        let cannonball = page.rows.iter().find(|r| r.id == 2).unwrap();
        assert!(cannonball.hidden);
        assert!(!page.rows.iter().find(|r| r.id == 6).unwrap().hidden);
    }

    #[test]
    fn rendered_html_contains_table_filters_and_toggle_forms() {
        let mut state = QueryState::default();
        let visibility = VisibilityStore::load(Box::new(InMemoryKvStore::default()));
        let page = build_display_page(&demo_records(), &visibility, &mut state);

        let html = render_table_html(&page, &state);
        assert!(html.contains("<table"));
        assert!(html.contains("filters-form"));
        assert!(html.contains("name=\"name\""));
        assert!(html.contains("name=\"price_percentage\""));
        assert!(html.contains("/table/toggle/2"));
        assert!(html.contains("Page 1 of 1"));
    }

    #[test]
    fn page_link_preserves_filters_and_escapes_values() {
        let mut state = QueryState::default();
        state.set_filter("price", ">100 <200");
        state.sort_by("price");

        let link = page_link(&state, None, 2);
        assert!(link.starts_with("/table?"));
        assert!(link.contains("price=%3E100%20%3C200"));
        assert!(link.contains("sort=price"));
        assert!(link.contains("page=2"));
    }
}
