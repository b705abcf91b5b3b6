//! Coffer core crate.
//!
//! Joins the official and market price feeds into one item table and answers
//! filter/sort/page queries over it:
//! - feed normalization with tolerant key parsing
//! - left-biased join with derived difference/percentage fields
//! - per-field filter expressions, visibility state, sorting, pagination
//! - axum table routes plus a passthrough feed relay

mod feeds;
mod filter;
mod join;
mod observability;
mod query;
mod relay;
mod table;
mod visibility;

pub use feeds::{
    fetch_market, fetch_official, normalize_market, normalize_metadata, FeedConfig, FeedError,
    FeedHttp, MarketNormalizeReport, MetadataNormalizeReport, RawMarketRecord, RawMetadataRecord,
    ReqwestBlockingFeed, DEFAULT_MARKET_URL, DEFAULT_OFFICIAL_URL, DEFAULT_USER_AGENT,
};
pub use filter::{field_kind, matches, FieldKind, FilterSet};
pub use join::{join_records, CombinedRecord};
pub use observability::{
    init_logging, log_app_bind, log_app_start, log_source_selected, logging_config_from_env,
    LogFormat, LoggingConfig, LoggingInitError,
};
pub use query::{
    paginate, run_query, sort_records, total_pages, QueryPage, QueryState, SortDirection,
    VisibilityMode, DEFAULT_PAGE_SIZE,
};
pub use relay::relay_router;
pub use table::{
    build_display_page, demo_records, render_table_html, table_router, DisplayPage,
    InMemoryRecordSource, LiveFeedConfig, LiveFeedSource, RecordSource, TableQuery, TableRow,
    TABLE_COLUMN_KEYS, TABLE_HEADERS,
};
pub use visibility::{
    is_hidden, InMemoryKvStore, KvStore, SqliteKvStore, StoreError, VisibilityMap, VisibilityStore,
};
