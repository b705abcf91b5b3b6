use std::{net::SocketAddr, sync::Arc, sync::Mutex};

use coffer::{
    init_logging, log_app_bind, log_app_start, log_source_selected, logging_config_from_env,
    relay_router, table_router, FeedConfig, InMemoryRecordSource, LiveFeedConfig, LiveFeedSource,
    RecordSource, SqliteKvStore, VisibilityStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;
    log_app_start(&logging_cfg);

    let addr: SocketAddr = std::env::var("COFFER_TABLE_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        .parse()?;

    let feed_cfg = feed_config_from_env();
    let store_path =
        std::env::var("COFFER_STORE_PATH").unwrap_or_else(|_| "coffer_state.sqlite".to_string());
    let kv = SqliteKvStore::open(&store_path)?;
    let visibility = Arc::new(Mutex::new(VisibilityStore::load(Box::new(kv))));

    let source = source_from_env(&feed_cfg);
    let app = table_router(source, visibility).merge(relay_router(feed_cfg));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    log_app_bind(bound_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn feed_config_from_env() -> FeedConfig {
    let mut cfg = FeedConfig::default();
    if let Ok(url) = std::env::var("COFFER_OFFICIAL_URL") {
        cfg.official_url = url;
    }
    if let Ok(url) = std::env::var("COFFER_MARKET_URL") {
        cfg.market_url = url;
    }
    if let Ok(agent) = std::env::var("COFFER_USER_AGENT") {
        cfg.user_agent = agent;
    }
    cfg
}

fn source_from_env(feed_cfg: &FeedConfig) -> Arc<dyn RecordSource> {
    let force_demo = std::env::var("COFFER_USE_DEMO")
        .map(|raw| raw == "1" || raw.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if force_demo {
        log_source_selected("demo", Some("COFFER_USE_DEMO"), None);
        return Arc::new(InMemoryRecordSource::demo());
    }

    let mut cfg = LiveFeedConfig {
        feed: feed_cfg.clone(),
        ..LiveFeedConfig::default()
    };
    if let Ok(raw) = std::env::var("COFFER_REFRESH_MS") {
        if let Ok(interval) = raw.parse::<u64>() {
            cfg.refresh_interval_ms = interval.max(1_000);
        }
    }

    log_source_selected("live_feeds", None, Some(cfg.refresh_interval_ms));
    Arc::new(LiveFeedSource::spawn(cfg))
}
