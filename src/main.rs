//! # Link Lifecycle - نقطه ورود برنامه
//!
//! daemon کوچیکی که storage رو آماده میکنه و sweep دوره‌ای رو اجرا میکنه
//! تا وقتی Ctrl+C بیاد.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use link_lifecycle::{
    config::{Config, Environment},
    database::{Database, SqliteLinkStore},
    error::Result,
    services::AppState,
    utils,
};

/// نقطه ورود اصلی برنامه
///
/// # Errors
/// خطا برمیگردونه اگه:
/// - تنظیمات لود نشن یا نامعتبر باشن
/// - دیتابیس متصل نشه یا migration شکست بخوره
#[tokio::main]
async fn main() -> Result<()> {
    // اگه فایل .env نباشه اوکیه
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.environment);

    info!("🚀 Starting link lifecycle service...");

    config.validate()?;
    info!(
        environment = ?config.environment,
        base_url = %config.base_url,
        "✅ Configuration loaded successfully"
    );

    let database = Database::connect(&config.database_url).await?;
    database.migrate().await?;
    info!("✅ Database connected and migrated");

    let store = Arc::new(SqliteLinkStore::new(database));
    let state = AppState::new(store, config);

    // رکوردهایی که وقتی سرویس خاموش بود منقضی شدن
    let swept = state.engine.sweep_expired(Utc::now()).await?;
    info!(count = swept, "Initial sweep finished");

    let sweeper = state.start_sweeper();
    info!(
        every = %utils::format_duration(state.config.cleanup_interval().as_secs() as i64),
        "⏱️  Sweep scheduler running, press Ctrl+C to stop"
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }

    info!("Shutting down...");
    sweeper.shutdown().await;

    let stats = state.engine.statistics().await?;
    info!(
        total = stats.total_links,
        active = stats.active_links,
        clicks = stats.total_clicks,
        "👋 Bye"
    );

    Ok(())
}

/// راه‌اندازی سیستم tracing برای لاگینگ
///
/// # مفاهیم:
/// - Structured Logging: لاگ‌ها به صورت ساختاریافته ذخیره میشن
/// - EnvFilter: فیلتر کردن لاگ‌ها بر اساس `RUST_LOG`
/// - در production خروجی JSON برای جمع‌آوری لاگ
fn init_tracing(environment: Environment) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("link_lifecycle=debug,sqlx=warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if environment.is_production() {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_level(true)
                    .pretty(),
            )
            .init();
    }
}
