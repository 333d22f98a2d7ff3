//! # Link Lifecycle Library
//!
//! موتور لینک‌های کوتاه با سقف کلیک و زمان انقضا.
//!
//! ## ساختار پروژه
//!
//! ```text
//! src/
//! ├── lib.rs          # نقطه ورود کتابخانه - اینجا!
//! ├── main.rs         # daemon: sweep دوره‌ای روی SQLite
//! ├── config/         # مدیریت تنظیمات
//! ├── error/          # تعریف خطاها
//! ├── database/       # LinkStore و پیاده‌سازی‌هاش
//! ├── models/         # مدل‌های داده
//! ├── services/       # ژنراتور، موتور چرخه عمر، زمان‌بند
//! └── utils/          # توابع کمکی
//! ```
//!
//! ## مثال استفاده
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use link_lifecycle::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let state = AppState::new(Arc::new(MemoryLinkStore::new()), Config::default());
//!     let owner = OwnerId::new();
//!
//!     let link = state
//!         .engine
//!         .shorten(ShortenRequest::new("https://example.com").with_max_clicks(3), &owner)
//!         .await?;
//!     let granted = state.engine.access(&link.code, Utc::now()).await?;
//!     println!("{} -> {}", link.code, granted.target_url);
//!     Ok(())
//! }
//! ```

// =====================================
// Module Declarations
// =====================================

/// ماژول مدیریت تنظیمات برنامه
pub mod config;

/// ماژول تعریف و مدیریت خطاها
pub mod error;

/// ماژول storage
pub mod database;

/// ماژول مدل‌های داده (Domain Models)
pub mod models;

/// ماژول سرویس‌ها (Business Logic)
pub mod services;

/// ماژول توابع کمکی
pub mod utils;

// =====================================
// Re-exports
// =====================================

/// نتیجه عملیات با خطای سفارشی ما
pub use error::Result;

/// خطای اصلی برنامه
pub use error::AppError;

// =====================================
// Prelude Module
// =====================================
/// ماژول prelude برای import راحت‌تر آیتم‌های پرکاربرد
///
/// کاربرد:
/// ```rust
/// use link_lifecycle::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Config, ConfigBuilder};
    pub use crate::database::{Database, LinkStore, MemoryLinkStore, SqliteLinkStore};
    pub use crate::error::{AppError, Result};
    pub use crate::models::*;
    pub use crate::services::*;
}
