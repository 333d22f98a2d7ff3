//! # ماژول سرویس‌ها (Business Logic Layer)
//!
//! ## لایه‌بندی معماری
//!
//! ```text
//! ┌──────────────────────┐
//! │  لایه بیرونی (CLI…)  │  <-- خارج از این crate
//! ├──────────────────────┤
//! │   LifecycleEngine    │  <-- اینجا!
//! │   CodeGenerator      │
//! │   SweepScheduler     │
//! ├──────────────────────┤
//! │ LinkStore │ Notifier │  <-- collaboratorهای تزریق‌شده
//! └──────────────────────┘
//! ```
//!
//! هیچ state سراسری نداریم؛ همه چیز از constructor تزریق میشه.

mod generator;
mod lifecycle;
mod notifier;
mod scheduler;

pub use generator::*;
pub use lifecycle::*;
pub use notifier::*;
pub use scheduler::*;

use std::sync::Arc;

use crate::{config::Config, database::LinkStore};

// =====================================
// Application State
// =====================================
/// سیم‌کشی سرویس‌ها برای لایه بیرونی
///
/// # مفاهیم:
/// - `Arc<T>`: Reference counting برای thread-safe sharing
/// - `Clone`: فقط Arcها clone میشن، نه داده
#[derive(Clone)]
pub struct AppState {
    /// تنظیمات برنامه
    pub config: Arc<Config>,

    /// موتور چرخه عمر
    pub engine: Arc<LifecycleEngine>,

    /// صف اعلان‌ها؛ همون sink که موتور بهش می‌نویسه
    pub notifications: Arc<NotificationCenter>,
}

impl AppState {
    /// ساخت AppState روی یک storage دلخواه
    #[must_use]
    pub fn new(store: Arc<dyn LinkStore>, config: Config) -> Self {
        let config = Arc::new(config);
        let notifications = Arc::new(NotificationCenter::new());

        let engine = Arc::new(LifecycleEngine::new(
            store,
            notifications.clone(),
            config.clone(),
        ));

        Self {
            config,
            engine,
            notifications,
        }
    }

    /// شروع sweep دوره‌ای با فاصله تنظیم‌شده
    #[must_use]
    pub fn start_sweeper(&self) -> SweepHandle {
        SweepScheduler::start(self.engine.clone(), self.config.cleanup_interval())
    }
}
