//! # زمان‌بند sweep
//!
//! یک task جدا که هر `interval` یک بار `sweep_expired(Utc::now())` رو صدا میزنه.
//! shutdown فقط زمان‌بندی بعدی رو متوقف میکنه؛ sweep در حال اجرا تموم میشه.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info};

use super::LifecycleEngine;

/// راه‌انداز task دوره‌ای sweep
pub struct SweepScheduler;

impl SweepScheduler {
    /// شروع task؛ اولین sweep بعد از یک `interval` کامل اجرا میشه
    ///
    /// # Panics
    /// اگه `interval` صفر باشه (`tokio::time::interval_at` قبولش نمیکنه)
    #[must_use]
    pub fn start(engine: Arc<LifecycleEngine>, interval: Duration) -> SweepHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            // اگه یک sweep طول کشید، tickهای جا مونده پشت سر هم اجرا نمیشن
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(interval_secs = interval.as_secs_f64(), "Sweep scheduler started");

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        match engine.sweep_expired(Utc::now()).await {
                            Ok(count) => debug!(count, "Scheduled sweep finished"),
                            Err(e) => error!(error = %e, "Scheduled sweep failed"),
                        }
                    }
                }
            }

            info!("Sweep scheduler stopped");
        });

        SweepHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// کنترل task زمان‌بند
pub struct SweepHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// توقف تمیز: منتظر میمونه تا sweep فعلی (اگه هست) تموم بشه
    pub async fn shutdown(self) {
        // اگه task قبلا تموم شده باشه receiver وجود نداره
        let _ = self.shutdown.send(true);

        if let Err(e) = self.task.await {
            error!(error = %e, "Sweep scheduler task failed");
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
