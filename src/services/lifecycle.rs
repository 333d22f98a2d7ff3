//! # موتور چرخه عمر لینک
//!
//! منطق کسب‌وکار لینک‌های کوتاه: ساخت، دسترسی، sweep و عملیات مالک.
//!
//! ## همزمانی
//!
//! هر تغییر یک حلقه read-modify-CAS هست:
//!
//! ```text
//! loop {
//!     link = store.get(code)
//!     تصمیم روی link
//!     store.compare_and_swap(link.revision, updated)  // اگه false بود دوباره
//! }
//! ```
//!
//! CAS ناموفق یعنی نویسنده دیگه‌ای موفق شده، پس حلقه همیشه پیشرفت داره.
//! دو دسترسی همزمان روی آخرین کلیک باقی‌مونده هیچوقت هر دو موفق نمیشن.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use super::{messages, CodeGenerator, NotificationSink};
use crate::{
    config::Config,
    database::LinkStore,
    error::{AppError, OptionExt, Result},
    models::{AccessGranted, LinkBuilder, LinkStats, LinkStatus, OwnerId, ShortLink, ShortenRequest},
    utils,
};

/// چند بار ساخت + رزرو کد تکرار بشه اگه insert برخورد داشت
const MAX_RESERVE_ATTEMPTS: usize = 3;

/// موتور چرخه عمر
///
/// # مسئولیت‌ها:
/// - ساخت لینک (ژنراتور + رزرو اتمیک کد)
/// - تصمیم دسترسی و شمارش کلیک
/// - sweep دوره‌ای لینک‌های منقضی
/// - عملیات مدیریتی مالک
#[derive(Clone)]
pub struct LifecycleEngine {
    store: Arc<dyn LinkStore>,
    notifier: Arc<dyn NotificationSink>,
    generator: CodeGenerator,
    config: Arc<Config>,
}

impl LifecycleEngine {
    /// ساخت موتور با collaboratorهای تزریق‌شده
    #[must_use]
    pub fn new(
        store: Arc<dyn LinkStore>,
        notifier: Arc<dyn NotificationSink>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            generator: CodeGenerator::new(store.clone()),
            store,
            notifier,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// تصمیم دسترسی؛ تابع خالص روی وضعیت فعلی و زمان
    #[must_use]
    pub fn is_accessible(link: &ShortLink, now: DateTime<Utc>) -> bool {
        link.is_accessible(now)
    }

    /// لینک کامل برای نمایش
    #[must_use]
    pub fn short_url(&self, link: &ShortLink) -> String {
        link.full_short_url(&self.config.base_url)
    }

    // =====================================
    // Creation
    // =====================================
    /// ساخت لینک کوتاه جدید
    ///
    /// # Errors
    /// - `InvalidInput`: URL نامعتبر، سقف کلیک یا مدت صفر
    /// - `StorageFailure`
    #[instrument(skip(self, request, owner), fields(url = %request.url, owner = %owner))]
    pub async fn shorten(&self, request: ShortenRequest, owner: &OwnerId) -> Result<ShortLink> {
        request.validate()?;

        if !utils::is_valid_url(&request.url) {
            return Err(AppError::InvalidInput(format!(
                "invalid URL format: {}",
                request.url
            )));
        }

        let target_url = utils::normalize_url(&request.url);
        let max_clicks = request.max_clicks.unwrap_or(self.config.default_max_clicks);
        let hours = request
            .expires_in_hours
            .unwrap_or(self.config.default_expiration_hours);

        for attempt in 0..MAX_RESERVE_ATTEMPTS {
            let code = self.generator.generate(&target_url, owner).await?;

            let link = LinkBuilder::new(target_url.clone())
                .code(code)
                .owner(*owner)
                .max_clicks(max_clicks)
                .created_at(Utc::now())
                .expires_in_hours(hours)
                .build()?;

            // insert همون check-and-reserve اتمیک هست
            if self.store.insert(&link).await? {
                info!(code = %link.code, max_clicks, hours, "Created short link");
                self.notifier
                    .notify(owner, messages::created(&link, &self.config.base_url));
                return Ok(link);
            }

            debug!(code = %link.code, attempt, "Code taken between generation and insert");
        }

        Err(AppError::Storage(
            "could not reserve a unique short code".to_string(),
        ))
    }

    // =====================================
    // Access
    // =====================================
    /// یک تلاش برای دسترسی به لینک
    ///
    /// تنها مسیری که `click_count` رو زیاد میکنه. دسترسی رد شده هیچ تغییری
    /// در رکورد نمیده؛ حتی اگه زمانش گذشته باشه وضعیت رو sweep عوض میکنه.
    ///
    /// # Errors
    /// - `InvalidInput`: کد با الفبا نمیخونه
    /// - `NotFound`
    /// - `NotAccessible(reason)`
    #[instrument(skip(self))]
    pub async fn access(&self, code: &str, now: DateTime<Utc>) -> Result<AccessGranted> {
        if !utils::is_valid_short_code(code) {
            return Err(AppError::InvalidInput(format!(
                "invalid short code format: {}",
                code
            )));
        }

        loop {
            let link = self.store.get(code).await?.ok_or_not_found(code)?;

            if let Some(reason) = link.inaccessibility_reason(now) {
                warn!(code, %reason, "Access denied");
                self.notifier.notify(
                    &link.owner_id,
                    messages::access_denied(&link, reason, &self.config.base_url),
                );
                return Err(AppError::NotAccessible(reason));
            }

            let mut updated = link.clone();
            updated.click_count += 1;
            if updated.click_count >= updated.max_clicks {
                updated.status = LinkStatus::LimitExceeded;
            }
            updated.revision = link.revision + 1;

            if !self.store.compare_and_swap(link.revision, &updated).await? {
                debug!(code, "Concurrent update on link, retrying access");
                continue;
            }

            if updated.status == LinkStatus::LimitExceeded {
                info!(code, clicks = updated.click_count, "Click limit reached");
                self.notifier.notify(
                    &updated.owner_id,
                    messages::limit_reached(&updated, &self.config.base_url),
                );
            }

            return Ok(AccessGranted::from(&updated));
        }
    }

    // =====================================
    // Sweep
    // =====================================
    /// انتقال لینک‌های Active که زمانشون گذشته به Expired
    ///
    /// تنها مسیر Active → Expired. تعداد رکوردهای منتقل‌شده رو برمیگردونه.
    #[instrument(skip(self))]
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let candidates = self.store.expired_active(now).await?;

        let mut transitioned = 0;
        for candidate in candidates {
            if let Some(link) = self.expire(&candidate.code, now).await? {
                self.notifier
                    .notify(&link.owner_id, messages::expired(&link, &self.config.base_url));
                transitioned += 1;
            }
        }

        if transitioned > 0 {
            info!(count = transitioned, "Swept expired links");
        }

        Ok(transitioned)
    }

    /// انتقال یک رکورد؛ اگه در این فاصله تغییر کرده بود دوباره بررسی میشه
    async fn expire(&self, code: &str, now: DateTime<Utc>) -> Result<Option<ShortLink>> {
        loop {
            let Some(link) = self.store.get(code).await? else {
                return Ok(None);
            };

            // ممکنه همزمان تمدید، غیرفعال یا پر شده باشه
            if !link.status.is_active() || link.expires_at >= now {
                return Ok(None);
            }

            let mut updated = link.clone();
            updated.status = LinkStatus::Expired;
            updated.revision = link.revision + 1;

            if self.store.compare_and_swap(link.revision, &updated).await? {
                return Ok(Some(updated));
            }
        }
    }

    // =====================================
    // Owner Management
    // =====================================
    /// تغییر سقف کلیک
    ///
    /// سقف جدید باید مثبت و بیشتر از تعداد کلیک فعلی باشه.
    ///
    /// # Errors
    /// `InvalidInput`، `NotFound`، `Forbidden`، `InvalidState`
    #[instrument(skip(self))]
    pub async fn raise_click_limit(
        &self,
        code: &str,
        owner: &OwnerId,
        new_limit: u32,
    ) -> Result<ShortLink> {
        if new_limit == 0 {
            return Err(AppError::InvalidInput(
                "click limit must be positive".to_string(),
            ));
        }

        let link = self
            .mutate_active(code, owner, |link| {
                if new_limit <= link.click_count {
                    return Err(AppError::InvalidInput(format!(
                        "click limit must exceed current clicks ({})",
                        link.click_count
                    )));
                }
                link.max_clicks = new_limit;
                Ok(())
            })
            .await?;

        info!(code, new_limit, "Click limit updated");
        self.notifier
            .notify(owner, messages::limit_raised(&link, &self.config.base_url));
        Ok(link)
    }

    /// تمدید انقضا: `expires_at += extra`
    ///
    /// # Errors
    /// `InvalidInput` (مدت غیرمثبت یا انقضای خارج از بازه)، `NotFound`، `Forbidden`، `InvalidState`
    #[instrument(skip(self))]
    pub async fn extend_expiry(
        &self,
        code: &str,
        owner: &OwnerId,
        extra: Duration,
    ) -> Result<ShortLink> {
        if extra <= Duration::zero() {
            return Err(AppError::InvalidInput(
                "extension must be positive".to_string(),
            ));
        }

        let link = self
            .mutate_active(code, owner, |link| {
                link.expires_at = link.expires_at.checked_add_signed(extra).ok_or_else(|| {
                    AppError::InvalidInput("expiration out of range".to_string())
                })?;
                Ok(())
            })
            .await?;

        info!(code, expires_at = %link.expires_at, "Expiration extended");
        self.notifier.notify(
            owner,
            messages::expiry_extended(&link, extra, &self.config.base_url),
        );
        Ok(link)
    }

    /// غیرفعال کردن لینک
    ///
    /// اگه لینک از قبل Active نبود `false` برمیگردونه و کاری نمیکنه.
    ///
    /// # Errors
    /// `NotFound`، `Forbidden`
    #[instrument(skip(self))]
    pub async fn deactivate(&self, code: &str, owner: &OwnerId) -> Result<bool> {
        let result = self
            .mutate_active(code, owner, |link| {
                link.status = LinkStatus::Inactive;
                Ok(())
            })
            .await;

        match result {
            Ok(link) => {
                info!(code, "Link deactivated");
                self.notifier
                    .notify(owner, messages::deactivated(&link, &self.config.base_url));
                Ok(true)
            }
            Err(AppError::InvalidState(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// حلقه CAS مشترک عملیات‌های مدیریتی
    ///
    /// ترتیب بررسی: وجود → مالکیت → Active بودن → `apply`.
    async fn mutate_active<F>(&self, code: &str, owner: &OwnerId, mut apply: F) -> Result<ShortLink>
    where
        F: FnMut(&mut ShortLink) -> Result<()>,
    {
        loop {
            let link = self.store.get(code).await?.ok_or_not_found(code)?;

            if !link.is_owned_by(owner) {
                return Err(AppError::not_owner(code));
            }

            if !link.status.is_active() {
                return Err(AppError::InvalidState(format!(
                    "link '{}' is {}",
                    code, link.status
                )));
            }

            let mut updated = link.clone();
            apply(&mut updated)?;
            updated.revision = link.revision + 1;

            if self.store.compare_and_swap(link.revision, &updated).await? {
                return Ok(updated);
            }

            debug!(code, "Concurrent update on link, retrying");
        }
    }

    // =====================================
    // Queries
    // =====================================
    /// اطلاعات یک لینک (برای همه وضعیت‌ها، حتی پایانی)
    pub async fn link_info(&self, code: &str) -> Result<ShortLink> {
        if !utils::is_valid_short_code(code) {
            return Err(AppError::InvalidInput(format!(
                "invalid short code format: {}",
                code
            )));
        }

        self.store.get(code).await?.ok_or_not_found(code)
    }

    /// لینک‌های یک مالک
    pub async fn owner_links(&self, owner: &OwnerId) -> Result<Vec<ShortLink>> {
        self.store.list_by_owner(owner).await
    }

    /// آمار storage
    pub async fn statistics(&self) -> Result<LinkStats> {
        self.store.stats().await
    }
}
