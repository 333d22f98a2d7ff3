//! # مدل لینک کوتاه
//!
//! Entity اصلی و ماشین وضعیت اون

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::OwnerId;
use crate::error::{AppError, Result};

// =====================================
// Link Status
// =====================================
/// وضعیت لینک
///
/// ```text
///            access (click == max)
///   Active ───────────────────────► LimitExceeded
///     │  \
///     │   \ sweep (expires_at < now)
///     │    └──────────────────────► Expired
///     │ deactivate
///     └───────────────────────────► Inactive
/// ```
///
/// هر سه وضعیت پایانی دائمی هستن؛ لینک هیچوقت به Active برنمیگرده.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    #[default]
    Active,
    Expired,
    LimitExceeded,
    Inactive,
}

impl LinkStatus {
    /// شکل متنی برای ذخیره در دیتابیس
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::LimitExceeded => "limit_exceeded",
            Self::Inactive => "inactive",
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl FromStr for LinkStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "limit_exceeded" => Ok(Self::LimitExceeded),
            "inactive" => Ok(Self::Inactive),
            other => Err(AppError::Storage(format!("unknown link status '{}'", other))),
        }
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =====================================
// Inaccessible Reason
// =====================================
/// دلیل در دسترس نبودن لینک
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InaccessibleReason {
    Expired,
    LimitExceeded,
    Inactive,
}

impl std::fmt::Display for InaccessibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Expired => "link has expired",
            Self::LimitExceeded => "click limit exceeded",
            Self::Inactive => "link is inactive",
        };
        f.write_str(text)
    }
}

// =====================================
// ShortLink Entity
// =====================================
/// رکورد لینک کوتاه
///
/// فیلدهای `code`، `target_url`، `owner_id` و `created_at` بعد از ساخت تغییر نمیکنن.
/// `revision` با هر تغییر ذخیره‌شده یکی زیاد میشه و storage ازش برای
/// compare-and-swap استفاده میکنه.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    pub code: String,
    pub target_url: String,
    pub owner_id: OwnerId,
    pub click_count: u32,
    pub max_clicks: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: LinkStatus,
    pub revision: u64,
}

impl ShortLink {
    /// آیا زمان لینک در لحظه `now` گذشته؟
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// آیا تعداد کلیک به سقف رسیده؟
    #[must_use]
    pub fn is_click_limit_reached(&self) -> bool {
        self.click_count >= self.max_clicks
    }

    /// تصمیم دسترسی
    ///
    /// `status == Active` و `now <= expires_at` و `click_count < max_clicks`.
    /// تابع خالص هست؛ وضعیت ذخیره‌شده رو تغییر نمیده.
    #[must_use]
    pub fn is_accessible(&self, now: DateTime<Utc>) -> bool {
        self.status.is_active() && !self.is_expired_at(now) && !self.is_click_limit_reached()
    }

    /// دلیل مشخص در دسترس نبودن، یا `None` اگه لینک قابل دسترسی باشه
    ///
    /// وضعیت ذخیره‌شده اولویت داره؛ برای لینک Active زمان قبل از کلیک بررسی میشه.
    #[must_use]
    pub fn inaccessibility_reason(&self, now: DateTime<Utc>) -> Option<InaccessibleReason> {
        match self.status {
            LinkStatus::Expired => Some(InaccessibleReason::Expired),
            LinkStatus::LimitExceeded => Some(InaccessibleReason::LimitExceeded),
            LinkStatus::Inactive => Some(InaccessibleReason::Inactive),
            LinkStatus::Active if self.is_expired_at(now) => Some(InaccessibleReason::Expired),
            LinkStatus::Active if self.is_click_limit_reached() => {
                Some(InaccessibleReason::LimitExceeded)
            }
            LinkStatus::Active => None,
        }
    }

    /// آیا `owner` مالک این لینک هست؟
    #[must_use]
    pub fn is_owned_by(&self, owner: &OwnerId) -> bool {
        &self.owner_id == owner
    }

    /// لینک کامل (مثلا `clck.ru/abcDEF1`)
    #[must_use]
    pub fn full_short_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.code)
    }
}

// =====================================
// Link Builder (Builder Pattern)
// =====================================
/// Builder برای ساخت رکورد جدید با `status = Active` و `click_count = 0`
///
/// # مثال
/// ```rust
/// use link_lifecycle::models::{LinkBuilder, LinkStatus, OwnerId};
///
/// let link = LinkBuilder::new("https://example.com")
///     .code("abcDEF1")
///     .owner(OwnerId::new())
///     .max_clicks(3)
///     .expires_in_hours(24)
///     .build()
///     .unwrap();
/// assert_eq!(link.status, LinkStatus::Active);
/// assert_eq!(link.click_count, 0);
/// ```
#[derive(Debug, Default)]
pub struct LinkBuilder {
    target_url: String,
    code: Option<String>,
    owner_id: Option<OwnerId>,
    max_clicks: Option<u32>,
    created_at: Option<DateTime<Utc>>,
    expiry: Option<Expiry>,
}

/// انقضا یا زمان مشخص هست یا چند ساعت بعد از ساخت
#[derive(Debug, Clone, Copy)]
enum Expiry {
    At(DateTime<Utc>),
    AfterHours(u32),
}

impl LinkBuilder {
    /// شروع builder با URL مقصد
    #[must_use]
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn owner(mut self, owner: OwnerId) -> Self {
        self.owner_id = Some(owner);
        self
    }

    #[must_use]
    pub fn max_clicks(mut self, max_clicks: u32) -> Self {
        self.max_clicks = Some(max_clicks);
        self
    }

    /// زمان ساخت (پیش‌فرض: الان)
    #[must_use]
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    #[must_use]
    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expiry = Some(Expiry::At(expires_at));
        self
    }

    /// انقضا بعد از n ساعت از زمان ساخت (در `build` محاسبه میشه)
    #[must_use]
    pub fn expires_in_hours(mut self, hours: u32) -> Self {
        self.expiry = Some(Expiry::AfterHours(hours));
        self
    }

    /// ساخت ShortLink
    ///
    /// # Errors
    /// `InvalidInput` اگه کد، مالک، سقف کلیک یا انقضا تنظیم نشده باشه،
    /// یا زمان انقضا از بازه `DateTime` بیرون بزنه
    pub fn build(self) -> Result<ShortLink> {
        let code = self
            .code
            .ok_or_else(|| AppError::InvalidInput("short code is required".to_string()))?;
        let owner_id = self
            .owner_id
            .ok_or_else(|| AppError::InvalidInput("owner id is required".to_string()))?;
        let max_clicks = match self.max_clicks {
            Some(0) | None => {
                return Err(AppError::InvalidInput(
                    "max clicks must be positive".to_string(),
                ))
            }
            Some(n) => n,
        };
        let created_at = self.created_at.unwrap_or_else(Utc::now);
        let expires_at = match self.expiry {
            Some(Expiry::At(at)) => at,
            Some(Expiry::AfterHours(hours)) => created_at
                .checked_add_signed(Duration::hours(i64::from(hours)))
                .ok_or_else(|| AppError::InvalidInput("expiration out of range".to_string()))?,
            None => {
                return Err(AppError::InvalidInput(
                    "expiration is required".to_string(),
                ))
            }
        };

        Ok(ShortLink {
            code,
            target_url: self.target_url,
            owner_id,
            click_count: 0,
            max_clicks,
            created_at,
            expires_at,
            status: LinkStatus::Active,
            revision: 0,
        })
    }
}
