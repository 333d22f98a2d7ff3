//! # Data Transfer Objects (DTOs)
//!
//! ورودی و خروجی عملیات‌های موتور

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{LinkStatus, ShortLink};

// =====================================
// Shorten Request
// =====================================
/// درخواست ساخت لینک کوتاه
///
/// فیلدهای اختیاری از تنظیمات پر میشن
/// (`default_max_clicks` و `default_expiration_hours`).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShortenRequest {
    /// آدرس اصلی
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,

    /// سقف کلیک (اختیاری)
    #[validate(range(min = 1, message = "Max clicks must be positive"))]
    pub max_clicks: Option<u32>,

    /// مدت اعتبار به ساعت (اختیاری)
    #[validate(range(min = 1, message = "Expiration hours must be positive"))]
    pub expires_in_hours: Option<u32>,
}

impl ShortenRequest {
    /// درخواست با مقادیر پیش‌فرض
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_clicks: None,
            expires_in_hours: None,
        }
    }

    #[must_use]
    pub fn with_max_clicks(mut self, max_clicks: u32) -> Self {
        self.max_clicks = Some(max_clicks);
        self
    }

    #[must_use]
    pub fn with_expires_in_hours(mut self, hours: u32) -> Self {
        self.expires_in_hours = Some(hours);
        self
    }
}

// =====================================
// Access Result
// =====================================
/// نتیجه یک دسترسی موفق
///
/// فراخواننده با `target_url` تصمیم میگیره چیکار کنه (redirect، باز کردن و ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessGranted {
    pub target_url: String,
    pub click_count: u32,
    pub max_clicks: u32,
    /// وضعیت بعد از این کلیک (Active یا LimitExceeded)
    pub status: LinkStatus,
}

impl From<&ShortLink> for AccessGranted {
    fn from(link: &ShortLink) -> Self {
        Self {
            target_url: link.target_url.clone(),
            click_count: link.click_count,
            max_clicks: link.max_clicks,
            status: link.status,
        }
    }
}

// =====================================
// Statistics
// =====================================
/// آمار کلی storage
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct LinkStats {
    pub total_links: i64,
    pub active_links: i64,
    pub total_owners: i64,
    pub total_clicks: i64,
}
