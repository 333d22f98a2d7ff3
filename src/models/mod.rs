//! # ماژول مدل‌ها (Domain Models)
//!
//! این ماژول مدل‌های داده موتور لینک کوتاه رو تعریف میکنه.
//!
//! ## تفاوت انواع مدل:
//! - **Entity**: `ShortLink` که در storage ذخیره میشه
//! - **DTO**: `ShortenRequest`، `AccessGranted` و `LinkStats`
//! - **Identity**: `OwnerId` که تنها مکانیزم کنترل دسترسی هست

mod link;
mod dto;

// Re-export همه مدل‌ها
pub use link::*;
pub use dto::*;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

// =====================================
// Owner Identity (Newtype Pattern)
// =====================================
/// شناسه مالک لینک
///
/// هیچ احراز هویتی در کار نیست؛ داشتن این شناسه یعنی اجازه مدیریت لینک‌ها.
/// برای همین از UUID نسخه ۴ استفاده میکنیم که قابل حدس نباشه.
///
/// # مثال
/// ```rust
/// use link_lifecycle::models::OwnerId;
///
/// let owner = OwnerId::new();
/// let parsed: OwnerId = owner.to_string().parse().unwrap();
/// assert_eq!(owner, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)] // در JSON فقط مقدار داخلی نمایش داده میشه
pub struct OwnerId(Uuid);

impl OwnerId {
    /// ساخت شناسه تصادفی جدید
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// مقدار UUID داخلی
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for OwnerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for OwnerId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| AppError::InvalidInput(format!("invalid owner id '{}': {}", s, e)))
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
