//! # ماژول مدیریت خطاها (Error Handling)
//!
//! این ماژول سیستم مدیریت خطای موتور لینک کوتاه رو تعریف میکنه.
//!
//! ## دسته‌بندی خطاها
//!
//! - `InvalidInput`: URL نامعتبر، سقف کلیک یا مدت زمان غیرمثبت
//! - `NotFound`: کد کوتاه ناشناخته
//! - `NotAccessible`: لینک منقضی، به سقف کلیک رسیده یا غیرفعال
//! - `Forbidden`: مالک لینک با درخواست‌دهنده یکی نیست
//! - `InvalidState`: عملیات مدیریتی روی لینکی که Active نیست
//! - `Storage`: خطای لایه ذخیره‌سازی (بدون retry داخلی)
//!
//! همه‌ی این خطاها قابل بازیابی هستن و هیچ‌کدوم برنامه رو متوقف نمیکنن.

use thiserror::Error;

use crate::models::InaccessibleReason;

// =====================================
// Result Type Alias
// =====================================
/// نوع Result سفارشی برنامه
///
/// به جای نوشتن `Result<ShortLink, AppError>` میتونیم بنویسیم `Result<ShortLink>`
pub type Result<T, E = AppError> = std::result::Result<T, E>;

// =====================================
// Custom Error Enum
// =====================================
/// خطای اصلی برنامه
#[derive(Debug, Error)]
pub enum AppError {
    // ----------------------------------------
    // خطاهای فراخواننده
    // ----------------------------------------

    /// ورودی نامعتبر
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// کد کوتاه پیدا نشد
    #[error("Not found: {0}")]
    NotFound(String),

    /// لینک وجود داره ولی قابل دسترسی نیست
    #[error("Link is not accessible: {0}")]
    NotAccessible(InaccessibleReason),

    /// فقط مالک میتونه لینک رو مدیریت کنه
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// وضعیت لینک اجازه این عملیات رو نمیده
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // ----------------------------------------
    // خطاهای زیرساخت
    // ----------------------------------------

    /// خطای عمومی ذخیره‌سازی
    #[error("Storage failure: {0}")]
    Storage(String),

    /// خطای تنظیمات
    #[error("Configuration error: {0}")]
    Config(String),

    /// خطای داخلی
    #[error("Internal error: {0}")]
    Internal(String),

    /// خطای دیتابیس
    /// `#[from]` یعنی sqlx::Error خودکار به این تبدیل میشه
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// خطای اجرای migration
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// خطای IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// کد ثابت و قابل پردازش برای هر نوع خطا
    ///
    /// # مثال
    /// ```rust
    /// use link_lifecycle::AppError;
    ///
    /// let err = AppError::Forbidden("not yours".to_string());
    /// assert_eq!(err.code(), "FORBIDDEN");
    /// ```
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::NotAccessible(_) => "NOT_ACCESSIBLE",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Config(_) => "CONFIG",
            Self::Internal(_) => "INTERNAL",
            Self::Storage(_)
            | Self::Database(_)
            | Self::Migrate(_)
            | Self::Io(_) => "STORAGE_FAILURE",
        }
    }

    /// آیا این خطا از لایه ذخیره‌سازی اومده؟
    ///
    /// موتور این خطاها رو retry نمیکنه، تصمیمش با فراخواننده‌ست.
    #[must_use]
    pub fn is_storage_failure(&self) -> bool {
        self.code() == "STORAGE_FAILURE"
    }

    /// ساخت خطای Not Found برای کد کوتاه
    #[must_use]
    pub fn link_not_found(code: &str) -> Self {
        Self::NotFound(format!("short code '{}' not found", code))
    }

    /// ساخت خطای Forbidden برای عملیات مدیریتی
    #[must_use]
    pub fn not_owner(code: &str) -> Self {
        Self::Forbidden(format!("only the owner can modify '{}'", code))
    }
}

// =====================================
// From Implementations
// =====================================
// تبدیل validator error
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<::config::ConfigError> for AppError {
    fn from(err: ::config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

// =====================================
// Result Extensions
// =====================================
/// Extension trait برای Result
///
/// # مفاهیم:
/// - Extension Trait: اضافه کردن متد به نوع‌های موجود
/// - Generic: کار با هر نوع T و E
pub trait ResultExt<T, E> {
    /// تبدیل خطا به AppError::Storage
    fn map_storage(self) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for std::result::Result<T, E> {
    fn map_storage(self) -> Result<T> {
        self.map_err(|e| AppError::Storage(e.to_string()))
    }
}

// =====================================
// Option Extensions
// =====================================
/// Extension trait برای Option
pub trait OptionExt<T> {
    /// تبدیل None به AppError::NotFound برای کد کوتاه
    fn ok_or_not_found(self, code: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, code: &str) -> Result<T> {
        self.ok_or_else(|| AppError::link_not_found(code))
    }
}
