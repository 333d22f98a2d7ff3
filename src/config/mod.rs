//! # ماژول تنظیمات (Configuration)
//!
//! این ماژول مسئول خوندن و مدیریت تنظیمات موتور لینک کوتاه هست.
//!
//! ## ترتیب لایه‌ها
//!
//! ```text
//! مقادیر پیش‌فرض  →  فایل url-shortener.*  →  متغیرهای محیطی SHORTENER_*
//! ```
//!
//! هر لایه مقادیر لایه قبلی رو override میکنه.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// نام فایل تنظیمات (بدون پسوند)
pub const CONFIG_FILE: &str = "url-shortener";

/// پیشوند متغیرهای محیطی
pub const ENV_PREFIX: &str = "SHORTENER";

/// بیشترین فاصله sweep (یک هفته)
pub const MAX_CLEANUP_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// تنظیمات اصلی برنامه
///
/// # مثال
/// ```rust
/// use link_lifecycle::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.default_max_clicks, 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// سقف کلیک پیش‌فرض برای لینک‌های جدید
    pub default_max_clicks: u32,

    /// مدت اعتبار پیش‌فرض (ساعت)
    pub default_expiration_hours: u32,

    /// دامنه‌ای که جلوی کد کوتاه میاد
    pub base_url: String,

    /// فاصله بین دو sweep (دقیقه)
    pub cleanup_interval_minutes: u64,

    /// آدرس اتصال به دیتابیس
    pub database_url: String,

    /// محیط اجرا (development, production)
    pub environment: Environment,
}

/// محیط اجرای برنامه
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// محیط توسعه - با قابلیت‌های دیباگ
    #[default]
    Development,

    /// محیط تست
    Testing,

    /// محیط تولید
    Production,
}

impl Environment {
    /// آیا در محیط تولید هستیم؟
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_max_clicks: 100,
            default_expiration_hours: 24,
            base_url: "clck.ru".to_string(),
            cleanup_interval_minutes: 5,
            database_url: "sqlite://data/links.db?mode=rwc".to_string(),
            environment: Environment::Development,
        }
    }
}

impl Config {
    /// ساخت تنظیمات از فایل و متغیرهای محیطی
    ///
    /// # مفاهیم:
    /// - کتابخونه `config` لایه‌ها رو روی هم میچینه
    /// - `Config::default()` به عنوان اولین source استفاده میشه
    /// - `try_parsing(true)`: مقدار "100" از env به عدد تبدیل میشه
    ///
    /// # Errors
    /// خطا برمیگردونه اگه مقداری قابل تبدیل نباشه
    ///
    /// # مثال
    /// ```rust,no_run
    /// use link_lifecycle::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load config");
    /// ```
    pub fn from_env() -> Result<Self> {
        let defaults = ::config::Config::try_from(&Config::default())?;

        let settings = ::config::Config::builder()
            .add_source(defaults)
            .add_source(::config::File::with_name(CONFIG_FILE).required(false))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// اعتبارسنجی تنظیمات
    ///
    /// # Errors
    /// اگه یکی از مقادیر عددی صفر باشه یا base_url خالی باشه
    pub fn validate(&self) -> Result<()> {
        if self.default_max_clicks == 0 {
            return Err(AppError::Config(
                "default_max_clicks must be positive".to_string(),
            ));
        }

        if self.default_expiration_hours == 0 {
            return Err(AppError::Config(
                "default_expiration_hours must be positive".to_string(),
            ));
        }

        if self.cleanup_interval_minutes == 0 {
            return Err(AppError::Config(
                "cleanup_interval_minutes must be positive".to_string(),
            ));
        }

        if self.cleanup_interval_minutes > MAX_CLEANUP_INTERVAL_MINUTES {
            return Err(AppError::Config(format!(
                "cleanup_interval_minutes must be at most {}",
                MAX_CLEANUP_INTERVAL_MINUTES
            )));
        }

        if self.base_url.trim().is_empty() {
            return Err(AppError::Config("base_url cannot be empty".to_string()));
        }

        Ok(())
    }

    /// فاصله زمانی sweep
    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_minutes.saturating_mul(60))
    }
}

// =====================================
// Builder Pattern
// =====================================
/// ساخت Config با Builder Pattern
///
/// # مثال
/// ```rust
/// use link_lifecycle::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .default_max_clicks(3)
///     .base_url("sho.rt")
///     .build();
/// assert_eq!(config.default_max_clicks, 3);
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// ساخت builder جدید
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    #[must_use]
    pub fn default_max_clicks(mut self, clicks: u32) -> Self {
        self.config.default_max_clicks = clicks;
        self
    }

    #[must_use]
    pub fn default_expiration_hours(mut self, hours: u32) -> Self {
        self.config.default_expiration_hours = hours;
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    #[must_use]
    pub fn cleanup_interval_minutes(mut self, minutes: u64) -> Self {
        self.config.cleanup_interval_minutes = minutes;
        self
    }

    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    #[must_use]
    pub fn environment(mut self, env: Environment) -> Self {
        self.config.environment = env;
        self
    }

    /// ساخت Config نهایی
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }

    /// ساخت Config با اعتبارسنجی
    ///
    /// # Errors
    /// خطا برمیگردونه اگه اعتبارسنجی fail بشه
    pub fn build_validated(self) -> Result<Config> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
