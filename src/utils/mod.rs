//! # ماژول توابع کمکی (Utilities)
//!
//! الفبای کد کوتاه، base62، اعتبارسنجی URL و فرمت‌دهی متن اعلان‌ها.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

// =====================================
// Constants
// =====================================
/// الفبای ۶۲ حرفی کد کوتاه
///
/// ترتیب مهمه: `a` صفرِ این مبنا حساب میشه و برای padding استفاده میشه.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// طول ثابت کد کوتاه
pub const SHORT_CODE_LENGTH: usize = 7;

/// حداکثر طول URL اصلی
pub const MAX_URL_LENGTH: usize = 2048;

// =====================================
// Lazy Statics (Regex patterns)
// =====================================
/// الگوی URL معتبر
///
/// - پروتکل اختیاری (`http://` یا `https://`)
/// - دامنه چندبخشی که هیچ بخشش با `-` شروع یا تموم نمیشه، یا `localhost`
/// - پورت مثبت اختیاری
/// - مسیر اختیاری
pub static VALID_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(https?://)?",
        r"((\w([\w-]*\w)?\.)+\w([\w-]*\w)?|localhost)",
        r"(:[1-9][0-9]*)?",
        r"(/[\w\-._~:/?#\[\]@!&'()*+,;=%]*)?$",
    ))
    .expect("Invalid regex pattern")
});

// =====================================
// Short Code Encoding
// =====================================
/// تبدیل عدد به base62 با الفبای [`ALPHABET`]
///
/// کتابخونه `base62` ارقام رو با الفبای خودش (که با `0` شروع میشه) می‌نویسه؛
/// هر رقم با مقدار عددیش به کاراکتر هم‌رتبه در [`ALPHABET`] نگاشت میشه،
/// پس صفر همیشه `a` هست.
///
/// # مثال
/// ```rust
/// use link_lifecycle::utils::encode_base62;
///
/// assert_eq!(encode_base62(0), "a");
/// assert_eq!(encode_base62(61), "9");
/// assert_eq!(encode_base62(62), "ba");
/// ```
#[must_use]
pub fn encode_base62(value: u64) -> String {
    base62::encode(value)
        .bytes()
        .map(|digit| {
            // مقدار رقم در الفبای کتابخونه؛ یک رقم تنها همیشه دیکود میشه
            let index = base62::decode([digit]).unwrap_or_default() as usize;
            char::from(ALPHABET[index])
        })
        .collect()
}

/// تولید کد تصادفی با طول مشخص
#[must_use]
pub fn random_code(length: usize) -> String {
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

// =====================================
// Validation Functions
// =====================================
/// اعتبارسنجی کد کوتاه
///
/// معتبره اگه خالی نباشه و همه کاراکترها از الفبای ۶۲ حرفی باشن.
///
/// # مثال
/// ```rust
/// use link_lifecycle::utils::is_valid_short_code;
///
/// assert!(is_valid_short_code("abc123X"));
/// assert!(!is_valid_short_code("abc-123"));
/// assert!(!is_valid_short_code(""));
/// ```
#[must_use]
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// اعتبارسنجی URL
///
/// اول با الگو چک میشه، بعد شکل نرمال‌شده باید با `url` crate parse بشه.
#[must_use]
pub fn is_valid_url(url_str: &str) -> bool {
    let trimmed = url_str.trim();

    if trimmed.is_empty() || trimmed.len() > MAX_URL_LENGTH {
        return false;
    }

    if !VALID_URL.is_match(trimmed) {
        return false;
    }

    url::Url::parse(&normalize_url(trimmed)).is_ok()
}

/// نرمال کردن URL: حذف فاصله‌ها و اضافه کردن `https://` اگه پروتکل نداشت
///
/// # مثال
/// ```rust
/// use link_lifecycle::utils::normalize_url;
///
/// assert_eq!(normalize_url(" example.com "), "https://example.com");
/// assert_eq!(normalize_url("http://example.com"), "http://example.com");
/// ```
#[must_use]
pub fn normalize_url(url_str: &str) -> String {
    let trimmed = url_str.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

// =====================================
// String Utilities
// =====================================
/// خلاصه کردن متن طولانی
///
/// # مثال
/// ```rust
/// use link_lifecycle::utils::truncate;
///
/// assert_eq!(truncate("Hello, World!", Some(8)), "Hello...");
/// ```
#[must_use]
pub fn truncate(text: &str, max_len: Option<usize>) -> String {
    let max = max_len.unwrap_or(100);

    if text.chars().count() <= max {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", truncated)
}

/// فرمت مدت زمان به صورت خوانا
///
/// # مثال
/// ```rust
/// use link_lifecycle::utils::format_duration;
///
/// assert_eq!(format_duration(3661), "1h 1m 1s");
/// assert_eq!(format_duration(60), "1m 0s");
/// ```
#[must_use]
pub fn format_duration(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
