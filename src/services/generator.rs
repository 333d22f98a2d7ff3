//! # تولید کد کوتاه
//!
//! ## الگوریتم
//!
//! ```text
//! owner + url + nanos ──MD5──► 15 رقم hex اول (60 بیت) ──base62──► pad ──► 7 کاراکتر
//!        │
//!        └─ اگه تکراری بود: همون ورودی + شماره تلاش (حداکثر 10 بررسی)
//!           و بعدش fallback به کد تصادفی
//! ```
//!
//! ژنراتور چیزی نمی‌نویسه؛ رزرو واقعی کد با `LinkStore::insert` انجام میشه.

use std::sync::Arc;

use chrono::Utc;
use md5::{Digest, Md5};
use tracing::{debug, warn};

use crate::{
    database::LinkStore,
    error::Result,
    models::OwnerId,
    utils::{self, ALPHABET, SHORT_CODE_LENGTH},
};

/// تعداد بررسی‌های یکتایی قبل از fallback
pub const MAX_COLLISION_ATTEMPTS: usize = 10;

/// تعداد کدهای تصادفی که در fallback بررسی میشن
pub const MAX_FALLBACK_ATTEMPTS: usize = 5;

/// تعداد بیت‌های ابتدای digest که به عدد تبدیل میشن (15 رقم hex)
const DIGEST_PREFIX_BITS: u32 = 60;

/// مشتق کردن کد 7 حرفی از یک ورودی
///
/// خروجی قطعی هست و همیشه دقیقا 7 کاراکتر از الفبا داره.
/// وقتی عدد کوچیک باشه و base62 کوتاه‌تر بشه، از چپ با `a` (صفرِ الفبا) پر میشه.
///
/// # مثال
/// ```rust
/// use link_lifecycle::services::derive_code;
///
/// let code = derive_code("owner|https://example.com|1");
/// assert_eq!(code.len(), 7);
/// assert_eq!(code, derive_code("owner|https://example.com|1"));
/// ```
#[must_use]
pub fn derive_code(input: &str) -> String {
    let digest = Md5::digest(input.as_bytes());

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let value = u64::from_be_bytes(prefix) >> (64 - DIGEST_PREFIX_BITS);

    let encoded = utils::encode_base62(value);
    let padding = SHORT_CODE_LENGTH.saturating_sub(encoded.len());

    std::iter::repeat(ALPHABET[0] as char)
        .take(padding)
        .chain(encoded.chars())
        .take(SHORT_CODE_LENGTH)
        .collect()
}

/// ژنراتور کد کوتاه یکتا
///
/// فقط از `exists` در storage استفاده میکنه.
#[derive(Clone)]
pub struct CodeGenerator {
    store: Arc<dyn LinkStore>,
}

impl CodeGenerator {
    #[must_use]
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self { store }
    }

    /// تولید کد برای `url` و `owner`
    ///
    /// هیچوقت به خاطر برخورد fail نمیشه؛ در بدترین حالت کد تصادفی برمیگردونه.
    ///
    /// # Errors
    /// فقط خطای storage (`StorageFailure`)
    pub async fn generate(&self, url: &str, owner: &OwnerId) -> Result<String> {
        let nanos = Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| Utc::now().timestamp_micros());
        self.generate_with_salt(url, owner, &nanos.to_string()).await
    }

    /// مثل `generate` ولی با salt مشخص، برای ورودی قابل تکرار
    pub async fn generate_with_salt(&self, url: &str, owner: &OwnerId, salt: &str) -> Result<String> {
        let base_input = format!("{}{}{}", owner, url, salt);
        let mut candidate = derive_code(&base_input);

        for attempt in 0..MAX_COLLISION_ATTEMPTS {
            if !self.store.exists(&candidate).await? {
                return Ok(candidate);
            }

            debug!(code = %candidate, attempt, "Short code collision, re-deriving");
            candidate = derive_code(&format!("{}{}", base_input, attempt));
        }

        self.fallback_code().await
    }

    /// کد تصادفی، با بررسی مجدد یکتایی
    async fn fallback_code(&self) -> Result<String> {
        for _ in 0..MAX_FALLBACK_ATTEMPTS {
            let code = utils::random_code(SHORT_CODE_LENGTH);
            if !self.store.exists(&code).await? {
                warn!(code = %code, "Hash-derived codes exhausted, using random code");
                return Ok(code);
            }
        }

        // احتمالش تقریبا صفره؛ insert در موتور برخورد نهایی رو میگیره
        warn!("Random fallback collided repeatedly, returning unverified code");
        Ok(utils::random_code(SHORT_CODE_LENGTH))
    }
}
