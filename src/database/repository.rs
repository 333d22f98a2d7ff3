//! # Repository Pattern
//!
//! قرارداد storage موتور (`LinkStore`) و پیاده‌سازی SQLite اون.
//!
//! ## قرارداد همزمانی
//! - `insert` اتمیک هست: check-and-reserve کد کوتاه در یک قدم
//! - `compare_and_swap` فقط وقتی می‌نویسه که `revision` ذخیره‌شده با مقدار
//!   مورد انتظار یکی باشه؛ این بخش بحرانی per-record موتور هست

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::Database;
use crate::{
    error::{AppError, Result, ResultExt},
    models::{LinkStats, LinkStatus, OwnerId, ShortLink},
};

// =====================================
// Link Store Trait
// =====================================
/// شرط فیلتر برای `scan`
pub type LinkPredicate<'a> = &'a (dyn Fn(&ShortLink) -> bool + Send + Sync);

/// collaborator ذخیره‌سازی لینک‌ها
///
/// # مفاهیم:
/// - `#[async_trait]`: macro برای async در traits
/// - `Send + Sync`: موتور این trait رو پشت `Arc<dyn LinkStore>` بین taskها share میکنه
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// آیا این کد قبلا استفاده شده؟
    async fn exists(&self, code: &str) -> Result<bool>;

    /// خوندن رکورد با کد کوتاه
    async fn get(&self, code: &str) -> Result<Option<ShortLink>>;

    /// ذخیره رکورد جدید
    ///
    /// اگه کد قبلا گرفته شده باشه `false` برمیگردونه و چیزی نمی‌نویسه.
    async fn insert(&self, link: &ShortLink) -> Result<bool>;

    /// جایگزینی رکورد به شرط `revision == expected_revision`
    ///
    /// `updated.revision` باید قبلا روی مقدار بعدی تنظیم شده باشه.
    /// اگه رکورد در این فاصله تغییر کرده باشه `false` برمیگردونه.
    ///
    /// # Errors
    /// `NotFound` اگه رکوردی با این کد نباشه
    async fn compare_and_swap(&self, expected_revision: u64, updated: &ShortLink) -> Result<bool>;

    /// همه رکوردهایی که شرط رو برقرار میکنن
    async fn scan(&self, predicate: LinkPredicate<'_>) -> Result<Vec<ShortLink>>;

    /// رکوردهای Active با `expires_at < now` (کاندیدهای sweep)
    ///
    /// پیاده‌سازی پیش‌فرض از `scan` استفاده میکنه؛ storageهایی که index دارن
    /// باید override کنن تا رکوردهای پایانی خونده نشن.
    async fn expired_active(&self, now: DateTime<Utc>) -> Result<Vec<ShortLink>> {
        self.scan(&|link: &ShortLink| link.status.is_active() && link.expires_at < now)
            .await
    }

    /// لینک‌های یک مالک به ترتیب ساخت
    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<ShortLink>>;

    /// آمار کلی برای observability
    async fn stats(&self) -> Result<LinkStats>;
}

// =====================================
// SQLite Link Store
// =====================================
/// ردیف جدول `short_links`
#[derive(Debug, FromRow)]
struct LinkRow {
    code: String,
    target_url: String,
    owner_id: String,
    click_count: i64,
    max_clicks: i64,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    status: String,
    revision: i64,
}

impl TryFrom<LinkRow> for ShortLink {
    type Error = AppError;

    fn try_from(row: LinkRow) -> Result<Self> {
        Ok(ShortLink {
            owner_id: row
                .owner_id
                .parse::<OwnerId>()
                .map_err(|e| AppError::Storage(e.to_string()))?,
            click_count: u32::try_from(row.click_count).map_storage()?,
            max_clicks: u32::try_from(row.max_clicks).map_storage()?,
            created_at: row.created_at,
            expires_at: row.expires_at,
            status: row.status.parse()?,
            revision: u64::try_from(row.revision).map_storage()?,
            code: row.code,
            target_url: row.target_url,
        })
    }
}

const SELECT_LINK: &str = r#"
    SELECT code, target_url, owner_id, click_count, max_clicks,
           created_at, expires_at, status, revision
    FROM short_links
"#;

/// Repository برای لینک‌ها روی SQLite
#[derive(Debug, Clone)]
pub struct SqliteLinkStore {
    db: Database,
}

impl SqliteLinkStore {
    /// ساخت repository جدید
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn fetch_rows(&self, sql: &str, bind: Option<&str>) -> Result<Vec<ShortLink>> {
        let mut query = sqlx::query_as::<_, LinkRow>(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }

        query
            .fetch_all(self.db.pool())
            .await?
            .into_iter()
            .map(ShortLink::try_from)
            .collect()
    }
}

#[async_trait]
impl LinkStore for SqliteLinkStore {
    async fn exists(&self, code: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM short_links WHERE code = ?")
            .bind(code)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count > 0)
    }

    async fn get(&self, code: &str) -> Result<Option<ShortLink>> {
        let row = sqlx::query_as::<_, LinkRow>(&format!("{SELECT_LINK} WHERE code = ?"))
            .bind(code)
            .fetch_optional(self.db.pool())
            .await?;

        row.map(ShortLink::try_from).transpose()
    }

    async fn insert(&self, link: &ShortLink) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO short_links (code, target_url, owner_id, click_count, max_clicks,
                                     created_at, expires_at, status, revision)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(code) DO NOTHING
            "#,
        )
        .bind(&link.code)
        .bind(&link.target_url)
        .bind(link.owner_id.to_string())
        .bind(i64::from(link.click_count))
        .bind(i64::from(link.max_clicks))
        .bind(link.created_at)
        .bind(link.expires_at)
        .bind(link.status.as_str())
        .bind(link.revision as i64)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn compare_and_swap(&self, expected_revision: u64, updated: &ShortLink) -> Result<bool> {
        // یک UPDATE در SQLite اتمیک هست؛ شرط revision جای قفل رو میگیره
        let result = sqlx::query(
            r#"
            UPDATE short_links
            SET click_count = ?, max_clicks = ?, expires_at = ?, status = ?, revision = ?
            WHERE code = ? AND revision = ?
            "#,
        )
        .bind(i64::from(updated.click_count))
        .bind(i64::from(updated.max_clicks))
        .bind(updated.expires_at)
        .bind(updated.status.as_str())
        .bind(updated.revision as i64)
        .bind(&updated.code)
        .bind(expected_revision as i64)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        if self.exists(&updated.code).await? {
            Ok(false)
        } else {
            Err(AppError::link_not_found(&updated.code))
        }
    }

    async fn scan(&self, predicate: LinkPredicate<'_>) -> Result<Vec<ShortLink>> {
        let links = self.fetch_rows(SELECT_LINK, None).await?;
        Ok(links.into_iter().filter(|link| predicate(link)).collect())
    }

    async fn expired_active(&self, now: DateTime<Utc>) -> Result<Vec<ShortLink>> {
        // از idx_short_links_status استفاده میکنه؛ رکوردهای پایانی خونده نمیشن
        let rows = sqlx::query_as::<_, LinkRow>(&format!(
            "{SELECT_LINK} WHERE status = ? AND expires_at < ?"
        ))
        .bind(LinkStatus::Active.as_str())
        .bind(now)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(ShortLink::try_from).collect()
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<ShortLink>> {
        let owner = owner.to_string();
        self.fetch_rows(
            &format!("{SELECT_LINK} WHERE owner_id = ? ORDER BY created_at ASC, rowid ASC"),
            Some(&owner),
        )
        .await
    }

    async fn stats(&self) -> Result<LinkStats> {
        let stats = sqlx::query_as::<_, LinkStats>(
            r#"
            SELECT
                COUNT(*) AS total_links,
                COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0) AS active_links,
                COUNT(DISTINCT owner_id) AS total_owners,
                COALESCE(SUM(click_count), 0) AS total_clicks
            FROM short_links
            "#,
        )
        .fetch_one(self.db.pool())
        .await?;

        Ok(stats)
    }
}
