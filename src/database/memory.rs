//! # Storage در حافظه
//!
//! یک map معتبر `code → ShortLink` و یک index کمکی `owner → [code]`
//! که فقط کلید نگه میداره، نه کپی رکورد.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};

use super::{LinkPredicate, LinkStore};
use crate::{
    error::{AppError, Result},
    models::{LinkStats, OwnerId, ShortLink},
};

/// `LinkStore` روی `DashMap`
///
/// # مفاهیم:
/// - DashMap هر shard رو جدا قفل میکنه؛ `entry` و `get_mut` روی یک کلید
///   تا آخر عمر guard انحصاری هستن
/// - هیچ guardی از روی `.await` رد نمیشه
#[derive(Debug, Default)]
pub struct MemoryLinkStore {
    links: DashMap<String, ShortLink>,
    owners: DashMap<OwnerId, Vec<String>>,
}

impl MemoryLinkStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// تعداد کل رکوردها
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn exists(&self, code: &str) -> Result<bool> {
        Ok(self.links.contains_key(code))
    }

    async fn get(&self, code: &str) -> Result<Option<ShortLink>> {
        Ok(self.links.get(code).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, link: &ShortLink) -> Result<bool> {
        match self.links.entry(link.code.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(link.clone());
                self.owners
                    .entry(link.owner_id)
                    .or_default()
                    .push(link.code.clone());
                Ok(true)
            }
        }
    }

    async fn compare_and_swap(&self, expected_revision: u64, updated: &ShortLink) -> Result<bool> {
        let Some(mut current) = self.links.get_mut(&updated.code) else {
            return Err(AppError::link_not_found(&updated.code));
        };

        if current.revision != expected_revision {
            return Ok(false);
        }

        *current = updated.clone();
        Ok(true)
    }

    async fn scan(&self, predicate: LinkPredicate<'_>) -> Result<Vec<ShortLink>> {
        Ok(self
            .links
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<ShortLink>> {
        // اول کلیدها رو کپی میکنیم تا قفل index قبل از خوندن links آزاد بشه
        let codes = match self.owners.get(owner) {
            Some(codes) => codes.value().clone(),
            None => return Ok(Vec::new()),
        };

        Ok(codes
            .iter()
            .filter_map(|code| self.links.get(code).map(|entry| entry.value().clone()))
            .collect())
    }

    async fn stats(&self) -> Result<LinkStats> {
        let mut stats = LinkStats {
            total_owners: self.owners.len() as i64,
            ..LinkStats::default()
        };

        for entry in self.links.iter() {
            let link = entry.value();
            stats.total_links += 1;
            stats.total_clicks += i64::from(link.click_count);
            if link.status.is_active() {
                stats.active_links += 1;
            }
        }

        Ok(stats)
    }
}
