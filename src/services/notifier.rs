//! # اعلان‌های مالک
//!
//! موتور فقط `NotificationSink::notify` رو صدا میزنه و منتظر نمیمونه.
//! `NotificationCenter` پیام‌ها رو در یک صف FIFO برای هر مالک نگه میداره
//! تا لایه بیرونی (console، HTTP و ...) هر وقت خواست تحویلشون بگیره.

use std::collections::VecDeque;

use chrono::Duration;
use dashmap::DashMap;
use tracing::{debug, trace};

use crate::{
    models::{InaccessibleReason, OwnerId, ShortLink},
    utils,
};

// =====================================
// Notification Sink
// =====================================
/// collaborator اعلان
///
/// پیاده‌سازی‌ها نباید block کنن؛ موتور این متد رو وسط عملیات‌هاش صدا میزنه.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    fn notify(&self, owner: &OwnerId, message: String);
}

// =====================================
// Notification Center
// =====================================
/// حداکثر پیام در انتظار برای هر مالک
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// صف اعلان per-owner در حافظه
///
/// هر صف حداکثر `capacity` پیام نگه میداره؛ وقتی پر بشه قدیمی‌ترین پیام
/// دور ریخته میشه تا لینکی که مدام رد میشه حافظه رو پر نکنه.
#[derive(Debug)]
pub struct NotificationCenter {
    queues: DashMap<OwnerId, VecDeque<String>>,
    capacity: usize,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl NotificationCenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// صف با ظرفیت دلخواه (حداقل 1)
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queues: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// برداشتن همه پیام‌های در انتظار (و خالی کردن صف)
    #[must_use]
    pub fn drain(&self, owner: &OwnerId) -> Vec<String> {
        self.queues
            .get_mut(owner)
            .map(|mut queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn pending_count(&self, owner: &OwnerId) -> usize {
        self.queues.get(owner).map_or(0, |queue| queue.len())
    }

    #[must_use]
    pub fn has_pending(&self, owner: &OwnerId) -> bool {
        self.pending_count(owner) > 0
    }

    pub fn clear(&self, owner: &OwnerId) {
        if let Some(mut queue) = self.queues.get_mut(owner) {
            queue.clear();
        }
    }

    pub fn clear_all(&self) {
        self.queues.clear();
    }
}

impl NotificationSink for NotificationCenter {
    fn notify(&self, owner: &OwnerId, message: String) {
        trace!(owner = %owner, "Queueing owner notification");
        let mut queue = self.queues.entry(*owner).or_default();
        if queue.len() >= self.capacity {
            queue.pop_front();
            debug!(owner = %owner, capacity = self.capacity, "Notification queue full, dropped oldest");
        }
        queue.push_back(message);
    }
}

// =====================================
// Message Builders
// =====================================
/// متن پیام‌هایی که موتور برای مالک میفرسته
pub mod messages {
    use super::*;

    const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

    fn target(link: &ShortLink) -> String {
        utils::truncate(&link.target_url, Some(100))
    }

    #[must_use]
    pub fn created(link: &ShortLink, base_url: &str) -> String {
        format!(
            "Short URL created: {}\n   Original URL: {}\n   Click limit: {}\n   Expires: {}",
            link.full_short_url(base_url),
            target(link),
            link.max_clicks,
            link.expires_at.format(TIME_FORMAT),
        )
    }

    #[must_use]
    pub fn expired(link: &ShortLink, base_url: &str) -> String {
        format!(
            "Your short URL '{}' has expired and is no longer accessible.\n   Original URL: {}\n   Clicks used: {}/{}",
            link.full_short_url(base_url),
            target(link),
            link.click_count,
            link.max_clicks,
        )
    }

    #[must_use]
    pub fn limit_reached(link: &ShortLink, base_url: &str) -> String {
        format!(
            "Your short URL '{}' has reached its click limit of {} and is no longer accessible.\n   Original URL: {}",
            link.full_short_url(base_url),
            link.max_clicks,
            target(link),
        )
    }

    #[must_use]
    pub fn access_denied(link: &ShortLink, reason: InaccessibleReason, base_url: &str) -> String {
        format!(
            "Access denied to '{}': {}\n   Status: {}\n   Clicks: {}/{}",
            link.full_short_url(base_url),
            reason,
            link.status,
            link.click_count,
            link.max_clicks,
        )
    }

    #[must_use]
    pub fn limit_raised(link: &ShortLink, base_url: &str) -> String {
        format!(
            "Click limit for {} updated to {} clicks",
            link.full_short_url(base_url),
            link.max_clicks,
        )
    }

    #[must_use]
    pub fn expiry_extended(link: &ShortLink, extra: Duration, base_url: &str) -> String {
        format!(
            "Expiration for {} extended by {}. New expiration: {}",
            link.full_short_url(base_url),
            utils::format_duration(extra.num_seconds()),
            link.expires_at.format(TIME_FORMAT),
        )
    }

    #[must_use]
    pub fn deactivated(link: &ShortLink, base_url: &str) -> String {
        format!("Short URL deactivated: {}", link.full_short_url(base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_fifo_per_owner() {
        let center = NotificationCenter::new();
        let alice = OwnerId::new();
        let bob = OwnerId::new();

        center.notify(&alice, "first".to_string());
        center.notify(&alice, "second".to_string());
        center.notify(&bob, "other".to_string());

        assert_eq!(center.pending_count(&alice), 2);
        assert_eq!(center.drain(&alice), vec!["first", "second"]);
        assert!(!center.has_pending(&alice));
        assert!(center.has_pending(&bob));
    }

    #[test]
    fn test_drain_unknown_owner() {
        let center = NotificationCenter::new();
        assert!(center.drain(&OwnerId::new()).is_empty());
    }

    #[test]
    fn test_queue_is_bounded_per_owner() {
        let center = NotificationCenter::with_capacity(3);
        let owner = OwnerId::new();

        for i in 0..10 {
            center.notify(&owner, format!("denied {}", i));
        }

        assert_eq!(center.pending_count(&owner), 3);
        assert_eq!(center.drain(&owner), vec!["denied 7", "denied 8", "denied 9"]);
    }

    #[test]
    fn test_clear() {
        let center = NotificationCenter::new();
        let owner = OwnerId::new();
        center.notify(&owner, "x".to_string());
        center.clear(&owner);
        assert_eq!(center.pending_count(&owner), 0);

        center.notify(&owner, "y".to_string());
        center.clear_all();
        assert!(!center.has_pending(&owner));
    }
}
