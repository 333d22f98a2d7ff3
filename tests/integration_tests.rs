//! # تست‌های Integration
//!
//! سناریوهای کامل روی API عمومی کتابخونه، با هر دو storage.
//!
//! ## اجرای تست‌ها:
//! ```bash
//! cargo test                              # همه تست‌ها
//! cargo test --lib                        # فقط تست‌های unit
//! cargo test --test integration_tests     # فقط این فایل
//! cargo test concurrency_                 # فقط تست‌های همزمانی
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use link_lifecycle::prelude::*;

/// موتور روی storage حافظه، با صف اعلان قابل بررسی
fn memory_state() -> (AppState, Arc<MemoryLinkStore>) {
    let store = Arc::new(MemoryLinkStore::new());
    (AppState::new(store.clone(), Config::default()), store)
}

async fn sqlite_state() -> (AppState, Arc<SqliteLinkStore>) {
    let db = Database::in_memory().await.unwrap();
    let store = Arc::new(SqliteLinkStore::new(db));
    (AppState::new(store.clone(), Config::default()), store)
}

// =====================================
// تست‌های تولید کد
// =====================================
mod generator_tests {
    use super::*;
    use link_lifecycle::utils;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_created_codes_are_seven_alphanumeric_chars() {
        let (state, _) = memory_state();
        let owner = OwnerId::new();

        for i in 0..20 {
            let link = state
                .engine
                .shorten(ShortenRequest::new(format!("https://example.com/{}", i)), &owner)
                .await
                .unwrap();
            assert_eq!(link.code.len(), utils::SHORT_CODE_LENGTH);
            assert!(utils::is_valid_short_code(&link.code));
        }
    }

    /// یک URL برای N مالک متفاوت → N کد متفاوت
    #[tokio::test]
    async fn test_distinct_owners_get_distinct_codes() {
        let (state, store) = memory_state();

        let mut codes = HashSet::new();
        for _ in 0..50 {
            let link = state
                .engine
                .shorten(ShortenRequest::new("https://example.com"), &OwnerId::new())
                .await
                .unwrap();
            codes.insert(link.code);
        }

        assert_eq!(codes.len(), 50);
        assert_eq!(store.len(), 50);
    }

    #[tokio::test]
    async fn test_generator_avoids_existing_codes() {
        let store = Arc::new(MemoryLinkStore::new());
        let generator = CodeGenerator::new(store.clone());
        let owner = OwnerId::new();

        let first = generator
            .generate_with_salt("https://example.com", &owner, "1")
            .await
            .unwrap();
        let taken = LinkBuilder::new("https://example.com")
            .code(first.clone())
            .owner(owner)
            .max_clicks(1)
            .expires_in_hours(1)
            .build()
            .unwrap();
        assert!(store.insert(&taken).await.unwrap());

        let second = generator
            .generate_with_salt("https://example.com", &owner, "1")
            .await
            .unwrap();
        assert_ne!(first, second);
    }
}

// =====================================
// تست‌های چرخه عمر
// =====================================
mod lifecycle_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// سناریو: سقف 3 کلیک
    #[tokio::test]
    async fn test_three_click_scenario() {
        let (state, store) = memory_state();
        let owner = OwnerId::new();
        let link = state
            .engine
            .shorten(ShortenRequest::new("https://example.com").with_max_clicks(3), &owner)
            .await
            .unwrap();

        let now = Utc::now();
        let first = state.engine.access(&link.code, now).await.unwrap();
        assert_eq!(first.click_count, 1);
        assert_eq!(first.status, LinkStatus::Active);

        let second = state.engine.access(&link.code, now).await.unwrap();
        assert_eq!(second.click_count, 2);

        let third = state.engine.access(&link.code, now).await.unwrap();
        assert_eq!(third.click_count, 3);
        assert_eq!(third.status, LinkStatus::LimitExceeded);
        assert_eq!(third.target_url, "https://example.com");

        let fourth = state.engine.access(&link.code, now).await;
        assert!(matches!(
            fourth,
            Err(AppError::NotAccessible(InaccessibleReason::LimitExceeded))
        ));

        // دسترسی رد شده تعداد رو تغییر نمیده
        let stored = store.get(&link.code).await.unwrap().unwrap();
        assert_eq!(stored.click_count, 3);
        assert_eq!(stored.status, LinkStatus::LimitExceeded);
    }

    #[tokio::test]
    async fn test_already_expired_record_is_denied() {
        let (state, store) = memory_state();
        let owner = OwnerId::new();
        let link = LinkBuilder::new("https://example.com")
            .code("oldlink")
            .owner(owner)
            .max_clicks(10)
            .created_at(Utc::now() - Duration::hours(2))
            .expires_at(Utc::now() - Duration::hours(1))
            .build()
            .unwrap();
        store.insert(&link).await.unwrap();

        assert!(matches!(
            state.engine.access("oldlink", Utc::now()).await,
            Err(AppError::NotAccessible(InaccessibleReason::Expired))
        ));

        // وضعیت فقط با sweep عوض میشه
        let stored = store.get("oldlink").await.unwrap().unwrap();
        assert_eq!(stored.status, LinkStatus::Active);
        assert_eq!(stored.click_count, 0);

        // مالک از رد شدن دسترسی باخبر میشه
        let messages = state.notifications.drain(&owner);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("link has expired"));
    }

    #[tokio::test]
    async fn test_inactive_link_is_never_accessible() {
        let (state, _) = memory_state();
        let owner = OwnerId::new();
        let link = state
            .engine
            .shorten(ShortenRequest::new("https://example.com"), &owner)
            .await
            .unwrap();

        assert!(state.engine.deactivate(&link.code, &owner).await.unwrap());
        assert!(!state.engine.deactivate(&link.code, &owner).await.unwrap());

        assert!(matches!(
            state.engine.access(&link.code, Utc::now()).await,
            Err(AppError::NotAccessible(InaccessibleReason::Inactive))
        ));

        let info = state.engine.link_info(&link.code).await.unwrap();
        assert_eq!(info.status, LinkStatus::Inactive);
        assert!(!LifecycleEngine::is_accessible(&info, Utc::now()));
    }

    #[tokio::test]
    async fn test_raise_limit_ownership_and_state() {
        let (state, _) = memory_state();
        let owner = OwnerId::new();
        let link = state
            .engine
            .shorten(ShortenRequest::new("https://example.com").with_max_clicks(1), &owner)
            .await
            .unwrap();

        assert!(matches!(
            state
                .engine
                .raise_click_limit(&link.code, &OwnerId::new(), 10)
                .await,
            Err(AppError::Forbidden(_))
        ));

        state.engine.access(&link.code, Utc::now()).await.unwrap();

        // LimitExceeded پایانیه؛ بالا بردن سقف برش نمیگردونه
        assert!(matches!(
            state.engine.raise_click_limit(&link.code, &owner, 10).await,
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            state.engine.raise_click_limit("missing", &owner, 10).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_extend_expiry_keeps_link_alive() {
        let (state, _) = memory_state();
        let owner = OwnerId::new();
        let link = state
            .engine
            .shorten(ShortenRequest::new("https://example.com").with_expires_in_hours(1), &owner)
            .await
            .unwrap();

        let later = link.expires_at + Duration::minutes(30);
        assert!(state.engine.access(&link.code, later).await.is_err());

        state
            .engine
            .extend_expiry(&link.code, &owner, Duration::hours(1))
            .await
            .unwrap();
        assert!(state.engine.access(&link.code, later).await.is_ok());
    }

    /// لینک مرده‌ای که مدام درخواست میگیره صف مالک رو بی‌نهایت بزرگ نمیکنه
    #[tokio::test]
    async fn test_repeated_denials_keep_queue_bounded() {
        let (state, _) = memory_state();
        let owner = OwnerId::new();
        let link = state
            .engine
            .shorten(ShortenRequest::new("https://example.com"), &owner)
            .await
            .unwrap();
        assert!(state.engine.deactivate(&link.code, &owner).await.unwrap());

        for _ in 0..(DEFAULT_QUEUE_CAPACITY * 2) {
            assert!(state.engine.access(&link.code, Utc::now()).await.is_err());
        }

        assert_eq!(state.notifications.pending_count(&owner), DEFAULT_QUEUE_CAPACITY);
        let messages = state.notifications.drain(&owner);
        assert!(messages.iter().all(|m| m.contains("link is inactive")));
    }

    #[tokio::test]
    async fn test_owner_notifications_in_order() {
        let (state, _) = memory_state();
        let owner = OwnerId::new();
        let link = state
            .engine
            .shorten(ShortenRequest::new("https://example.com").with_max_clicks(1), &owner)
            .await
            .unwrap();
        state.engine.access(&link.code, Utc::now()).await.unwrap();

        let messages = state.notifications.drain(&owner);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("Short URL created: clck.ru/"));
        assert!(messages[1].contains("reached its click limit of 1"));
        assert!(!state.notifications.has_pending(&owner));
    }
}

// =====================================
// تست‌های Sweep
// =====================================
mod sweep_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expired_link(code: &str, owner: OwnerId) -> ShortLink {
        LinkBuilder::new("https://example.com")
            .code(code)
            .owner(owner)
            .max_clicks(5)
            .created_at(Utc::now() - Duration::hours(3))
            .expires_at(Utc::now() - Duration::hours(1))
            .build()
            .unwrap()
    }

    async fn two_expired_one_live<S: LinkStore>(state: &AppState, store: &S) -> (OwnerId, String) {
        let owner = OwnerId::new();
        store.insert(&expired_link("expire1", owner)).await.unwrap();
        store.insert(&expired_link("expire2", owner)).await.unwrap();
        let live = state
            .engine
            .shorten(ShortenRequest::new("https://example.com"), &owner)
            .await
            .unwrap();
        (owner, live.code)
    }

    #[tokio::test]
    async fn test_sweep_moves_only_expired_links() {
        let (state, store) = memory_state();
        let (owner, live) = two_expired_one_live(&state, store.as_ref()).await;

        assert_eq!(state.engine.sweep_expired(Utc::now()).await.unwrap(), 2);
        assert_eq!(state.engine.sweep_expired(Utc::now()).await.unwrap(), 0);

        for code in ["expire1", "expire2"] {
            let link = store.get(code).await.unwrap().unwrap();
            assert_eq!(link.status, LinkStatus::Expired);
        }
        assert_eq!(
            store.get(&live).await.unwrap().unwrap().status,
            LinkStatus::Active
        );

        let expired_messages = state
            .notifications
            .drain(&owner)
            .into_iter()
            .filter(|m| m.contains("has expired"))
            .count();
        assert_eq!(expired_messages, 2);
    }

    #[tokio::test]
    async fn test_sweep_on_sqlite() {
        let (state, store) = sqlite_state().await;
        let (_, live) = two_expired_one_live(&state, store.as_ref()).await;

        assert_eq!(state.engine.sweep_expired(Utc::now()).await.unwrap(), 2);

        let stats = state.engine.statistics().await.unwrap();
        assert_eq!(stats.total_links, 3);
        assert_eq!(stats.active_links, 1);
        assert_eq!(stats.total_owners, 1);

        assert!(matches!(
            state.engine.access("expire1", Utc::now()).await,
            Err(AppError::NotAccessible(InaccessibleReason::Expired))
        ));
        assert!(state.engine.access(&live, Utc::now()).await.is_ok());
    }

    /// `expires_at == now`: هنوز قابل دسترسیه و sweep نمیشه
    async fn boundary_is_not_swept(state: AppState, store: Arc<dyn LinkStore>) {
        let now = Utc::now();
        let link = LinkBuilder::new("https://example.com")
            .code("edgecas")
            .owner(OwnerId::new())
            .max_clicks(5)
            .created_at(now - Duration::hours(1))
            .expires_at(now)
            .build()
            .unwrap();
        store.insert(&link).await.unwrap();

        assert_eq!(state.engine.sweep_expired(now).await.unwrap(), 0);
        assert_eq!(
            store.get("edgecas").await.unwrap().unwrap().status,
            LinkStatus::Active
        );

        let granted = state.engine.access("edgecas", now).await.unwrap();
        assert_eq!(granted.click_count, 1);

        // یک لحظه بعد sweep میشه
        let later = now + Duration::milliseconds(1);
        assert_eq!(state.engine.sweep_expired(later).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sweep_boundary_on_memory() {
        let (state, store) = memory_state();
        boundary_is_not_swept(state, store).await;
    }

    #[tokio::test]
    async fn test_sweep_boundary_on_sqlite() {
        let (state, store) = sqlite_state().await;
        boundary_is_not_swept(state, store).await;
    }

    #[tokio::test]
    async fn test_sweep_skips_terminal_links() {
        let (state, store) = memory_state();
        let owner = OwnerId::new();
        store.insert(&expired_link("gonenow", owner)).await.unwrap();
        assert!(state.engine.deactivate("gonenow", &owner).await.unwrap());

        assert_eq!(state.engine.sweep_expired(Utc::now()).await.unwrap(), 0);
        assert_eq!(
            store.get("gonenow").await.unwrap().unwrap().status,
            LinkStatus::Inactive
        );
    }
}

// =====================================
// تست‌های همزمانی
// =====================================
mod concurrency_tests {
    use super::*;

    /// maxClicks + K دسترسی همزمان → دقیقا maxClicks موفق
    async fn run_concurrent_access(state: AppState, store: Arc<dyn LinkStore>) {
        const MAX_CLICKS: u32 = 10;
        const EXTRA: u32 = 15;

        let owner = OwnerId::new();
        let link = state
            .engine
            .shorten(
                ShortenRequest::new("https://example.com").with_max_clicks(MAX_CLICKS),
                &owner,
            )
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..(MAX_CLICKS + EXTRA) {
            let engine = state.engine.clone();
            let code = link.code.clone();
            handles.push(tokio::spawn(async move {
                engine.access(&code, Utc::now()).await
            }));
        }

        let mut granted = 0;
        let mut denied = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => granted += 1,
                Err(AppError::NotAccessible(InaccessibleReason::LimitExceeded)) => denied += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(granted, MAX_CLICKS);
        assert_eq!(denied, EXTRA);

        let stored = store.get(&link.code).await.unwrap().unwrap();
        assert_eq!(stored.click_count, MAX_CLICKS);
        assert_eq!(stored.status, LinkStatus::LimitExceeded);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_memory_store_never_over_counts() {
        let (state, store) = memory_state();
        run_concurrent_access(state, store).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_sqlite_store_never_over_counts() {
        let (state, store) = sqlite_state().await;
        run_concurrent_access(state, store).await;
    }

    /// deactivate و access همزمان؛ بعد از deactivate هیچ کلیکی ثبت نمیشه
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_deactivate_races_with_access() {
        let (state, store) = memory_state();
        let owner = OwnerId::new();
        let link = state
            .engine
            .shorten(ShortenRequest::new("https://example.com").with_max_clicks(1000), &owner)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let engine = state.engine.clone();
            let code = link.code.clone();
            handles.push(tokio::spawn(async move {
                engine.access(&code, Utc::now()).await.is_ok()
            }));
        }
        assert!(state.engine.deactivate(&link.code, &owner).await.unwrap());

        let granted = futures_count(handles).await;
        let stored = store.get(&link.code).await.unwrap().unwrap();
        assert_eq!(stored.status, LinkStatus::Inactive);
        assert_eq!(stored.click_count as usize, granted);
    }

    async fn futures_count(handles: Vec<tokio::task::JoinHandle<bool>>) -> usize {
        let mut count = 0;
        for handle in handles {
            if handle.await.unwrap() {
                count += 1;
            }
        }
        count
    }
}

// =====================================
// Serialization
// =====================================
mod model_tests {
    use super::*;

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&LinkStatus::LimitExceeded).unwrap(),
            "\"limit_exceeded\""
        );
        let parsed: LinkStatus = serde_json::from_str("\"inactive\"").unwrap();
        assert_eq!(parsed, LinkStatus::Inactive);
    }

    #[test]
    fn test_access_granted_json_shape() {
        let granted = AccessGranted {
            target_url: "https://example.com".to_string(),
            click_count: 1,
            max_clicks: 3,
            status: LinkStatus::Active,
        };
        let value = serde_json::to_value(&granted).unwrap();
        assert_eq!(value["status"], "active");
        assert_eq!(value["click_count"], 1);
    }
}

// =====================================
// Property-Based Tests
// =====================================
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// هر ترتیبی از دسترسی‌ها: click_count <= max_clicks
        #[test]
        fn click_count_never_exceeds_limit(max_clicks in 1u32..8, attempts in 0usize..20) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let (state, store) = memory_state();
                let owner = OwnerId::new();
                let link = state
                    .engine
                    .shorten(
                        ShortenRequest::new("https://example.com").with_max_clicks(max_clicks),
                        &owner,
                    )
                    .await
                    .unwrap();

                let mut granted = 0usize;
                for _ in 0..attempts {
                    if state.engine.access(&link.code, Utc::now()).await.is_ok() {
                        granted += 1;
                    }
                }

                let stored = store.get(&link.code).await.unwrap().unwrap();
                assert!(stored.click_count <= stored.max_clicks);
                assert_eq!(granted, attempts.min(max_clicks as usize));
                assert_eq!(
                    stored.status == LinkStatus::LimitExceeded,
                    attempts >= max_clicks as usize
                );
            });
        }
    }
}
