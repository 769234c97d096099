// PostgreSQL-backed tests for the diesel layer
// Run against a disposable database: DATABASE_URL=... cargo test -- --ignored

mod common;

use axum::{body::Body, http::Request, http::StatusCode};
use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use qr_redirect_service::{
    app::{build_router, AppState},
    app_config::AppConfig,
    db::{create_diesel_pool, DieselDatabaseConfig, DieselPool, DieselRedirectStore, RedirectStore},
    migrations,
    models::{
        BulkAction, BulkActionRequest, CreateFolderRequest, CreateQrCodeRequest, NewScan,
        SubscriptionStatus,
    },
    schema::{qr_codes, scans, users},
    services::{FolderService, QrCodeService},
    utils::service_error::ServiceError,
};
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

struct TestDb {
    pool: DieselPool,
    config: Arc<AppConfig>,
}

async fn setup_test_db() -> TestDb {
    dotenv::from_filename(".env.test").ok();

    let mut config = AppConfig::for_test();
    config.database.url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
    config.database.max_connections = 10;
    config.database.connect_timeout = 5;

    migrations::run_migrations(&config.database.url)
        .await
        .expect("migrations apply");
    let pool = create_diesel_pool(DieselDatabaseConfig::from(&config.database))
        .await
        .expect("pool connects");

    TestDb {
        pool,
        config: Arc::new(config),
    }
}

async fn create_owner(
    db: &TestDb,
    status: SubscriptionStatus,
    subscription_ends_at: Option<DateTime<Utc>>,
) -> Uuid {
    let mut conn = db.pool.get().await.unwrap();

    diesel::insert_into(users::table)
        .values((
            users::email.eq(format!("owner-{}@example.test", Uuid::new_v4())),
            users::subscription_status.eq(status.as_str()),
            users::subscription_ends_at.eq(subscription_ends_at),
        ))
        .returning(users::id)
        .get_result(&mut conn)
        .await
        .unwrap()
}

fn website_request(name: &str, folder_id: Option<Uuid>) -> CreateQrCodeRequest {
    CreateQrCodeRequest {
        name: name.to_string(),
        qr_type: "website".to_string(),
        content: json!({"url": "https://example.com/menu"}),
        design: None,
        is_dynamic: true,
        folder_id,
        access_password: None,
        scan_limit: None,
        qrfy_id: None,
    }
}

async fn scan_rows(db: &TestDb, qr_code_id: Uuid) -> i64 {
    let mut conn = db.pool.get().await.unwrap();
    scans::table
        .filter(scans::qr_code_id.eq(qr_code_id))
        .count()
        .get_result(&mut conn)
        .await
        .unwrap()
}

async fn scan_count(db: &TestDb, qr_code_id: Uuid) -> i32 {
    let mut conn = db.pool.get().await.unwrap();
    qr_codes::table
        .find(qr_code_id)
        .select(qr_codes::scan_count)
        .first(&mut conn)
        .await
        .unwrap()
}

fn scan_for(qr_code_id: Uuid, user_id: Uuid) -> NewScan {
    NewScan {
        id: Uuid::new_v4(),
        qr_code_id,
        user_id,
        ip_address: "203.0.113.50".to_string(),
        country: "Germany".to_string(),
        city: "Berlin".to_string(),
        device_type: "mobile".to_string(),
        browser: "Safari".to_string(),
        os: "iPhone".to_string(),
        referrer: None,
        scanned_at: Utc::now(),
    }
}

#[tokio::test]
#[ignore] // Requires database
async fn test_find_by_slug_carries_owner_snapshot() {
    let db = setup_test_db().await;
    let ends = Utc::now() - Duration::days(2);
    let owner = create_owner(&db, SubscriptionStatus::PastDue, Some(ends)).await;
    let codes = QrCodeService::new(db.pool.clone(), db.config.clone());
    let created = codes.create(owner, website_request("Menu", None)).await.unwrap();

    let store = DieselRedirectStore::new(db.pool.clone());
    let target = store.find_by_slug(&created.slug).await.unwrap().unwrap();

    assert_eq!(target.qr.id, created.id);
    assert_eq!(target.qr.user_id, owner);
    assert_eq!(target.owner.status, SubscriptionStatus::PastDue);
    assert_eq!(target.owner.trial_ends_at, None);
    let synced = target.owner.subscription_ends_at.unwrap();
    assert!((synced - ends).num_milliseconds().abs() < 1);

    assert!(store.find_by_slug("nothere1").await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires database
async fn test_concurrent_increments_are_not_lost() {
    let db = setup_test_db().await;
    let owner = create_owner(&db, SubscriptionStatus::Active, None).await;
    let codes = QrCodeService::new(db.pool.clone(), db.config.clone());
    let created = codes.create(owner, website_request("Flyer", None)).await.unwrap();

    let store = Arc::new(DieselRedirectStore::new(db.pool.clone()));
    let handles: Vec<_> = (0..25)
        .map(|_| {
            let store = store.clone();
            let id = created.id;
            tokio::spawn(async move { store.increment_scan_count(id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(scan_count(&db, created.id).await, 25);
}

#[tokio::test]
#[ignore] // Requires database
async fn test_scans_are_removed_with_their_code() {
    let db = setup_test_db().await;
    let owner = create_owner(&db, SubscriptionStatus::Active, None).await;
    let codes = QrCodeService::new(db.pool.clone(), db.config.clone());
    let created = codes.create(owner, website_request("Poster", None)).await.unwrap();

    let store = DieselRedirectStore::new(db.pool.clone());
    store.insert_scan(scan_for(created.id, owner)).await.unwrap();
    store.insert_scan(scan_for(created.id, owner)).await.unwrap();
    assert_eq!(scan_rows(&db, created.id).await, 2);

    codes.delete(owner, created.id).await.unwrap();
    assert_eq!(scan_rows(&db, created.id).await, 0);
}

#[tokio::test]
#[ignore] // Requires database
async fn test_deleting_folder_keeps_its_codes() {
    let db = setup_test_db().await;
    let owner = create_owner(&db, SubscriptionStatus::Active, None).await;
    let folders = FolderService::new(db.pool.clone());
    let codes = QrCodeService::new(db.pool.clone(), db.config.clone());

    let folder = folders
        .create(
            owner,
            CreateFolderRequest {
                name: "Spring campaign".to_string(),
                color: Some("#1a2b3c".to_string()),
            },
        )
        .await
        .unwrap();
    let filed = codes
        .create(owner, website_request("Table card", Some(folder.id)))
        .await
        .unwrap();
    assert_eq!(filed.folder_id, Some(folder.id));

    let listed = folders.list(owner).await.unwrap();
    assert_eq!(listed.iter().find(|f| f.id == folder.id).unwrap().qr_count, 1);

    folders.delete(owner, folder.id).await.unwrap();

    let kept = codes.find_owned(owner, filed.id).await.unwrap();
    assert_eq!(kept.folder_id, None);
    assert!(folders.list(owner).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore] // Requires database
async fn test_bulk_action_only_touches_own_codes() {
    let db = setup_test_db().await;
    let owner = create_owner(&db, SubscriptionStatus::Active, None).await;
    let stranger = create_owner(&db, SubscriptionStatus::Active, None).await;
    let codes = QrCodeService::new(db.pool.clone(), db.config.clone());

    let mine_a = codes.create(owner, website_request("A", None)).await.unwrap();
    let mine_b = codes.create(owner, website_request("B", None)).await.unwrap();
    let theirs = codes.create(stranger, website_request("C", None)).await.unwrap();
    let ids = vec![mine_a.id, mine_b.id, theirs.id];

    let result = codes
        .bulk_action(
            owner,
            BulkActionRequest {
                ids: ids.clone(),
                action: BulkAction::Deactivate,
                folder_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(result.affected, 2);
    assert!(!codes.find_owned(owner, mine_a.id).await.unwrap().is_active);
    assert!(codes.find_owned(stranger, theirs.id).await.unwrap().is_active);

    let result = codes
        .bulk_action(
            owner,
            BulkActionRequest {
                ids,
                action: BulkAction::Delete,
                folder_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(result.affected, 2);
    assert!(codes.find_owned(stranger, theirs.id).await.is_ok());

    // Moving into someone else's folder is refused
    let foreign_folder = FolderService::new(db.pool.clone())
        .create(
            stranger,
            CreateFolderRequest {
                name: "Theirs".to_string(),
                color: None,
            },
        )
        .await
        .unwrap();
    let mine_c = codes.create(owner, website_request("D", None)).await.unwrap();
    let moved = codes
        .bulk_action(
            owner,
            BulkActionRequest {
                ids: vec![mine_c.id],
                action: BulkAction::Move,
                folder_id: Some(foreign_folder.id),
            },
        )
        .await;
    assert!(moved.is_err());
    assert_eq!(codes.find_owned(owner, mine_c.id).await.unwrap().folder_id, None);
}

#[tokio::test]
#[ignore] // Requires database
async fn test_toggle_status_is_owner_scoped() {
    let db = setup_test_db().await;
    let owner = create_owner(&db, SubscriptionStatus::Active, None).await;
    let stranger = create_owner(&db, SubscriptionStatus::Active, None).await;
    let codes = QrCodeService::new(db.pool.clone(), db.config.clone());
    let created = codes.create(owner, website_request("Badge", None)).await.unwrap();

    assert!(matches!(
        codes.toggle_status(stranger, created.id).await,
        Err(ServiceError::NotFound)
    ));
    assert!(codes.find_owned(owner, created.id).await.unwrap().is_active);

    let toggled = codes.toggle_status(owner, created.id).await.unwrap();
    assert!(!toggled.is_active);
    let toggled = codes.toggle_status(owner, created.id).await.unwrap();
    assert!(toggled.is_active);
}

#[tokio::test]
#[ignore] // Requires database
async fn test_scan_through_router_writes_count_and_row() {
    let db = setup_test_db().await;
    let owner = create_owner(&db, SubscriptionStatus::Active, None).await;
    let codes = QrCodeService::new(db.pool.clone(), db.config.clone());
    let created = codes.create(owner, website_request("Door", None)).await.unwrap();

    let store = Arc::new(DieselRedirectStore::new(db.pool.clone()));
    let geo = Arc::new(common::StubGeo::new("Germany", "Berlin"));
    let state = AppState::new(db.config.clone(), db.pool.clone(), store, geo);

    let response = build_router(state)
        .oneshot(
            Request::builder()
                .uri(format!("/r/{}", created.slug))
                .header("x-forwarded-for", "203.0.113.50")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(scan_count(&db, created.id).await, 1);
    assert_eq!(scan_rows(&db, created.id).await, 1);

    let mut conn = db.pool.get().await.unwrap();
    let (ip, country): (String, String) = scans::table
        .filter(scans::qr_code_id.eq(created.id))
        .select((scans::ip_address, scans::country))
        .first(&mut conn)
        .await
        .unwrap();
    assert_eq!(ip, "203.0.113.50");
    assert_eq!(country, "Germany");
}
