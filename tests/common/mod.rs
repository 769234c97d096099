// Common test utilities shared by the integration tests
// The router runs against an in-memory RedirectStore; dashboard routes get a lazy
// pool that never connects unless a test actually reaches the database.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, Response, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use qr_redirect_service::{
    app::{build_router, AppState},
    app_config::AppConfig,
    db::{DieselDatabaseConfig, RedirectStore, RedirectTarget, StoreError},
    models::{NewScan, QrCode, SubscriptionSnapshot, SubscriptionStatus, UserRole},
    services::{GeoError, GeoLocation, GeoLocator, JwtService},
};
use serde::Serialize;
use serde_json::{json, Value};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;
use uuid::Uuid;

pub const BASE_URL: &str = "https://app.example.test";

// =============================================================================
// FIXTURES
// =============================================================================

pub fn website_code(slug: &str, url: &str) -> QrCode {
    QrCode {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        folder_id: None,
        name: format!("Code {}", slug),
        slug: slug.to_string(),
        qr_type: "website".to_string(),
        content: json!({ "url": url }),
        design: json!({}),
        is_dynamic: true,
        is_active: true,
        is_favorite: false,
        access_password: None,
        scan_limit: None,
        scan_count: 0,
        qrfy_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn content_code(slug: &str, qr_type: &str, content: Value) -> QrCode {
    QrCode {
        qr_type: qr_type.to_string(),
        content,
        ..website_code(slug, "https://example.com")
    }
}

pub fn owner(status: SubscriptionStatus) -> SubscriptionSnapshot {
    SubscriptionSnapshot {
        status,
        trial_ends_at: None,
        subscription_ends_at: None,
    }
}

pub fn trialing_until(ends: DateTime<Utc>) -> SubscriptionSnapshot {
    SubscriptionSnapshot {
        status: SubscriptionStatus::Trialing,
        trial_ends_at: Some(ends),
        subscription_ends_at: None,
    }
}

/// Cheap bcrypt hash; verification accepts bcrypt alongside Argon2
pub fn quick_hash(password: &str) -> String {
    bcrypt::hash(password, 4).expect("bcrypt hash")
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// RedirectStore over a Vec, with call counters and switchable failures
#[derive(Default)]
pub struct InMemoryStore {
    targets: Mutex<Vec<RedirectTarget>>,
    scans: Mutex<Vec<NewScan>>,
    pub lookups: AtomicUsize,
    pub fail_lookups: AtomicBool,
    pub fail_increments: AtomicBool,
    pub fail_inserts: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, qr: QrCode, owner: SubscriptionSnapshot) {
        self.targets
            .lock()
            .unwrap()
            .push(RedirectTarget { qr, owner });
    }

    pub fn scan_count(&self, slug: &str) -> i32 {
        self.targets
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.qr.slug == slug)
            .map(|t| t.qr.scan_count)
            .unwrap_or(0)
    }

    pub fn scans(&self) -> Vec<NewScan> {
        self.scans.lock().unwrap().clone()
    }

    pub fn scans_for(&self, qr_code_id: Uuid) -> Vec<NewScan> {
        self.scans()
            .into_iter()
            .filter(|s| s.qr_code_id == qr_code_id)
            .collect()
    }

    fn injected(flag: &AtomicBool, what: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Pool(format!("injected {} failure", what)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RedirectStore for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<RedirectTarget>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Self::injected(&self.fail_lookups, "lookup")?;

        Ok(self
            .targets
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.qr.slug == slug)
            .cloned())
    }

    async fn increment_scan_count(&self, qr_code_id: Uuid) -> Result<(), StoreError> {
        Self::injected(&self.fail_increments, "increment")?;

        let mut targets = self.targets.lock().unwrap();
        if let Some(target) = targets.iter_mut().find(|t| t.qr.id == qr_code_id) {
            target.qr.scan_count += 1;
        }
        Ok(())
    }

    async fn insert_scan(&self, scan: NewScan) -> Result<(), StoreError> {
        Self::injected(&self.fail_inserts, "insert")?;
        self.scans.lock().unwrap().push(scan);
        Ok(())
    }
}

// =============================================================================
// GEOLOCATION STUB
// =============================================================================

/// Answers every lookup with a fixed location, or fails on demand
pub struct StubGeo {
    pub location: GeoLocation,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl StubGeo {
    pub fn new(country: &str, city: &str) -> Self {
        Self {
            location: GeoLocation {
                country: country.to_string(),
                city: city.to_string(),
            },
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GeoLocator for StubGeo {
    async fn locate(&self, _ip: IpAddr) -> Result<GeoLocation, GeoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(GeoError::Lookup("stubbed failure".to_string()));
        }
        Ok(self.location.clone())
    }
}

// =============================================================================
// TEST APPLICATION
// =============================================================================

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub store: Arc<InMemoryStore>,
    pub geo: Arc<StubGeo>,
    pub jwt_service: Arc<JwtService>,
    pub config: Arc<AppConfig>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::for_test())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(InMemoryStore::new());
        let geo = Arc::new(StubGeo::new("Germany", "Berlin"));
        let pool = DieselDatabaseConfig::from(&config.database).build_lazy();

        let state = AppState::new(config.clone(), pool, store.clone(), geo.clone());
        let jwt_service = state.jwt_service.clone();

        Self {
            app: build_router(state),
            store,
            geo,
            jwt_service,
            config,
        }
    }

    pub fn get(&self, uri: &str) -> TestRequest<'_> {
        TestRequest::new(self, "GET", uri)
    }

    pub fn post(&self, uri: &str) -> TestRequest<'_> {
        TestRequest::new(self, "POST", uri)
    }

    pub fn patch(&self, uri: &str) -> TestRequest<'_> {
        TestRequest::new(self, "PATCH", uri)
    }

    /// Dashboard bearer token for a fresh user id
    pub fn token_for(&self, role: UserRole) -> String {
        self.jwt_service
            .generate_access_token(Uuid::new_v4(), "owner@example.test", role, 3600)
            .expect("mint access token")
    }
}

/// Test request builder
pub struct TestRequest<'a> {
    app: &'a TestApp,
    method: &'static str,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    forwarded_for: String,
}

impl<'a> TestRequest<'a> {
    fn new(app: &'a TestApp, method: &'static str, uri: &str) -> Self {
        Self {
            app,
            method,
            uri: uri.to_string(),
            headers: Vec::new(),
            body: None,
            // Public address so geolocation is attempted
            forwarded_for: "203.0.113.50".to_string(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", &format!("Bearer {}", token))
    }

    pub fn cookie(self, cookie: &str) -> Self {
        self.header("cookie", cookie)
    }

    pub fn user_agent(self, ua: &str) -> Self {
        self.header("user-agent", ua)
    }

    /// Replace the default `x-forwarded-for` chain
    pub fn forwarded_for(mut self, chain: &str) -> Self {
        self.forwarded_for = chain.to_string();
        self
    }

    /// Add JSON body to request
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        self.body = Some(serde_json::to_vec(body).unwrap());
        self.header("content-type", "application/json")
    }

    /// Send the request
    pub async fn send(self) -> TestResponse {
        let mut builder = Request::builder()
            .method(self.method)
            .uri(&self.uri)
            .header("x-forwarded-for", self.forwarded_for.as_str());
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let request = builder
            .body(self.body.map(Body::from).unwrap_or_else(Body::empty))
            .unwrap();

        let response = self.app.app.clone().oneshot(request).await.unwrap();
        TestResponse { response }
    }
}

/// Test response wrapper
pub struct TestResponse {
    response: Response<Body>,
}

impl TestResponse {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    pub fn location(&self) -> Option<&str> {
        self.response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// First `Set-Cookie` header, if any
    pub fn set_cookie(&self) -> Option<String> {
        self.response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub async fn json<T: serde::de::DeserializeOwned>(self) -> T {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    pub async fn text(self) -> String {
        let body = axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }
}

/// `name=value` pair from a `Set-Cookie` header, ready to send back
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
