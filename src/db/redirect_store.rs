// Persistence seam for the public resolver
// The resolver only needs three operations, so it talks to the database through this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use thiserror::Error;
use uuid::Uuid;

use crate::db::DieselPool;
use crate::models::{NewScan, QrCode, SubscriptionSnapshot};
use crate::schema::{qr_codes, scans, users};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),
}

/// A QR code together with its owner's last-synced subscription state
#[derive(Debug, Clone)]
pub struct RedirectTarget {
    pub qr: QrCode,
    pub owner: SubscriptionSnapshot,
}

#[async_trait]
pub trait RedirectStore: Send + Sync {
    /// One logical read: the code and its owner's subscription snapshot
    async fn find_by_slug(&self, slug: &str) -> Result<Option<RedirectTarget>, StoreError>;

    /// Atomic `scan_count = scan_count + 1`
    async fn increment_scan_count(&self, qr_code_id: Uuid) -> Result<(), StoreError>;

    async fn insert_scan(&self, scan: NewScan) -> Result<(), StoreError>;
}

/// PostgreSQL-backed store used in production
#[derive(Clone)]
pub struct DieselRedirectStore {
    pool: DieselPool,
}

impl DieselRedirectStore {
    pub fn new(pool: DieselPool) -> Self {
        Self { pool }
    }
}

type OwnerColumns = (String, Option<DateTime<Utc>>, Option<DateTime<Utc>>);

#[async_trait]
impl RedirectStore for DieselRedirectStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<RedirectTarget>, StoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        let row: Option<(QrCode, OwnerColumns)> = qr_codes::table
            .inner_join(users::table)
            .filter(qr_codes::slug.eq(slug))
            .select((
                QrCode::as_select(),
                (
                    users::subscription_status,
                    users::trial_ends_at,
                    users::subscription_ends_at,
                ),
            ))
            .first(&mut conn)
            .await
            .optional()?;

        Ok(row.map(|(qr, (status, trial_ends_at, subscription_ends_at))| RedirectTarget {
            qr,
            owner: SubscriptionSnapshot::from_columns(&status, trial_ends_at, subscription_ends_at),
        }))
    }

    async fn increment_scan_count(&self, qr_code_id: Uuid) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        diesel::update(qr_codes::table.find(qr_code_id))
            .set(qr_codes::scan_count.eq(qr_codes::scan_count + 1))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn insert_scan(&self, scan: NewScan) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        diesel::insert_into(scans::table)
            .values(&scan)
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}
