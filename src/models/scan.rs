// Scan event model
// Immutable once written; rows only disappear through cascades

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::scans;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = scans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Scan {
    pub id: Uuid,
    pub qr_code_id: Uuid,
    pub user_id: Uuid,
    pub ip_address: String,
    pub country: String,
    pub city: String,
    pub device_type: String,
    pub browser: String,
    pub os: String,
    pub referrer: Option<String>,
    pub scanned_at: DateTime<Utc>,
}

/// New scan for insertion
#[derive(Debug, Clone, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = scans)]
pub struct NewScan {
    pub id: Uuid,
    pub qr_code_id: Uuid,
    pub user_id: Uuid,
    pub ip_address: String,
    pub country: String,
    pub city: String,
    pub device_type: String,
    pub browser: String,
    pub os: String,
    pub referrer: Option<String>,
    pub scanned_at: DateTime<Utc>,
}
