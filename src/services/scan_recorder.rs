// Best-effort scan persistence
// Increment and insert run concurrently and outside a transaction; failures are logged,
// counted and swallowed so a scan never fails to redirect.

use chrono::Utc;
use uuid::Uuid;

use crate::db::RedirectStore;
use crate::models::{NewScan, QrCode};
use crate::services::attribution::DeviceInfo;
use crate::services::geo::GeoLocation;
use crate::services::metrics;

/// Attribution fields captured for one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanAttribution {
    pub ip_address: String,
    pub device: DeviceInfo,
    pub location: GeoLocation,
    pub referrer: Option<String>,
}

impl ScanAttribution {
    pub fn into_new_scan(self, qr: &QrCode) -> NewScan {
        NewScan {
            id: Uuid::new_v4(),
            qr_code_id: qr.id,
            user_id: qr.user_id,
            ip_address: self.ip_address,
            country: self.location.country,
            city: self.location.city,
            device_type: self.device.device_type.as_str().to_string(),
            browser: self.device.browser,
            os: self.device.os,
            referrer: self.referrer,
            scanned_at: Utc::now(),
        }
    }
}

/// What happened to the two writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordResult {
    pub counter_incremented: bool,
    pub scan_inserted: bool,
}

/// Persist one scan for a locally tracked code. Vendor-tracked codes must not reach here.
pub async fn record_scan(
    store: &dyn RedirectStore,
    qr: &QrCode,
    attribution: ScanAttribution,
) -> RecordResult {
    let scan = attribution.into_new_scan(qr);

    let (increment, insert) = tokio::join!(
        store.increment_scan_count(qr.id),
        store.insert_scan(scan)
    );

    if let Err(e) = &increment {
        tracing::error!("Failed to increment scan count for {}: {}", qr.slug, e);
        metrics::record_scan_failure("increment");
    }
    if let Err(e) = &insert {
        tracing::error!("Failed to insert scan for {}: {}", qr.slug, e);
        metrics::record_scan_failure("insert");
    }

    RecordResult {
        counter_incremented: increment.is_ok(),
        scan_inserted: insert.is_ok(),
    }
}
