// Analytics DTOs for dashboards and the admin panel

use chrono::NaiveDate;
use diesel::QueryableByName;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::user::User;

/// One bucket of a breakdown (device, browser, OS, country, city)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, QueryableByName, ToSchema)]
pub struct BreakdownEntry {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub label: String,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub count: i64,
}

/// Scans for a single day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, QueryableByName, ToSchema)]
pub struct DailyCount {
    #[diesel(sql_type = diesel::sql_types::Date)]
    pub day: NaiveDate,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScanBreakdowns {
    pub by_device: Vec<BreakdownEntry>,
    pub by_browser: Vec<BreakdownEntry>,
    pub by_os: Vec<BreakdownEntry>,
    pub by_country: Vec<BreakdownEntry>,
    pub by_city: Vec<BreakdownEntry>,
}

/// Analytics for one QR code
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QrAnalytics {
    pub qr_code_id: Uuid,
    /// Denormalized counter on the QR code
    pub scan_count: i32,
    /// Scan rows inside the requested window
    pub scans_in_period: i64,
    pub period_days: u32,
    pub vendor_tracked: bool,
    #[serde(flatten)]
    pub breakdowns: ScanBreakdowns,
    pub daily: Vec<DailyCount>,
}

/// Analytics across all of a user's QR codes
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsOverview {
    pub total_qr_codes: i64,
    pub active_qr_codes: i64,
    pub total_scans: i64,
    pub scans_in_period: i64,
    pub period_days: u32,
    #[serde(flatten)]
    pub breakdowns: ScanBreakdowns,
    pub daily: Vec<DailyCount>,
    pub top_qr_codes: Vec<TopQrCode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopQrCode {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub scan_count: i32,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalyticsQuery {
    /// Window size in days (1-365, default 30)
    pub days: Option<u32>,
}

impl AnalyticsQuery {
    pub fn days(&self) -> u32 {
        self.days.unwrap_or(30).clamp(1, 365)
    }
}

/// Platform-wide metrics for administrators
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminStats {
    pub total_users: i64,
    pub users_by_status: Vec<BreakdownEntry>,
    pub total_qr_codes: i64,
    pub active_qr_codes: i64,
    pub total_scans: i64,
    pub scans_last_30_days: i64,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminListParams {
    /// Case-insensitive match on email/name (users) or name/slug (QR codes)
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl AdminListParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(50).clamp(1, 200)
    }

    pub fn offset(&self) -> i64 {
        ((self.page() - 1) * self.per_page()) as i64
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminToggleRequest {
    /// Explicit state; omitted flips the current one
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminUserSummary {
    #[serde(flatten)]
    pub user: User,
    pub qr_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_pagination_defaults() {
        let params = AdminListParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 50);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_days_window_is_clamped() {
        assert_eq!(AnalyticsQuery { days: None }.days(), 30);
        assert_eq!(AnalyticsQuery { days: Some(0) }.days(), 1);
        assert_eq!(AnalyticsQuery { days: Some(9999) }.days(), 365);
    }
}
