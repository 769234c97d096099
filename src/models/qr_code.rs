// QR code model, request/response DTOs

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::content::QrContent;
use crate::schema::qr_codes;
use crate::utils::validation::deserialize_some;

// =============================================================================
// DATABASE MODELS
// =============================================================================

/// QR code model representing a database record
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = qr_codes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QrCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub folder_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub qr_type: String,
    pub content: Value,
    pub design: Value,
    pub is_dynamic: bool,
    pub is_active: bool,
    pub is_favorite: bool,
    pub access_password: Option<String>,
    pub scan_limit: Option<i32>,
    pub scan_count: i32,
    pub qrfy_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QrCode {
    /// Typed view of `content`
    pub fn typed_content(&self) -> QrContent {
        QrContent::from_parts(&self.qr_type, &self.content)
    }

    pub fn is_password_protected(&self) -> bool {
        self.access_password
            .as_deref()
            .map(|p| !p.is_empty())
            .unwrap_or(false)
    }

    /// Scans are counted by the rendering vendor instead of locally
    pub fn is_vendor_tracked(&self) -> bool {
        self.qrfy_id
            .as_deref()
            .map(|id| !id.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn to_response(&self, public_base_url: &str) -> QrCodeResponse {
        QrCodeResponse {
            id: self.id,
            folder_id: self.folder_id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            short_url: format!("{}/r/{}", public_base_url, self.slug),
            qr_type: self.qr_type.clone(),
            content: self.content.clone(),
            design: self.design.clone(),
            is_dynamic: self.is_dynamic,
            is_active: self.is_active,
            is_favorite: self.is_favorite,
            has_password: self.is_password_protected(),
            scan_limit: self.scan_limit,
            scan_count: self.scan_count,
            vendor_tracked: self.is_vendor_tracked(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// New QR code for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = qr_codes)]
pub struct NewQrCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub folder_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub qr_type: String,
    pub content: Value,
    pub design: Value,
    pub is_dynamic: bool,
    pub is_active: bool,
    pub is_favorite: bool,
    pub access_password: Option<String>,
    pub scan_limit: Option<i32>,
    pub scan_count: i32,
    pub qrfy_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Update QR code fields
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = qr_codes)]
pub struct UpdateQrCode {
    pub name: Option<String>,
    pub qr_type: Option<String>,
    pub content: Option<Value>,
    pub design: Option<Value>,
    pub folder_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
    pub is_favorite: Option<bool>,
    pub access_password: Option<Option<String>>,
    pub scan_limit: Option<Option<i32>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// REQUEST/RESPONSE DTOs
// =============================================================================

/// Request to create a QR code
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Spring menu",
    "qr_type": "website",
    "content": {"url": "https://example.com/menu"},
    "design": {"dotsColor": "#000000"},
    "is_dynamic": true,
    "folder_id": null,
    "access_password": null,
    "scan_limit": 500
}))]
pub struct CreateQrCodeRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 50, message = "Type must be 1-50 characters"))]
    pub qr_type: String,

    #[schema(value_type = Object)]
    pub content: Value,

    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub design: Option<Value>,

    #[serde(default = "default_true")]
    pub is_dynamic: bool,

    #[serde(default)]
    pub folder_id: Option<Uuid>,

    #[validate(length(min = 4, max = 128, message = "Password must be 4-128 characters"))]
    #[serde(default)]
    pub access_password: Option<String>,

    #[validate(range(min = 0, message = "Scan limit cannot be negative"))]
    #[serde(default)]
    pub scan_limit: Option<i32>,

    /// Identifier of the code at the rendering vendor, when it tracks scans itself
    #[validate(length(max = 255))]
    #[serde(default)]
    pub qrfy_id: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Partial update. `null` clears nullable fields; absent fields are untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateQrCodeRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Type must be 1-50 characters"))]
    pub qr_type: Option<String>,

    #[schema(value_type = Option<Object>)]
    pub content: Option<Value>,

    #[schema(value_type = Option<Object>)]
    pub design: Option<Value>,

    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<Uuid>)]
    pub folder_id: Option<Option<Uuid>>,

    pub is_active: Option<bool>,

    pub is_favorite: Option<bool>,

    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub access_password: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<i32>)]
    pub scan_limit: Option<Option<i32>>,
}

/// QR code as returned to its owner; the password hash never leaves the service
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QrCodeResponse {
    pub id: Uuid,
    pub folder_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub short_url: String,
    pub qr_type: String,
    #[schema(value_type = Object)]
    pub content: Value,
    #[schema(value_type = Object)]
    pub design: Value,
    pub is_dynamic: bool,
    pub is_active: bool,
    pub is_favorite: bool,
    pub has_password: bool,
    pub scan_limit: Option<i32>,
    pub scan_count: i32,
    pub vendor_tracked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing QR codes
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQrCodesParams {
    pub folder_id: Option<Uuid>,
    /// Only codes outside any folder
    #[serde(default)]
    pub unfiled: bool,
    pub search: Option<String>,
    pub favorite: Option<bool>,
    pub active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListQrCodesParams {
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(20).clamp(1, Self::MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        ((self.page() - 1) * self.per_page()) as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QrCodeListResponse {
    pub items: Vec<QrCodeResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// Action applied to many QR codes at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Delete,
    Activate,
    Deactivate,
    Favorite,
    Unfavorite,
    Move,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkActionRequest {
    #[validate(length(min = 1, max = 500, message = "Select between 1 and 500 QR codes"))]
    pub ids: Vec<Uuid>,
    pub action: BulkAction,
    /// Destination folder for `move`; `null` removes the codes from their folder
    #[serde(default)]
    pub folder_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkActionResponse {
    pub action: BulkAction,
    pub affected: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(qrfy_id: Option<&str>, password: Option<&str>) -> QrCode {
        QrCode {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            folder_id: None,
            name: "Menu".to_string(),
            slug: "abc12345".to_string(),
            qr_type: "website".to_string(),
            content: json!({"url": "https://example.com"}),
            design: json!({}),
            is_dynamic: true,
            is_active: true,
            is_favorite: false,
            access_password: password.map(str::to_string),
            scan_limit: None,
            scan_count: 0,
            qrfy_id: qrfy_id.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_vendor_tracking_ignores_blank_ids() {
        assert!(!sample(None, None).is_vendor_tracked());
        assert!(!sample(Some("  "), None).is_vendor_tracked());
        assert!(sample(Some("qrfy_123"), None).is_vendor_tracked());
    }

    #[test]
    fn test_response_hides_password_hash() {
        let qr = sample(None, Some("$argon2id$v=19$..."));
        let response = qr.to_response("https://app.example.com");
        assert!(response.has_password);
        assert_eq!(response.short_url, "https://app.example.com/r/abc12345");
        let body = serde_json::to_value(&response).unwrap();
        assert!(body.get("access_password").is_none());
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let absent: UpdateQrCodeRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.folder_id, None);

        let cleared: UpdateQrCodeRequest =
            serde_json::from_value(json!({"folder_id": null, "scan_limit": null})).unwrap();
        assert_eq!(cleared.folder_id, Some(None));
        assert_eq!(cleared.scan_limit, Some(None));
    }

    #[test]
    fn test_pagination_is_clamped() {
        let params = ListQrCodesParams {
            page: Some(0),
            per_page: Some(10_000),
            ..Default::default()
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), ListQrCodesParams::MAX_PER_PAGE);
        assert_eq!(params.offset(), 0);
    }
}
