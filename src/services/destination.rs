// Destination selection and the internal routes the resolver redirects to

use crate::models::QrCode;
use crate::services::access_policy::DenyReason;

/// Final URL for an allowed scan: the payload URL for URL-bearing types,
/// otherwise the internal landing page that renders the content.
pub fn select_destination(qr: &QrCode, public_base_url: &str, view_pass: Option<&str>) -> String {
    match qr.typed_content().redirect_url() {
        Some(url) => url.to_string(),
        None => landing_url(public_base_url, &qr.slug, view_pass),
    }
}

/// Whether an allowed scan of `qr` ends on the landing page
pub fn needs_landing_page(qr: &QrCode) -> bool {
    qr.typed_content().redirect_url().is_none()
}

pub fn landing_url(public_base_url: &str, slug: &str, view_pass: Option<&str>) -> String {
    match view_pass {
        Some(pass) => format!("{}/view/{}?pass={}", public_base_url, slug, pass),
        None => format!("{}/view/{}", public_base_url, slug),
    }
}

pub fn challenge_url(public_base_url: &str, slug: &str) -> String {
    format!("{}/r/{}/verify", public_base_url, slug)
}

pub fn unavailable_url(public_base_url: &str, reason: DenyReason) -> String {
    match reason.query_value() {
        Some(value) => format!("{}/expired?reason={}", public_base_url, value),
        None => format!("{}/expired", public_base_url),
    }
}

pub fn home_url(public_base_url: &str) -> String {
    format!("{}/", public_base_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::{json, Value};
    use uuid::Uuid;

    const BASE: &str = "https://app.example.test";

    fn qr(qr_type: &str, content: Value) -> QrCode {
        QrCode {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            folder_id: None,
            name: "Code".to_string(),
            slug: "abc12345".to_string(),
            qr_type: qr_type.to_string(),
            content,
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

    #[test]
    fn test_url_types_redirect_to_payload() {
        let website = qr("website", json!({"url": "https://example.com"}));
        assert_eq!(select_destination(&website, BASE, None), "https://example.com");
        assert!(!needs_landing_page(&website));

        let video = qr("video", json!({"url": "https://youtube.com/watch?v=1"}));
        assert_eq!(select_destination(&video, BASE, None), "https://youtube.com/watch?v=1");

        let social = qr("linkedin", json!({"url": "https://linkedin.com/in/ada"}));
        assert_eq!(select_destination(&social, BASE, None), "https://linkedin.com/in/ada");
    }

    #[test]
    fn test_other_types_use_landing_page() {
        let vcard = qr("vcard", json!({"firstName": "Ada"}));
        assert_eq!(select_destination(&vcard, BASE, None), "https://app.example.test/view/abc12345");
        assert!(needs_landing_page(&vcard));

        let wifi = qr("wifi", json!({"ssid": "Cafe"}));
        assert_eq!(
            select_destination(&wifi, BASE, Some("t0k.en")),
            "https://app.example.test/view/abc12345?pass=t0k.en"
        );
    }

    #[test]
    fn test_url_type_without_real_url_falls_back_to_landing() {
        let broken = qr("website", json!({"url": "javascript:alert(1)"}));
        assert_eq!(select_destination(&broken, BASE, None), "https://app.example.test/view/abc12345");
    }

    #[test]
    fn test_unavailable_urls_carry_reason() {
        assert_eq!(
            unavailable_url(BASE, DenyReason::Unavailable),
            "https://app.example.test/expired"
        );
        assert_eq!(
            unavailable_url(BASE, DenyReason::Limit),
            "https://app.example.test/expired?reason=limit"
        );
        assert_eq!(
            unavailable_url(BASE, DenyReason::Subscription),
            "https://app.example.test/expired?reason=subscription"
        );
        assert_eq!(challenge_url(BASE, "abc12345"), "https://app.example.test/r/abc12345/verify");
        assert_eq!(home_url(BASE), "https://app.example.test/");
    }
}
