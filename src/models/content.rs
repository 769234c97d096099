// Typed QR payloads
// The `content` column is JSON whose shape depends on `qr_type`; this module turns
// that pair into a closed set of variants with an opaque fallback.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// QR types whose payload is itself a destination URL
pub const URL_QR_TYPES: &[&str] = &[
    "website",
    "url",
    "video",
    "social",
    "facebook",
    "instagram",
    "twitter",
    "linkedin",
    "youtube",
    "tiktok",
];

/// Social platforms stored with their own type tag
const SOCIAL_PLATFORMS: &[&str] = &[
    "social",
    "facebook",
    "instagram",
    "twitter",
    "linkedin",
    "youtube",
    "tiktok",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlContent {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcardContent {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl VcardContent {
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// vCard 3.0 text for "save contact" downloads
    pub fn to_vcf(&self) -> String {
        let mut lines = vec!["BEGIN:VCARD".to_string(), "VERSION:3.0".to_string()];
        lines.push(format!(
            "N:{};{};;;",
            self.last_name.as_deref().unwrap_or(""),
            self.first_name.as_deref().unwrap_or("")
        ));
        lines.push(format!("FN:{}", self.full_name()));
        if let Some(org) = &self.organization {
            lines.push(format!("ORG:{}", org));
        }
        if let Some(title) = &self.title {
            lines.push(format!("TITLE:{}", title));
        }
        if let Some(phone) = &self.phone {
            lines.push(format!("TEL;TYPE=CELL:{}", phone));
        }
        if let Some(email) = &self.email {
            lines.push(format!("EMAIL:{}", email));
        }
        if let Some(website) = &self.website {
            lines.push(format!("URL:{}", website));
        }
        if let Some(address) = &self.address {
            lines.push(format!("ADR:;;{};;;;", address));
        }
        lines.push("END:VCARD".to_string());
        lines.join("\r\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WifiContent {
    pub ssid: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub encryption: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailContent {
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneContent {
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsContent {
    pub phone: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationContent {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub label: Option<String>,
}

/// Non-URL types with a fixed payload shape
const STRUCTURED_TYPES: &[&str] = &["vcard", "wifi", "text", "email", "phone", "sms", "location"];

/// Whether `qr_type` has a known payload shape that content must match
pub fn is_known_type(qr_type: &str) -> bool {
    let tag = qr_type.trim().to_lowercase();
    URL_QR_TYPES.contains(&tag.as_str()) || STRUCTURED_TYPES.contains(&tag.as_str())
}

/// A QR payload interpreted through its type tag
#[derive(Debug, Clone, PartialEq)]
pub enum QrContent {
    Website(UrlContent),
    Video(UrlContent),
    Social { platform: String, url: String },
    Vcard(VcardContent),
    Wifi(WifiContent),
    Text(TextContent),
    Email(EmailContent),
    Phone(PhoneContent),
    Sms(SmsContent),
    Location(LocationContent),
    /// Unknown type, or a payload that does not match its type's shape
    Opaque { qr_type: String, payload: Value },
}

fn parse_as<T: serde::de::DeserializeOwned>(payload: &Value) -> Option<T> {
    serde_json::from_value(payload.clone()).ok()
}

impl QrContent {
    /// Interpret a stored `(qr_type, content)` pair. Never fails.
    pub fn from_parts(qr_type: &str, payload: &Value) -> Self {
        let tag = qr_type.trim().to_lowercase();

        let parsed = match tag.as_str() {
            "website" | "url" => parse_as(payload).map(QrContent::Website),
            "video" => parse_as(payload).map(QrContent::Video),
            t if SOCIAL_PLATFORMS.contains(&t) => {
                parse_as::<UrlContent>(payload).map(|c| QrContent::Social {
                    platform: tag.clone(),
                    url: c.url,
                })
            },
            "vcard" => parse_as(payload).map(QrContent::Vcard),
            "wifi" => parse_as(payload).map(QrContent::Wifi),
            "text" => parse_as(payload).map(QrContent::Text),
            "email" => parse_as(payload).map(QrContent::Email),
            "phone" => parse_as(payload).map(QrContent::Phone),
            "sms" => parse_as(payload).map(QrContent::Sms),
            "location" => parse_as(payload).map(QrContent::Location),
            _ => None,
        };

        parsed.unwrap_or_else(|| QrContent::Opaque {
            qr_type: tag,
            payload: payload.clone(),
        })
    }

    /// The type tag this content was parsed from
    pub fn qr_type(&self) -> &str {
        match self {
            QrContent::Website(_) => "website",
            QrContent::Video(_) => "video",
            QrContent::Social { platform, .. } => platform,
            QrContent::Vcard(_) => "vcard",
            QrContent::Wifi(_) => "wifi",
            QrContent::Text(_) => "text",
            QrContent::Email(_) => "email",
            QrContent::Phone(_) => "phone",
            QrContent::Sms(_) => "sms",
            QrContent::Location(_) => "location",
            QrContent::Opaque { qr_type, .. } => qr_type,
        }
    }

    /// Destination URL for URL-bearing types, only when it is real http(s)
    pub fn redirect_url(&self) -> Option<&str> {
        let candidate = match self {
            QrContent::Website(c) | QrContent::Video(c) => c.url.trim(),
            QrContent::Social { url, .. } => url.trim(),
            _ => return None,
        };

        match url::Url::parse(candidate) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
                Some(candidate)
            },
            _ => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, QrContent::Opaque { .. })
    }

    /// WiFi network string in the de-facto `WIFI:` QR format
    pub fn wifi_string(wifi: &WifiContent) -> String {
        let escape = |s: &str| {
            s.replace('\\', "\\\\")
                .replace(';', "\\;")
                .replace(',', "\\,")
                .replace(':', "\\:")
        };
        format!(
            "WIFI:T:{};S:{};P:{};H:{};;",
            wifi.encryption.as_deref().unwrap_or("WPA"),
            escape(&wifi.ssid),
            escape(wifi.password.as_deref().unwrap_or("")),
            if wifi.hidden { "true" } else { "false" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_website_content_parses() {
        let content = QrContent::from_parts("website", &json!({"url": "https://example.com"}));
        assert_eq!(
            content,
            QrContent::Website(UrlContent {
                url: "https://example.com".to_string()
            })
        );
        assert_eq!(content.redirect_url(), Some("https://example.com"));
    }

    #[test]
    fn test_type_tag_is_case_insensitive() {
        let content = QrContent::from_parts("WebSite", &json!({"url": "https://example.com"}));
        assert_eq!(content.qr_type(), "website");
    }

    #[test]
    fn test_social_platform_keeps_its_tag() {
        let content =
            QrContent::from_parts("instagram", &json!({"url": "https://instagram.com/acme"}));
        assert_eq!(content.qr_type(), "instagram");
        assert_eq!(content.redirect_url(), Some("https://instagram.com/acme"));
    }

    #[test]
    fn test_non_http_url_is_not_a_destination() {
        for url in ["javascript:alert(1)", "ftp://example.com/file", "example.com", ""] {
            let content = QrContent::from_parts("website", &json!({ "url": url }));
            assert_eq!(content.redirect_url(), None, "url {:?} must not redirect", url);
        }
    }

    #[test]
    fn test_mismatched_payload_falls_back_to_opaque() {
        let payload = json!({"link": "https://example.com"});
        let content = QrContent::from_parts("website", &payload);
        assert!(content.is_opaque());
        assert_eq!(content.qr_type(), "website");
        assert_eq!(content.redirect_url(), None);
    }

    #[test]
    fn test_known_types() {
        assert!(is_known_type("Website"));
        assert!(is_known_type("wifi"));
        assert!(!is_known_type("crypto"));
    }

    #[test]
    fn test_unknown_type_is_opaque() {
        let content = QrContent::from_parts("crypto", &json!({"address": "bc1q"}));
        assert!(matches!(content, QrContent::Opaque { ref qr_type, .. } if qr_type == "crypto"));
    }

    #[test]
    fn test_vcard_parses_camel_case_fields() {
        let content = QrContent::from_parts(
            "vcard",
            &json!({"firstName": "Ada", "lastName": "Lovelace", "phone": "+44 20 0000"}),
        );
        match content {
            QrContent::Vcard(card) => {
                assert_eq!(card.full_name(), "Ada Lovelace");
                let vcf = card.to_vcf();
                assert!(vcf.starts_with("BEGIN:VCARD"));
                assert!(vcf.contains("FN:Ada Lovelace"));
                assert!(vcf.contains("TEL;TYPE=CELL:+44 20 0000"));
            },
            other => panic!("expected vcard, got {:?}", other),
        }
    }

    #[test]
    fn test_wifi_string_escapes_special_characters() {
        let wifi = WifiContent {
            ssid: "Cafe;Guest".to_string(),
            password: Some("p:ss".to_string()),
            encryption: None,
            hidden: false,
        };
        assert_eq!(
            QrContent::wifi_string(&wifi),
            "WIFI:T:WPA;S:Cafe\\;Guest;P:p\\:ss;H:false;;"
        );
    }
}
