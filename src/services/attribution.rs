// Scan attribution: client IP, user-agent classification
// Every field has a concrete default; nothing here can fail a redirect.

use axum::http::{header, HeaderMap};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use woothee::parser::Parser;

pub const UNKNOWN: &str = "Unknown";
pub const LOOPBACK_IP: &str = "127.0.0.1";

// Nothing longer can be an address, bracketed IPv6 with a port included
const MAX_ADDRESS_TEXT: usize = 64;

/// Explicit per-request context handed to the resolver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRequestContext {
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

impl ScanRequestContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: client_ip(headers),
            user_agent: header_value(headers, header::USER_AGENT.as_str()),
            referrer: header_value(headers, header::REFERER.as_str()),
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// First `x-forwarded-for` hop, then `x-real-ip`, then loopback. Only values that
/// parse as an IP address are taken, so what gets stored is always a bare address.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(parse_ip);

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_ip)
        })
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| LOOPBACK_IP.to_string())
}

/// `203.0.113.9`, `203.0.113.9:443`, `[2001:db8::1]` and `[2001:db8::1]:443`
fn parse_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    if raw.is_empty() || raw.len() > MAX_ADDRESS_TEXT {
        return None;
    }

    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
        .or_else(|| {
            raw.strip_prefix('[')
                .and_then(|v| v.strip_suffix(']'))
                .and_then(|v| v.parse::<IpAddr>().ok())
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
    Bot,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Desktop => "desktop",
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Bot => "bot",
        }
    }
}

/// Device, browser and OS derived from a user-agent string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_type: DeviceType,
    pub browser: String,
    pub os: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            device_type: DeviceType::Desktop,
            browser: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
        }
    }
}

fn known(value: &str) -> String {
    if value.is_empty() || value.eq_ignore_ascii_case("unknown") {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

impl DeviceInfo {
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(user_agent) = user_agent.filter(|ua| !ua.trim().is_empty()) else {
            return Self::default();
        };

        let parser = Parser::new();
        let Some(result) = parser.parse(user_agent) else {
            return Self::default();
        };

        let os = known(&result.os);
        let device_type = match &*result.category {
            "crawler" => DeviceType::Bot,
            // woothee files tablets under smartphone; tell them apart by OS and UA hints
            "smartphone" | "mobilephone" if is_tablet(&os, user_agent) => DeviceType::Tablet,
            "smartphone" | "mobilephone" => DeviceType::Mobile,
            _ => DeviceType::Desktop,
        };

        Self {
            device_type,
            browser: known(&result.name),
            os,
        }
    }
}

fn is_tablet(os: &str, user_agent: &str) -> bool {
    os == "iPad"
        || user_agent.contains("Tablet")
        || (os == "Android" && !user_agent.contains("Mobile"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const IPAD_UA: &str = "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";
    const ANDROID_TABLET_UA: &str = "Mozilla/5.0 (Linux; Android 13; SM-X700) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36";
    const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const BOT_UA: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_then_loopback() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), LOOPBACK_IP);

        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers), "198.51.100.2");

        headers.insert("x-forwarded-for", HeaderValue::from_static(" , "));
        assert_eq!(client_ip(&headers), "198.51.100.2");
    }

    #[test]
    fn test_ports_and_brackets_are_stripped() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9:443, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers), "203.0.113.9");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("[2001:db8::1]:8443"),
        );
        assert_eq!(client_ip(&headers), "2001:db8::1");

        headers.insert("x-forwarded-for", HeaderValue::from_static("[2001:db8::2]"));
        assert_eq!(client_ip(&headers), "2001:db8::2");
    }

    #[test]
    fn test_unparseable_forwarded_value_falls_through() {
        let mut headers = HeaderMap::new();
        let junk = "x".repeat(200);
        headers.insert("x-forwarded-for", HeaderValue::from_str(&junk).unwrap());
        assert_eq!(client_ip(&headers), LOOPBACK_IP);

        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers), "198.51.100.2");

        headers.insert("x-real-ip", HeaderValue::from_static("not-an-ip"));
        assert_eq!(client_ip(&headers), LOOPBACK_IP);
    }

    #[test]
    fn test_context_captures_referrer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_static("https://news.example"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static(DESKTOP_UA));

        let ctx = ScanRequestContext::from_headers(&headers);
        assert_eq!(ctx.referrer.as_deref(), Some("https://news.example"));
        assert_eq!(ctx.user_agent.as_deref(), Some(DESKTOP_UA));
        assert_eq!(ctx.ip_address, LOOPBACK_IP);
    }

    #[test]
    fn test_device_classification() {
        let phone = DeviceInfo::from_user_agent(Some(IPHONE_UA));
        assert_eq!(phone.device_type, DeviceType::Mobile);
        assert_eq!(phone.os, "iPhone");
        assert_eq!(phone.browser, "Safari");

        assert_eq!(
            DeviceInfo::from_user_agent(Some(IPAD_UA)).device_type,
            DeviceType::Tablet
        );
        assert_eq!(
            DeviceInfo::from_user_agent(Some(ANDROID_TABLET_UA)).device_type,
            DeviceType::Tablet
        );

        let desktop = DeviceInfo::from_user_agent(Some(DESKTOP_UA));
        assert_eq!(desktop.device_type, DeviceType::Desktop);
        assert_eq!(desktop.browser, "Chrome");

        assert_eq!(
            DeviceInfo::from_user_agent(Some(BOT_UA)).device_type,
            DeviceType::Bot
        );
    }

    #[test]
    fn test_missing_or_garbage_user_agent_defaults() {
        assert_eq!(DeviceInfo::from_user_agent(None), DeviceInfo::default());
        assert_eq!(DeviceInfo::from_user_agent(Some("   ")), DeviceInfo::default());

        let garbage = DeviceInfo::from_user_agent(Some("definitely-not-a-browser"));
        assert_eq!(garbage.device_type, DeviceType::Desktop);
        assert_eq!(garbage.browser, UNKNOWN);
        assert_eq!(garbage.os, UNKNOWN);
    }
}
