// Best-effort IP geolocation for scan attribution

use async_trait::async_trait;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

use crate::app_config::AttributionConfig;
use crate::services::attribution::UNKNOWN;
use crate::services::metrics;

pub const LOCAL: &str = "Local";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoLocation {
    pub country: String,
    pub city: String,
}

impl GeoLocation {
    pub fn unknown() -> Self {
        Self {
            country: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
        }
    }

    pub fn local() -> Self {
        Self {
            country: LOCAL.to_string(),
            city: LOCAL.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Geolocation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Geolocation lookup unsuccessful: {0}")]
    Lookup(String),

    #[error("Geolocation disabled")]
    Disabled,
}

#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn locate(&self, ip: IpAddr) -> Result<GeoLocation, GeoError>;
}

/// Addresses that never leave the local network
pub fn is_local_address(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        },
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // unique local fc00::/7
                || (first & 0xfe00) == 0xfc00
                // link local fe80::/10
                || (first & 0xffc0) == 0xfe80
                || v6.to_ipv4_mapped().map(|v4| is_local_address(&IpAddr::V4(v4))).unwrap_or(false)
        },
    }
}

/// Resolve geography for a raw IP string, substituting defaults on every failure path
pub async fn resolve_location(locator: &dyn GeoLocator, ip: &str) -> GeoLocation {
    let parsed = match ip.trim().parse::<IpAddr>() {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::debug!("Unparseable client IP {:?}, skipping geolocation", ip);
            return GeoLocation::unknown();
        },
    };

    if is_local_address(&parsed) {
        return GeoLocation::local();
    }

    match locator.locate(parsed).await {
        Ok(location) => location,
        Err(GeoError::Disabled) => GeoLocation::unknown(),
        Err(e) => {
            tracing::warn!("Geolocation failed for {}: {}", parsed, e);
            metrics::record_geo_failure();
            GeoLocation::unknown()
        },
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

fn non_empty_or_unknown(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// ip-api.com compatible HTTP lookup with a bounded timeout
pub struct HttpGeoLocator {
    client: reqwest::Client,
    base_url: String,
    enabled: bool,
}

impl HttpGeoLocator {
    pub fn new(config: &AttributionConfig) -> Result<Self, GeoError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.geoip_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.geoip_api_url.trim_end_matches('/').to_string(),
            enabled: config.geoip_enabled,
        })
    }
}

#[async_trait]
impl GeoLocator for HttpGeoLocator {
    async fn locate(&self, ip: IpAddr) -> Result<GeoLocation, GeoError> {
        if !self.enabled {
            return Err(GeoError::Disabled);
        }

        let response: IpApiResponse = self
            .client
            .get(format!("{}/{}", self.base_url, ip))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "success" {
            return Err(GeoError::Lookup(
                response.message.unwrap_or_else(|| response.status.clone()),
            ));
        }

        Ok(GeoLocation {
            country: non_empty_or_unknown(response.country),
            city: non_empty_or_unknown(response.city),
        })
    }
}
