// Services module
// Public resolver pipeline plus the dashboard and admin business logic

pub mod access_policy;
pub mod admin;
pub mod analytics;
pub mod attribution;
pub mod destination;
pub mod folder;
pub mod geo;
pub mod jwt;
pub mod metrics;
pub mod password_gate;
pub mod qr_code;
pub mod redirect;
pub mod scan_recorder;
pub mod slug;

// Re-export commonly used services
pub use access_policy::{AccessDecision, DenyReason, GracePeriod};
pub use admin::AdminService;
pub use analytics::AnalyticsService;
pub use attribution::{DeviceInfo, DeviceType, ScanRequestContext};
pub use folder::FolderService;
pub use geo::{GeoError, GeoLocation, GeoLocator, HttpGeoLocator};
pub use jwt::{AccessTokenClaims, JwtConfig, JwtError, JwtService};
pub use password_gate::{PasswordGateError, PasswordGateService};
pub use qr_code::QrCodeService;
pub use redirect::{RedirectOutcome, RedirectService, ScanLimit};
pub use scan_recorder::{RecordResult, ScanAttribution};
