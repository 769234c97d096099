// Public scan resolution: slug -> policy -> attribution -> recording -> destination
// Every request is evaluated from scratch; nothing but scan rows outlives it.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

use crate::app_config::AppConfig;
use crate::db::{RedirectStore, RedirectTarget};
use crate::models::QrCode;
use crate::services::access_policy::{self, AccessDecision, DenyReason, GracePeriod};
use crate::services::attribution::{DeviceInfo, ScanRequestContext};
use crate::services::destination;
use crate::services::geo::{self, GeoLocator};
use crate::services::jwt::JwtService;
use crate::services::metrics;
use crate::services::scan_recorder::{self, RecordResult, ScanAttribution};
use crate::services::slug;

/// Terminal state of one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    Redirected {
        location: String,
        /// `None` when the vendor counts scans for this code
        recorded: Option<RecordResult>,
    },
    Denied {
        reason: DenyReason,
        location: String,
    },
    Challenge {
        location: String,
    },
    /// Something unexpected; send the caller home
    Failed {
        location: String,
    },
}

impl RedirectOutcome {
    pub fn location(&self) -> &str {
        match self {
            RedirectOutcome::Redirected { location, .. }
            | RedirectOutcome::Denied { location, .. }
            | RedirectOutcome::Challenge { location }
            | RedirectOutcome::Failed { location } => location,
        }
    }

    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            RedirectOutcome::Redirected { .. } => "redirected",
            RedirectOutcome::Denied { reason, .. } => match reason {
                DenyReason::Unavailable => "unavailable",
                DenyReason::Subscription => "subscription",
                DenyReason::Limit => "limit",
            },
            RedirectOutcome::Challenge { .. } => "challenge",
            RedirectOutcome::Failed { .. } => "failed",
        }
    }

    pub fn failed(public_base_url: &str) -> Self {
        RedirectOutcome::Failed {
            location: destination::home_url(public_base_url),
        }
    }
}

/// Whether `authorize` applies the scan ceiling. A landing page opened with a
/// view pass skips it: that scan was already allowed and counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanLimit {
    Enforce,
    Ignore,
}

#[derive(Clone)]
pub struct RedirectService {
    store: Arc<dyn RedirectStore>,
    geo: Arc<dyn GeoLocator>,
    jwt: Arc<JwtService>,
    config: Arc<AppConfig>,
}

impl RedirectService {
    pub fn new(
        store: Arc<dyn RedirectStore>,
        geo: Arc<dyn GeoLocator>,
        jwt: Arc<JwtService>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            geo,
            jwt,
            config,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.redirect.public_base_url
    }

    fn grace(&self) -> GracePeriod {
        GracePeriod(self.config.redirect.past_due_grace_days)
    }

    /// Slug lookup. Failures are logged and treated as not found.
    async fn lookup(&self, slug: &str) -> Option<RedirectTarget> {
        match self.store.find_by_slug(slug).await {
            Ok(target) => target,
            Err(e) => {
                tracing::error!("Slug lookup failed for {}: {}", slug, e);
                None
            },
        }
    }

    fn password_verified(&self, slug: &str, access_token: Option<&str>) -> bool {
        match access_token {
            Some(token) => match self.jwt.verify_slug_access_token(token, slug) {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!("Ignoring verification cookie for {}: {}", slug, e);
                    false
                },
            },
            None => false,
        }
    }

    /// Resolve one scan into a redirect
    #[instrument(skip(self, access_token, ctx), fields(ip = %ctx.ip_address))]
    pub async fn resolve(
        &self,
        slug: &str,
        access_token: Option<&str>,
        ctx: ScanRequestContext,
    ) -> RedirectOutcome {
        let started = Instant::now();
        let outcome = self.resolve_inner(slug, access_token, ctx).await;

        metrics::observe_resolve_seconds(started.elapsed().as_secs_f64());
        metrics::record_outcome(outcome.label());
        tracing::info!(outcome = outcome.label(), "Resolved scan for {}", slug);

        outcome
    }

    /// Lookup plus policy, without attribution or recording. `Err` carries the
    /// redirect a caller who may not see the content gets instead.
    pub async fn authorize(
        &self,
        slug: &str,
        access_token: Option<&str>,
        limit: ScanLimit,
    ) -> Result<RedirectTarget, RedirectOutcome> {
        let target = if slug::is_plausible_slug(slug) {
            self.lookup(slug).await
        } else {
            None
        };

        let Some(target) = target else {
            return Err(RedirectOutcome::Denied {
                reason: DenyReason::Unavailable,
                location: destination::unavailable_url(self.base_url(), DenyReason::Unavailable),
            });
        };

        let qr = &target.qr;
        let verified = qr.is_password_protected() && self.password_verified(slug, access_token);

        let decision = match limit {
            ScanLimit::Enforce => {
                access_policy::evaluate(qr, &target.owner, verified, Utc::now(), self.grace())
            },
            ScanLimit::Ignore => {
                let uncapped = QrCode {
                    scan_limit: None,
                    ..qr.clone()
                };
                access_policy::evaluate(&uncapped, &target.owner, verified, Utc::now(), self.grace())
            },
        };

        match decision {
            AccessDecision::Allow => Ok(target),
            AccessDecision::Deny(reason) => Err(RedirectOutcome::Denied {
                reason,
                location: destination::unavailable_url(self.base_url(), reason),
            }),
            AccessDecision::Challenge => Err(RedirectOutcome::Challenge {
                location: destination::challenge_url(self.base_url(), &qr.slug),
            }),
        }
    }

    async fn resolve_inner(
        &self,
        slug: &str,
        access_token: Option<&str>,
        ctx: ScanRequestContext,
    ) -> RedirectOutcome {
        let qr = match self.authorize(slug, access_token, ScanLimit::Enforce).await {
            Ok(RedirectTarget { qr, .. }) => qr,
            Err(outcome) => return outcome,
        };

        let recorded = if qr.is_vendor_tracked() {
            tracing::debug!("{} is counted by the rendering vendor, not recording", slug);
            None
        } else {
            let location = geo::resolve_location(self.geo.as_ref(), &ctx.ip_address).await;
            let attribution = ScanAttribution {
                device: DeviceInfo::from_user_agent(ctx.user_agent.as_deref()),
                ip_address: ctx.ip_address,
                location,
                referrer: ctx.referrer,
            };
            Some(scan_recorder::record_scan(self.store.as_ref(), &qr, attribution).await)
        };

        let view_pass = self.view_pass(&qr);
        RedirectOutcome::Redirected {
            location: destination::select_destination(&qr, self.base_url(), view_pass.as_deref()),
            recorded,
        }
    }

    /// Short-lived pass for the landing page, so the scan just allowed can still
    /// show its content once the code reaches its limit
    fn view_pass(&self, qr: &QrCode) -> Option<String> {
        if !destination::needs_landing_page(qr) {
            return None;
        }
        match self.jwt.issue_view_pass(&qr.slug) {
            Ok(pass) => Some(pass),
            Err(e) => {
                tracing::warn!("Could not issue view pass for {}: {}", qr.slug, e);
                None
            },
        }
    }

    /// Whether `pass` was issued by an allowed scan of `slug`
    pub fn has_view_pass(&self, slug: &str, pass: Option<&str>) -> bool {
        match pass {
            Some(pass) => match self.jwt.verify_view_pass(pass, slug) {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!("Ignoring view pass for {}: {}", slug, e);
                    false
                },
            },
            None => false,
        }
    }
}
