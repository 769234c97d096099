// Access policy for public scans
// Pure decision over already-fetched data: no I/O, no clock reads, no cookies.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{QrCode, SubscriptionSnapshot, SubscriptionStatus};

/// Why a scan may not proceed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Missing or disabled code; the two are indistinguishable to callers
    Unavailable,
    Subscription,
    Limit,
}

impl DenyReason {
    /// Machine-readable indicator appended to the unavailable page, if any
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            DenyReason::Unavailable => None,
            DenyReason::Subscription => Some("subscription"),
            DenyReason::Limit => Some("limit"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Unavailable => "unavailable",
            DenyReason::Subscription => "subscription",
            DenyReason::Limit => "limit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
    /// Password-protected and not yet verified for this slug
    Challenge,
}

/// How long a `past_due` owner stays entitled after `subscription_ends_at`.
/// `None` means indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GracePeriod(pub Option<u32>);

impl GracePeriod {
    pub const UNLIMITED: GracePeriod = GracePeriod(None);

    pub fn days(days: u32) -> Self {
        GracePeriod(Some(days))
    }
}

/// Whether the owner's subscription snapshot permits their codes to resolve
pub fn is_entitled(snapshot: &SubscriptionSnapshot, now: DateTime<Utc>, grace: GracePeriod) -> bool {
    match snapshot.status {
        SubscriptionStatus::Active => true,
        SubscriptionStatus::Trialing => snapshot
            .trial_ends_at
            .map(|ends| ends > now)
            .unwrap_or(false),
        SubscriptionStatus::PastDue => match (grace.0, snapshot.subscription_ends_at) {
            (None, _) => true,
            // No period end synced yet; billing has not told us when the grace clock starts
            (Some(_), None) => true,
            (Some(days), Some(ends)) => now < ends + Duration::days(i64::from(days)),
        },
        SubscriptionStatus::Canceled | SubscriptionStatus::Expired => false,
    }
}

/// Decide whether a scan may proceed. The first failing check wins:
/// active flag, owner entitlement, scan ceiling, then the password gate.
pub fn evaluate(
    qr: &QrCode,
    owner: &SubscriptionSnapshot,
    password_verified: bool,
    now: DateTime<Utc>,
    grace: GracePeriod,
) -> AccessDecision {
    if !qr.is_active {
        return AccessDecision::Deny(DenyReason::Unavailable);
    }

    if !is_entitled(owner, now, grace) {
        return AccessDecision::Deny(DenyReason::Subscription);
    }

    if let Some(limit) = qr.scan_limit {
        if qr.scan_count >= limit {
            return AccessDecision::Deny(DenyReason::Limit);
        }
    }

    if qr.is_password_protected() && !password_verified {
        return AccessDecision::Challenge;
    }

    AccessDecision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn qr() -> QrCode {
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
            access_password: None,
            scan_limit: None,
            scan_count: 0,
            qrfy_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn owner(status: SubscriptionStatus) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            status,
            trial_ends_at: None,
            subscription_ends_at: None,
        }
    }

    const GRACE: GracePeriod = GracePeriod(Some(7));

    #[test]
    fn test_active_owner_is_allowed() {
        let decision = evaluate(&qr(), &owner(SubscriptionStatus::Active), false, Utc::now(), GRACE);
        assert_eq!(decision, AccessDecision::Allow);
    }

    #[test]
    fn test_inactive_code_wins_over_everything() {
        let mut code = qr();
        code.is_active = false;
        code.scan_limit = Some(0);
        code.access_password = Some("$argon2id$hash".to_string());

        for status in SubscriptionStatus::ALL {
            assert_eq!(
                evaluate(&code, &owner(status), true, Utc::now(), GRACE),
                AccessDecision::Deny(DenyReason::Unavailable)
            );
        }
    }

    #[test]
    fn test_trial_must_end_strictly_in_the_future() {
        let now = Utc::now();
        let mut snapshot = owner(SubscriptionStatus::Trialing);

        snapshot.trial_ends_at = Some(now - Duration::days(1));
        assert_eq!(
            evaluate(&qr(), &snapshot, false, now, GRACE),
            AccessDecision::Deny(DenyReason::Subscription)
        );

        snapshot.trial_ends_at = Some(now);
        assert!(!is_entitled(&snapshot, now, GRACE));

        snapshot.trial_ends_at = Some(now + Duration::days(3));
        assert_eq!(evaluate(&qr(), &snapshot, false, now, GRACE), AccessDecision::Allow);

        snapshot.trial_ends_at = None;
        assert!(!is_entitled(&snapshot, now, GRACE));
    }

    #[test]
    fn test_canceled_and_expired_are_not_entitled() {
        let now = Utc::now();
        assert!(!is_entitled(&owner(SubscriptionStatus::Canceled), now, GRACE));
        assert!(!is_entitled(&owner(SubscriptionStatus::Expired), now, GRACE));
    }

    #[test]
    fn test_past_due_grace_window() {
        let now = Utc::now();
        let mut snapshot = owner(SubscriptionStatus::PastDue);

        // Nothing synced yet
        assert!(is_entitled(&snapshot, now, GRACE));

        snapshot.subscription_ends_at = Some(now - Duration::days(3));
        assert!(is_entitled(&snapshot, now, GRACE));

        snapshot.subscription_ends_at = Some(now - Duration::days(8));
        assert!(!is_entitled(&snapshot, now, GRACE));
        assert!(is_entitled(&snapshot, now, GracePeriod::UNLIMITED));

        assert!(!is_entitled(&snapshot, now, GracePeriod::days(0)));
    }

    #[test]
    fn test_scan_limit_boundary() {
        let active = owner(SubscriptionStatus::Active);
        let mut code = qr();
        code.scan_limit = Some(5);

        code.scan_count = 4;
        assert_eq!(evaluate(&code, &active, false, Utc::now(), GRACE), AccessDecision::Allow);

        code.scan_count = 5;
        assert_eq!(
            evaluate(&code, &active, false, Utc::now(), GRACE),
            AccessDecision::Deny(DenyReason::Limit)
        );

        code.scan_limit = Some(0);
        code.scan_count = 0;
        assert_eq!(
            evaluate(&code, &active, false, Utc::now(), GRACE),
            AccessDecision::Deny(DenyReason::Limit)
        );
    }

    #[test]
    fn test_subscription_checked_before_limit() {
        let mut code = qr();
        code.scan_limit = Some(1);
        code.scan_count = 1;
        assert_eq!(
            evaluate(&code, &owner(SubscriptionStatus::Expired), false, Utc::now(), GRACE),
            AccessDecision::Deny(DenyReason::Subscription)
        );
    }

    #[test]
    fn test_password_gate_challenges_until_verified() {
        let active = owner(SubscriptionStatus::Active);
        let mut code = qr();
        code.access_password = Some("$argon2id$hash".to_string());

        assert_eq!(
            evaluate(&code, &active, false, Utc::now(), GRACE),
            AccessDecision::Challenge
        );
        assert_eq!(evaluate(&code, &active, true, Utc::now(), GRACE), AccessDecision::Allow);
    }

    #[test]
    fn test_limit_checked_before_password() {
        let mut code = qr();
        code.access_password = Some("$argon2id$hash".to_string());
        code.scan_limit = Some(2);
        code.scan_count = 2;
        assert_eq!(
            evaluate(&code, &owner(SubscriptionStatus::Active), false, Utc::now(), GRACE),
            AccessDecision::Deny(DenyReason::Limit)
        );
    }

    #[test]
    fn test_deny_reason_query_values() {
        assert_eq!(DenyReason::Unavailable.query_value(), None);
        assert_eq!(DenyReason::Limit.query_value(), Some("limit"));
        assert_eq!(DenyReason::Subscription.query_value(), Some("subscription"));
    }
}
