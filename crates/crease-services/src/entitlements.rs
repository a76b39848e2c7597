//! Feature entitlements: plans, per-period quotas and expiry.
//!
//! Usage is counted per subscription. Subscribing (or renewing) resets the
//! counters; an expired paid plan is reported once as `PlanExpired` and the
//! user drops back to the free plan with fresh counters.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crease_models::{Feature, Plan, UserId};

use crate::error::{ServiceError, ServiceResult};

/// Checks a feature against the caller's plan and consumes one use.
#[async_trait]
pub trait EntitlementGate: Send + Sync {
    async fn check_and_consume(&self, user: &UserId, feature: Feature) -> ServiceResult<EntitlementGrant>;
}

/// A successful check. `used` includes the use just consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementGrant {
    pub feature: Feature,
    pub plan: Plan,
    pub used: u32,
    pub limit: u32,
}

impl EntitlementGrant {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }
}

/// One user's subscription and usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan: Plan,
    pub started_at: DateTime<Utc>,
    /// `None` for the free plan.
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage: HashMap<Feature, u32>,
}

impl Subscription {
    pub fn new(plan: Plan, now: DateTime<Utc>) -> Self {
        Self {
            plan,
            started_at: now,
            expires_at: plan.period().map(|p| now + p),
            usage: HashMap::new(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    pub fn used(&self, feature: Feature) -> u32 {
        self.usage.get(&feature).copied().unwrap_or(0)
    }
}

/// In-process entitlement store.
#[derive(Debug, Default)]
pub struct InMemoryEntitlements {
    subscriptions: RwLock<HashMap<UserId, Subscription>>,
}

impl InMemoryEntitlements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or renew) a plan for a user, resetting usage.
    pub async fn subscribe(&self, user: &UserId, plan: Plan, now: DateTime<Utc>) -> Subscription {
        let subscription = Subscription::new(plan, now);
        self.subscriptions
            .write()
            .await
            .insert(user.clone(), subscription.clone());
        info!(user = %user, plan = %plan, expires_at = ?subscription.expires_at, "Subscription started");
        subscription
    }

    pub async fn subscription(&self, user: &UserId) -> Option<Subscription> {
        self.subscriptions.read().await.get(user).cloned()
    }

    /// Check and consume at an explicit instant.
    pub async fn check_and_consume_at(
        &self,
        user: &UserId,
        feature: Feature,
        now: DateTime<Utc>,
    ) -> ServiceResult<EntitlementGrant> {
        let mut subscriptions = self.subscriptions.write().await;
        let subscription = subscriptions
            .entry(user.clone())
            .or_insert_with(|| Subscription::new(Plan::Free, now));

        if subscription.is_expired(now) {
            let plan = subscription.plan;
            let expired_at = subscription.expires_at.unwrap_or(now);
            *subscription = Subscription::new(Plan::Free, now);
            warn!(user = %user, plan = %plan, "Plan expired, reverted to free");
            return Err(ServiceError::PlanExpired { plan, expired_at });
        }

        let plan = subscription.plan;
        let limit = plan.limits().limit(feature);
        if limit == 0 {
            return Err(ServiceError::PremiumRequired { feature, plan });
        }

        let used = subscription.used(feature);
        if used >= limit {
            debug!(user = %user, feature = %feature, used, limit, "Quota exhausted");
            return Err(ServiceError::QuotaExceeded { feature, used, limit });
        }

        let used = used + 1;
        subscription.usage.insert(feature, used);
        Ok(EntitlementGrant {
            feature,
            plan,
            used,
            limit,
        })
    }
}

#[async_trait]
impl EntitlementGate for InMemoryEntitlements {
    async fn check_and_consume(&self, user: &UserId, feature: Feature) -> ServiceResult<EntitlementGrant> {
        self.check_and_consume_at(user, feature, Utc::now()).await
    }
}

/// Grants everything. For local runs without a billing backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unmetered;

#[async_trait]
impl EntitlementGate for Unmetered {
    async fn check_and_consume(&self, _user: &UserId, feature: Feature) -> ServiceResult<EntitlementGrant> {
        Ok(EntitlementGrant {
            feature,
            plan: Plan::UltraPro,
            used: 0,
            limit: u32::MAX,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_free_plan_quota() {
        let gate = InMemoryEntitlements::new();
        let user = UserId::new("u1");

        for n in 1..=5 {
            let grant = gate.check_and_consume_at(&user, Feature::Chat, t0()).await.unwrap();
            assert_eq!(grant.used, n);
            assert_eq!(grant.plan, Plan::Free);
        }

        let err = gate.check_and_consume_at(&user, Feature::Chat, t0()).await.unwrap_err();
        assert!(matches!(err, ServiceError::QuotaExceeded { used: 5, limit: 5, .. }));

        // a refused check does not consume
        let sub = gate.subscription(&user).await.unwrap();
        assert_eq!(sub.used(Feature::Chat), 5);
    }

    #[tokio::test]
    async fn test_premium_required() {
        let gate = InMemoryEntitlements::new();
        let user = UserId::new("u2");

        let err = gate.check_and_consume_at(&user, Feature::Compare, t0()).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::PremiumRequired {
                feature: Feature::Compare,
                plan: Plan::Free
            }
        ));

        gate.subscribe(&user, Plan::Yearly, t0()).await;
        let grant = gate.check_and_consume_at(&user, Feature::Compare, t0()).await.unwrap();
        assert_eq!(grant.limit, 50);
        assert_eq!(grant.remaining(), 49);
    }

    #[tokio::test]
    async fn test_expired_plan_reverts_to_free() {
        let gate = InMemoryEntitlements::new();
        let user = UserId::new("u3");
        gate.subscribe(&user, Plan::Monthly, t0()).await;

        let before = t0() + Duration::days(29);
        assert!(gate.check_and_consume_at(&user, Feature::Chat, before).await.is_ok());

        let after = t0() + Duration::days(30);
        let err = gate.check_and_consume_at(&user, Feature::Chat, after).await.unwrap_err();
        assert!(matches!(err, ServiceError::PlanExpired { plan: Plan::Monthly, .. }));

        let grant = gate.check_and_consume_at(&user, Feature::Chat, after).await.unwrap();
        assert_eq!(grant.plan, Plan::Free);
        assert_eq!(grant.used, 1);
    }

    #[tokio::test]
    async fn test_unmetered() {
        let grant = Unmetered.check_and_consume(&UserId::new("x"), Feature::Compare).await.unwrap();
        assert_eq!(grant.plan, Plan::UltraPro);
    }
}
