//! "Ask the coach about this delivery".
//!
//! Identity first, then the entitlement check, then text generation. A
//! refused caller never reaches the quota; a refused quota never reaches the
//! text generator.

use serde::Serialize;
use tracing::info;

use crease_models::{DeliveryAnalysis, Feature, UserId};
use crease_services::{build_coaching_prompt, CoachingTextGenerator, EntitlementGate, EntitlementGrant, IdentityResolver};

use crate::error::WorkerResult;

/// A coaching answer and the quota it used.
#[derive(Debug, Clone, Serialize)]
pub struct CoachingAnswer {
    pub user: UserId,
    pub text: String,
    pub grant: EntitlementGrant,
}

/// Collaborators wired together for one review surface.
pub struct ReviewSession<I, E, C> {
    identity: I,
    entitlements: E,
    coach: C,
}

impl<I, E, C> ReviewSession<I, E, C>
where
    I: IdentityResolver,
    E: EntitlementGate,
    C: CoachingTextGenerator,
{
    pub fn new(identity: I, entitlements: E, coach: C) -> Self {
        Self {
            identity,
            entitlements,
            coach,
        }
    }

    /// Resolve the caller and consume one use of `feature`.
    pub async fn authorize(&self, credential: &str, feature: Feature) -> WorkerResult<(UserId, EntitlementGrant)> {
        let user = self.identity.resolve(credential).await?;
        let grant = self.entitlements.check_and_consume(&user, feature).await?;
        info!(user = %user, feature = %feature, used = grant.used, limit = grant.limit, "Feature granted");
        Ok((user, grant))
    }

    pub async fn ask_coach(
        &self,
        credential: &str,
        analysis: &DeliveryAnalysis,
        question: &str,
    ) -> WorkerResult<CoachingAnswer> {
        let (user, grant) = self.authorize(credential, Feature::Chat).await?;
        let prompt = build_coaching_prompt(analysis, question);
        let text = self.coach.generate(&prompt).await?;
        Ok(CoachingAnswer { user, text, grant })
    }

    pub fn entitlements(&self) -> &E {
        &self.entitlements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use crease_models::{AnalysisStatus, BoundaryCode, Plan};
    use crease_services::{InMemoryEntitlements, ServiceError, ServiceResult, StaticIdentityResolver};

    use crate::error::WorkerError;

    #[derive(Default)]
    struct EchoCoach {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CoachingTextGenerator for EchoCoach {
        async fn generate(&self, prompt: &str) -> ServiceResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{} chars", prompt.len()))
        }
    }

    struct DownCoach;

    #[async_trait]
    impl CoachingTextGenerator for DownCoach {
        async fn generate(&self, _prompt: &str) -> ServiceResult<String> {
            Err(ServiceError::unavailable("model overloaded"))
        }
    }

    fn analysis() -> DeliveryAnalysis {
        DeliveryAnalysis::insufficient(AnalysisStatus::TrackingFailed, None, Vec::new())
    }

    fn identity() -> StaticIdentityResolver {
        StaticIdentityResolver::new().with_user("token-a", UserId::new("alice"))
    }

    #[tokio::test]
    async fn test_ask_coach_consumes_chat_quota() {
        let session = ReviewSession::new(identity(), InMemoryEntitlements::new(), EchoCoach::default());

        let answer = session.ask_coach("token-a", &analysis(), "Why no speed?").await.unwrap();
        assert_eq!(answer.user.as_str(), "alice");
        assert_eq!(answer.grant.used, 1);
        assert!(answer.text.ends_with("chars"));
    }

    #[tokio::test]
    async fn test_unknown_caller_never_reaches_quota_or_coach() {
        let session = ReviewSession::new(identity(), InMemoryEntitlements::new(), EchoCoach::default());

        let err = session.ask_coach("stolen", &analysis(), "?").await.unwrap_err();
        assert_eq!(err.boundary_code(), BoundaryCode::Unauthenticated);
        assert_eq!(session.coach.calls.load(Ordering::SeqCst), 0);
        assert!(session.entitlements().subscription(&UserId::new("alice")).await.is_none());
    }

    #[tokio::test]
    async fn test_quota_and_premium_failures_pass_through() {
        let session = ReviewSession::new(identity(), InMemoryEntitlements::new(), EchoCoach::default());

        for _ in 0..5 {
            session.ask_coach("token-a", &analysis(), "again").await.unwrap();
        }
        let err = session.ask_coach("token-a", &analysis(), "again").await.unwrap_err();
        assert_eq!(err.boundary_code().as_str(), "QUOTA_EXCEEDED");
        assert_eq!(session.coach.calls.load(Ordering::SeqCst), 5);

        let err = session.authorize("token-a", Feature::Compare).await.unwrap_err();
        assert_eq!(err.boundary_code(), BoundaryCode::PremiumRequired);

        session
            .entitlements()
            .subscribe(&UserId::new("alice"), Plan::Yearly, Utc::now())
            .await;
        assert!(session.authorize("token-a", Feature::Compare).await.is_ok());
    }

    #[tokio::test]
    async fn test_generator_outage_is_retryable() {
        let session = ReviewSession::new(identity(), InMemoryEntitlements::new(), DownCoach);
        let err = session.ask_coach("token-a", &analysis(), "?").await.unwrap_err();
        assert!(matches!(err, WorkerError::Service(ServiceError::ServiceUnavailable(_))));
        assert!(err.is_retryable());
    }
}
