//! Error types for collaborator services.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crease_models::{BoundaryCode, Feature, Plan};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Quota exceeded for {feature}: used {used} of {limit}")]
    QuotaExceeded { feature: Feature, used: u32, limit: u32 },

    #[error("Feature {feature} requires a higher plan than {plan}")]
    PremiumRequired { feature: Feature, plan: Plan },

    #[error("Plan {plan} expired at {expired_at}")]
    PlanExpired { plan: Plan, expired_at: DateTime<Utc> },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn boundary_code(&self) -> BoundaryCode {
        match self {
            ServiceError::Unauthenticated(_) => BoundaryCode::Unauthenticated,
            ServiceError::QuotaExceeded { .. } => BoundaryCode::QuotaExceeded,
            ServiceError::PremiumRequired { .. } => BoundaryCode::PremiumRequired,
            ServiceError::PlanExpired { .. } => BoundaryCode::PlanExpired,
            ServiceError::ServiceUnavailable(_) => BoundaryCode::ServiceUnavailable,
            ServiceError::Internal(_) => BoundaryCode::Internal,
        }
    }

    /// Whether the caller may reasonably try again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::ServiceUnavailable(_))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        Self::ServiceUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_codes() {
        let quota = ServiceError::QuotaExceeded {
            feature: Feature::Chat,
            used: 5,
            limit: 5,
        };
        assert_eq!(quota.boundary_code(), BoundaryCode::QuotaExceeded);
        assert_eq!(quota.to_string(), "Quota exceeded for chat: used 5 of 5");
        assert!(!quota.is_retryable());

        let down = ServiceError::unavailable("gemini 503");
        assert_eq!(down.boundary_code().as_str(), "SERVICE_UNAVAILABLE");
        assert!(down.is_retryable());
    }
}
