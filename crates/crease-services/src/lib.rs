//! Collaborator services consumed at the pipeline boundary.
//!
//! Each collaborator sits behind a trait so the worker can swap real
//! implementations for in-process ones:
//! - [`IdentityResolver`]: credential to user id
//! - [`EntitlementGate`]: plan and quota checks per feature
//! - [`CoachingTextGenerator`]: opaque text completion
//!
//! Nothing in `crease-engine` depends on this crate.

pub mod coaching;
pub mod entitlements;
pub mod error;
pub mod identity;

pub use coaching::{build_coaching_prompt, CoachingTextGenerator, GeminiCoach};
pub use entitlements::{EntitlementGate, EntitlementGrant, InMemoryEntitlements, Subscription, Unmetered};
pub use error::{ServiceError, ServiceResult};
pub use identity::{IdentityResolver, JwtIdentityResolver, SessionClaims, StaticIdentityResolver};
