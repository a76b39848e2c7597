//! Subscription plans and the features they gate.

use chrono::Duration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Opaque caller identity returned by identity resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Features metered per subscription period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Coaching chat about an analysed delivery.
    Chat,
    /// Technique mistake detection.
    #[serde(rename = "mistake")]
    MistakeDetection,
    /// Side-by-side delivery comparison.
    Compare,
}

impl Feature {
    pub const ALL: &'static [Feature] = &[Feature::Chat, Feature::MistakeDetection, Feature::Compare];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Chat => "chat",
            Feature::MistakeDetection => "mistake",
            Feature::Compare => "compare",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    Monthly,
    #[serde(rename = "6_months")]
    SixMonths,
    Yearly,
    UltraPro,
}

impl Plan {
    /// Parse from string (case-insensitive). Unknown names map to `Free`.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "monthly" => Plan::Monthly,
            "6_months" | "six_months" => Plan::SixMonths,
            "yearly" => Plan::Yearly,
            "ultra_pro" => Plan::UltraPro,
            _ => Plan::Free,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Monthly => "monthly",
            Plan::SixMonths => "6_months",
            Plan::Yearly => "yearly",
            Plan::UltraPro => "ultra_pro",
        }
    }

    /// Billing period. `None` for the free plan, which never expires.
    pub fn period(&self) -> Option<Duration> {
        match self {
            Plan::Free => None,
            Plan::Monthly => Some(Duration::days(30)),
            Plan::SixMonths => Some(Duration::days(180)),
            Plan::Yearly | Plan::UltraPro => Some(Duration::days(365)),
        }
    }

    pub fn limits(&self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits::new(5, 2, 0),
            Plan::Monthly => PlanLimits::new(200, 15, 0),
            Plan::SixMonths => PlanLimits::new(1200, 30, 0),
            Plan::Yearly => PlanLimits::new(3000, 60, 50),
            Plan::UltraPro => PlanLimits::new(20000, 200, 200),
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-period feature limits. A limit of zero means the plan lacks the feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlanLimits {
    pub chat: u32,
    pub mistake: u32,
    pub compare: u32,
}

impl PlanLimits {
    pub const fn new(chat: u32, mistake: u32, compare: u32) -> Self {
        Self { chat, mistake, compare }
    }

    pub fn limit(&self, feature: Feature) -> u32 {
        match feature {
            Feature::Chat => self.chat,
            Feature::MistakeDetection => self.mistake,
            Feature::Compare => self.compare,
        }
    }
}
