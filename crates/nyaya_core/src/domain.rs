//! crates/nyaya_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format,
//! except that their serde names match the records the web client used to
//! persist (`ns_userState`, `ns_settings`, `ns_sessions`), so existing
//! installations load cleanly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use std::collections::BTreeSet;
use uuid::Uuid;

//=========================================================================================
// Subscription Tiers and Limits
//=========================================================================================

/// A named subscription level. The derived `Ord` gives the fixed ordering
/// FREE < PRO < PREMIUM used by every access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum SubscriptionTier {
    #[serde(rename = "FREE")]
    Free,
    #[serde(rename = "PRO")]
    Pro,
    #[serde(rename = "PREMIUM")]
    Premium,
}

impl SubscriptionTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Pro => "PRO",
            Self::Premium => "PREMIUM",
        }
    }

    /// The static entitlement configuration for this tier.
    pub fn limits(self) -> &'static TierLimits {
        match self {
            Self::Free => &FREE_LIMITS,
            Self::Pro => &PRO_LIMITS,
            Self::Premium => &PREMIUM_LIMITS,
        }
    }
}

/// Per-tier entitlement configuration. Not persisted.
///
/// `max_history` is declared but no code path enforces it; the session log
/// grows without bound. The same goes for the `documents_generated` counter
/// on [`UserState`]. Both are tracked-only by explicit decision.
#[derive(Debug, Clone, Copy)]
pub struct TierLimits {
    pub daily_queries: u32,
    pub can_generate_docs: bool,
    pub can_analyze_cases: bool,
    pub can_simulate_scenarios: bool,
    pub support_priority: &'static str,
    pub max_history: u32,
    pub allowed_complexity: &'static [Complexity],
}

const FREE_LIMITS: TierLimits = TierLimits {
    daily_queries: 5,
    can_generate_docs: false,
    can_analyze_cases: false,
    can_simulate_scenarios: false,
    support_priority: "Standard",
    max_history: 3,
    allowed_complexity: &[Complexity::Simple],
};

const PRO_LIMITS: TierLimits = TierLimits {
    daily_queries: 100, // Effectively unlimited for normal use
    can_generate_docs: true,
    can_analyze_cases: true,
    can_simulate_scenarios: false,
    support_priority: "Priority",
    max_history: 50,
    allowed_complexity: &[Complexity::Simple, Complexity::Legal],
};

const PREMIUM_LIMITS: TierLimits = TierLimits {
    daily_queries: 9999,
    can_generate_docs: true,
    can_analyze_cases: true,
    can_simulate_scenarios: true,
    support_priority: "Dedicated",
    max_history: 9999,
    allowed_complexity: &[Complexity::Simple, Complexity::Legal],
};

//=========================================================================================
// User Entitlement State
//=========================================================================================

/// The singleton entitlement record, one per installation.
///
/// Persisted after every mutation and never deleted. `unlocked_features` is a
/// true set: a repeated one-time purchase of the same feature collapses into
/// a single membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub tier: SubscriptionTier,
    pub daily_queries_used: u32,
    pub last_query_date: DateTime<Utc>,
    pub documents_generated: u32,
    pub unlocked_features: BTreeSet<String>,
}

impl UserState {
    /// The first-run default: FREE tier, nothing used, nothing unlocked.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            tier: SubscriptionTier::Free,
            daily_queries_used: 0,
            last_query_date: now,
            documents_generated: 0,
            unlocked_features: BTreeSet::new(),
        }
    }
}

//=========================================================================================
// Generation Preferences
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Language {
    English,
    Hindi,
    Hinglish,
}

impl Language {
    pub fn label(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Hinglish => "Hinglish",
        }
    }
}

/// Response-style toggle. `Legal` is tier-gated at the call site, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Complexity {
    Simple,
    Legal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub language: Language,
    pub complexity: Complexity,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            language: Language::English,
            complexity: Complexity::Simple,
        }
    }
}

/// A partial update to [`AppSettings`]; absent fields are left untouched.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub language: Option<Language>,
    pub complexity: Option<Complexity>,
}

//=========================================================================================
// Conversations
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A single conversation turn. Immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    pub fn user(content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            timestamp: now,
            is_error: false,
        }
    }

    pub fn model(content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Model,
            content: content.into(),
            timestamp: now,
            is_error: false,
        }
    }

    /// A model-role turn flagged as the user-visible result of a failed
    /// generation.
    pub fn error(content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            is_error: true,
            ..Self::model(content, now)
        }
    }
}

/// One conversation thread: an append-only ordered log of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

//=========================================================================================
// Document Tools
//=========================================================================================

/// The document-generation tools, gated by tier or one-time purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DocumentKind {
    #[serde(rename = "fir-gen")]
    FirGenerator,
    #[serde(rename = "notice-gen")]
    LegalNoticeDrafter,
    #[serde(rename = "judgment")]
    JudgmentSummarizer,
    #[serde(rename = "scenario")]
    ScenarioSimulator,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        Self::FirGenerator,
        Self::LegalNoticeDrafter,
        Self::JudgmentSummarizer,
        Self::ScenarioSimulator,
    ];

    /// The stable wire identifier, matching the serde rename.
    pub fn id(self) -> &'static str {
        match self {
            Self::FirGenerator => "fir-gen",
            Self::LegalNoticeDrafter => "notice-gen",
            Self::JudgmentSummarizer => "judgment",
            Self::ScenarioSimulator => "scenario",
        }
    }

    /// The display name. This is also the feature name recorded by a
    /// one-time purchase, so it must stay stable across releases.
    pub fn name(self) -> &'static str {
        match self {
            Self::FirGenerator => "FIR Generator",
            Self::LegalNoticeDrafter => "Legal Notice Drafter",
            Self::JudgmentSummarizer => "Judgment Summarizer",
            Self::ScenarioSimulator => "Scenario Simulator",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::FirGenerator => {
                "Draft a First Information Report based on incident details."
            }
            Self::LegalNoticeDrafter => {
                "Create formal legal notices for breach of contract, defamation, etc."
            }
            Self::JudgmentSummarizer => {
                "Paste a long judgment to get a structured summary."
            }
            Self::ScenarioSimulator => {
                "Roleplay \"What if\" legal scenarios with risk assessment."
            }
        }
    }

    pub fn required_tier(self) -> SubscriptionTier {
        match self {
            Self::FirGenerator | Self::LegalNoticeDrafter | Self::JudgmentSummarizer => {
                SubscriptionTier::Pro
            }
            Self::ScenarioSimulator => SubscriptionTier::Premium,
        }
    }

    /// The one-time unlock price shown next to the tool.
    pub fn one_time_price(self) -> &'static str {
        match self {
            Self::FirGenerator => "₹199",
            Self::LegalNoticeDrafter => "₹299",
            Self::JudgmentSummarizer => "₹99",
            Self::ScenarioSimulator => "₹499",
        }
    }
}

//=========================================================================================
// Pricing Plans
//=========================================================================================

/// A static pricing-page entry. Selecting a plan simply overwrites the tier;
/// payment verification is out of scope.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPlan {
    pub tier: SubscriptionTier,
    pub name: &'static str,
    pub price: &'static str,
    pub period: &'static str,
    pub features: &'static [&'static str],
    pub cta: &'static str,
    pub recommended: bool,
}

pub const PRICING_PLANS: [PricingPlan; 3] = [
    PricingPlan {
        tier: SubscriptionTier::Free,
        name: "Citizen Basic",
        price: "₹0",
        period: "/forever",
        features: &[
            "5 AI Legal Queries / Day",
            "Basic IPC/CrPC Explanations",
            "Case Status Links",
            "Ad-supported",
        ],
        cta: "Current Plan",
        recommended: false,
    },
    PricingPlan {
        tier: SubscriptionTier::Pro,
        name: "Advocate Pro",
        price: "₹499",
        period: "/month",
        features: &[
            "Unlimited Queries",
            "FIR & Legal Notice Generator",
            "Judgment Summarizer",
            "Case Law Citations",
            "Drafting Assistant",
        ],
        cta: "Upgrade to Pro",
        recommended: true,
    },
    PricingPlan {
        tier: SubscriptionTier::Premium,
        name: "Law Firm Elite",
        price: "₹1,999",
        period: "/month",
        features: &[
            "Everything in Pro",
            "Scenario Simulator (Risk Analysis)",
            "Timeline Visualization",
            "AI Cross-Questioning Mode",
            "Priority Support",
        ],
        cta: "Go Premium",
        recommended: false,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn tier_ordering_is_free_pro_premium() {
        assert!(SubscriptionTier::Free < SubscriptionTier::Pro);
        assert!(SubscriptionTier::Pro < SubscriptionTier::Premium);
    }

    #[test]
    fn user_state_round_trips_through_json() {
        let now = Utc.with_ymd_and_hms(2026, 8, 31, 10, 30, 0).unwrap();
        let mut state = UserState::new(now);
        state.tier = SubscriptionTier::Pro;
        state.daily_queries_used = 7;
        state.unlocked_features.insert("Scenario Simulator".into());

        let json = serde_json::to_string(&state).unwrap();
        let back: UserState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }

    #[test]
    fn user_state_uses_the_legacy_field_names() {
        let now = Utc.with_ymd_and_hms(2026, 8, 31, 0, 0, 0).unwrap();
        let json = serde_json::to_value(UserState::new(now)).unwrap();
        assert_eq!(json["tier"], "FREE");
        assert!(json.get("dailyQueriesUsed").is_some());
        assert!(json.get("lastQueryDate").is_some());
        assert!(json.get("unlockedFeatures").is_some());
    }

    #[test]
    fn messages_serialize_timestamps_as_epoch_millis() {
        let now = Utc.timestamp_millis_opt(1_756_600_000_000).unwrap();
        let json = serde_json::to_value(Message::user("hello", now)).unwrap();
        assert_eq!(json["timestamp"], 1_756_600_000_000i64);
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn sessions_round_trip_through_json() {
        let now = Utc.with_ymd_and_hms(2026, 8, 31, 12, 0, 0).unwrap();
        let session = ChatSession {
            id: "default".into(),
            title: "New Conversation".into(),
            messages: vec![Message::user("What is Section 420?", now)],
            updated_at: now,
        };
        let json = serde_json::to_string(&session).unwrap();
        let back: ChatSession = serde_json::from_str(&json).unwrap();
        assert_eq!(session, back);
    }

    #[test]
    fn document_kinds_carry_their_gating_tier() {
        assert_eq!(
            DocumentKind::ScenarioSimulator.required_tier(),
            SubscriptionTier::Premium
        );
        assert_eq!(
            DocumentKind::FirGenerator.required_tier(),
            SubscriptionTier::Pro
        );
    }
}
