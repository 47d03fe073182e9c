pub mod domain;
pub mod entitlement;
pub mod ports;
pub mod session;
pub mod settings;

pub use domain::{
    AppSettings, ChatSession, Complexity, DocumentKind, Language, Message, PricingPlan, Role,
    SettingsUpdate, SubscriptionTier, TierLimits, UserState, PRICING_PLANS,
};
pub use ports::{ConversationService, DocumentDraftingService, PortError, PortResult, StateStore};
pub use session::SessionLog;
