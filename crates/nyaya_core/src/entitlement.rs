//! crates/nyaya_core/src/entitlement.rs
//!
//! The entitlement and quota state machine: the single source of truth for
//! what a user may do right now. Every operation here is total — quota
//! exhaustion and access denial are boolean results, never errors.

use chrono::{DateTime, Utc};

use crate::domain::{SubscriptionTier, UserState};

/// True when `now` falls on a later calendar day than `last_query_date`.
///
/// The comparison is date-only: a session crossing midnight rolls over on its
/// very next quota-consuming action, not on a timer.
pub fn day_rolled_over(now: DateTime<Utc>, last_query_date: DateTime<Utc>) -> bool {
    now.date_naive() != last_query_date.date_naive()
}

impl UserState {
    /// Zeroes the daily counter if a calendar-day boundary has passed since
    /// the last quota check. Returns whether a rollover happened.
    ///
    /// This runs before every quota-consuming action (not just at startup),
    /// so a long-lived process still resets exactly once per day.
    pub fn apply_daily_rollover(&mut self, now: DateTime<Utc>) -> bool {
        if day_rolled_over(now, self.last_query_date) {
            self.daily_queries_used = 0;
            self.last_query_date = now;
            true
        } else {
            false
        }
    }

    /// The sole gate for conversational queries.
    ///
    /// Applies the daily rollover, then returns `false` with no further
    /// mutation when the tier's daily quota is exhausted. Otherwise consumes
    /// one quota unit and returns `true`. Callers must invoke this before
    /// the generation request: a failed generation still consumes its unit,
    /// which is the intended guard against repeated failing requests.
    pub fn increment_query_count(&mut self, now: DateTime<Utc>) -> bool {
        self.apply_daily_rollover(now);
        if self.daily_queries_used >= self.tier.limits().daily_queries {
            return false;
        }
        self.daily_queries_used += 1;
        true
    }

    /// Decides whether a tier-gated feature is accessible.
    ///
    /// A one-time unlock of `feature` grants access unconditionally,
    /// regardless of tier. Otherwise the current tier must be at least
    /// `required_tier` in the fixed FREE < PRO < PREMIUM order.
    pub fn check_feature_access(
        &self,
        required_tier: SubscriptionTier,
        feature: Option<&str>,
    ) -> bool {
        if let Some(name) = feature {
            if self.unlocked_features.contains(name) {
                return true;
            }
        }
        self.tier >= required_tier
    }

    /// Records a permanent, tier-independent one-time purchase. Idempotent.
    pub fn purchase_one_time_feature(&mut self, feature: impl Into<String>) {
        self.unlocked_features.insert(feature.into());
    }

    /// Overwrites the tier unconditionally. Payment verification is a
    /// trusted external collaborator and out of scope here.
    pub fn upgrade_tier(&mut self, tier: SubscriptionTier) {
        self.tier = tier;
    }

    /// Administrative reset: zero the counter without touching the
    /// rollover date.
    pub fn reset_daily_limits(&mut self) {
        self.daily_queries_used = 0;
    }

    /// Bumps the generated-documents counter. Tracked only; no limit is
    /// enforced against it.
    pub fn record_document_generated(&mut self) {
        self.documents_generated += 1;
    }
}
