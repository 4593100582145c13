use serde::{Deserialize, Serialize};
use std::fmt;

pub mod logging;

// ============================================================================
// Ledger Constants
// ============================================================================

/// Period a single token lock covers: 30 days.
pub const LOCK_DURATION_SECS: i64 = 30 * 24 * 60 * 60;

/// Renewals earlier than this many seconds before expiry earn a bonus: 7 days.
pub const EARLY_RENEWAL_WINDOW_SECS: i64 = 7 * 24 * 60 * 60;

/// Optional grace period past nominal expiry: 3 days.
pub const GRACE_PERIOD_SECS: i64 = 3 * 24 * 60 * 60;

/// Basis point denominator (100% == 10_000 bps)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Bulk subscription discount: 5%
pub const BULK_DISCOUNT_BPS: u64 = 500;

/// Early renewal bonus: 10% of locked tokens
pub const EARLY_RENEWAL_BONUS_BPS: u64 = 1_000;

/// Referral reward: 10% of the referred amount
pub const REFERRAL_REWARD_BPS: u64 = 1_000;

// ============================================================================
// Identity
// ============================================================================

/// Opaque subscriber identity (typically a wallet address).
///
/// The ledger only compares principals for equality; resolving a caller
/// to a principal is the job of the wallet/auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Principal {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Tier catalog key
pub type TierId = u32;

// ============================================================================
// Subscription Types
// ============================================================================

/// An active (not paused) subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Unix seconds at which the lock expires
    pub end_time: i64,
    pub tokens_locked: u64,
}

/// A priced, fixed-duration subscription plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionTier {
    pub price: u64,
    /// Lock duration in seconds
    pub duration: i64,
    pub benefits: String,
}

/// A subscription that has been paused and removed from the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedSubscription {
    pub pause_time: i64,
    /// Seconds left on the lock at pause time; negative if it had already expired
    pub remaining_time: i64,
    /// Locked amount carried over so a resume can restore it
    pub tokens_locked: u64,
}

/// Cumulative referral statistics for one referrer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRecord {
    pub total_referrals: u64,
    pub rewards_earned: u64,
}

/// Result of a multi-month bulk subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSubscription {
    pub end_time: i64,
    pub discounted_amount: u64,
}

/// Lifecycle status as seen by a caller at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// No subscription record exists
    None,
    Active,
    /// Record exists but its end time (plus any grace) has passed
    Expired,
    Paused,
}

/// How `is_active` treats the time after nominal expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ExpiryPolicy {
    /// Active while `now <= end_time`
    #[default]
    Strict,
    /// Active while `now <= end_time + grace_secs`
    Grace { grace_secs: i64 },
}

impl ExpiryPolicy {
    /// Grace policy using the standard 3 day period
    pub fn standard_grace() -> Self {
        ExpiryPolicy::Grace { grace_secs: GRACE_PERIOD_SECS }
    }

    pub fn grace_secs(&self) -> i64 {
        match self {
            ExpiryPolicy::Strict => 0,
            ExpiryPolicy::Grace { grace_secs } => *grace_secs,
        }
    }

    /// Whether a lock ending at `end_time` still counts as active at `now`
    pub fn is_active_at(&self, end_time: i64, now: i64) -> bool {
        end_time.saturating_add(self.grace_secs()) >= now
    }
}

// ============================================================================
// Ledger Events
// ============================================================================

/// What happened in a successful ledger mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum LedgerEventKind {
    Subscribed { end_time: i64, tokens_locked: u64 },
    Renewed { end_time: i64 },
    EarlyRenewed { end_time: i64, bonus_amount: u64 },
    Paused { remaining_time: i64 },
    Resumed { end_time: i64 },
    ReferralCredited { referred: Principal, reward: u64 },
}

impl LedgerEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEventKind::Subscribed { .. } => "subscribed",
            LedgerEventKind::Renewed { .. } => "renewed",
            LedgerEventKind::EarlyRenewed { .. } => "early_renewed",
            LedgerEventKind::Paused { .. } => "paused",
            LedgerEventKind::Resumed { .. } => "resumed",
            LedgerEventKind::ReferralCredited { .. } => "referral_credited",
        }
    }
}

/// A ledger state change, published after the write has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEvent {
    pub id: String,
    /// The principal whose record changed (the referrer for referral credits)
    pub principal: Principal,
    /// Ledger clock reading the operation ran at
    pub occurred_at: i64,
    pub kind: LedgerEventKind,
}

impl LedgerEvent {
    pub fn new(principal: Principal, occurred_at: i64, kind: LedgerEventKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            principal,
            occurred_at,
            kind,
        }
    }
}
