//! Subscription Ledger - owns all subscriber and referral state
//!
//! Subscriber records live in a single map so a principal can never hold an
//! active and a paused subscription at once. Every mutation runs under the
//! map's per-key write guard, which serialises operations on one principal
//! while leaving other principals free to proceed in parallel. Events are
//! published before the guard is released, so events for one principal
//! arrive in the order their mutations were applied.

use std::sync::Arc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use sl_common::{
    BulkSubscription, ExpiryPolicy, LedgerEvent, LedgerEventKind, PausedSubscription, Principal,
    ReferralRecord, Subscription, SubscriptionStatus, TierId, BULK_DISCOUNT_BPS,
    EARLY_RENEWAL_BONUS_BPS, EARLY_RENEWAL_WINDOW_SECS, LOCK_DURATION_SECS, REFERRAL_REWARD_BPS,
};
use sl_config::AppConfig;

use crate::clock::Clock;
use crate::error::{BuildError, LedgerError};
use crate::pricing;
use crate::tier::TierCatalog;
use crate::Result;

/// Ledger behaviour settings
#[derive(Debug, Clone)]
pub struct LedgerOptions {
    pub expiry_policy: ExpiryPolicy,
    /// Buffered events per receiver; lagging receivers lose the oldest
    pub event_channel_capacity: usize,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            expiry_policy: ExpiryPolicy::Strict,
            event_channel_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubscriberState {
    Active(Subscription),
    Paused(PausedSubscription),
}

pub struct SubscriptionLedger {
    subscribers: DashMap<Principal, SubscriberState>,
    referrals: DashMap<Principal, ReferralRecord>,
    tiers: TierCatalog,
    clock: Arc<dyn Clock>,
    expiry_policy: ExpiryPolicy,
    events_tx: broadcast::Sender<LedgerEvent>,
}

impl SubscriptionLedger {
    /// Create a ledger with the strict expiry policy
    pub fn new(tiers: TierCatalog, clock: Arc<dyn Clock>) -> Self {
        Self::with_options(tiers, clock, LedgerOptions::default())
    }

    pub fn with_options(tiers: TierCatalog, clock: Arc<dyn Clock>, options: LedgerOptions) -> Self {
        let (events_tx, _) = broadcast::channel(options.event_channel_capacity.max(1));

        info!(
            tiers = tiers.len(),
            expiry_policy = ?options.expiry_policy,
            "Subscription ledger created"
        );

        Self {
            subscribers: DashMap::new(),
            referrals: DashMap::new(),
            tiers,
            clock,
            expiry_policy: options.expiry_policy,
            events_tx,
        }
    }

    /// Build a ledger from validated application configuration
    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> std::result::Result<Self, BuildError> {
        config.validate()?;
        let tiers = TierCatalog::from_config(&config.tiers)?;
        let options = LedgerOptions {
            expiry_policy: config.ledger.policy()?,
            event_channel_capacity: config.ledger.event_channel_capacity,
        };
        Ok(Self::with_options(tiers, clock, options))
    }

    pub fn tiers(&self) -> &TierCatalog {
        &self.tiers
    }

    /// Receive every event published after this call
    pub fn events(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events_tx.subscribe()
    }

    // ========================================================================
    // Subscribing
    // ========================================================================

    /// Lock `amount` tokens for one standard period. Replaces any existing record.
    pub fn subscribe(&self, user: &Principal, amount: u64) -> Result<i64> {
        self.subscribe_at(user, amount, self.clock.now())
    }

    fn subscribe_at(&self, user: &Principal, amount: u64, now: i64) -> Result<i64> {
        check_principal(user).map_err(|e| rejected("subscribe", user, e))?;
        if amount == 0 {
            return Err(rejected("subscribe", user, LedgerError::InvalidAmount));
        }

        let end_time = pricing::lock_end(now, 1).map_err(|e| rejected("subscribe", user, e))?;

        self.put_active(user, Subscription { end_time, tokens_locked: amount }, now);
        Ok(end_time)
    }

    /// Subscribe at a catalog tier's price and duration
    pub fn subscribe_with_tier(&self, user: &Principal, tier_id: TierId) -> Result<i64> {
        check_principal(user).map_err(|e| rejected("subscribe_with_tier", user, e))?;
        let tier = self
            .tiers
            .get(tier_id)
            .ok_or_else(|| rejected("subscribe_with_tier", user, LedgerError::InvalidTier(tier_id)))?;

        let now = self.clock.now();
        let end_time = pricing::extend(now, tier.duration)
            .map_err(|e| rejected("subscribe_with_tier", user, e))?;

        debug!(principal = %user, tier_id, benefits = %tier.benefits, "Subscribing with tier");
        self.put_active(user, Subscription { end_time, tokens_locked: tier.price }, now);
        Ok(end_time)
    }

    /// Prepay `months` periods at `amount` each with the bulk discount applied
    pub fn subscribe_bulk(&self, user: &Principal, amount: u64, months: u32) -> Result<BulkSubscription> {
        check_principal(user).map_err(|e| rejected("subscribe_bulk", user, e))?;
        if amount == 0 || months == 0 {
            return Err(rejected("subscribe_bulk", user, LedgerError::InvalidParameters));
        }

        let now = self.clock.now();
        let discounted_amount = pricing::bulk_total(amount, months)
            .and_then(|total| pricing::apply_bps_discount(total, BULK_DISCOUNT_BPS))
            .map_err(|e| rejected("subscribe_bulk", user, e))?;
        let end_time = pricing::lock_end(now, months).map_err(|e| rejected("subscribe_bulk", user, e))?;

        debug!(principal = %user, amount, months, discounted_amount, "Bulk subscription priced");
        self.put_active(user, Subscription { end_time, tokens_locked: discounted_amount }, now);
        Ok(BulkSubscription { end_time, discounted_amount })
    }

    /// Subscribe `user` and credit `referrer` with the referral reward
    pub fn subscribe_with_referral(&self, user: &Principal, amount: u64, referrer: &Principal) -> Result<()> {
        check_principal(referrer).map_err(|e| rejected("subscribe_with_referral", referrer, e))?;
        let reward = pricing::bps_share(amount, REFERRAL_REWARD_BPS)
            .map_err(|e| rejected("subscribe_with_referral", user, e))?;

        let now = self.clock.now();

        // The referrer's guard is held across the subscribe so the credit
        // computed here is the one committed. Lock order: referrals, then subscribers.
        let entry = self.referrals.entry(referrer.clone());
        let current = match &entry {
            Entry::Occupied(occupied) => *occupied.get(),
            Entry::Vacant(_) => ReferralRecord::default(),
        };
        let record = credit_referral(current, reward)
            .map_err(|e| rejected("subscribe_with_referral", referrer, e))?;

        self.subscribe_at(user, amount, now)?;

        let _guard = match entry {
            Entry::Occupied(mut occupied) => {
                occupied.insert(record);
                occupied.into_ref()
            }
            Entry::Vacant(vacant) => vacant.insert(record),
        };

        info!(
            referrer = %referrer,
            referred = %user,
            reward,
            total_referrals = record.total_referrals,
            rewards_earned = record.rewards_earned,
            "Referral credited"
        );
        self.publish(
            referrer.clone(),
            now,
            LedgerEventKind::ReferralCredited { referred: user.clone(), reward },
        );
        Ok(())
    }

    // ========================================================================
    // Renewal
    // ========================================================================

    /// Extend the stored end time by one period; returns the new end time
    pub fn renew(&self, user: &Principal) -> Result<i64> {
        let now = self.clock.now();
        let end_time = self
            .update_active(user, now, |sub| {
                sub.end_time = pricing::extend(sub.end_time, LOCK_DURATION_SECS)?;
                info!(principal = %user, end_time = sub.end_time, "Subscription renewed");
                Ok((sub.end_time, LedgerEventKind::Renewed { end_time: sub.end_time }))
            })
            .map_err(|e| rejected("renew", user, e))?;
        Ok(end_time)
    }

    /// Renew, paying a bonus when renewing before the early renewal window.
    ///
    /// The extension always happens; only the bonus depends on timing.
    pub fn early_renew(&self, user: &Principal) -> Result<u64> {
        let now = self.clock.now();
        let bonus_amount = self
            .update_active(user, now, |sub| {
                let bonus_threshold = sub
                    .end_time
                    .checked_sub(EARLY_RENEWAL_WINDOW_SECS)
                    .ok_or(LedgerError::ArithmeticOverflow)?;
                let bonus = if now < bonus_threshold {
                    pricing::bps_share(sub.tokens_locked, EARLY_RENEWAL_BONUS_BPS)?
                } else {
                    0
                };
                sub.end_time = pricing::extend(sub.end_time, LOCK_DURATION_SECS)?;
                info!(principal = %user, end_time = sub.end_time, bonus_amount = bonus, "Subscription renewed early");
                Ok((bonus, LedgerEventKind::EarlyRenewed { end_time: sub.end_time, bonus_amount: bonus }))
            })
            .map_err(|e| rejected("early_renew", user, e))?;
        Ok(bonus_amount)
    }

    // ========================================================================
    // Pause / Resume
    // ========================================================================

    /// Move an active subscription to the paused set, recording the time left
    pub fn pause_subscription(&self, user: &Principal) -> Result<PausedSubscription> {
        let now = self.clock.now();
        let mut entry = self
            .subscribers
            .get_mut(user)
            .ok_or_else(|| rejected("pause", user, LedgerError::NoActiveSubscription(user.clone())))?;

        let sub = match *entry {
            SubscriberState::Active(sub) => sub,
            SubscriberState::Paused(_) => {
                return Err(rejected("pause", user, LedgerError::NoActiveSubscription(user.clone())));
            }
        };
        let remaining_time = sub
            .end_time
            .checked_sub(now)
            .ok_or_else(|| rejected("pause", user, LedgerError::ArithmeticOverflow))?;

        let paused = PausedSubscription {
            pause_time: now,
            remaining_time,
            tokens_locked: sub.tokens_locked,
        };
        *entry = SubscriberState::Paused(paused);

        if paused.remaining_time <= 0 {
            warn!(principal = %user, remaining_time = paused.remaining_time, "Paused an already expired subscription");
        }
        info!(principal = %user, remaining_time = paused.remaining_time, "Subscription paused");
        self.publish(
            user.clone(),
            now,
            LedgerEventKind::Paused { remaining_time: paused.remaining_time },
        );
        Ok(paused)
    }

    /// Reactivate a paused subscription with the time it had left when paused
    pub fn resume_subscription(&self, user: &Principal) -> Result<i64> {
        let now = self.clock.now();
        let mut entry = self
            .subscribers
            .get_mut(user)
            .ok_or_else(|| rejected("resume", user, LedgerError::NoPausedSubscription(user.clone())))?;

        let paused = match *entry {
            SubscriberState::Paused(paused) => paused,
            SubscriberState::Active(_) => {
                return Err(rejected("resume", user, LedgerError::NoPausedSubscription(user.clone())));
            }
        };
        let end_time = pricing::extend(now, paused.remaining_time)
            .map_err(|e| rejected("resume", user, e))?;

        *entry = SubscriberState::Active(Subscription {
            end_time,
            tokens_locked: paused.tokens_locked,
        });

        info!(principal = %user, end_time, "Subscription resumed");
        self.publish(user.clone(), now, LedgerEventKind::Resumed { end_time });
        Ok(end_time)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// The active subscription, if any (paused subscriptions are not returned)
    pub fn get_subscription(&self, user: &Principal) -> Option<Subscription> {
        match self.subscribers.get(user).map(|entry| *entry) {
            Some(SubscriberState::Active(sub)) => Some(sub),
            _ => None,
        }
    }

    pub fn get_paused_subscription(&self, user: &Principal) -> Option<PausedSubscription> {
        match self.subscribers.get(user).map(|entry| *entry) {
            Some(SubscriberState::Paused(paused)) => Some(paused),
            _ => None,
        }
    }

    /// Whether `user` holds an unexpired active subscription under the expiry policy
    pub fn is_active(&self, user: &Principal) -> bool {
        let now = self.clock.now();
        let active = self
            .get_subscription(user)
            .map(|sub| self.expiry_policy.is_active_at(sub.end_time, now))
            .unwrap_or(false);
        debug!(principal = %user, active, now, "Checked subscription activity");
        active
    }

    pub fn subscription_status(&self, user: &Principal) -> SubscriptionStatus {
        let now = self.clock.now();
        match self.subscribers.get(user).map(|entry| *entry) {
            None => SubscriptionStatus::None,
            Some(SubscriberState::Paused(_)) => SubscriptionStatus::Paused,
            Some(SubscriberState::Active(sub)) => {
                if self.expiry_policy.is_active_at(sub.end_time, now) {
                    SubscriptionStatus::Active
                } else {
                    SubscriptionStatus::Expired
                }
            }
        }
    }

    pub fn get_referral_data(&self, referrer: &Principal) -> Option<ReferralRecord> {
        self.referrals.get(referrer).map(|entry| *entry)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn put_active(&self, user: &Principal, sub: Subscription, now: i64) {
        let state = SubscriberState::Active(sub);
        let (previous, _guard) = match self.subscribers.entry(user.clone()) {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.insert(state);
                (Some(previous), occupied.into_ref())
            }
            Entry::Vacant(vacant) => (None, vacant.insert(state)),
        };

        match previous {
            Some(SubscriberState::Paused(_)) => {
                debug!(principal = %user, "Subscription replaced a paused subscription");
            }
            Some(SubscriberState::Active(old)) => {
                debug!(principal = %user, old_end_time = old.end_time, "Subscription overwritten");
            }
            None => {}
        }

        info!(
            principal = %user,
            end_time = sub.end_time,
            tokens_locked = sub.tokens_locked,
            "Subscribed"
        );
        self.publish(
            user.clone(),
            now,
            LedgerEventKind::Subscribed {
                end_time: sub.end_time,
                tokens_locked: sub.tokens_locked,
            },
        );
    }

    /// Apply `f` to a copy of the active subscription and store it only if `f`
    /// succeeds, publishing the event `f` returns before the guard is released
    fn update_active<T, F>(&self, user: &Principal, now: i64, f: F) -> Result<T>
    where
        F: FnOnce(&mut Subscription) -> Result<(T, LedgerEventKind)>,
    {
        let mut entry = self
            .subscribers
            .get_mut(user)
            .ok_or_else(|| LedgerError::NoActiveSubscription(user.clone()))?;

        let mut updated = match *entry {
            SubscriberState::Active(current) => current,
            SubscriberState::Paused(_) => return Err(LedgerError::NoActiveSubscription(user.clone())),
        };
        let (out, kind) = f(&mut updated)?;
        *entry = SubscriberState::Active(updated);
        self.publish(user.clone(), now, kind);
        Ok(out)
    }

    fn publish(&self, principal: Principal, occurred_at: i64, kind: LedgerEventKind) {
        let event = LedgerEvent::new(principal, occurred_at, kind);
        // No receivers is not an error
        let _ = self.events_tx.send(event);
    }
}

/// Next referral totals for one more referral paying `reward`
fn credit_referral(current: ReferralRecord, reward: u64) -> Result<ReferralRecord> {
    Ok(ReferralRecord {
        total_referrals: current
            .total_referrals
            .checked_add(1)
            .ok_or(LedgerError::ArithmeticOverflow)?,
        rewards_earned: current
            .rewards_earned
            .checked_add(reward)
            .ok_or(LedgerError::ArithmeticOverflow)?,
    })
}

fn check_principal(user: &Principal) -> Result<()> {
    if user.is_blank() {
        return Err(LedgerError::InvalidPrincipal);
    }
    Ok(())
}

fn rejected(operation: &'static str, user: &Principal, error: LedgerError) -> LedgerError {
    warn!(operation, principal = %user, error = %error, "Ledger operation rejected");
    error
}
