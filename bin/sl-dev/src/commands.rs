//! Line command parsing and execution against a ledger

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use sl_common::{Principal, TierId};
use sl_ledger::{LedgerError, SubscriptionLedger};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Subscribe { user: Principal, amount: u64 },
    Tier { user: Principal, tier_id: TierId },
    Bulk { user: Principal, amount: u64, months: u32 },
    Refer { user: Principal, amount: u64, referrer: Principal },
    Renew { user: Principal },
    EarlyRenew { user: Principal },
    Pause { user: Principal },
    Resume { user: Principal },
    Get { user: Principal },
    Paused { user: Principal },
    Active { user: Principal },
    Status { user: Principal },
    Referrals { referrer: Principal },
    Tiers,
}

pub const USAGE: &str = "commands: subscribe <user> <amount> | tier <user> <id> | bulk <user> <amount> <months> \
| refer <user> <amount> <referrer> | renew <user> | early-renew <user> | pause <user> | resume <user> \
| get <user> | paused <user> | active <user> | status <user> | referrals <referrer> | tiers";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ParseError(pub String);

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Command {
    /// Parse a whitespace separated command line
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (name, args) = parts
            .split_first()
            .ok_or_else(|| ParseError("empty command".to_string()))?;

        let command = match (name.to_ascii_lowercase().as_str(), args) {
            ("subscribe", [user, amount]) => Command::Subscribe {
                user: Principal::from(*user),
                amount: number(amount, "amount")?,
            },
            ("tier", [user, tier_id]) => Command::Tier {
                user: Principal::from(*user),
                tier_id: number(tier_id, "tier id")?,
            },
            ("bulk", [user, amount, months]) => Command::Bulk {
                user: Principal::from(*user),
                amount: number(amount, "amount")?,
                months: number(months, "months")?,
            },
            ("refer", [user, amount, referrer]) => Command::Refer {
                user: Principal::from(*user),
                amount: number(amount, "amount")?,
                referrer: Principal::from(*referrer),
            },
            ("renew", [user]) => Command::Renew { user: Principal::from(*user) },
            ("early-renew", [user]) => Command::EarlyRenew { user: Principal::from(*user) },
            ("pause", [user]) => Command::Pause { user: Principal::from(*user) },
            ("resume", [user]) => Command::Resume { user: Principal::from(*user) },
            ("get", [user]) => Command::Get { user: Principal::from(*user) },
            ("paused", [user]) => Command::Paused { user: Principal::from(*user) },
            ("active", [user]) => Command::Active { user: Principal::from(*user) },
            ("status", [user]) => Command::Status { user: Principal::from(*user) },
            ("referrals", [referrer]) => Command::Referrals { referrer: Principal::from(*referrer) },
            ("tiers", []) => Command::Tiers,
            (other, _) => {
                return Err(ParseError(format!(
                    "unknown command or wrong arguments: '{}'",
                    other
                )))
            }
        };
        Ok(command)
    }

    /// Run the command, returning the JSON payload to print
    pub fn execute(&self, ledger: &SubscriptionLedger) -> Result<Value, CommandError> {
        let value = match self {
            Command::Subscribe { user, amount } => {
                json!({ "endTime": ledger.subscribe(user, *amount)? })
            }
            Command::Tier { user, tier_id } => {
                json!({ "endTime": ledger.subscribe_with_tier(user, *tier_id)? })
            }
            Command::Bulk { user, amount, months } => to_json(ledger.subscribe_bulk(user, *amount, *months)?)?,
            Command::Refer { user, amount, referrer } => {
                ledger.subscribe_with_referral(user, *amount, referrer)?;
                json!({ "referral": ledger.get_referral_data(referrer) })
            }
            Command::Renew { user } => json!({ "endTime": ledger.renew(user)? }),
            Command::EarlyRenew { user } => json!({ "bonusAmount": ledger.early_renew(user)? }),
            Command::Pause { user } => to_json(ledger.pause_subscription(user)?)?,
            Command::Resume { user } => json!({ "endTime": ledger.resume_subscription(user)? }),
            Command::Get { user } => to_json(ledger.get_subscription(user))?,
            Command::Paused { user } => to_json(ledger.get_paused_subscription(user))?,
            Command::Active { user } => json!({ "active": ledger.is_active(user) }),
            Command::Status { user } => json!({ "status": ledger.subscription_status(user) }),
            Command::Referrals { referrer } => to_json(ledger.get_referral_data(referrer))?,
            Command::Tiers => {
                let tiers: Vec<Value> = ledger
                    .tiers()
                    .list()
                    .into_iter()
                    .map(|(id, tier)| json!({ "id": id, "tier": tier }))
                    .collect();
                Value::Array(tiers)
            }
        };
        Ok(value)
    }
}

fn number<T: std::str::FromStr>(value: &str, what: &str) -> Result<T, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError(format!("invalid {}: '{}'", what, value)))
}

fn to_json<T: Serialize>(value: T) -> serde_json::Result<Value> {
    serde_json::to_value(value)
}
