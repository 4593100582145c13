//! SubLedger Subscription Ledger
//!
//! Time-locked token subscriptions with:
//! - SubscriptionLedger: subscribe (plain, tiered, bulk, referred), renew,
//!   early renew with bonus, pause and resume
//! - TierCatalog: read-only tier definitions loaded at startup
//! - Clock: injectable time source (SystemClock, ManualClock)
//! - pricing: integer basis-point arithmetic shared by the operations
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sl_common::Principal;
//! use sl_ledger::{ManualClock, SubscriptionLedger, TierCatalog};
//!
//! let clock = Arc::new(ManualClock::new(1_700_000_000));
//! let ledger = SubscriptionLedger::new(TierCatalog::default(), clock.clone());
//! let user = Principal::from("wallet_1");
//!
//! let end_time = ledger.subscribe(&user, 100).unwrap();
//! assert_eq!(end_time, 1_700_000_000 + 2_592_000);
//! assert!(ledger.is_active(&user));
//! ```

pub mod clock;
pub mod error;
pub mod ledger;
pub mod pricing;
pub mod tier;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BuildError, CatalogError, LedgerError};
pub use ledger::{LedgerOptions, SubscriptionLedger};
pub use tier::TierCatalog;

pub type Result<T> = std::result::Result<T, LedgerError>;
