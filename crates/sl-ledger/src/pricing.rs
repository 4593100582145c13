//! Integer pricing rules
//!
//! Rates are basis points. Fractional results are truncated toward zero:
//! a 5% discount on 301 is 15 (not 15.05), so the discounted amount is 286.

use sl_common::{BPS_DENOMINATOR, LOCK_DURATION_SECS};

use crate::error::LedgerError;
use crate::Result;

/// `amount * bps / 10_000`, truncated.
///
/// The product is taken in `u128`, so any rate up to 100% fits for every `u64` amount.
pub fn bps_share(amount: u64, bps: u64) -> Result<u64> {
    let scaled = u128::from(amount) * u128::from(bps) / u128::from(BPS_DENOMINATOR);
    u64::try_from(scaled).map_err(|_| LedgerError::ArithmeticOverflow)
}

/// Amount left after taking a `bps` discount (the discount itself is truncated)
pub fn apply_bps_discount(amount: u64, bps: u64) -> Result<u64> {
    let discount = bps_share(amount, bps)?;
    amount
        .checked_sub(discount)
        .ok_or(LedgerError::ArithmeticOverflow)
}

/// Undiscounted cost of `months` periods at `amount` each
pub fn bulk_total(amount: u64, months: u32) -> Result<u64> {
    amount
        .checked_mul(u64::from(months))
        .ok_or(LedgerError::ArithmeticOverflow)
}

/// `from + duration`, failing on overflow
pub fn extend(from: i64, duration: i64) -> Result<i64> {
    from.checked_add(duration)
        .ok_or(LedgerError::ArithmeticOverflow)
}

/// End time of a lock covering `months` standard periods starting at `now`
pub fn lock_end(now: i64, months: u32) -> Result<i64> {
    let duration = LOCK_DURATION_SECS
        .checked_mul(i64::from(months))
        .ok_or(LedgerError::ArithmeticOverflow)?;
    extend(now, duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sl_common::{BULK_DISCOUNT_BPS, EARLY_RENEWAL_BONUS_BPS, REFERRAL_REWARD_BPS};

    #[test]
    fn test_bulk_discount() {
        let total = bulk_total(100, 3).unwrap();
        assert_eq!(total, 300);
        assert_eq!(apply_bps_discount(total, BULK_DISCOUNT_BPS).unwrap(), 285);
    }

    #[test]
    fn test_discount_truncates() {
        // 5% of 301 = 15.05 -> 15
        assert_eq!(apply_bps_discount(301, BULK_DISCOUNT_BPS).unwrap(), 286);
        // 5% of 19 = 0.95 -> 0
        assert_eq!(apply_bps_discount(19, BULK_DISCOUNT_BPS).unwrap(), 19);
    }

    #[test]
    fn test_ten_percent_share() {
        assert_eq!(bps_share(100, REFERRAL_REWARD_BPS).unwrap(), 10);
        assert_eq!(bps_share(200, REFERRAL_REWARD_BPS).unwrap(), 20);
        assert_eq!(bps_share(15, REFERRAL_REWARD_BPS).unwrap(), 1);
    }

    #[test]
    fn test_overflow_is_reported() {
        // Rates above 100% can exceed u64
        assert_eq!(bps_share(u64::MAX, 20_000), Err(LedgerError::ArithmeticOverflow));
        assert_eq!(bulk_total(u64::MAX, 2), Err(LedgerError::ArithmeticOverflow));
        assert_eq!(extend(i64::MAX, 1), Err(LedgerError::ArithmeticOverflow));
    }

    #[test]
    fn test_large_amounts_do_not_overflow() {
        assert_eq!(bps_share(20_000_000_000_000_000, EARLY_RENEWAL_BONUS_BPS).unwrap(), 2_000_000_000_000_000);
        assert_eq!(bps_share(u64::MAX, BPS_DENOMINATOR).unwrap(), u64::MAX);
        assert_eq!(bps_share(u64::MAX, REFERRAL_REWARD_BPS).unwrap(), u64::MAX / 10);
        assert_eq!(
            apply_bps_discount(u64::MAX, BULK_DISCOUNT_BPS).unwrap(),
            u64::MAX - u64::MAX / 20
        );
    }

    #[test]
    fn test_lock_end() {
        assert_eq!(lock_end(1_000, 1).unwrap(), 1_000 + 2_592_000);
        assert_eq!(lock_end(0, 3).unwrap(), 3 * 2_592_000);
    }
}
