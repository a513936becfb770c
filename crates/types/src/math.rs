//! Checked integer math for payout calculations.
//!
//! All money math is integer-only; intermediate products widen to u128 so
//! `n * mul` cannot overflow for any pair of u64 operands.

use crate::scalars::Tokens;

/// Computes `n * mul / div` with a u128 intermediate, `None` on division by
/// zero or if the result does not fit back into u64.
pub fn mul_div_u64(n: u64, mul: u64, div: u64) -> Option<u64> {
    if div == 0 {
        return None;
    }
    let wide = (n as u128) * (mul as u128) / (div as u128);
    u64::try_from(wide).ok()
}

/// Basis-point slice of an amount, truncating.
///
/// Callers must pass `bps <= 10_000` (enforced by `PoolParams::validate`),
/// which makes the result at most `amount` and the narrowing cast exact.
pub fn bps_of(amount: Tokens, bps: u16) -> Tokens {
    ((amount as u128 * bps as u128) / 10_000) as Tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_u64() {
        assert_eq!(mul_div_u64(100, 50, 100), Some(50));
        assert_eq!(mul_div_u64(850, 600, 1000), Some(510));
        assert_eq!(mul_div_u64(1000, 3333, 10000), Some(333));
        assert_eq!(mul_div_u64(100, 1, 0), None); // Division by zero
    }

    #[test]
    fn test_mul_div_u64_wide_intermediate() {
        // u64::MAX * 2 overflows u64 but not the u128 intermediate
        assert_eq!(mul_div_u64(u64::MAX, 2, 2), Some(u64::MAX));
        // Result too large for u64
        assert_eq!(mul_div_u64(u64::MAX, 2, 1), None);
    }

    #[test]
    fn test_bps_of() {
        assert_eq!(bps_of(1000, 8500), 850);
        assert_eq!(bps_of(1000, 1500), 150);
        assert_eq!(bps_of(101, 1500), 15); // truncates
        assert_eq!(bps_of(0, 10_000), 0);
    }
}
