//! Safe integer arithmetic for financial computations.
//!
//! All cross-unit math widens to u128 before dividing so intermediate
//! products cannot overflow. Rounding direction is always explicit.

use crate::error::{Error, Result};

/// Safe addition with overflow check
pub fn safe_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(Error::Overflow {
        operation: format!("{} + {}", a, b),
    })
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or(Error::Overflow {
        operation: format!("{} - {}", a, b),
    })
}

/// Safe multiplication with overflow check
pub fn safe_mul(a: u64, b: u64) -> Result<u64> {
    a.checked_mul(b).ok_or(Error::Overflow {
        operation: format!("{} * {}", a, b),
    })
}

/// Computes (a * b) / c with u128 intermediate, rounding down
pub fn mul_div(a: u64, b: u64, c: u64) -> Result<u64> {
    if c == 0 {
        return Err(Error::DivisionByZero {
            operation: format!("({} * {}) / {}", a, b, c),
        });
    }
    let result = (a as u128) * (b as u128) / (c as u128);
    if result > u64::MAX as u128 {
        return Err(Error::Overflow {
            operation: format!("({} * {}) / {}", a, b, c),
        });
    }
    Ok(result as u64)
}

/// Computes (a * b) / c with u128 intermediate, rounding up
pub fn mul_div_up(a: u64, b: u64, c: u64) -> Result<u64> {
    if c == 0 {
        return Err(Error::DivisionByZero {
            operation: format!("ceil(({} * {}) / {})", a, b, c),
        });
    }
    let numerator = (a as u128) * (b as u128);
    let result = (numerator + (c as u128) - 1) / (c as u128);
    if result > u64::MAX as u128 {
        return Err(Error::Overflow {
            operation: format!("ceil(({} * {}) / {})", a, b, c),
        });
    }
    Ok(result as u64)
}

/// Integer square root (Babylonian method)
pub fn isqrt(y: u128) -> u128 {
    if y == 0 {
        return 0;
    }
    let mut z = y;
    let mut x = y / 2 + 1;
    while x < z {
        z = x;
        x = (y / x + x) / 2;
    }
    z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_arithmetic() {
        assert_eq!(safe_add(1, 2).unwrap(), 3);
        assert!(safe_add(u64::MAX, 1).is_err());

        assert_eq!(safe_sub(5, 3).unwrap(), 2);
        assert!(safe_sub(3, 5).is_err());

        assert_eq!(safe_mul(100, 200).unwrap(), 20_000);
        assert!(safe_mul(u64::MAX, 2).is_err());
    }

    #[test]
    fn test_mul_div_rounding() {
        // 10 * 10 / 3 = 33.33...
        assert_eq!(mul_div(10, 10, 3).unwrap(), 33);
        assert_eq!(mul_div_up(10, 10, 3).unwrap(), 34);

        // Exact division rounds the same both ways
        assert_eq!(mul_div(10, 9, 3).unwrap(), 30);
        assert_eq!(mul_div_up(10, 9, 3).unwrap(), 30);
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // a * b overflows u64 but the quotient fits
        let a = u64::MAX / 2;
        assert_eq!(mul_div(a, 4, 4).unwrap(), a);
    }

    #[test]
    fn test_mul_div_zero_divisor() {
        assert!(mul_div(1, 1, 0).is_err());
        assert!(mul_div_up(1, 1, 0).is_err());
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(4), 2);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(1_000_000), 1_000);
    }
}
