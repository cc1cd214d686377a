//! Unit-safe amount types.
//!
//! Each economic unit gets its own newtype so underlying, hTokens,
//! collateral, liquidity shares, and native value cannot be mixed in a
//! signature. Raw values are u64 base units; cross-unit conversions go
//! through the u128 helpers in [`crate::core::math`].

use serde::{Deserialize, Serialize};

macro_rules! amount_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
            Serialize, Deserialize,
        )]
        pub struct $name(u64);

        impl $name {
            /// Zero amount
            pub const ZERO: Self = Self(0);

            /// Create from raw base units
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Get the raw base-unit value
            pub const fn raw(&self) -> u64 {
                self.0
            }

            /// Check if zero
            pub const fn is_zero(&self) -> bool {
                self.0 == 0
            }

            /// Saturating addition
            pub fn saturating_add(self, other: Self) -> Self {
                Self(self.0.saturating_add(other.0))
            }

            /// Saturating subtraction
            pub fn saturating_sub(self, other: Self) -> Self {
                Self(self.0.saturating_sub(other.0))
            }

            /// Checked addition
            pub fn checked_add(self, other: Self) -> Option<Self> {
                self.0.checked_add(other.0).map(Self)
            }

            /// Checked subtraction
            pub fn checked_sub(self, other: Self) -> Option<Self> {
                self.0.checked_sub(other.0).map(Self)
            }

            /// Minimum of two amounts
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(amount: $name) -> Self {
                amount.0
            }
        }
    };
}

amount_type!(
    /// Amount of the spot (underlying) currency, in base units
    UnderlyingAmount
);

amount_type!(
    /// Amount of a fixed-term debt token, in base units
    HTokenAmount
);

amount_type!(
    /// Amount of a collateral token, in base units
    CollateralAmount
);

amount_type!(
    /// Amount of pool liquidity shares
    ShareAmount
);

amount_type!(
    /// Amount of the chain's native value, in base units
    NativeAmount
);

impl NativeAmount {
    /// The wrapped form of this native value, 1:1 with no rounding loss
    pub const fn as_collateral(&self) -> CollateralAmount {
        CollateralAmount::new(self.0)
    }
}

impl CollateralAmount {
    /// The native form of this wrapped value, 1:1 with no rounding loss
    pub const fn as_native(&self) -> NativeAmount {
        NativeAmount::new(self.0)
    }
}
