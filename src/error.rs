//! Error types for the tenor router.
//!
//! Every failure an operation can surface is a variant here. Nothing is
//! recovered locally: errors propagate with `?` out of the enclosing
//! operation and the atomic wrapper discards all partial state.

use thiserror::Error;

/// Result type alias for router operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy, one bucket per class of rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Realized counter-amount failed the caller's tolerance
    BoundViolation,
    /// A collaborator (ledger, issuer, pool) refused the mutation
    CollaboratorRejected,
    /// The caller has not granted sufficient transfer rights
    CallerPrecondition,
    /// Malformed input or arithmetic fault
    Validation,
}

/// Main error type for the tenor router
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Bound violations
    // ═══════════════════════════════════════════════════════════════════

    /// Trade proceeds fell below the caller's minimum-out bound
    #[error("realized proceeds {realized} below minimum bound {bound}")]
    ProceedsBelowBound {
        /// Counter-amount actually produced by the trade
        realized: u64,
        /// Caller's minimum acceptable counter-amount
        bound: u64,
    },

    /// Trade cost rose above the caller's maximum-in bound
    #[error("realized cost {realized} above maximum bound {bound}")]
    CostAboveBound {
        /// Counter-amount actually consumed by the trade
        realized: u64,
        /// Caller's maximum acceptable counter-amount
        bound: u64,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Ledger rejections
    // ═══════════════════════════════════════════════════════════════════

    /// Not enough free collateral for the requested withdrawal
    #[error("insufficient collateral: required {required}, available {available}")]
    InsufficientCollateral {
        /// Required collateral amount
        required: u64,
        /// Available collateral amount
        available: u64,
    },

    /// Position would fall below the required collateralization after the mutation
    #[error("borrowing power {power} below debt {debt} after mutation")]
    PositionUndercollateralized {
        /// Borrowing power of the locked collateral, in underlying units
        power: u64,
        /// Total debt at par, in underlying units
        debt: u64,
    },

    /// Repay amount exceeds the outstanding debt for the bond
    #[error("repay amount {amount} exceeds outstanding debt {outstanding}")]
    RepayExceedsDebt {
        /// Requested repay amount
        amount: u64,
        /// Outstanding debt
        outstanding: u64,
    },

    /// Collateral kind is not listed by the ledger
    #[error("unknown collateral kind: {0}")]
    UnknownCollateral(String),

    /// Bond is not listed by the ledger or market
    #[error("unknown bond: {0}")]
    UnknownBond(String),

    // ═══════════════════════════════════════════════════════════════════
    // Issuer rejections
    // ═══════════════════════════════════════════════════════════════════

    /// Trade or quote attempted at or past the bond's maturity
    #[error("bond matured at {maturity}, now {now}")]
    BondMatured {
        /// Maturity timestamp (unix seconds)
        maturity: u64,
        /// Current timestamp
        now: u64,
    },

    /// Redemption attempted before the bond's maturity
    #[error("bond not matured until {maturity}, now {now}")]
    BondNotMatured {
        /// Maturity timestamp (unix seconds)
        maturity: u64,
        /// Current timestamp
        now: u64,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Pool rejections
    // ═══════════════════════════════════════════════════════════════════

    /// Requested output meets or exceeds the pool reserve
    #[error("insufficient pool liquidity: requested {requested}, reserve {reserve}")]
    InsufficientLiquidity {
        /// Requested output amount
        requested: u64,
        /// Reserve backing that side of the trade
        reserve: u64,
    },

    /// Pool has no reserves to price against
    #[error("pool has no liquidity")]
    EmptyReserves,

    /// Pool is not listed by the market
    #[error("unknown pool: {0}")]
    UnknownPool(String),

    /// Token is not listed by the market
    #[error("unknown token: {0}")]
    UnknownToken(String),

    // ═══════════════════════════════════════════════════════════════════
    // Caller preconditions
    // ═══════════════════════════════════════════════════════════════════

    /// Caller's balance cannot fund the requested transfer
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Required amount
        required: u64,
        /// Available balance
        available: u64,
    },

    /// Caller has not approved the router for the required amount
    #[error("insufficient allowance: required {required}, granted {granted}")]
    InsufficientAllowance {
        /// Required transfer amount
        required: u64,
        /// Allowance currently granted
        granted: u64,
    },

    /// Attached native value cannot fund the requested wrap
    #[error("insufficient native value: required {required}, attached {attached}")]
    InsufficientNative {
        /// Required native amount
        required: u64,
        /// Native value attached to the call
        attached: u64,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Validation
    // ═══════════════════════════════════════════════════════════════════

    /// Amount is zero
    #[error("amount cannot be zero")]
    ZeroAmount,

    /// Overflow in calculation
    #[error("arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed
        operation: String,
    },

    /// Division by zero in calculation
    #[error("division by zero in {operation}")]
    DivisionByZero {
        /// Operation that divided by zero
        operation: String,
    },
}

impl Error {
    /// Classify this error into the router's failure taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ProceedsBelowBound { .. } | Error::CostAboveBound { .. } => {
                ErrorKind::BoundViolation
            }

            Error::InsufficientCollateral { .. }
            | Error::PositionUndercollateralized { .. }
            | Error::RepayExceedsDebt { .. }
            | Error::UnknownCollateral(_)
            | Error::UnknownBond(_)
            | Error::BondMatured { .. }
            | Error::BondNotMatured { .. }
            | Error::InsufficientLiquidity { .. }
            | Error::EmptyReserves
            | Error::UnknownPool(_)
            | Error::UnknownToken(_) => ErrorKind::CollaboratorRejected,

            Error::InsufficientBalance { .. }
            | Error::InsufficientAllowance { .. }
            | Error::InsufficientNative { .. } => ErrorKind::CallerPrecondition,

            Error::ZeroAmount | Error::Overflow { .. } | Error::DivisionByZero { .. } => {
                ErrorKind::Validation
            }
        }
    }

    /// Stable numeric code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Bound violations: 1xxx
            Error::ProceedsBelowBound { .. } => 1001,
            Error::CostAboveBound { .. } => 1002,

            // Ledger rejections: 2xxx
            Error::InsufficientCollateral { .. } => 2001,
            Error::PositionUndercollateralized { .. } => 2002,
            Error::RepayExceedsDebt { .. } => 2003,
            Error::UnknownCollateral(_) => 2004,
            Error::UnknownBond(_) => 2005,

            // Issuer rejections: 3xxx
            Error::BondMatured { .. } => 3001,
            Error::BondNotMatured { .. } => 3002,

            // Pool rejections: 4xxx
            Error::InsufficientLiquidity { .. } => 4001,
            Error::EmptyReserves => 4002,
            Error::UnknownPool(_) => 4003,
            Error::UnknownToken(_) => 4004,

            // Caller preconditions: 5xxx
            Error::InsufficientBalance { .. } => 5001,
            Error::InsufficientAllowance { .. } => 5002,
            Error::InsufficientNative { .. } => 5003,

            // Validation: 6xxx
            Error::ZeroAmount => 6001,
            Error::Overflow { .. } => 6002,
            Error::DivisionByZero { .. } => 6003,
        }
    }
}
