//! # Tenor
//!
//! An atomic operation router for fixed-term lending. Tenor composes
//! multi-step financial actions against three independent ledgers - a
//! collateralized-borrowing ledger, a fixed-term debt-token (hToken)
//! issuer, and a two-reserve market-maker pool - into single
//! all-or-nothing units of execution, so a caller can express one intent
//! ("deposit collateral, borrow, and sell the borrowed tokens for spot")
//! without sequencing the subsystems by hand or risking partial
//! execution.
//!
//! ## Architecture
//!
//! - **Core**: unit-safe amounts, identifiers, checked arithmetic
//! - **Collaborators**: the token books, hToken issuers, collateral
//!   ledger, and pools the router calls into
//! - **Market**: the collaborator registry and atomic execution
//!   environment
//! - **Router**: the quote calculator, six bound-checked exchange
//!   primitives, and the composite recipes
//!
//! ## Example
//!
//! ```rust,ignore
//! use tenor::prelude::*;
//!
//! let proceeds = router::deposit_collateral_and_borrow_and_sell(
//!     &mut market,
//!     caller,
//!     pool,
//!     kind,
//!     CollateralAmount::new(1_000),
//!     HTokenAmount::new(500),
//!     UnderlyingAmount::new(480),
//! )?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod amm;
pub mod core;
pub mod error;
pub mod events;
pub mod htoken;
pub mod ledger;
pub mod market;
pub mod router;
pub mod token;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::amm::{Pool, PoolAsset};
    pub use crate::core::amount::{
        CollateralAmount, HTokenAmount, NativeAmount, ShareAmount, UnderlyingAmount,
    };
    pub use crate::core::id::{AccountId, BondId, PoolId, TokenId};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::events::{EventLog, RouterEvent};
    pub use crate::htoken::HToken;
    pub use crate::ledger::{CollateralLedger, CollateralParams};
    pub use crate::market::Market;
    pub use crate::router;
    pub use crate::token::Fungible;
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
