//! Shared primitive types: amounts, identifiers, arithmetic.

pub mod amount;
pub mod id;
pub mod math;

pub use amount::{
    CollateralAmount, HTokenAmount, NativeAmount, ShareAmount, UnderlyingAmount,
};
pub use id::{AccountId, BondId, PoolId, TokenId};
