//! The operation router.
//!
//! Stateless free functions, each parameterized by a `&mut Market` and
//! explicit collaborator ids - there is no router object, no
//! configuration beyond the market's wrapped-native constant, and no
//! state carried between invocations. Every operation here is a single
//! atomic unit: it completes in full or leaves no effect.
//!
//! - [`wrapper`]: native-asset adapter
//! - [`quote`]: pure quote calculator
//! - [`swaps`]: the six bound-checked exchange primitives
//! - [`recipes`]: composite recipes across the ledger, issuer, and pool

pub mod quote;
pub mod recipes;
pub mod swaps;
pub mod wrapper;

pub use quote::htokens_required_for_mint;
pub use recipes::{
    add_liquidity, borrow_and_add_liquidity, borrow_htokens, buy_htokens_and_repay_borrow,
    deposit_collateral, deposit_collateral_and_borrow, deposit_collateral_and_borrow_and_sell,
    redeem_htokens, remove_liquidity, remove_liquidity_and_repay_borrow, repay_borrow,
    sell_underlying_and_repay_borrow, supply_underlying, withdraw_collateral,
};
pub use swaps::{
    borrow_and_buy_underlying, borrow_and_sell_htokens, buy_htokens, buy_underlying,
    sell_htokens, sell_underlying,
};
pub use wrapper::{
    withdraw_collateral_and_unwrap, wrap_native_and_borrow_and_sell,
    wrap_native_and_deposit_collateral,
};
