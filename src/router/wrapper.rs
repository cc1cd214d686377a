//! Native-asset adapter.
//!
//! The ledger only accepts fungible-token collateral, so native value
//! attached to a call is wrapped 1:1 into the wrapped-native token before
//! it is deposited, and unwrapped 1:1 on the way back out. The attached
//! amount is consumed in full within the same invocation; the wrap loses
//! nothing to fees or rounding. The wrapped-native token id is the
//! router's one configuration constant, read from the market.

use crate::core::amount::{CollateralAmount, HTokenAmount, NativeAmount, UnderlyingAmount};
use crate::core::id::{AccountId, PoolId};
use crate::error::Result;
use crate::market::Market;
use crate::router::swaps::borrow_and_sell_core;

/// Wrap attached native value and deposit it as collateral for the
/// caller. The ledger's collateral balance grows by exactly the attached
/// amount.
pub fn wrap_native_and_deposit_collateral(
    market: &mut Market,
    caller: AccountId,
    attached: NativeAmount,
) -> Result<()> {
    market.execute_atomic(|m| {
        m.wrap_native(caller, attached)?;
        let kind = m.wrapped_native();
        m.deposit_collateral(caller, kind, attached.as_collateral())
    })
}

/// Wrap attached native value, deposit it as collateral, borrow an exact
/// hToken amount, and sell it for underlying subject to
/// `min_underlying_out`. Proceeds go to the caller.
///
/// Returns the underlying actually received.
pub fn wrap_native_and_borrow_and_sell(
    market: &mut Market,
    caller: AccountId,
    pool: PoolId,
    attached: NativeAmount,
    borrow_amount: HTokenAmount,
    min_underlying_out: UnderlyingAmount,
) -> Result<UnderlyingAmount> {
    market.execute_atomic(|m| {
        // collateral-staged
        m.wrap_native(caller, attached)?;
        let kind = m.wrapped_native();
        m.deposit_collateral(caller, kind, attached.as_collateral())?;
        // debt-issued, traded, settled
        borrow_and_sell_core(m, caller, pool, borrow_amount, min_underlying_out)
    })
}

/// Withdraw wrapped-native collateral and unwrap it back to native value
/// for the caller.
pub fn withdraw_collateral_and_unwrap(
    market: &mut Market,
    caller: AccountId,
    amount: CollateralAmount,
) -> Result<()> {
    market.execute_atomic(|m| {
        let kind = m.wrapped_native();
        m.withdraw_collateral(caller, kind, amount)?;
        m.unwrap_native(caller, amount)
    })
}
