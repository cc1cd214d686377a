//! Composite recipes.
//!
//! Each recipe is a fixed, named sequence of calls across the ledger, the
//! issuer, the pool, and the exchange primitives - written out by hand,
//! in order, because the ordering is a correctness invariant: collateral
//! is staged before debt is issued, debt is converted before anything is
//! forwarded, and every balance the router holds mid-sequence is disposed
//! of before the operation returns. A recipe visits the states
//! collateral-staged, debt-issued, traded, settled at most once each and
//! never out of order.
//!
//! All recipes run inside the market's atomic wrapper: any sub-call
//! failure leaves every collaborator exactly as it was.

use tracing::debug;

use crate::amm::PoolAsset;
use crate::core::amount::{
    CollateralAmount, HTokenAmount, ShareAmount, UnderlyingAmount,
};
use crate::core::id::{AccountId, BondId, PoolId, TokenId};
use crate::error::Result;
use crate::market::Market;
use crate::router::quote::htokens_required_for_mint;
use crate::router::swaps::{borrow_and_sell_core, ensure_max_in, ensure_min_out};

// ═══════════════════════════════════════════════════════════════════════════════
// COLLATERAL
// ═══════════════════════════════════════════════════════════════════════════════

/// Pull collateral from the caller and deposit it into the ledger
pub fn deposit_collateral(
    market: &mut Market,
    caller: AccountId,
    kind: TokenId,
    amount: CollateralAmount,
) -> Result<()> {
    market.execute_atomic(|m| {
        m.pull_token(caller, kind, amount.raw())?;
        m.deposit_collateral(caller, kind, amount)
    })
}

/// Withdraw free collateral from the ledger to the caller
pub fn withdraw_collateral(
    market: &mut Market,
    caller: AccountId,
    kind: TokenId,
    amount: CollateralAmount,
) -> Result<()> {
    market.execute_atomic(|m| {
        m.withdraw_collateral(caller, kind, amount)?;
        m.forward_token(kind, caller, amount.raw())
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// BORROWING
// ═══════════════════════════════════════════════════════════════════════════════

/// Borrow hTokens against existing collateral, to the caller
pub fn borrow_htokens(
    market: &mut Market,
    caller: AccountId,
    bond: BondId,
    amount: HTokenAmount,
) -> Result<()> {
    market.execute_atomic(|m| {
        m.borrow(caller, bond, amount)?;
        m.forward_htokens(bond, caller, amount)
    })
}

/// Deposit collateral, then borrow against it, to the caller
pub fn deposit_collateral_and_borrow(
    market: &mut Market,
    caller: AccountId,
    kind: TokenId,
    deposit_amount: CollateralAmount,
    bond: BondId,
    borrow_amount: HTokenAmount,
) -> Result<()> {
    market.execute_atomic(|m| {
        // collateral-staged
        m.pull_token(caller, kind, deposit_amount.raw())?;
        m.deposit_collateral(caller, kind, deposit_amount)?;
        // debt-issued, settled
        m.borrow(caller, bond, borrow_amount)?;
        m.forward_htokens(bond, caller, borrow_amount)
    })
}

/// Deposit collateral, borrow an exact hToken amount, and sell it for
/// underlying subject to `min_underlying_out`. Proceeds go to the caller.
///
/// Returns the underlying actually received.
pub fn deposit_collateral_and_borrow_and_sell(
    market: &mut Market,
    caller: AccountId,
    pool: PoolId,
    kind: TokenId,
    deposit_amount: CollateralAmount,
    borrow_amount: HTokenAmount,
    min_underlying_out: UnderlyingAmount,
) -> Result<UnderlyingAmount> {
    market.execute_atomic(|m| {
        // collateral-staged
        m.pull_token(caller, kind, deposit_amount.raw())?;
        m.deposit_collateral(caller, kind, deposit_amount)?;
        // debt-issued, traded, settled
        borrow_and_sell_core(m, caller, pool, borrow_amount, min_underlying_out)
    })
}

/// Repay the caller's debt with hTokens pulled from their balance
pub fn repay_borrow(
    market: &mut Market,
    caller: AccountId,
    bond: BondId,
    amount: HTokenAmount,
) -> Result<()> {
    market.execute_atomic(|m| {
        m.pull_htokens(caller, bond, amount)?;
        m.repay(caller, bond, amount)
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRADE-AND-REPAY
// ═══════════════════════════════════════════════════════════════════════════════

/// Buy an exact hToken amount (paying at most `max_underlying_in`) and
/// repay the caller's debt with it, up to the outstanding balance.
/// Surplus hTokens go back to the caller.
///
/// Returns the underlying actually paid.
pub fn buy_htokens_and_repay_borrow(
    market: &mut Market,
    caller: AccountId,
    pool: PoolId,
    htokens_out: HTokenAmount,
    max_underlying_in: UnderlyingAmount,
) -> Result<UnderlyingAmount> {
    market.execute_atomic(|m| {
        let bond = m.pool(pool)?.bond();

        let funding = m
            .pool(pool)?
            .preview_trade_exact_out(PoolAsset::HToken, htokens_out.raw())?;
        m.pull_token(caller, m.pool(pool)?.underlying(), funding)?;

        // traded
        let realized = m.pool_trade_exact_out(pool, PoolAsset::HToken, htokens_out.raw())?;
        ensure_max_in(realized, max_underlying_in.raw())?;

        // settled
        let repaid = settle_htokens_against_debt(m, caller, bond, htokens_out)?;
        if funding > realized {
            m.forward_token(m.pool(pool)?.underlying(), caller, funding - realized)?;
        }

        debug!(%caller, %pool, repaid = repaid.raw(), cost = realized, "buy_htokens_and_repay_borrow");
        Ok(UnderlyingAmount::new(realized))
    })
}

/// Sell an exact underlying amount for hTokens (at least
/// `min_htokens_out`) and repay the caller's debt, up to the outstanding
/// balance. Surplus hTokens go back to the caller.
///
/// Returns the hTokens actually received from the sale.
pub fn sell_underlying_and_repay_borrow(
    market: &mut Market,
    caller: AccountId,
    pool: PoolId,
    underlying_in: UnderlyingAmount,
    min_htokens_out: HTokenAmount,
) -> Result<HTokenAmount> {
    market.execute_atomic(|m| {
        let bond = m.pool(pool)?.bond();
        m.pull_token(caller, m.pool(pool)?.underlying(), underlying_in.raw())?;

        // traded
        let realized = m.pool_trade_exact_in(pool, PoolAsset::Underlying, underlying_in.raw())?;
        ensure_min_out(realized, min_htokens_out.raw())?;

        // settled: repay what the debt absorbs, forward the rest
        settle_htokens_against_debt(m, caller, bond, HTokenAmount::new(realized))?;

        debug!(%caller, %pool, sold = underlying_in.raw(), proceeds = realized, "sell_underlying_and_repay_borrow");
        Ok(HTokenAmount::new(realized))
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIQUIDITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Add liquidity funded entirely by the caller. The hToken leg is the
/// pool's quoted requirement for `underlying_amount`, gated by
/// `max_htokens_in`. Shares go to the caller.
///
/// Returns the shares minted.
pub fn add_liquidity(
    market: &mut Market,
    caller: AccountId,
    pool: PoolId,
    underlying_amount: UnderlyingAmount,
    max_htokens_in: HTokenAmount,
) -> Result<ShareAmount> {
    market.execute_atomic(|m| {
        let bond = m.pool(pool)?.bond();

        let required = htokens_required_for_mint(m, pool, underlying_amount)?;
        ensure_max_in(required.raw(), max_htokens_in.raw())?;

        m.pull_token(caller, m.pool(pool)?.underlying(), underlying_amount.raw())?;
        m.pull_htokens(caller, bond, required)?;

        let shares = m.pool_mint(pool, underlying_amount, required)?;
        m.forward_shares(pool, caller, shares)?;

        debug!(%caller, %pool, underlying = underlying_amount.raw(), htokens = required.raw(), shares = shares.raw(), "add_liquidity");
        Ok(shares)
    })
}

/// Add liquidity with the hToken leg funded by a borrow. The recipe
/// borrows exactly the pool's quoted requirement - never more - so no
/// unused borrowed balance can exist; `max_borrow` only bounds the quote.
/// Shares go to the caller.
///
/// Returns (shares minted, hTokens borrowed).
pub fn borrow_and_add_liquidity(
    market: &mut Market,
    caller: AccountId,
    pool: PoolId,
    underlying_amount: UnderlyingAmount,
    max_borrow: HTokenAmount,
) -> Result<(ShareAmount, HTokenAmount)> {
    market.execute_atomic(|m| {
        let bond = m.pool(pool)?.bond();

        let required = htokens_required_for_mint(m, pool, underlying_amount)?;
        ensure_max_in(required.raw(), max_borrow.raw())?;

        // collateral must already be staged; debt-issued
        m.pull_token(caller, m.pool(pool)?.underlying(), underlying_amount.raw())?;
        m.borrow(caller, bond, required)?;

        // traded (liquidity mint), settled
        let shares = m.pool_mint(pool, underlying_amount, required)?;
        m.forward_shares(pool, caller, shares)?;

        debug!(%caller, %pool, underlying = underlying_amount.raw(), borrowed = required.raw(), shares = shares.raw(), "borrow_and_add_liquidity");
        Ok((shares, required))
    })
}

/// Burn the caller's shares and forward both legs to them.
///
/// Returns (underlying leg, hToken leg).
pub fn remove_liquidity(
    market: &mut Market,
    caller: AccountId,
    pool: PoolId,
    shares: ShareAmount,
) -> Result<(UnderlyingAmount, HTokenAmount)> {
    market.execute_atomic(|m| {
        m.pull_shares(caller, pool, shares)?;
        let (underlying_out, htokens_out) = m.pool_burn(pool, shares)?;

        if !underlying_out.is_zero() {
            m.forward_token(m.pool(pool)?.underlying(), caller, underlying_out.raw())?;
        }
        if !htokens_out.is_zero() {
            let bond = m.pool(pool)?.bond();
            m.forward_htokens(bond, caller, htokens_out)?;
        }
        Ok((underlying_out, htokens_out))
    })
}

/// Burn the caller's shares, sell the underlying leg for hTokens subject
/// to `min_htokens_out`, and repay the caller's debt with everything
/// recovered, up to the outstanding balance. Surplus hTokens go back to
/// the caller.
///
/// Returns the hTokens applied to the debt.
pub fn remove_liquidity_and_repay_borrow(
    market: &mut Market,
    caller: AccountId,
    pool: PoolId,
    shares: ShareAmount,
    min_htokens_out: HTokenAmount,
) -> Result<HTokenAmount> {
    market.execute_atomic(|m| {
        let bond = m.pool(pool)?.bond();

        m.pull_shares(caller, pool, shares)?;
        let (underlying_leg, htoken_leg) = m.pool_burn(pool, shares)?;

        // traded: convert the underlying leg into more hTokens
        let mut recovered = htoken_leg;
        if !underlying_leg.is_zero() {
            let realized = m.pool_trade_exact_in(pool, PoolAsset::Underlying, underlying_leg.raw())?;
            ensure_min_out(realized, min_htokens_out.raw())?;
            recovered = recovered.saturating_add(HTokenAmount::new(realized));
        }

        // settled
        let repaid = settle_htokens_against_debt(m, caller, bond, recovered)?;

        debug!(%caller, %pool, shares = shares.raw(), recovered = recovered.raw(), repaid = repaid.raw(), "remove_liquidity_and_repay_borrow");
        Ok(repaid)
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// ISSUER
// ═══════════════════════════════════════════════════════════════════════════════

/// Supply underlying to the issuer, minting hTokens 1:1 to the caller
pub fn supply_underlying(
    market: &mut Market,
    caller: AccountId,
    bond: BondId,
    amount: UnderlyingAmount,
) -> Result<HTokenAmount> {
    market.execute_atomic(|m| {
        let underlying = m.htoken(bond)?.underlying();
        m.pull_token(caller, underlying, amount.raw())?;
        let minted = m.supply_htokens(bond, amount)?;
        m.forward_htokens(bond, caller, minted)?;
        Ok(minted)
    })
}

/// Redeem the caller's hTokens 1:1 for underlying, at or after maturity
pub fn redeem_htokens(
    market: &mut Market,
    caller: AccountId,
    bond: BondId,
    amount: HTokenAmount,
) -> Result<UnderlyingAmount> {
    market.execute_atomic(|m| {
        m.pull_htokens(caller, bond, amount)?;
        let redeemed = m.redeem_htokens(bond, amount)?;
        let underlying = m.htoken(bond)?.underlying();
        m.forward_token(underlying, caller, redeemed.raw())?;
        Ok(redeemed)
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTERNAL
// ═══════════════════════════════════════════════════════════════════════════════

/// Apply recovered hTokens to the caller's debt, up to the outstanding
/// balance, and forward any surplus back to the caller. The router keeps
/// nothing.
fn settle_htokens_against_debt(
    m: &mut Market,
    caller: AccountId,
    bond: BondId,
    recovered: HTokenAmount,
) -> Result<HTokenAmount> {
    let outstanding = HTokenAmount::new(m.ledger().debt_of(&caller, bond));
    let repaid = recovered.min(outstanding);

    if !repaid.is_zero() {
        m.repay(caller, bond, repaid)?;
    }
    let surplus = recovered.saturating_sub(repaid);
    if !surplus.is_zero() {
        m.forward_htokens(bond, caller, surplus)?;
    }
    Ok(repaid)
}
