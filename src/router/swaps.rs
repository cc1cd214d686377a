//! Bound-checked exchange primitives.
//!
//! Six paired buy/sell, exact-in/exact-out operations against a pool. The
//! fixed side is exact; the counter side is policed by a caller-supplied
//! tolerance, compared against the amount the pool actually realized -
//! after its reserves have moved, never against an estimate - and before
//! any further external call. A violated bound aborts the whole
//! operation; the atomic wrapper undoes any borrow or transfer already
//! performed.

use tracing::debug;

use crate::amm::PoolAsset;
use crate::core::amount::{HTokenAmount, UnderlyingAmount};
use crate::core::id::{AccountId, PoolId};
use crate::error::{Error, Result};
use crate::events::{
    BorrowAndBuyUnderlyingEvent, BorrowAndSellHTokensEvent, RouterEvent,
};
use crate::market::Market;

// ═══════════════════════════════════════════════════════════════════════════════
// BOUND CHECKS
// ═══════════════════════════════════════════════════════════════════════════════

/// Fail unless realized proceeds meet the caller's minimum
pub(crate) fn ensure_min_out(realized: u64, bound: u64) -> Result<()> {
    if realized < bound {
        return Err(Error::ProceedsBelowBound { realized, bound });
    }
    Ok(())
}

/// Fail unless realized cost stays within the caller's maximum
pub(crate) fn ensure_max_in(realized: u64, bound: u64) -> Result<()> {
    if realized > bound {
        return Err(Error::CostAboveBound { realized, bound });
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALLER-FUNDED PRIMITIVES
// ═══════════════════════════════════════════════════════════════════════════════

/// Buy an exact amount of hTokens, paying at most `max_underlying_in`.
///
/// Returns the underlying actually paid.
pub fn buy_htokens(
    market: &mut Market,
    caller: AccountId,
    pool: PoolId,
    htokens_out: HTokenAmount,
    max_underlying_in: UnderlyingAmount,
) -> Result<UnderlyingAmount> {
    market.execute_atomic(|m| {
        // funding estimate only; the bound is checked against the trade
        let funding = m
            .pool(pool)?
            .preview_trade_exact_out(PoolAsset::HToken, htokens_out.raw())?;
        m.pull_token(caller, m.pool(pool)?.underlying(), funding)?;

        let realized = m.pool_trade_exact_out(pool, PoolAsset::HToken, htokens_out.raw())?;
        ensure_max_in(realized, max_underlying_in.raw())?;

        let bond = m.pool(pool)?.bond();
        m.forward_htokens(bond, caller, htokens_out)?;
        refund_underlying(m, caller, pool, funding, realized)?;

        debug!(%caller, %pool, out = htokens_out.raw(), cost = realized, "buy_htokens");
        Ok(UnderlyingAmount::new(realized))
    })
}

/// Sell an exact amount of hTokens for at least `min_underlying_out`.
///
/// Returns the underlying actually received.
pub fn sell_htokens(
    market: &mut Market,
    caller: AccountId,
    pool: PoolId,
    htokens_in: HTokenAmount,
    min_underlying_out: UnderlyingAmount,
) -> Result<UnderlyingAmount> {
    market.execute_atomic(|m| {
        let bond = m.pool(pool)?.bond();
        m.pull_htokens(caller, bond, htokens_in)?;

        let realized = m.pool_trade_exact_in(pool, PoolAsset::HToken, htokens_in.raw())?;
        ensure_min_out(realized, min_underlying_out.raw())?;

        m.forward_token(m.pool(pool)?.underlying(), caller, realized)?;

        debug!(%caller, %pool, sold = htokens_in.raw(), proceeds = realized, "sell_htokens");
        Ok(UnderlyingAmount::new(realized))
    })
}

/// Buy an exact amount of underlying, paying at most `max_htokens_in`.
///
/// Returns the hTokens actually paid.
pub fn buy_underlying(
    market: &mut Market,
    caller: AccountId,
    pool: PoolId,
    underlying_out: UnderlyingAmount,
    max_htokens_in: HTokenAmount,
) -> Result<HTokenAmount> {
    market.execute_atomic(|m| {
        let bond = m.pool(pool)?.bond();
        let funding = m
            .pool(pool)?
            .preview_trade_exact_out(PoolAsset::Underlying, underlying_out.raw())?;
        m.pull_htokens(caller, bond, HTokenAmount::new(funding))?;

        let realized = m.pool_trade_exact_out(pool, PoolAsset::Underlying, underlying_out.raw())?;
        ensure_max_in(realized, max_htokens_in.raw())?;

        m.forward_token(m.pool(pool)?.underlying(), caller, underlying_out.raw())?;
        if funding > realized {
            m.forward_htokens(bond, caller, HTokenAmount::new(funding - realized))?;
        }

        debug!(%caller, %pool, out = underlying_out.raw(), cost = realized, "buy_underlying");
        Ok(HTokenAmount::new(realized))
    })
}

/// Sell an exact amount of underlying for at least `min_htokens_out`.
///
/// Returns the hTokens actually received.
pub fn sell_underlying(
    market: &mut Market,
    caller: AccountId,
    pool: PoolId,
    underlying_in: UnderlyingAmount,
    min_htokens_out: HTokenAmount,
) -> Result<HTokenAmount> {
    market.execute_atomic(|m| {
        m.pull_token(caller, m.pool(pool)?.underlying(), underlying_in.raw())?;

        let realized = m.pool_trade_exact_in(pool, PoolAsset::Underlying, underlying_in.raw())?;
        ensure_min_out(realized, min_htokens_out.raw())?;

        let bond = m.pool(pool)?.bond();
        m.forward_htokens(bond, caller, HTokenAmount::new(realized))?;

        debug!(%caller, %pool, sold = underlying_in.raw(), proceeds = realized, "sell_underlying");
        Ok(HTokenAmount::new(realized))
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// BORROW-FUNDED PRIMITIVES
// ═══════════════════════════════════════════════════════════════════════════════

/// Borrow an exact amount of hTokens and sell them for at least
/// `min_underlying_out`, forwarding the proceeds to the caller.
///
/// Returns the underlying actually received.
pub fn borrow_and_sell_htokens(
    market: &mut Market,
    caller: AccountId,
    pool: PoolId,
    borrow_amount: HTokenAmount,
    min_underlying_out: UnderlyingAmount,
) -> Result<UnderlyingAmount> {
    market.execute_atomic(|m| borrow_and_sell_core(m, caller, pool, borrow_amount, min_underlying_out))
}

/// Buy an exact amount of underlying funded by a borrow of at most
/// `max_htokens_borrowed`, forwarding the underlying to the caller.
///
/// Returns the hTokens actually borrowed (the realized trade cost).
pub fn borrow_and_buy_underlying(
    market: &mut Market,
    caller: AccountId,
    pool: PoolId,
    underlying_out: UnderlyingAmount,
    max_htokens_borrowed: HTokenAmount,
) -> Result<HTokenAmount> {
    market.execute_atomic(|m| {
        let bond = m.pool(pool)?.bond();

        // debt-issued: borrow exactly what the trade will consume
        let funding = m
            .pool(pool)?
            .preview_trade_exact_out(PoolAsset::Underlying, underlying_out.raw())?;
        m.borrow(caller, bond, HTokenAmount::new(funding))?;

        // traded
        let realized = m.pool_trade_exact_out(pool, PoolAsset::Underlying, underlying_out.raw())?;
        ensure_max_in(realized, max_htokens_borrowed.raw())?;

        // settled
        m.forward_token(m.pool(pool)?.underlying(), caller, underlying_out.raw())?;
        if funding > realized {
            m.forward_htokens(bond, caller, HTokenAmount::new(funding - realized))?;
        }

        let event = BorrowAndBuyUnderlyingEvent {
            caller,
            pool,
            borrowed: HTokenAmount::new(realized),
            bought: underlying_out,
        };
        tracing::info!(%caller, %pool, borrowed = realized, bought = underlying_out.raw(), "borrow_and_buy_underlying");
        m.record_event(RouterEvent::BorrowAndBuyUnderlying(event));

        Ok(HTokenAmount::new(realized))
    })
}

/// Shared borrow-then-sell sequence: debt-issued, traded, settled.
///
/// Used by [`borrow_and_sell_htokens`] and the composites that stage
/// collateral first. Emits the borrow-and-sell notification.
pub(crate) fn borrow_and_sell_core(
    m: &mut Market,
    caller: AccountId,
    pool: PoolId,
    borrow_amount: HTokenAmount,
    min_underlying_out: UnderlyingAmount,
) -> Result<UnderlyingAmount> {
    let bond = m.pool(pool)?.bond();

    // debt-issued
    m.borrow(caller, bond, borrow_amount)?;

    // traded; the bound is checked against what the pool realized
    let realized = m.pool_trade_exact_in(pool, PoolAsset::HToken, borrow_amount.raw())?;
    ensure_min_out(realized, min_underlying_out.raw())?;

    // settled
    m.forward_token(m.pool(pool)?.underlying(), caller, realized)?;

    let event = BorrowAndSellHTokensEvent {
        caller,
        pool,
        borrowed: borrow_amount,
        proceeds: UnderlyingAmount::new(realized),
    };
    tracing::info!(%caller, %pool, borrowed = borrow_amount.raw(), proceeds = realized, "borrow_and_sell_htokens");
    m.record_event(RouterEvent::BorrowAndSellHTokens(event));

    Ok(UnderlyingAmount::new(realized))
}

/// Return unspent funding pulled for an exact-out trade
fn refund_underlying(
    m: &mut Market,
    caller: AccountId,
    pool: PoolId,
    pulled: u64,
    spent: u64,
) -> Result<()> {
    if pulled > spent {
        m.forward_token(m.pool(pool)?.underlying(), caller, pulled - spent)?;
    }
    Ok(())
}
