//! Quote calculator.
//!
//! Answers "how many hTokens must accompany this much underlying into the
//! pool" without touching state. The number comes from the pool's own
//! previewMint capability - the same method the mint path executes - so a
//! quote taken on unchanged reserves is exactly what a subsequent mint
//! will require.

use crate::core::amount::{HTokenAmount, UnderlyingAmount};
use crate::core::id::PoolId;
use crate::error::Result;
use crate::market::Market;

/// hTokens required to pair `underlying` into the pool at the current
/// reserve ratio. Fails with a matured-bond error at or past maturity,
/// where the pool's curve is no longer defined.
pub fn htokens_required_for_mint(
    market: &Market,
    pool: PoolId,
    underlying: UnderlyingAmount,
) -> Result<HTokenAmount> {
    let pool_state = market.pool(pool)?;
    market.htoken(pool_state.bond())?.ensure_tradable(market.now())?;

    let required = pool_state.required_htokens_for_mint(underlying.raw())?;
    Ok(HTokenAmount::new(required))
}
