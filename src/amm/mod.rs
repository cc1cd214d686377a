//! Two-reserve market-maker pool.
//!
//! Each pool pairs one underlying token against one bond's hToken and
//! prices trades off its reserve proportions (constant product, no fee).
//! The preview functions are the only pricing authority in the crate:
//! quoting and execution both call them, so a quote can never drift from
//! what a trade realizes on unchanged reserves.
//!
//! Reserve mutation happens here; the matching token transfers in and out
//! of the pool's custody account are performed by the market in the same
//! operation, keeping reserves mirrored with custody balances.

use serde::{Deserialize, Serialize};

use crate::core::id::{AccountId, BondId, TokenId};
use crate::core::math::{isqrt, mul_div, mul_div_up, safe_add, safe_sub};
use crate::error::{Error, Result};
use crate::token::Fungible;

/// Which side of the pair a trade amount denominates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolAsset {
    /// The spot (underlying) currency
    Underlying,
    /// The bond's hToken
    HToken,
}

impl PoolAsset {
    /// The opposite side of the pair
    pub fn other(self) -> Self {
        match self {
            PoolAsset::Underlying => PoolAsset::HToken,
            PoolAsset::HToken => PoolAsset::Underlying,
        }
    }
}

/// A two-reserve pool for one (underlying, bond) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// The underlying token of the pair
    underlying: TokenId,
    /// The bond whose hToken trades here
    bond: BondId,
    /// Underlying reserve, base units
    underlying_reserve: u64,
    /// hToken reserve, base units
    htoken_reserve: u64,
    /// Liquidity-share book
    pub shares: Fungible,
    /// Custody account holding the reserves
    custody: AccountId,
}

impl Pool {
    /// Create an empty pool
    pub fn new(label: impl Into<String>, underlying: TokenId, bond: BondId) -> Self {
        let label = label.into();
        let custody = AccountId::named(&format!("pool-custody/{label}"));
        Self {
            underlying,
            bond,
            underlying_reserve: 0,
            htoken_reserve: 0,
            shares: Fungible::new(label, 18),
            custody,
        }
    }

    /// The underlying token of the pair
    pub fn underlying(&self) -> TokenId {
        self.underlying
    }

    /// The bond whose hToken trades here
    pub fn bond(&self) -> BondId {
        self.bond
    }

    /// Custody account holding the reserves
    pub fn custody(&self) -> AccountId {
        self.custody
    }

    /// Current reserves as (underlying, hToken)
    pub fn reserves(&self) -> (u64, u64) {
        (self.underlying_reserve, self.htoken_reserve)
    }

    fn reserve(&self, asset: PoolAsset) -> u64 {
        match asset {
            PoolAsset::Underlying => self.underlying_reserve,
            PoolAsset::HToken => self.htoken_reserve,
        }
    }

    fn reserve_mut(&mut self, asset: PoolAsset) -> &mut u64 {
        match asset {
            PoolAsset::Underlying => &mut self.underlying_reserve,
            PoolAsset::HToken => &mut self.htoken_reserve,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Trade pricing
    // ═══════════════════════════════════════════════════════════════════

    /// Counter-amount produced by paying exactly `amount_in` of `asset_in`.
    ///
    /// out = out_reserve * in / (in_reserve + in), rounded down.
    pub fn preview_trade_exact_in(&self, asset_in: PoolAsset, amount_in: u64) -> Result<u64> {
        if amount_in == 0 {
            return Err(Error::ZeroAmount);
        }
        let in_reserve = self.reserve(asset_in);
        let out_reserve = self.reserve(asset_in.other());
        if in_reserve == 0 || out_reserve == 0 {
            return Err(Error::EmptyReserves);
        }
        mul_div(out_reserve, amount_in, safe_add(in_reserve, amount_in)?)
    }

    /// Counter-amount required to receive exactly `amount_out` of `asset_out`.
    ///
    /// in = in_reserve * out / (out_reserve - out), rounded up.
    pub fn preview_trade_exact_out(&self, asset_out: PoolAsset, amount_out: u64) -> Result<u64> {
        if amount_out == 0 {
            return Err(Error::ZeroAmount);
        }
        let out_reserve = self.reserve(asset_out);
        let in_reserve = self.reserve(asset_out.other());
        if in_reserve == 0 || out_reserve == 0 {
            return Err(Error::EmptyReserves);
        }
        if amount_out >= out_reserve {
            return Err(Error::InsufficientLiquidity {
                requested: amount_out,
                reserve: out_reserve,
            });
        }
        mul_div_up(in_reserve, amount_out, out_reserve - amount_out)
    }

    /// Apply a priced trade to the reserves
    pub fn apply_trade(&mut self, asset_in: PoolAsset, amount_in: u64, amount_out: u64) -> Result<()> {
        let asset_out = asset_in.other();
        *self.reserve_mut(asset_in) = safe_add(self.reserve(asset_in), amount_in)?;
        *self.reserve_mut(asset_out) = safe_sub(self.reserve(asset_out), amount_out)?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Liquidity pricing
    // ═══════════════════════════════════════════════════════════════════

    /// hTokens that must accompany `underlying_offered` to preserve the
    /// reserve ratio, rounded against the minter. This is the pool's
    /// previewMint capability; the quote calculator and the mint path both
    /// call it.
    pub fn required_htokens_for_mint(&self, underlying_offered: u64) -> Result<u64> {
        if underlying_offered == 0 {
            return Err(Error::ZeroAmount);
        }
        if self.underlying_reserve == 0 {
            return Err(Error::EmptyReserves);
        }
        mul_div_up(underlying_offered, self.htoken_reserve, self.underlying_reserve)
    }

    /// Shares minted for a contribution of (`underlying_in`, `htokens_in`).
    ///
    /// First mint takes the geometric mean of the two legs; later mints are
    /// proportional to the underlying reserve.
    pub fn preview_mint_shares(&self, underlying_in: u64, htokens_in: u64) -> Result<u64> {
        if underlying_in == 0 {
            return Err(Error::ZeroAmount);
        }
        let total = self.shares.total_supply();
        if total == 0 {
            let minted = isqrt((underlying_in as u128) * (htokens_in as u128));
            if minted == 0 {
                return Err(Error::ZeroAmount);
            }
            if minted > u64::MAX as u128 {
                return Err(Error::Overflow {
                    operation: "initial share mint".into(),
                });
            }
            return Ok(minted as u64);
        }
        mul_div(underlying_in, total, self.underlying_reserve)
    }

    /// Both legs returned for burning `shares` liquidity, rounded down
    pub fn preview_burn(&self, shares: u64) -> Result<(u64, u64)> {
        if shares == 0 {
            return Err(Error::ZeroAmount);
        }
        let total = self.shares.total_supply();
        if total == 0 {
            return Err(Error::EmptyReserves);
        }
        let underlying_out = mul_div(self.underlying_reserve, shares, total)?;
        let htokens_out = mul_div(self.htoken_reserve, shares, total)?;
        Ok((underlying_out, htokens_out))
    }

    /// Apply a liquidity mint to the reserves and share book
    pub fn apply_mint(
        &mut self,
        to: AccountId,
        underlying_in: u64,
        htokens_in: u64,
        shares_minted: u64,
    ) -> Result<()> {
        self.underlying_reserve = safe_add(self.underlying_reserve, underlying_in)?;
        self.htoken_reserve = safe_add(self.htoken_reserve, htokens_in)?;
        self.shares.mint(to, shares_minted)
    }

    /// Apply a liquidity burn to the reserves and share book
    pub fn apply_burn(
        &mut self,
        from: AccountId,
        shares: u64,
        underlying_out: u64,
        htokens_out: u64,
    ) -> Result<()> {
        self.shares.burn(from, shares)?;
        self.underlying_reserve = safe_sub(self.underlying_reserve, underlying_out)?;
        self.htoken_reserve = safe_sub(self.htoken_reserve, htokens_out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_with_reserves(underlying: u64, htokens: u64) -> Pool {
        let mut pool = Pool::new("LP-hUSDN", TokenId::new(0), BondId::new(0));
        let seeder = AccountId::named("seeder");
        let shares = pool.preview_mint_shares(underlying, htokens).unwrap();
        pool.apply_mint(seeder, underlying, htokens, shares).unwrap();
        pool
    }

    #[test]
    fn test_exact_in_pricing() {
        let pool = pool_with_reserves(10_000, 10_000);
        // out = 10000 * 1000 / 11000 = 909
        let out = pool
            .preview_trade_exact_in(PoolAsset::HToken, 1_000)
            .unwrap();
        assert_eq!(out, 909);
    }

    #[test]
    fn test_exact_out_pricing_rounds_up() {
        let pool = pool_with_reserves(10_000, 10_000);
        // in = ceil(10000 * 909 / 9091) = ceil(999.89..) = 1000
        let cost = pool
            .preview_trade_exact_out(PoolAsset::Underlying, 909)
            .unwrap();
        assert_eq!(cost, 1_000);
    }

    #[test]
    fn test_exact_out_limited_by_reserve() {
        let pool = pool_with_reserves(10_000, 10_000);
        let err = pool
            .preview_trade_exact_out(PoolAsset::Underlying, 10_000)
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientLiquidity { .. }));
    }

    #[test]
    fn test_empty_pool_has_no_price() {
        let pool = Pool::new("LP", TokenId::new(0), BondId::new(0));
        assert_eq!(
            pool.preview_trade_exact_in(PoolAsset::Underlying, 1)
                .unwrap_err(),
            Error::EmptyReserves
        );
    }

    #[test]
    fn test_trade_preserves_invariant_direction() {
        let mut pool = pool_with_reserves(10_000, 10_000);
        let k_before = 10_000u128 * 10_000u128;

        let out = pool
            .preview_trade_exact_in(PoolAsset::Underlying, 500)
            .unwrap();
        pool.apply_trade(PoolAsset::Underlying, 500, out).unwrap();

        let (u, h) = pool.reserves();
        // rounding always favors the pool, so k never decreases
        assert!((u as u128) * (h as u128) >= k_before);
    }

    #[test]
    fn test_required_htokens_tracks_reserve_ratio() {
        let pool = pool_with_reserves(20_000, 10_000);
        // ratio 1:2, so 1000 underlying needs 500 hTokens
        assert_eq!(pool.required_htokens_for_mint(1_000).unwrap(), 500);
        // rounding goes up
        assert_eq!(pool.required_htokens_for_mint(1_001).unwrap(), 501);
    }

    #[test]
    fn test_initial_shares_geometric_mean() {
        let pool = Pool::new("LP", TokenId::new(0), BondId::new(0));
        assert_eq!(pool.preview_mint_shares(400, 100).unwrap(), 200);
    }

    #[test]
    fn test_burn_is_proportional() {
        let mut pool = pool_with_reserves(10_000, 10_000);
        let seeder = AccountId::named("seeder");
        let total = pool.shares.total_supply();
        assert_eq!(total, 10_000);

        let (u, h) = pool.preview_burn(total / 2).unwrap();
        assert_eq!(u, 5_000);
        assert_eq!(h, 5_000);

        pool.apply_burn(seeder, total / 2, u, h).unwrap();
        assert_eq!(pool.reserves(), (5_000, 5_000));
    }

    #[test]
    fn test_mint_then_burn_round_trip() {
        let mut pool = pool_with_reserves(10_000, 10_000);
        let lp = AccountId::named("lp");

        let required = pool.required_htokens_for_mint(2_000).unwrap();
        let shares = pool.preview_mint_shares(2_000, required).unwrap();
        pool.apply_mint(lp, 2_000, required, shares).unwrap();

        let (u, h) = pool.preview_burn(shares).unwrap();
        // rounding may withhold a unit, never pay one extra
        assert!(u <= 2_000 && u >= 1_999);
        assert!(h <= required);
    }
}
