//! Fixed-term debt token ("hToken") issuer.
//!
//! An hToken is a fungible claim on one unit of underlying, redeemable at
//! or after a fixed maturity timestamp. Before maturity the token trades
//! against underlying on a pool; at or after maturity trading stops and
//! redemption opens. The issuer owns the token's balance book and the
//! maturity gate; movements of the underlying it custodies are orchestrated
//! by the market, which also authorizes the ledger's debt mint/burn.

use serde::{Deserialize, Serialize};

use crate::core::id::{AccountId, TokenId};
use crate::error::{Error, Result};
use crate::token::Fungible;

/// A fixed-term debt token and its issuance state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HToken {
    /// Balance book for the token itself
    pub book: Fungible,
    /// Maturity timestamp (unix seconds); trading is defined strictly before it
    maturity: u64,
    /// The underlying token this bond settles into
    underlying: TokenId,
    /// Custody account holding supplied underlying until redemption
    custody: AccountId,
}

impl HToken {
    /// Create a new issuer for one bond series
    pub fn new(symbol: impl Into<String>, decimals: u8, maturity: u64, underlying: TokenId) -> Self {
        let symbol = symbol.into();
        let custody = AccountId::named(&format!("htoken-custody/{symbol}"));
        Self {
            book: Fungible::new(symbol, decimals),
            maturity,
            underlying,
            custody,
        }
    }

    /// Maturity timestamp
    pub fn maturity(&self) -> u64 {
        self.maturity
    }

    /// The underlying token this bond settles into
    pub fn underlying(&self) -> TokenId {
        self.underlying
    }

    /// Custody account for supplied underlying
    pub fn custody(&self) -> AccountId {
        self.custody
    }

    /// Whether the bond has reached maturity
    pub fn is_matured(&self, now: u64) -> bool {
        now >= self.maturity
    }

    // ═══════════════════════════════════════════════════════════════════
    // Maturity gates
    // ═══════════════════════════════════════════════════════════════════

    /// Fail unless the bond is still tradable (strictly before maturity).
    ///
    /// The pool's trading curve is degenerate past maturity, so every trade
    /// and quote path runs through this gate first.
    pub fn ensure_tradable(&self, now: u64) -> Result<()> {
        if self.is_matured(now) {
            return Err(Error::BondMatured {
                maturity: self.maturity,
                now,
            });
        }
        Ok(())
    }

    /// Fail unless the bond has matured (redemption is open)
    pub fn ensure_matured(&self, now: u64) -> Result<()> {
        if !self.is_matured(now) {
            return Err(Error::BondNotMatured {
                maturity: self.maturity,
                now,
            });
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Issuance
    // ═══════════════════════════════════════════════════════════════════

    /// Mint supplied tokens 1:1 against underlying, pre-maturity only.
    ///
    /// The market transfers the matching underlying into custody in the
    /// same operation.
    pub fn record_supply(&mut self, to: AccountId, amount: u64, now: u64) -> Result<()> {
        self.ensure_tradable(now)?;
        self.book.mint(to, amount)
    }

    /// Burn redeemed tokens 1:1 for underlying, at or after maturity only.
    pub fn record_redeem(&mut self, from: AccountId, amount: u64, now: u64) -> Result<()> {
        self.ensure_matured(now)?;
        self.book.burn(from, amount)
    }

    /// Mint borrowed tokens. Ledger-authorized; debt accounting lives in
    /// the collateral ledger.
    pub fn mint_borrowed(&mut self, to: AccountId, amount: u64) -> Result<()> {
        self.book.mint(to, amount)
    }

    /// Burn repaid tokens. Ledger-authorized.
    pub fn burn_repaid(&mut self, from: AccountId, amount: u64) -> Result<()> {
        self.book.burn(from, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATURITY: u64 = 1_750_000_000;

    fn htoken() -> HToken {
        HToken::new("hUSDN-2027", 6, MATURITY, TokenId::new(0))
    }

    fn alice() -> AccountId {
        AccountId::named("alice")
    }

    #[test]
    fn test_tradable_strictly_before_maturity() {
        let h = htoken();
        assert!(h.ensure_tradable(MATURITY - 1).is_ok());
        assert_eq!(
            h.ensure_tradable(MATURITY).unwrap_err(),
            Error::BondMatured {
                maturity: MATURITY,
                now: MATURITY
            }
        );
    }

    #[test]
    fn test_redeem_gate_opens_at_maturity() {
        let mut h = htoken();
        h.record_supply(alice(), 100, MATURITY - 10).unwrap();

        let err = h.record_redeem(alice(), 100, MATURITY - 1).unwrap_err();
        assert_eq!(
            err,
            Error::BondNotMatured {
                maturity: MATURITY,
                now: MATURITY - 1
            }
        );

        h.record_redeem(alice(), 100, MATURITY).unwrap();
        assert_eq!(h.book.balance_of(&alice()), 0);
    }

    #[test]
    fn test_supply_closes_at_maturity() {
        let mut h = htoken();
        assert!(h.record_supply(alice(), 100, MATURITY).is_err());
    }

    #[test]
    fn test_borrow_mint_and_repay_burn() {
        let mut h = htoken();
        h.mint_borrowed(alice(), 500).unwrap();
        assert_eq!(h.book.total_supply(), 500);
        h.burn_repaid(alice(), 500).unwrap();
        assert_eq!(h.book.total_supply(), 0);
    }
}
