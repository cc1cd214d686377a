//! Collateralized-borrowing ledger.
//!
//! Tracks, per account, collateral balances by kind and outstanding debt by
//! bond. Each listed collateral kind carries a fixed valuation and a
//! required collateralization ratio; debt is valued at par in underlying
//! units. Solvency — aggregate borrowing power covering aggregate debt —
//! is enforced on every borrow and every collateral withdrawal, never left
//! to a later check.
//!
//! The ledger only keeps accounts; custody of the collateral tokens and
//! minting of borrowed hTokens are performed by the market in the same
//! operation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::id::{AccountId, BondId, TokenId};
use crate::core::math::{mul_div, safe_add, safe_sub};
use crate::error::{Error, Result};

/// Basis-points divisor (10000 = 100%)
pub const BPS_DIVISOR: u64 = 10_000;

// ═══════════════════════════════════════════════════════════════════════════════
// COLLATERAL PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Listing parameters for one collateral kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralParams {
    /// Valuation numerator: underlying base units per `price_den` collateral units
    pub price_num: u64,
    /// Valuation denominator
    pub price_den: u64,
    /// Required collateralization ratio in basis points (15000 = 150%)
    pub ratio_bps: u64,
}

impl CollateralParams {
    /// Value of `amount` collateral units, in underlying base units
    pub fn value(&self, amount: u64) -> Result<u64> {
        mul_div(amount, self.price_num, self.price_den)
    }

    /// Borrowing power of `amount` collateral units: value discounted by
    /// the required ratio
    pub fn borrowing_power(&self, amount: u64) -> Result<u64> {
        let value = self.value(amount)?;
        mul_div(value, BPS_DIVISOR, self.ratio_bps)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// POSITION
// ═══════════════════════════════════════════════════════════════════════════════

/// One account's collateral and debt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Locked collateral by kind
    collateral: HashMap<TokenId, u64>,
    /// Outstanding debt by bond
    debts: HashMap<BondId, u64>,
}

impl Position {
    /// Whether the position holds nothing at all
    pub fn is_empty(&self) -> bool {
        self.collateral.is_empty() && self.debts.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

/// The collateralized-borrowing ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralLedger {
    /// Listed collateral kinds and their parameters
    params: HashMap<TokenId, CollateralParams>,
    /// Listed bonds
    bonds: Vec<BondId>,
    /// Positions by account
    positions: HashMap<AccountId, Position>,
    /// Custody account holding deposited collateral tokens
    custody: AccountId,
}

impl CollateralLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            params: HashMap::new(),
            bonds: Vec::new(),
            positions: HashMap::new(),
            custody: AccountId::named("ledger-custody"),
        }
    }

    /// Custody account for deposited collateral
    pub fn custody(&self) -> AccountId {
        self.custody
    }

    /// List a collateral kind
    pub fn list_collateral(&mut self, kind: TokenId, params: CollateralParams) {
        self.params.insert(kind, params);
    }

    /// List a bond as borrowable
    pub fn list_bond(&mut self, bond: BondId) {
        if !self.bonds.contains(&bond) {
            self.bonds.push(bond);
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════

    /// Locked collateral of `kind` for an account
    pub fn collateral_of(&self, account: &AccountId, kind: TokenId) -> u64 {
        self.positions
            .get(account)
            .and_then(|p| p.collateral.get(&kind).copied())
            .unwrap_or(0)
    }

    /// Outstanding debt on `bond` for an account
    pub fn debt_of(&self, account: &AccountId, bond: BondId) -> u64 {
        self.positions
            .get(account)
            .and_then(|p| p.debts.get(&bond).copied())
            .unwrap_or(0)
    }

    /// Aggregate borrowing power of an account, in underlying base units
    pub fn borrowing_power(&self, account: &AccountId) -> Result<u64> {
        let Some(position) = self.positions.get(account) else {
            return Ok(0);
        };
        let mut power = 0u64;
        for (kind, amount) in &position.collateral {
            let params = self.kind_params(*kind)?;
            power = safe_add(power, params.borrowing_power(*amount)?)?;
        }
        Ok(power)
    }

    /// Aggregate debt of an account at par, in underlying base units
    pub fn total_debt(&self, account: &AccountId) -> u64 {
        self.positions
            .get(account)
            .map(|p| p.debts.values().sum())
            .unwrap_or(0)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Mutations
    // ═══════════════════════════════════════════════════════════════════

    /// Record a collateral deposit
    pub fn deposit(&mut self, account: AccountId, kind: TokenId, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        self.kind_params(kind)?;

        let position = self.positions.entry(account).or_default();
        let locked = position.collateral.entry(kind).or_insert(0);
        *locked = safe_add(*locked, amount)?;
        Ok(())
    }

    /// Record a collateral withdrawal; the position must stay solvent
    pub fn withdraw(&mut self, account: AccountId, kind: TokenId, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        self.kind_params(kind)?;

        let locked = self.collateral_of(&account, kind);
        if locked < amount {
            return Err(Error::InsufficientCollateral {
                required: amount,
                available: locked,
            });
        }

        self.set_collateral(account, kind, locked - amount);
        if let Err(e) = self.check_solvency(&account) {
            // Undo so a failed withdrawal is side-effect free even without
            // the market's snapshot wrapper.
            self.set_collateral(account, kind, locked);
            return Err(e);
        }
        Ok(())
    }

    /// Record a borrow; the position must stay solvent
    pub fn borrow(&mut self, account: AccountId, bond: BondId, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        self.bond_listed(bond)?;

        let outstanding = self.debt_of(&account, bond);
        let new_debt = safe_add(outstanding, amount)?;
        self.set_debt(account, bond, new_debt);

        if let Err(e) = self.check_solvency(&account) {
            self.set_debt(account, bond, outstanding);
            return Err(e);
        }
        Ok(())
    }

    /// Record a repayment; cannot exceed the outstanding debt
    pub fn repay(&mut self, account: AccountId, bond: BondId, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        self.bond_listed(bond)?;

        let outstanding = self.debt_of(&account, bond);
        if amount > outstanding {
            return Err(Error::RepayExceedsDebt {
                amount,
                outstanding,
            });
        }
        self.set_debt(account, bond, safe_sub(outstanding, amount)?);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Internal
    // ═══════════════════════════════════════════════════════════════════

    fn kind_params(&self, kind: TokenId) -> Result<CollateralParams> {
        self.params
            .get(&kind)
            .copied()
            .ok_or_else(|| Error::UnknownCollateral(kind.to_string()))
    }

    fn bond_listed(&self, bond: BondId) -> Result<()> {
        if self.bonds.contains(&bond) {
            Ok(())
        } else {
            Err(Error::UnknownBond(bond.to_string()))
        }
    }

    /// Fail unless the account's borrowing power covers its debt
    fn check_solvency(&self, account: &AccountId) -> Result<()> {
        let power = self.borrowing_power(account)?;
        let debt = self.total_debt(account);
        if power < debt {
            return Err(Error::PositionUndercollateralized { power, debt });
        }
        Ok(())
    }

    fn set_collateral(&mut self, account: AccountId, kind: TokenId, amount: u64) {
        let position = self.positions.entry(account).or_default();
        if amount == 0 {
            position.collateral.remove(&kind);
        } else {
            position.collateral.insert(kind, amount);
        }
        if position.is_empty() {
            self.positions.remove(&account);
        }
    }

    fn set_debt(&mut self, account: AccountId, bond: BondId, amount: u64) {
        let position = self.positions.entry(account).or_default();
        if amount == 0 {
            position.debts.remove(&bond);
        } else {
            position.debts.insert(bond, amount);
        }
        if position.is_empty() {
            self.positions.remove(&account);
        }
    }
}

impl Default for CollateralLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WNAT: TokenId = TokenId::new(1);
    const BOND: BondId = BondId::new(0);

    fn alice() -> AccountId {
        AccountId::named("alice")
    }

    /// 1 collateral unit is worth 2 underlying units; 150% required ratio
    fn ledger() -> CollateralLedger {
        let mut ledger = CollateralLedger::new();
        ledger.list_collateral(
            WNAT,
            CollateralParams {
                price_num: 2,
                price_den: 1,
                ratio_bps: 15_000,
            },
        );
        ledger.list_bond(BOND);
        ledger
    }

    #[test]
    fn test_deposit_and_borrow_within_power() {
        let mut ledger = ledger();
        ledger.deposit(alice(), WNAT, 1_500).unwrap();

        // value 3000, power 2000
        assert_eq!(ledger.borrowing_power(&alice()).unwrap(), 2_000);
        ledger.borrow(alice(), BOND, 2_000).unwrap();
        assert_eq!(ledger.debt_of(&alice(), BOND), 2_000);
    }

    #[test]
    fn test_borrow_beyond_power_rejected() {
        let mut ledger = ledger();
        ledger.deposit(alice(), WNAT, 1_500).unwrap();

        let err = ledger.borrow(alice(), BOND, 2_001).unwrap_err();
        assert_eq!(
            err,
            Error::PositionUndercollateralized {
                power: 2_000,
                debt: 2_001
            }
        );
        // failed borrow left no debt behind
        assert_eq!(ledger.debt_of(&alice(), BOND), 0);
    }

    #[test]
    fn test_withdraw_respects_solvency() {
        let mut ledger = ledger();
        ledger.deposit(alice(), WNAT, 1_500).unwrap();
        ledger.borrow(alice(), BOND, 1_000).unwrap();

        // power must stay >= 1000, so at most 750 collateral may leave
        ledger.withdraw(alice(), WNAT, 750).unwrap();
        assert!(ledger.withdraw(alice(), WNAT, 1).is_err());
        assert_eq!(ledger.collateral_of(&alice(), WNAT), 750);
    }

    #[test]
    fn test_withdraw_more_than_locked() {
        let mut ledger = ledger();
        ledger.deposit(alice(), WNAT, 100).unwrap();
        let err = ledger.withdraw(alice(), WNAT, 101).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientCollateral {
                required: 101,
                available: 100
            }
        );
    }

    #[test]
    fn test_repay_capped_at_outstanding() {
        let mut ledger = ledger();
        ledger.deposit(alice(), WNAT, 1_500).unwrap();
        ledger.borrow(alice(), BOND, 500).unwrap();

        let err = ledger.repay(alice(), BOND, 501).unwrap_err();
        assert_eq!(
            err,
            Error::RepayExceedsDebt {
                amount: 501,
                outstanding: 500
            }
        );

        ledger.repay(alice(), BOND, 500).unwrap();
        assert_eq!(ledger.debt_of(&alice(), BOND), 0);
    }

    #[test]
    fn test_unknown_kind_and_bond_distinguished() {
        let mut ledger = ledger();
        let unknown_kind = ledger.deposit(alice(), TokenId::new(9), 1).unwrap_err();
        assert!(matches!(unknown_kind, Error::UnknownCollateral(_)));

        let unknown_bond = ledger.borrow(alice(), BondId::new(9), 1).unwrap_err();
        assert!(matches!(unknown_bond, Error::UnknownBond(_)));
    }

    #[test]
    fn test_empty_positions_pruned() {
        let mut ledger = ledger();
        ledger.deposit(alice(), WNAT, 100).unwrap();
        ledger.withdraw(alice(), WNAT, 100).unwrap();
        assert_eq!(ledger.collateral_of(&alice(), WNAT), 0);
        assert!(ledger.positions.is_empty());
    }
}
