//! Fungible balance book.
//!
//! One [`Fungible`] instance backs each listed token: the underlying
//! currency, the wrapped-native collateral, and the balance side of every
//! hToken. Balances and allowances are raw u64 base units; the unit-safe
//! amount types live at the market and router surfaces where the token's
//! role is known.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::id::AccountId;
use crate::core::math::safe_add;
use crate::error::{Error, Result};

/// A fungible token's balances and transfer rights
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fungible {
    /// Token symbol
    pub symbol: String,
    /// Decimal places of the base unit
    pub decimals: u8,
    /// Total supply in base units
    total_supply: u64,
    /// Balances by account
    balances: HashMap<AccountId, u64>,
    /// Allowances by (owner, spender)
    allowances: HashMap<(AccountId, AccountId), u64>,
}

impl Fungible {
    /// Create a new empty token book
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            total_supply: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════

    /// Get total supply
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Get balance of an account
    pub fn balance_of(&self, owner: &AccountId) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    /// Get the allowance granted by `owner` to `spender`
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u64 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Number of accounts with a nonzero balance
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Verify supply invariant (total_supply == sum of all balances)
    pub fn verify_supply_invariant(&self) -> bool {
        let sum: u128 = self.balances.values().map(|b| *b as u128).sum();
        sum == self.total_supply as u128
    }

    // ═══════════════════════════════════════════════════════════════════
    // Mutations
    // ═══════════════════════════════════════════════════════════════════

    /// Grant `spender` the right to move up to `amount` of `owner`'s balance
    pub fn approve(&mut self, owner: AccountId, spender: AccountId, amount: u64) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    /// Mint new tokens to an account
    pub fn mint(&mut self, to: AccountId, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }

        self.total_supply = safe_add(self.total_supply, amount)?;
        let balance = self.balances.entry(to).or_insert(0);
        *balance = safe_add(*balance, amount)?;
        Ok(())
    }

    /// Burn tokens from an account
    pub fn burn(&mut self, from: AccountId, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }

        let balance = self.balance_of(&from);
        if balance < amount {
            return Err(Error::InsufficientBalance {
                required: amount,
                available: balance,
            });
        }

        self.set_balance(from, balance - amount);
        self.total_supply -= amount;
        Ok(())
    }

    /// Transfer tokens between accounts
    pub fn transfer(&mut self, from: AccountId, to: AccountId, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        if from == to {
            return Ok(());
        }

        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(Error::InsufficientBalance {
                required: amount,
                available: from_balance,
            });
        }

        self.set_balance(from, from_balance - amount);
        let to_balance = safe_add(self.balance_of(&to), amount)?;
        self.set_balance(to, to_balance);
        Ok(())
    }

    /// Transfer on behalf of `from`, consuming `spender`'s allowance.
    ///
    /// A spender moving its own balance needs no allowance.
    pub fn transfer_from(
        &mut self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: u64,
    ) -> Result<()> {
        if spender != from {
            let granted = self.allowance(&from, &spender);
            if granted < amount {
                return Err(Error::InsufficientAllowance {
                    required: amount,
                    granted,
                });
            }
            self.approve(from, spender, granted - amount);
        }
        self.transfer(from, to, amount)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Internal
    // ═══════════════════════════════════════════════════════════════════

    /// Write a balance, pruning zero entries
    fn set_balance(&mut self, account: AccountId, balance: u64) {
        if balance == 0 {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, balance);
        }
    }
}
