//! Market - the collaborator registry and execution environment.
//!
//! A [`Market`] owns everything a router operation touches: the listed
//! token books, the hToken issuers, the collateral ledger, the pools, the
//! native-value balances, a logical clock, and the event log. The router
//! itself stays stateless; its one piece of configuration - the
//! wrapped-native token id - is fixed here at construction and never
//! mutated.
//!
//! Every router operation runs inside [`Market::execute_atomic`], which
//! snapshots the whole market and restores it verbatim if the operation
//! body returns any error. A failed composite is therefore observably
//! side-effect free.
//!
//! The methods in the "collaborator surface" section are the fixed call
//! contract the router depends on. They pair each collaborator's state
//! change with the matching token movement so reserves and custody
//! balances can never drift apart. Funds always stage through the
//! router's transient custody account, which must be empty again by the
//! time any operation completes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::amm::{Pool, PoolAsset};
use crate::core::amount::{
    CollateralAmount, HTokenAmount, NativeAmount, ShareAmount, UnderlyingAmount,
};
use crate::core::id::{AccountId, BondId, PoolId, TokenId};
use crate::core::math::safe_add;
use crate::error::{Error, Result};
use crate::events::{EventLog, RouterEvent};
use crate::htoken::HToken;
use crate::ledger::{CollateralLedger, CollateralParams};
use crate::token::Fungible;

/// The collaborator registry and execution environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Logical clock (unix seconds)
    now: u64,
    /// Listed fungible tokens
    tokens: HashMap<TokenId, Fungible>,
    /// Listed hToken issuers
    htokens: HashMap<BondId, HToken>,
    /// Listed pools
    pools: HashMap<PoolId, Pool>,
    /// The collateralized-borrowing ledger
    ledger: CollateralLedger,
    /// Native-value balances
    native: HashMap<AccountId, u64>,
    /// The wrapped-native token, fixed at construction
    wrapped_native: TokenId,
    /// The router's transient custody account
    router: AccountId,
    /// Events from completed operations
    events: EventLog,
    /// Next interned token index
    next_token: u32,
    /// Next interned bond index
    next_bond: u32,
    /// Next interned pool index
    next_pool: u32,
}

impl Market {
    /// Create a market at the given timestamp. The wrapped-native token is
    /// listed immediately and its id becomes the router's one
    /// configuration constant.
    pub fn new(now: u64) -> Self {
        let mut tokens = HashMap::new();
        let wrapped_native = TokenId::new(0);
        tokens.insert(wrapped_native, Fungible::new("WNATIVE", 18));

        Self {
            now,
            tokens,
            htokens: HashMap::new(),
            pools: HashMap::new(),
            ledger: CollateralLedger::new(),
            native: HashMap::new(),
            wrapped_native,
            router: AccountId::named("router"),
            events: EventLog::new(),
            next_token: 1,
            next_bond: 0,
            next_pool: 0,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Listing
    // ═══════════════════════════════════════════════════════════════════

    /// List a fungible token
    pub fn list_token(&mut self, symbol: impl Into<String>, decimals: u8) -> TokenId {
        let id = TokenId::new(self.next_token);
        self.next_token += 1;
        self.tokens.insert(id, Fungible::new(symbol, decimals));
        id
    }

    /// List an hToken series and register its bond with the ledger
    pub fn list_htoken(
        &mut self,
        symbol: impl Into<String>,
        decimals: u8,
        maturity: u64,
        underlying: TokenId,
    ) -> BondId {
        let id = BondId::new(self.next_bond);
        self.next_bond += 1;
        self.htokens
            .insert(id, HToken::new(symbol, decimals, maturity, underlying));
        self.ledger.list_bond(id);
        id
    }

    /// List a pool for one (underlying, bond) pair
    pub fn list_pool(&mut self, label: impl Into<String>, underlying: TokenId, bond: BondId) -> PoolId {
        let id = PoolId::new(self.next_pool);
        self.next_pool += 1;
        self.pools.insert(id, Pool::new(label, underlying, bond));
        id
    }

    /// List a collateral kind with the ledger
    pub fn list_collateral(&mut self, kind: TokenId, params: CollateralParams) {
        self.ledger.list_collateral(kind, params);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════

    /// Current timestamp
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Advance the clock. Time never runs backwards.
    pub fn set_now(&mut self, now: u64) {
        debug_assert!(now >= self.now);
        self.now = now;
    }

    /// The wrapped-native token id - the router's configuration constant,
    /// exposed for callers that need to pre-approve transfers
    pub fn wrapped_native(&self) -> TokenId {
        self.wrapped_native
    }

    /// The router's transient custody account
    pub fn router_account(&self) -> AccountId {
        self.router
    }

    /// Look up a token book
    pub fn token(&self, id: TokenId) -> Result<&Fungible> {
        self.tokens
            .get(&id)
            .ok_or_else(|| Error::UnknownToken(id.to_string()))
    }

    fn token_mut(&mut self, id: TokenId) -> Result<&mut Fungible> {
        self.tokens
            .get_mut(&id)
            .ok_or_else(|| Error::UnknownToken(id.to_string()))
    }

    /// Look up an hToken issuer
    pub fn htoken(&self, id: BondId) -> Result<&HToken> {
        self.htokens
            .get(&id)
            .ok_or_else(|| Error::UnknownBond(id.to_string()))
    }

    fn htoken_mut(&mut self, id: BondId) -> Result<&mut HToken> {
        self.htokens
            .get_mut(&id)
            .ok_or_else(|| Error::UnknownBond(id.to_string()))
    }

    /// Look up a pool
    pub fn pool(&self, id: PoolId) -> Result<&Pool> {
        self.pools
            .get(&id)
            .ok_or_else(|| Error::UnknownPool(id.to_string()))
    }

    fn pool_mut(&mut self, id: PoolId) -> Result<&mut Pool> {
        self.pools
            .get_mut(&id)
            .ok_or_else(|| Error::UnknownPool(id.to_string()))
    }

    /// The collateral ledger
    pub fn ledger(&self) -> &CollateralLedger {
        &self.ledger
    }

    /// Events from completed operations
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Native-value balance of an account
    pub fn native_balance(&self, account: &AccountId) -> NativeAmount {
        NativeAmount::new(self.native.get(account).copied().unwrap_or(0))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Atomic execution
    // ═══════════════════════════════════════════════════════════════════

    /// Run an operation all-or-nothing: on any error the market is
    /// restored to its exact pre-call state.
    pub fn execute_atomic<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = self.clone();
        match f(self) {
            Ok(value) => {
                debug_assert!(
                    self.router_has_no_residue(),
                    "operation completed with funds left in router custody"
                );
                Ok(value)
            }
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    /// Whether the router's custody account holds nothing anywhere:
    /// no token, hToken, share, or native balance.
    pub fn router_has_no_residue(&self) -> bool {
        self.tokens.values().all(|t| t.balance_of(&self.router) == 0)
            && self
                .htokens
                .values()
                .all(|h| h.book.balance_of(&self.router) == 0)
            && self
                .pools
                .values()
                .all(|p| p.shares.balance_of(&self.router) == 0)
            && self.native.get(&self.router).copied().unwrap_or(0) == 0
    }

    // ═══════════════════════════════════════════════════════════════════
    // Caller funding
    // ═══════════════════════════════════════════════════════════════════

    /// Grant the router a transfer right over the caller's tokens
    pub fn approve_router(&mut self, owner: AccountId, token: TokenId, amount: u64) -> Result<()> {
        let router = self.router;
        self.token_mut(token)?.approve(owner, router, amount);
        Ok(())
    }

    /// Grant the router a transfer right over the caller's hTokens
    pub fn approve_router_htokens(
        &mut self,
        owner: AccountId,
        bond: BondId,
        amount: u64,
    ) -> Result<()> {
        let router = self.router;
        self.htoken_mut(bond)?.book.approve(owner, router, amount);
        Ok(())
    }

    /// Grant the router a transfer right over the caller's pool shares
    pub fn approve_router_shares(
        &mut self,
        owner: AccountId,
        pool: PoolId,
        amount: u64,
    ) -> Result<()> {
        let router = self.router;
        self.pool_mut(pool)?.shares.approve(owner, router, amount);
        Ok(())
    }

    /// Credit native value to an account (the faucet side of the chain is
    /// out of scope; tests and demos seed balances here)
    pub fn fund_native(&mut self, account: AccountId, amount: NativeAmount) -> Result<()> {
        let balance = self.native.entry(account).or_insert(0);
        *balance = safe_add(*balance, amount.raw())?;
        Ok(())
    }

    /// Mint tokens directly to an account (test/demo seeding)
    pub fn fund_token(&mut self, account: AccountId, token: TokenId, amount: u64) -> Result<()> {
        self.token_mut(token)?.mint(account, amount)
    }

    /// Pull caller funds into router custody, consuming allowance
    pub fn pull_token(&mut self, caller: AccountId, token: TokenId, amount: u64) -> Result<()> {
        let router = self.router;
        self.token_mut(token)?
            .transfer_from(router, caller, router, amount)
    }

    /// Pull caller hTokens into router custody, consuming allowance
    pub fn pull_htokens(&mut self, caller: AccountId, bond: BondId, amount: HTokenAmount) -> Result<()> {
        let router = self.router;
        self.htoken_mut(bond)?
            .book
            .transfer_from(router, caller, router, amount.raw())
    }

    /// Pull caller pool shares into router custody, consuming allowance
    pub fn pull_shares(&mut self, caller: AccountId, pool: PoolId, amount: ShareAmount) -> Result<()> {
        let router = self.router;
        self.pool_mut(pool)?
            .shares
            .transfer_from(router, caller, router, amount.raw())
    }

    /// Forward tokens from router custody to a recipient
    pub fn forward_token(&mut self, token: TokenId, to: AccountId, amount: u64) -> Result<()> {
        let router = self.router;
        self.token_mut(token)?.transfer(router, to, amount)
    }

    /// Forward hTokens from router custody to a recipient
    pub fn forward_htokens(&mut self, bond: BondId, to: AccountId, amount: HTokenAmount) -> Result<()> {
        let router = self.router;
        self.htoken_mut(bond)?.book.transfer(router, to, amount.raw())
    }

    /// Forward pool shares from router custody to a recipient
    pub fn forward_shares(&mut self, pool: PoolId, to: AccountId, amount: ShareAmount) -> Result<()> {
        let router = self.router;
        self.pool_mut(pool)?.shares.transfer(router, to, amount.raw())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Collaborator surface: native-asset wrapper
    // ═══════════════════════════════════════════════════════════════════

    /// Wrap attached native value 1:1 into the wrapped-native token,
    /// credited to router custody
    pub fn wrap_native(&mut self, source: AccountId, amount: NativeAmount) -> Result<()> {
        if amount.is_zero() {
            return Err(Error::ZeroAmount);
        }
        let attached = self.native.get(&source).copied().unwrap_or(0);
        if attached < amount.raw() {
            return Err(Error::InsufficientNative {
                required: amount.raw(),
                attached,
            });
        }

        if attached == amount.raw() {
            self.native.remove(&source);
        } else {
            self.native.insert(source, attached - amount.raw());
        }
        let router = self.router;
        let wrapped = self.wrapped_native;
        self.token_mut(wrapped)?.mint(router, amount.raw())
    }

    /// Unwrap wrapped-native tokens from router custody 1:1 back into
    /// native value for a recipient
    pub fn unwrap_native(&mut self, recipient: AccountId, amount: CollateralAmount) -> Result<()> {
        if amount.is_zero() {
            return Err(Error::ZeroAmount);
        }
        let router = self.router;
        let wrapped = self.wrapped_native;
        self.token_mut(wrapped)?.burn(router, amount.raw())?;
        let balance = self.native.entry(recipient).or_insert(0);
        *balance = safe_add(*balance, amount.raw())?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Collaborator surface: lending ledger
    // ═══════════════════════════════════════════════════════════════════

    /// Deposit collateral staged in router custody into the ledger for
    /// `account`
    pub fn deposit_collateral(
        &mut self,
        account: AccountId,
        kind: TokenId,
        amount: CollateralAmount,
    ) -> Result<()> {
        self.ledger.deposit(account, kind, amount.raw())?;
        let router = self.router;
        let custody = self.ledger.custody();
        self.token_mut(kind)?.transfer(router, custody, amount.raw())
    }

    /// Withdraw collateral from the ledger into router custody
    pub fn withdraw_collateral(
        &mut self,
        account: AccountId,
        kind: TokenId,
        amount: CollateralAmount,
    ) -> Result<()> {
        self.ledger.withdraw(account, kind, amount.raw())?;
        let router = self.router;
        let custody = self.ledger.custody();
        self.token_mut(kind)?.transfer(custody, router, amount.raw())
    }

    /// Borrow hTokens against `account`'s collateral; proceeds land in
    /// router custody for the enclosing operation to dispose of
    pub fn borrow(&mut self, account: AccountId, bond: BondId, amount: HTokenAmount) -> Result<()> {
        self.ledger.borrow(account, bond, amount.raw())?;
        let router = self.router;
        self.htoken_mut(bond)?.mint_borrowed(router, amount.raw())
    }

    /// Repay `account`'s debt with hTokens staged in router custody
    pub fn repay(&mut self, account: AccountId, bond: BondId, amount: HTokenAmount) -> Result<()> {
        self.ledger.repay(account, bond, amount.raw())?;
        let router = self.router;
        self.htoken_mut(bond)?.burn_repaid(router, amount.raw())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Collaborator surface: hToken issuer
    // ═══════════════════════════════════════════════════════════════════

    /// Supply underlying staged in router custody to the issuer, minting
    /// hTokens 1:1 into router custody
    pub fn supply_htokens(&mut self, bond: BondId, amount: UnderlyingAmount) -> Result<HTokenAmount> {
        let now = self.now;
        let router = self.router;
        let (underlying, custody) = {
            let h = self.htoken(bond)?;
            (h.underlying(), h.custody())
        };
        self.htoken_mut(bond)?.record_supply(router, amount.raw(), now)?;
        self.token_mut(underlying)?
            .transfer(router, custody, amount.raw())?;
        Ok(HTokenAmount::new(amount.raw()))
    }

    /// Redeem hTokens staged in router custody 1:1 for underlying, at or
    /// after maturity
    pub fn redeem_htokens(&mut self, bond: BondId, amount: HTokenAmount) -> Result<UnderlyingAmount> {
        let now = self.now;
        let router = self.router;
        let (underlying, custody) = {
            let h = self.htoken(bond)?;
            (h.underlying(), h.custody())
        };
        self.htoken_mut(bond)?.record_redeem(router, amount.raw(), now)?;
        self.token_mut(underlying)?
            .transfer(custody, router, amount.raw())?;
        Ok(UnderlyingAmount::new(amount.raw()))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Collaborator surface: AMM pool
    // ═══════════════════════════════════════════════════════════════════

    /// Trade an exact input against the pool from router custody and
    /// return the realized counter-amount. Fails past maturity.
    pub fn pool_trade_exact_in(
        &mut self,
        pool: PoolId,
        asset_in: PoolAsset,
        amount_in: u64,
    ) -> Result<u64> {
        let bond = self.pool(pool)?.bond();
        self.htoken(bond)?.ensure_tradable(self.now)?;
        let amount_out = self.pool(pool)?.preview_trade_exact_in(asset_in, amount_in)?;

        self.settle_trade(pool, asset_in, amount_in, amount_out)?;
        Ok(amount_out)
    }

    /// Trade for an exact output against the pool from router custody and
    /// return the realized counter-amount paid. Fails past maturity.
    pub fn pool_trade_exact_out(
        &mut self,
        pool: PoolId,
        asset_out: PoolAsset,
        amount_out: u64,
    ) -> Result<u64> {
        let bond = self.pool(pool)?.bond();
        self.htoken(bond)?.ensure_tradable(self.now)?;
        let amount_in = self.pool(pool)?.preview_trade_exact_out(asset_out, amount_out)?;

        self.settle_trade(pool, asset_out.other(), amount_in, amount_out)?;
        Ok(amount_in)
    }

    /// Mint pool liquidity from both legs staged in router custody;
    /// shares land in router custody. Fails past maturity.
    pub fn pool_mint(
        &mut self,
        pool: PoolId,
        underlying_in: UnderlyingAmount,
        htokens_in: HTokenAmount,
    ) -> Result<ShareAmount> {
        let router = self.router;
        let (bond, underlying, custody) = {
            let p = self.pool(pool)?;
            (p.bond(), p.underlying(), p.custody())
        };
        self.htoken(bond)?.ensure_tradable(self.now)?;
        let shares = self
            .pool(pool)?
            .preview_mint_shares(underlying_in.raw(), htokens_in.raw())?;

        self.token_mut(underlying)?
            .transfer(router, custody, underlying_in.raw())?;
        self.htoken_mut(bond)?
            .book
            .transfer(router, custody, htokens_in.raw())?;
        self.pool_mut(pool)?
            .apply_mint(router, underlying_in.raw(), htokens_in.raw(), shares)?;
        Ok(ShareAmount::new(shares))
    }

    /// Burn pool shares staged in router custody; both legs land in
    /// router custody. Allowed at any time, including past maturity.
    pub fn pool_burn(
        &mut self,
        pool: PoolId,
        shares: ShareAmount,
    ) -> Result<(UnderlyingAmount, HTokenAmount)> {
        let router = self.router;
        let (bond, underlying, custody, underlying_out, htokens_out) = {
            let p = self.pool(pool)?;
            let (u, h) = p.preview_burn(shares.raw())?;
            (p.bond(), p.underlying(), p.custody(), u, h)
        };

        self.pool_mut(pool)?
            .apply_burn(router, shares.raw(), underlying_out, htokens_out)?;
        if underlying_out > 0 {
            self.token_mut(underlying)?
                .transfer(custody, router, underlying_out)?;
        }
        if htokens_out > 0 {
            self.htoken_mut(bond)?
                .book
                .transfer(custody, router, htokens_out)?;
        }
        Ok((
            UnderlyingAmount::new(underlying_out),
            HTokenAmount::new(htokens_out),
        ))
    }

    /// Record an event and keep it queryable
    pub fn record_event(&mut self, event: RouterEvent) {
        self.events.push(event);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Internal
    // ═══════════════════════════════════════════════════════════════════

    /// Move both legs of a priced trade and update the reserves
    fn settle_trade(
        &mut self,
        pool: PoolId,
        asset_in: PoolAsset,
        amount_in: u64,
        amount_out: u64,
    ) -> Result<()> {
        let router = self.router;
        let (bond, underlying, custody) = {
            let p = self.pool(pool)?;
            (p.bond(), p.underlying(), p.custody())
        };

        match asset_in {
            PoolAsset::Underlying => {
                self.token_mut(underlying)?
                    .transfer(router, custody, amount_in)?;
                self.htoken_mut(bond)?
                    .book
                    .transfer(custody, router, amount_out)?;
            }
            PoolAsset::HToken => {
                self.htoken_mut(bond)?
                    .book
                    .transfer(router, custody, amount_in)?;
                self.token_mut(underlying)?
                    .transfer(custody, router, amount_out)?;
            }
        }
        self.pool_mut(pool)?.apply_trade(asset_in, amount_in, amount_out)
    }
}
