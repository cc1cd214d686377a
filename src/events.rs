//! Router notifications.
//!
//! Emitted on successful completion of the two borrow-and-trade
//! composites so off-chain observers can reconcile the borrowed amount
//! with the traded counter-amount. Recorded in the market's event log and
//! mirrored through structured logging.

use serde::{Deserialize, Serialize};

use crate::core::amount::{HTokenAmount, UnderlyingAmount};
use crate::core::id::{AccountId, PoolId};

/// All router event types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouterEvent {
    /// hTokens were borrowed and sold for underlying
    BorrowAndSellHTokens(BorrowAndSellHTokensEvent),
    /// hTokens were borrowed to buy an exact underlying amount
    BorrowAndBuyUnderlying(BorrowAndBuyUnderlyingEvent),
}

impl RouterEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::BorrowAndSellHTokens(_) => "BorrowAndSellHTokens",
            Self::BorrowAndBuyUnderlying(_) => "BorrowAndBuyUnderlying",
        }
    }

    /// The caller the event belongs to
    pub fn caller(&self) -> AccountId {
        match self {
            Self::BorrowAndSellHTokens(e) => e.caller,
            Self::BorrowAndBuyUnderlying(e) => e.caller,
        }
    }
}

/// Event emitted when borrowed hTokens are sold for underlying
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowAndSellHTokensEvent {
    /// Caller identity
    pub caller: AccountId,
    /// Pool the trade executed on
    pub pool: PoolId,
    /// hTokens borrowed (and sold in full)
    pub borrowed: HTokenAmount,
    /// Underlying proceeds forwarded to the caller
    pub proceeds: UnderlyingAmount,
}

/// Event emitted when hTokens are borrowed to buy exact underlying
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowAndBuyUnderlyingEvent {
    /// Caller identity
    pub caller: AccountId,
    /// Pool the trade executed on
    pub pool: PoolId,
    /// hTokens borrowed (the realized trade cost)
    pub borrowed: HTokenAmount,
    /// Underlying bought and forwarded to the caller
    pub bought: UnderlyingAmount,
}

/// Collection of events from completed operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<RouterEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn push(&mut self, event: RouterEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[RouterEvent] {
        &self.events
    }

    /// Get events of a specific type
    pub fn filter_by_type(&self, event_type: &str) -> Vec<&RouterEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get the number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.push(RouterEvent::BorrowAndSellHTokens(BorrowAndSellHTokensEvent {
            caller: AccountId::named("alice"),
            pool: PoolId::new(0),
            borrowed: HTokenAmount::new(500),
            proceeds: UnderlyingAmount::new(495),
        }));

        assert_eq!(log.len(), 1);
        assert_eq!(log.filter_by_type("BorrowAndSellHTokens").len(), 1);
        assert_eq!(log.filter_by_type("BorrowAndBuyUnderlying").len(), 0);
    }

    #[test]
    fn test_event_serde_round_trip() {
        let event = RouterEvent::BorrowAndBuyUnderlying(BorrowAndBuyUnderlyingEvent {
            caller: AccountId::named("bob"),
            pool: PoolId::new(1),
            borrowed: HTokenAmount::new(1_010),
            bought: UnderlyingAmount::new(1_000),
        });

        let json = serde_json::to_string(&event).unwrap();
        let back: RouterEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
