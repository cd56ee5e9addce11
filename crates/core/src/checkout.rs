//! Payment-completion state machine.
//!
//! ```text
//!   Polling ──PaymentSettled──▶ CreatingOrder ──OrderCreated──▶ Done
//!      │                            │
//!      └──PaymentFailed──▶ Failed ◀─┘ OrderRejected
//! ```
//!
//! Cash-on-delivery checkouts start in `CreatingOrder`. The storefront's
//! checkout flow drives these transitions; the machine itself only decides
//! which step may follow which.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::PaymentMethod;

/// Where a checkout failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// The payment status check failed or reported an unsettled payment.
    PaymentCheck,
    /// The backend did not accept the order.
    OrderCreation,
}

/// Current phase of a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    Polling,
    CreatingOrder,
    Done,
    Failed(FailureStage),
}

/// Something that happened while driving a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutEvent {
    PaymentSettled,
    PaymentFailed,
    OrderCreated,
    OrderRejected,
}

/// An event arrived in a phase that does not accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("checkout event {event:?} is not valid in phase {phase:?}")]
pub struct InvalidTransition {
    pub phase: CheckoutPhase,
    pub event: CheckoutEvent,
}

impl CheckoutPhase {
    /// Entry phase for a payment method.
    #[must_use]
    pub const fn start(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Card => Self::Polling,
            PaymentMethod::CashOnDelivery => Self::CreatingOrder,
        }
    }

    /// Apply an event.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when `event` cannot happen in this phase,
    /// including any event after a terminal phase.
    pub const fn advance(self, event: CheckoutEvent) -> Result<Self, InvalidTransition> {
        match (self, event) {
            (Self::Polling, CheckoutEvent::PaymentSettled) => Ok(Self::CreatingOrder),
            (Self::Polling, CheckoutEvent::PaymentFailed) => {
                Ok(Self::Failed(FailureStage::PaymentCheck))
            }
            (Self::CreatingOrder, CheckoutEvent::OrderCreated) => Ok(Self::Done),
            (Self::CreatingOrder, CheckoutEvent::OrderRejected) => {
                Ok(Self::Failed(FailureStage::OrderCreation))
            }
            (phase, event) => Err(InvalidTransition { phase, event }),
        }
    }

    /// Whether no further event is accepted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

/// Client-generated key sent with order creation so the backend can drop
/// duplicate submissions of the same checkout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// A fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The key as sent in the `Idempotency-Key` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let phase = CheckoutPhase::start(PaymentMethod::Card);
        assert_eq!(phase, CheckoutPhase::Polling);

        let phase = phase.advance(CheckoutEvent::PaymentSettled).unwrap();
        assert_eq!(phase, CheckoutPhase::CreatingOrder);

        let phase = phase.advance(CheckoutEvent::OrderCreated).unwrap();
        assert_eq!(phase, CheckoutPhase::Done);
        assert!(phase.is_terminal());
    }

    #[test]
    fn test_failed_poll_never_reaches_order_creation() {
        let phase = CheckoutPhase::Polling
            .advance(CheckoutEvent::PaymentFailed)
            .unwrap();
        assert_eq!(phase, CheckoutPhase::Failed(FailureStage::PaymentCheck));
        assert!(phase.advance(CheckoutEvent::OrderCreated).is_err());
    }

    #[test]
    fn test_cash_on_delivery_skips_polling() {
        let phase = CheckoutPhase::start(PaymentMethod::CashOnDelivery);
        assert_eq!(phase, CheckoutPhase::CreatingOrder);
        assert!(phase.advance(CheckoutEvent::PaymentSettled).is_err());
        assert_eq!(
            phase.advance(CheckoutEvent::OrderRejected).unwrap(),
            CheckoutPhase::Failed(FailureStage::OrderCreation)
        );
    }

    #[test]
    fn test_done_accepts_nothing() {
        for event in [
            CheckoutEvent::PaymentSettled,
            CheckoutEvent::PaymentFailed,
            CheckoutEvent::OrderCreated,
            CheckoutEvent::OrderRejected,
        ] {
            assert!(CheckoutPhase::Done.advance(event).is_err());
        }
    }

    #[test]
    fn test_idempotency_keys_are_unique() {
        assert_ne!(IdempotencyKey::generate(), IdempotencyKey::generate());
    }
}
