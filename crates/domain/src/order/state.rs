//! Order state machine.

use serde::{Deserialize, Serialize};

/// The state of an order in its lifecycle.
///
/// States carry stable integer codes used in storage and on the operator API.
///
/// State transitions:
/// ```text
/// PendingPayment(1) ──► Paid(2) ──► Preparing(3) ──► Shipped(4)
///        │                 │             │
///        └─────────────────┴─────────────┴──► Cancelled(5)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "i16", into = "i16")]
pub enum OrderState {
    /// Order recorded, waiting for the payment gateway.
    #[default]
    PendingPayment,

    /// Payment confirmed by the success redirect.
    Paid,

    /// Operator is preparing the parcel.
    Preparing,

    /// Handed over to the carrier (terminal state).
    Shipped,

    /// Order was cancelled (terminal state).
    Cancelled,
}

/// Label and email template associated with an operator-driven state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateNotice {
    pub label: &'static str,
    pub email_subject: &'static str,
    pub email_template: &'static str,
}

/// Error returned for an unknown state code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order state code: {0}")]
pub struct UnknownStateCode(pub i16);

impl OrderState {
    /// States listed on the customer's account page.
    pub const IN_PROGRESS: [OrderState; 2] = [OrderState::Paid, OrderState::Preparing];

    /// Returns the stable integer code of the state.
    pub fn code(&self) -> i16 {
        match self {
            OrderState::PendingPayment => 1,
            OrderState::Paid => 2,
            OrderState::Preparing => 3,
            OrderState::Shipped => 4,
            OrderState::Cancelled => 5,
        }
    }

    /// Looks up a state by its integer code.
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(OrderState::PendingPayment),
            2 => Some(OrderState::Paid),
            3 => Some(OrderState::Preparing),
            4 => Some(OrderState::Shipped),
            5 => Some(OrderState::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the payment callback may move this order to `Paid`.
    pub fn can_confirm_payment(&self) -> bool {
        matches!(self, OrderState::PendingPayment)
    }

    /// Returns true if an operator may move an order from this state to `target`.
    ///
    /// `Paid` is never an operator target; it is reached only through the
    /// payment callback.
    pub fn can_transition_to(&self, target: OrderState) -> bool {
        match target {
            OrderState::Preparing => matches!(self, OrderState::Paid),
            OrderState::Shipped => matches!(self, OrderState::Preparing),
            OrderState::Cancelled => !self.is_terminal(),
            OrderState::PendingPayment | OrderState::Paid => false,
        }
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Shipped | OrderState::Cancelled)
    }

    /// Label and email for operator-driven states; `None` otherwise.
    pub fn notice(&self) -> Option<StateNotice> {
        match self {
            OrderState::Preparing => Some(StateNotice {
                label: "Being prepared",
                email_subject: "Your order is being prepared",
                email_template: "order_state_3.html",
            }),
            OrderState::Shipped => Some(StateNotice {
                label: "Shipped",
                email_subject: "Your order has shipped",
                email_template: "order_state_4.html",
            }),
            OrderState::Cancelled => Some(StateNotice {
                label: "Cancelled",
                email_subject: "Your order has been cancelled",
                email_template: "order_state_5.html",
            }),
            OrderState::PendingPayment | OrderState::Paid => None,
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::PendingPayment => "PendingPayment",
            OrderState::Paid => "Paid",
            OrderState::Preparing => "Preparing",
            OrderState::Shipped => "Shipped",
            OrderState::Cancelled => "Cancelled",
        }
    }
}

impl TryFrom<i16> for OrderState {
    type Error = UnknownStateCode;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        OrderState::from_code(code).ok_or(UnknownStateCode(code))
    }
}

impl From<OrderState> for i16 {
    fn from(state: OrderState) -> Self {
        state.code()
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
