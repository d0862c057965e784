//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::{Cart, CartEntry};
use crate::customer::{Address, Carrier};
use crate::pricing::{self, PricedLine};

use super::{OrderError, OrderState};

/// Frozen copy of one product at order-creation time.
///
/// Later catalog changes never reach an existing line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_name: String,
    pub product_illustration: String,
    pub quantity: u32,
    /// Unit price before tax.
    pub unit_price: Decimal,
    pub tax_rate_percent: Decimal,
}

impl OrderLine {
    /// Tax-inclusive unit price.
    pub fn unit_price_with_tax(&self) -> Decimal {
        pricing::unit_price_with_tax(self.unit_price, self.tax_rate_percent)
    }

    /// Tax-inclusive line total.
    pub fn total_with_tax(&self) -> Decimal {
        pricing::line_total(self)
    }
}

impl From<&CartEntry> for OrderLine {
    fn from(entry: &CartEntry) -> Self {
        Self {
            product_name: entry.product.name.clone(),
            product_illustration: entry.product.illustration.clone(),
            quantity: entry.quantity,
            unit_price: entry.product.unit_price,
            tax_rate_percent: entry.product.tax_rate_percent,
        }
    }
}

impl PricedLine for OrderLine {
    fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    fn tax_rate_percent(&self) -> Decimal {
        self.tax_rate_percent
    }

    fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Order aggregate root.
///
/// Owns its lines by composition. Created once in `PendingPayment`; afterwards
/// only the state and the payment session id change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    state: OrderState,
    carrier_name: String,
    carrier_price: Decimal,
    delivery: String,
    payment_session_id: Option<String>,
    submission_token: Option<Uuid>,
    lines: Vec<OrderLine>,
}

/// Everything needed to place an order, as gathered from the checkout form.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub address: &'a Address,
    pub carrier: &'a Carrier,
    pub cart: &'a Cart,
    pub submission_token: Option<Uuid>,
}

impl Order {
    /// Places a new order from a cart snapshot.
    ///
    /// Copies the carrier, renders the delivery address and snapshots every
    /// cart entry. Fails if the cart is empty.
    pub fn place(new: NewOrder<'_>) -> Result<Self, OrderError> {
        if new.cart.is_empty() {
            return Err(OrderError::NoLines);
        }
        if new.address.user_id != new.user_id {
            return Err(OrderError::AddressNotOwned);
        }

        let mut lines: Vec<OrderLine> = new.cart.entries().map(OrderLine::from).collect();
        lines.sort_by(|a, b| a.product_name.cmp(&b.product_name));

        Ok(Self {
            id: OrderId::new(),
            user_id: new.user_id,
            created_at: Utc::now(),
            state: OrderState::PendingPayment,
            carrier_name: new.carrier.name.clone(),
            carrier_price: new.carrier.price,
            delivery: new.address.delivery_text(),
            payment_session_id: None,
            submission_token: new.submission_token,
            lines,
        })
    }

    /// Rebuilds an order from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: OrderId,
        user_id: UserId,
        created_at: DateTime<Utc>,
        state: OrderState,
        carrier_name: String,
        carrier_price: Decimal,
        delivery: String,
        payment_session_id: Option<String>,
        submission_token: Option<Uuid>,
        lines: Vec<OrderLine>,
    ) -> Self {
        Self {
            id,
            user_id,
            created_at,
            state,
            carrier_name,
            carrier_price,
            delivery,
            payment_session_id,
            submission_token,
            lines,
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the owning customer.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the current state.
    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn carrier_name(&self) -> &str {
        &self.carrier_name
    }

    pub fn carrier_price(&self) -> Decimal {
        self.carrier_price
    }

    /// Delivery address snapshot.
    pub fn delivery(&self) -> &str {
        &self.delivery
    }

    /// Checkout session of the latest payment attempt.
    pub fn payment_session_id(&self) -> Option<&str> {
        self.payment_session_id.as_deref()
    }

    pub fn submission_token(&self) -> Option<Uuid> {
        self.submission_token
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Tax-inclusive sum of the lines, carrier excluded.
    pub fn subtotal_with_tax(&self) -> Decimal {
        pricing::subtotal_with_tax(&self.lines)
    }

    /// Tax part of the lines.
    pub fn tax_total(&self) -> Decimal {
        pricing::tax_total(&self.lines)
    }

    /// Amount the customer pays: lines with tax plus carrier.
    pub fn total_with_tax(&self) -> Decimal {
        pricing::grand_total(&self.lines, self.carrier_price)
    }

    /// Returns true if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

// State changes
impl Order {
    /// Records the checkout session of a new payment attempt.
    ///
    /// Replaces the id of any earlier attempt.
    pub fn attach_payment_session(&mut self, session_id: impl Into<String>) -> Result<(), OrderError> {
        if self.state != OrderState::PendingPayment {
            return Err(OrderError::NotAwaitingPayment { state: self.state });
        }
        self.payment_session_id = Some(session_id.into());
        Ok(())
    }

    /// Moves a pending order to `Paid`.
    ///
    /// Returns false, without changing anything, if the order is not pending.
    pub fn confirm_payment(&mut self) -> bool {
        if !self.state.can_confirm_payment() {
            return false;
        }
        self.state = OrderState::Paid;
        true
    }

    /// Overwrites the state without checking the transition.
    ///
    /// Storage backends use this to apply a compare-and-set they already
    /// validated.
    pub fn set_state(&mut self, state: OrderState) {
        self.state = state;
    }

    /// Applies an operator transition.
    ///
    /// Returns false when the order already is in `target`.
    pub fn transition_to(&mut self, target: OrderState) -> Result<bool, OrderError> {
        if self.state == target {
            return Ok(false);
        }
        if !self.state.can_transition_to(target) {
            return Err(OrderError::InvalidStateTransition {
                from: self.state,
                to: target,
            });
        }
        self.state = target;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use common::{AddressId, CarrierId};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::catalog::ProductRef;

    fn address(user_id: UserId) -> Address {
        Address {
            id: AddressId::new(),
            user_id,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            street: "12 Analytical Row".into(),
            postal_code: "75001".into(),
            city: "Paris".into(),
            country: "France".into(),
            phone: "0102030405".into(),
        }
    }

    fn carrier() -> Carrier {
        Carrier {
            id: CarrierId::new(),
            name: "Colissimo".into(),
            description: String::new(),
            price: dec!(5.00),
        }
    }

    fn shirt_cart(qty: u32) -> Cart {
        let mut cart = Cart::new();
        for _ in 0..qty {
            cart.add(ProductRef::new(
                "SHIRT-A",
                "Shirt A",
                dec!(10.00),
                dec!(20),
                "shirt-a.jpg",
            ));
        }
        cart
    }

    fn placed(user_id: UserId, cart: &Cart) -> Order {
        let address = address(user_id);
        let carrier = carrier();
        Order::place(NewOrder {
            user_id,
            address: &address,
            carrier: &carrier,
            cart,
            submission_token: None,
        })
        .unwrap()
    }

    #[test]
    fn test_place_snapshots_cart_and_carrier() {
        let user_id = UserId::new();
        let order = placed(user_id, &shirt_cart(2));

        assert_eq!(order.state(), OrderState::PendingPayment);
        assert_eq!(order.user_id(), user_id);
        assert_eq!(order.carrier_name(), "Colissimo");
        assert_eq!(order.carrier_price(), dec!(5.00));
        assert!(order.delivery().starts_with("Ada Lovelace\n"));
        assert!(order.payment_session_id().is_none());

        assert_eq!(order.lines().len(), 1);
        let line = &order.lines()[0];
        assert_eq!(line.product_name, "Shirt A");
        assert_eq!(line.product_illustration, "shirt-a.jpg");
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price_with_tax(), dec!(12.00));
    }

    #[test]
    fn test_totals_reference_scenario() {
        let order = placed(UserId::new(), &shirt_cart(2));

        assert_eq!(order.subtotal_with_tax(), dec!(24.00));
        assert_eq!(order.tax_total(), dec!(4.00));
        assert_eq!(order.total_with_tax(), dec!(29.00));
    }

    #[test]
    fn test_place_rejects_empty_cart() {
        let user_id = UserId::new();
        let address = address(user_id);
        let carrier = carrier();
        let result = Order::place(NewOrder {
            user_id,
            address: &address,
            carrier: &carrier,
            cart: &Cart::new(),
            submission_token: None,
        });
        assert!(matches!(result, Err(OrderError::NoLines)));
    }

    #[test]
    fn test_place_rejects_foreign_address() {
        let address = address(UserId::new());
        let carrier = carrier();
        let result = Order::place(NewOrder {
            user_id: UserId::new(),
            address: &address,
            carrier: &carrier,
            cart: &shirt_cart(1),
            submission_token: None,
        });
        assert!(matches!(result, Err(OrderError::AddressNotOwned)));
    }

    #[test]
    fn test_lines_do_not_follow_cart_changes() {
        let mut cart = shirt_cart(2);
        let order = placed(UserId::new(), &cart);

        cart.add(ProductRef::new(
            "SHIRT-A",
            "Shirt A",
            dec!(99.00),
            dec!(20),
            "shirt-a.jpg",
        ));

        assert_eq!(order.lines()[0].quantity, 2);
        assert_eq!(order.total_with_tax(), dec!(29.00));
    }

    #[test]
    fn test_confirm_payment_only_once() {
        let mut order = placed(UserId::new(), &shirt_cart(1));

        assert!(order.confirm_payment());
        assert_eq!(order.state(), OrderState::Paid);
        assert!(!order.confirm_payment());
        assert_eq!(order.state(), OrderState::Paid);
    }

    #[test]
    fn test_payment_session_only_while_pending() {
        let mut order = placed(UserId::new(), &shirt_cart(1));

        order.attach_payment_session("cs_1").unwrap();
        order.attach_payment_session("cs_2").unwrap();
        assert_eq!(order.payment_session_id(), Some("cs_2"));

        order.confirm_payment();
        let result = order.attach_payment_session("cs_3");
        assert!(matches!(
            result,
            Err(OrderError::NotAwaitingPayment {
                state: OrderState::Paid
            })
        ));
        assert_eq!(order.payment_session_id(), Some("cs_2"));
    }

    #[test]
    fn test_operator_transitions() {
        let mut order = placed(UserId::new(), &shirt_cart(1));
        order.confirm_payment();

        assert_eq!(order.transition_to(OrderState::Preparing).unwrap(), true);
        assert_eq!(order.transition_to(OrderState::Preparing).unwrap(), false);
        assert_eq!(order.transition_to(OrderState::Shipped).unwrap(), true);

        let result = order.transition_to(OrderState::PendingPayment);
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition {
                from: OrderState::Shipped,
                to: OrderState::PendingPayment
            })
        ));
        assert!(order.is_terminal());
    }
}
