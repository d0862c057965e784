//! Integration tests for the checkout workflow.

use std::sync::Arc;

use async_trait::async_trait;
use checkout::{
    CheckoutError, CheckoutUrls, InMemoryNotifier, InMemoryPaymentGateway, OrderBuilder,
    OrderForm, OrderStateMachine, PaymentService,
};
use common::{AddressId, CarrierId, OrderId, ProductId, UserId};
use domain::{
    Address, Carrier, Cart, CartStore, Catalog, Customer, InMemoryCatalog,
    InMemoryCustomerDirectory, InMemorySession, OrderRepository, OrderState, ProductRef,
    SessionError, SessionStore,
};
use order_store::InMemoryOrderStore;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Session whose cart can be read and written but never cleared.
#[derive(Default)]
struct UnclearableSession(InMemorySession);

#[async_trait]
impl SessionStore for UnclearableSession {
    async fn load_cart(&self) -> Result<Option<Cart>, SessionError> {
        self.0.load_cart().await
    }

    async fn store_cart(&self, cart: &Cart) -> Result<(), SessionError> {
        self.0.store_cart(cart).await
    }

    async fn clear_cart(&self) -> Result<(), SessionError> {
        Err(SessionError::new(std::io::Error::other("session backend unavailable")))
    }
}

struct TestHarness {
    builder: OrderBuilder<InMemoryOrderStore>,
    payments: PaymentService<InMemoryOrderStore>,
    state_machine: OrderStateMachine<InMemoryOrderStore>,
    store: InMemoryOrderStore,
    gateway: InMemoryPaymentGateway,
    notifier: InMemoryNotifier,
    catalog: InMemoryCatalog,
    cart: CartStore<InMemorySession>,
    customer: Customer,
    address: Address,
    carrier: Carrier,
}

impl TestHarness {
    async fn new() -> Self {
        let store = InMemoryOrderStore::new();
        let gateway = InMemoryPaymentGateway::new();
        let notifier = InMemoryNotifier::new();
        let directory = InMemoryCustomerDirectory::new();
        let catalog = InMemoryCatalog::with_products([
            ProductRef::new("SHIRT-A", "Shirt A", dec!(10.00), dec!(20), "shirt-a.jpg"),
            ProductRef::new("MUG-B", "Mug B", dec!(7.50), dec!(10), "mug-b.jpg"),
        ]);

        let customer = Customer {
            id: UserId::new(),
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        };
        let address = Address {
            id: AddressId::new(),
            user_id: customer.id,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            street: "12 Analytical Row".into(),
            postal_code: "75001".into(),
            city: "Paris".into(),
            country: "France".into(),
            phone: "0102030405".into(),
        };
        let carrier = Carrier {
            id: CarrierId::new(),
            name: "Colissimo".into(),
            description: "48h".into(),
            price: dec!(5.00),
        };
        directory.add_customer(customer.clone()).await;
        directory.add_address(address.clone()).await;
        directory.add_carrier(carrier.clone()).await;

        let directory = Arc::new(directory);
        let state_machine =
            OrderStateMachine::new(store.clone(), directory.clone(), Arc::new(notifier.clone()));
        let builder = OrderBuilder::new(store.clone(), directory);
        let payments = PaymentService::new(
            store.clone(),
            Arc::new(gateway.clone()),
            state_machine.clone(),
            CheckoutUrls::new("http://shop.test"),
        );

        Self {
            builder,
            payments,
            state_machine,
            store,
            gateway,
            notifier,
            catalog,
            cart: CartStore::new(InMemorySession::new()),
            customer,
            address,
            carrier,
        }
    }

    async fn add_to_cart(&self, id: &str) {
        let product = self.catalog.find_product(&ProductId::new(id)).await.unwrap();
        self.cart.add(product).await.unwrap();
    }

    fn form(&self) -> OrderForm {
        OrderForm {
            address_id: self.address.id,
            carrier_id: self.carrier.id,
            submission_token: None,
        }
    }

    async fn place_order(&self, form: &OrderForm) -> Result<domain::Order, CheckoutError> {
        let cart = self.cart.get_cart().await.unwrap();
        self.builder.place_order(&self.customer, &cart, form).await
    }

    /// Places and pays an order for two shirts.
    async fn paid_order(&self) -> OrderId {
        self.add_to_cart("SHIRT-A").await;
        self.add_to_cart("SHIRT-A").await;
        let order = self.place_order(&self.form()).await.unwrap();
        let session = self
            .payments
            .start_payment(order.id(), &self.customer)
            .await
            .unwrap();
        self.payments
            .confirm_payment(&session.session_id, self.customer.id, &self.cart)
            .await
            .unwrap();
        order.id()
    }
}

mod placing_orders {
    use super::*;

    #[tokio::test]
    async fn order_matches_reference_totals_and_keeps_cart() {
        let h = TestHarness::new().await;
        h.add_to_cart("SHIRT-A").await;
        h.add_to_cart("SHIRT-A").await;

        let order = h.place_order(&h.form()).await.unwrap();

        assert_eq!(order.state(), OrderState::PendingPayment);
        assert_eq!(order.subtotal_with_tax(), dec!(24.00));
        assert_eq!(order.total_with_tax(), dec!(29.00));
        assert_eq!(order.carrier_name(), "Colissimo");
        assert_eq!(h.store.order_count().await, 1);
        assert_eq!(h.cart.full_quantity().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn repricing_after_creation_does_not_change_order() {
        let h = TestHarness::new().await;
        h.add_to_cart("SHIRT-A").await;
        h.add_to_cart("SHIRT-A").await;
        let order = h.place_order(&h.form()).await.unwrap();

        h.catalog
            .set_price(&ProductId::new("SHIRT-A"), dec!(50.00))
            .await;

        let stored = h.store.find(order.id()).await.unwrap().unwrap();
        assert_eq!(stored.total_with_tax(), dec!(29.00));
    }

    #[tokio::test]
    async fn foreign_address_is_rejected() {
        let h = TestHarness::new().await;
        h.add_to_cart("MUG-B").await;
        let form = OrderForm {
            address_id: AddressId::new(),
            ..h.form()
        };

        let result = h.place_order(&form).await;

        assert!(matches!(result, Err(CheckoutError::InvalidAddress(_))));
        assert_eq!(h.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_carrier_is_rejected() {
        let h = TestHarness::new().await;
        h.add_to_cart("MUG-B").await;
        let form = OrderForm {
            carrier_id: CarrierId::new(),
            ..h.form()
        };

        let result = h.place_order(&form).await;

        assert!(matches!(result, Err(CheckoutError::UnknownCarrier(_))));
        assert_eq!(h.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let h = TestHarness::new().await;

        let result = h.place_order(&h.form()).await;

        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert_eq!(h.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn customer_without_address_is_sent_to_address_form() {
        let h = TestHarness::new().await;
        let stranger = UserId::new();

        let result = h.builder.delivery_options(stranger).await;
        assert!(matches!(result, Err(CheckoutError::NoSavedAddress)));

        let options = h.builder.delivery_options(h.customer.id).await.unwrap();
        assert_eq!(options.addresses.len(), 1);
        assert_eq!(options.carriers.len(), 1);
    }

    #[tokio::test]
    async fn same_submission_token_creates_one_order() {
        let h = TestHarness::new().await;
        h.add_to_cart("SHIRT-A").await;
        let form = OrderForm {
            submission_token: Some(Uuid::new_v4()),
            ..h.form()
        };

        let first = h.place_order(&form).await.unwrap();
        let second = h.place_order(&form).await.unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(h.store.order_count().await, 1);
    }
}

mod payment {
    use super::*;

    #[tokio::test]
    async fn session_request_carries_lines_and_carrier() {
        let h = TestHarness::new().await;
        h.add_to_cart("SHIRT-A").await;
        h.add_to_cart("SHIRT-A").await;
        let order = h.place_order(&h.form()).await.unwrap();

        let session = h
            .payments
            .start_payment(order.id(), &h.customer)
            .await
            .unwrap();
        let request = h.gateway.request_for(&session.session_id).await.unwrap();

        assert_eq!(request.customer_email, "ada@example.com");
        assert_eq!(request.line_items.len(), 2);
        assert_eq!(request.line_items[0].unit_amount_minor, 1200);
        assert_eq!(request.line_items[0].quantity, 2);
        assert_eq!(request.line_items[0].currency, "eur");
        assert_eq!(
            request.line_items[0].product_images,
            vec!["http://shop.test/uploads/shirt-a.jpg".to_string()]
        );
        assert_eq!(request.line_items[1].product_name, "Carrier: Colissimo");
        assert_eq!(request.line_items[1].unit_amount_minor, 500);
        assert_eq!(request.success_url, "http://shop.test/order/thanks/{SESSION_ID}");
        assert_eq!(request.cancel_url, "http://shop.test/cart/cancelled");

        let stored = h.store.find(order.id()).await.unwrap().unwrap();
        assert_eq!(stored.payment_session_id(), Some(session.session_id.as_str()));
    }

    #[tokio::test]
    async fn gateway_failure_leaves_order_retryable() {
        let h = TestHarness::new().await;
        h.add_to_cart("MUG-B").await;
        let order = h.place_order(&h.form()).await.unwrap();

        h.gateway.set_fail(true).await;
        let result = h.payments.start_payment(order.id(), &h.customer).await;
        assert!(matches!(result, Err(CheckoutError::Gateway(_))));

        let stored = h.store.find(order.id()).await.unwrap().unwrap();
        assert_eq!(stored.state(), OrderState::PendingPayment);
        assert!(stored.payment_session_id().is_none());

        h.gateway.set_fail(false).await;
        let session = h
            .payments
            .start_payment(order.id(), &h.customer)
            .await
            .unwrap();
        let stored = h.store.find(order.id()).await.unwrap().unwrap();
        assert_eq!(stored.payment_session_id(), Some(session.session_id.as_str()));
    }

    #[tokio::test]
    async fn new_attempt_replaces_session_id() {
        let h = TestHarness::new().await;
        h.add_to_cart("MUG-B").await;
        let order = h.place_order(&h.form()).await.unwrap();

        let first = h.payments.start_payment(order.id(), &h.customer).await.unwrap();
        let second = h.payments.start_payment(order.id(), &h.customer).await.unwrap();

        assert_ne!(first.session_id, second.session_id);
        assert!(h.store.find_by_payment_session(&first.session_id).await.unwrap().is_none());
        assert!(h.store.find_by_payment_session(&second.session_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn other_customers_cannot_start_payment() {
        let h = TestHarness::new().await;
        h.add_to_cart("MUG-B").await;
        let order = h.place_order(&h.form()).await.unwrap();
        let intruder = Customer {
            id: UserId::new(),
            ..h.customer.clone()
        };

        let result = h.payments.start_payment(order.id(), &intruder).await;

        assert!(matches!(result, Err(CheckoutError::OrderNotFound(_))));
        assert_eq!(h.gateway.session_count().await, 0);
    }

    #[tokio::test]
    async fn paid_order_cannot_be_paid_again() {
        let h = TestHarness::new().await;
        let order_id = h.paid_order().await;

        let result = h.payments.start_payment(order_id, &h.customer).await;

        assert!(matches!(
            result,
            Err(CheckoutError::OrderNotPayable {
                state: OrderState::Paid,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn confirmation_is_idempotent_and_clears_cart_once() {
        let h = TestHarness::new().await;
        h.add_to_cart("SHIRT-A").await;
        let order = h.place_order(&h.form()).await.unwrap();
        let session = h.payments.start_payment(order.id(), &h.customer).await.unwrap();

        let first = h
            .payments
            .confirm_payment(&session.session_id, h.customer.id, &h.cart)
            .await
            .unwrap();
        assert!(first.newly_paid);
        assert_eq!(first.order.state(), OrderState::Paid);
        assert!(h.cart.get_cart().await.unwrap().is_empty());

        // The customer fills the cart again before revisiting the success page
        h.add_to_cart("MUG-B").await;
        let second = h
            .payments
            .confirm_payment(&session.session_id, h.customer.id, &h.cart)
            .await
            .unwrap();

        assert!(!second.newly_paid);
        assert_eq!(second.order.state(), OrderState::Paid);
        assert_eq!(h.cart.full_quantity().await.unwrap(), 1);
        assert!(h.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn confirmation_succeeds_when_cart_cannot_be_cleared() {
        let h = TestHarness::new().await;
        h.add_to_cart("SHIRT-A").await;
        let order = h.place_order(&h.form()).await.unwrap();
        let session = h.payments.start_payment(order.id(), &h.customer).await.unwrap();

        let cart = CartStore::new(UnclearableSession::default());
        let shirt = h.catalog.find_product(&ProductId::new("SHIRT-A")).await.unwrap();
        cart.add(shirt).await.unwrap();

        let confirmation = h
            .payments
            .confirm_payment(&session.session_id, h.customer.id, &cart)
            .await
            .unwrap();

        assert!(confirmation.newly_paid);
        assert_eq!(confirmation.order.state(), OrderState::Paid);
        let stored = h.store.find(order.id()).await.unwrap().unwrap();
        assert_eq!(stored.state(), OrderState::Paid);
        // Left over, not lost
        assert_eq!(cart.full_quantity().await.unwrap(), 1);

        let again = h
            .payments
            .confirm_payment(&session.session_id, h.customer.id, &cart)
            .await
            .unwrap();
        assert!(!again.newly_paid);
    }

    #[tokio::test]
    async fn confirmation_by_other_user_is_not_found() {
        let h = TestHarness::new().await;
        h.add_to_cart("SHIRT-A").await;
        let order = h.place_order(&h.form()).await.unwrap();
        let session = h.payments.start_payment(order.id(), &h.customer).await.unwrap();

        let result = h
            .payments
            .confirm_payment(&session.session_id, UserId::new(), &h.cart)
            .await;
        assert!(matches!(result, Err(CheckoutError::PaymentSessionNotFound(_))));

        let unknown = h
            .payments
            .confirm_payment("cs_unknown", h.customer.id, &h.cart)
            .await;
        assert!(matches!(unknown, Err(CheckoutError::PaymentSessionNotFound(_))));

        let stored = h.store.find(order.id()).await.unwrap().unwrap();
        assert_eq!(stored.state(), OrderState::PendingPayment);
    }
}

mod operator_transitions {
    use super::*;

    #[tokio::test]
    async fn preparing_sends_exactly_one_notification() {
        let h = TestHarness::new().await;
        let order_id = h.paid_order().await;

        let outcome = h
            .state_machine
            .transition(order_id, OrderState::Preparing)
            .await
            .unwrap();

        assert!(outcome.changed);
        assert!(outcome.notified);
        let sent = h.notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].template, "order_state_3.html");
        assert_eq!(sent[0].subject, "Your order is being prepared");
        assert_eq!(sent[0].to_email, "ada@example.com");
        assert_eq!(sent[0].vars["firstname"], "Ada");
        assert_eq!(sent[0].vars["order_id"], order_id.to_string());
    }

    #[tokio::test]
    async fn invalid_transition_is_rejected_without_notification() {
        let h = TestHarness::new().await;
        let order_id = h.paid_order().await;

        let result = h
            .state_machine
            .transition(order_id, OrderState::Shipped)
            .await;

        assert!(result.as_ref().is_err_and(CheckoutError::is_invalid_transition));
        let stored = h.store.find(order_id).await.unwrap().unwrap();
        assert_eq!(stored.state(), OrderState::Paid);
        assert!(h.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn notifier_failure_keeps_transition() {
        let h = TestHarness::new().await;
        let order_id = h.paid_order().await;
        h.notifier.set_fail(true).await;

        let outcome = h
            .state_machine
            .transition(order_id, OrderState::Cancelled)
            .await
            .unwrap();

        assert!(outcome.changed);
        assert!(!outcome.notified);
        let stored = h.store.find(order_id).await.unwrap().unwrap();
        assert_eq!(stored.state(), OrderState::Cancelled);
    }

    #[tokio::test]
    async fn states_only_move_forward_through_lifecycle() {
        let h = TestHarness::new().await;
        let order_id = h.paid_order().await;

        let mut last = OrderState::Paid.code();
        for target in [OrderState::Preparing, OrderState::Shipped] {
            let outcome = h.state_machine.transition(order_id, target).await.unwrap();
            assert!(outcome.order.state().code() > last);
            last = outcome.order.state().code();
        }

        assert!(
            h.state_machine
                .transition(order_id, OrderState::Cancelled)
                .await
                .is_err()
        );
        assert_eq!(h.notifier.sent().await.len(), 2);
    }
}
