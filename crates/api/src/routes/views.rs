//! JSON representations of carts and orders.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use domain::{Cart, Order, OrderLine, pricing};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub illustration: String,
    pub quantity: u32,
    pub unit_price_with_tax: Decimal,
    pub total_with_tax: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub full_quantity: u64,
    pub total_with_tax: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

impl CartView {
    pub fn new(cart: &Cart) -> Self {
        let mut lines: Vec<CartLineView> = cart
            .entries()
            .map(|entry| CartLineView {
                product_id: entry.product.id.clone(),
                name: entry.product.name.clone(),
                illustration: entry.product.illustration.clone(),
                quantity: entry.quantity,
                unit_price_with_tax: entry.product.price_with_tax(),
                total_with_tax: pricing::line_total(entry),
            })
            .collect();
        lines.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            lines,
            full_quantity: cart.full_quantity(),
            total_with_tax: cart.total_with_tax(),
            notice: None,
        }
    }

    pub fn with_notice(mut self, notice: &'static str) -> Self {
        self.notice = Some(notice);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct OrderLineView {
    pub product_name: String,
    pub product_illustration: String,
    pub quantity: u32,
    pub unit_price_with_tax: Decimal,
    pub total_with_tax: Decimal,
}

impl From<&OrderLine> for OrderLineView {
    fn from(line: &OrderLine) -> Self {
        Self {
            product_name: line.product_name.clone(),
            product_illustration: line.product_illustration.clone(),
            quantity: line.quantity,
            unit_price_with_tax: line.unit_price_with_tax(),
            total_with_tax: line.total_with_tax(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub state: i16,
    pub state_label: &'static str,
    pub carrier_name: String,
    pub carrier_price: Decimal,
    pub delivery: String,
    pub lines: Vec<OrderLineView>,
    pub subtotal_with_tax: Decimal,
    pub tax_total: Decimal,
    pub total_with_tax: Decimal,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        let state = order.state();
        Self {
            id: order.id(),
            created_at: order.created_at(),
            state: state.code(),
            state_label: state.notice().map_or(state.as_str(), |n| n.label),
            carrier_name: order.carrier_name().to_string(),
            carrier_price: order.carrier_price(),
            delivery: order.delivery().to_string(),
            lines: order.lines().iter().map(OrderLineView::from).collect(),
            subtotal_with_tax: order.subtotal_with_tax(),
            tax_total: order.tax_total(),
            total_with_tax: order.total_with_tax(),
        }
    }
}
