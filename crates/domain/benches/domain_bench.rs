use common::{AddressId, CarrierId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    Address, Carrier, Cart, CartStore, InMemorySession, NewOrder, Order, ProductRef, pricing,
};
use rust_decimal::Decimal;

fn product(n: u32) -> ProductRef {
    ProductRef::new(
        format!("SKU-{n:03}"),
        format!("Product {n}"),
        Decimal::new(i64::from(n) * 100 + 99, 2),
        Decimal::from(20),
        format!("product-{n}.jpg"),
    )
}

fn filled_cart(products: u32) -> Cart {
    let mut cart = Cart::new();
    for n in 1..=products {
        cart.add(product(n));
        cart.add(product(n));
    }
    cart
}

fn bench_cart_add(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = CartStore::new(InMemorySession::new());

    c.bench_function("domain/cart_add", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.add(product(1)).await.unwrap();
            });
        });
    });
}

fn bench_cart_total_50(c: &mut Criterion) {
    let cart = filled_cart(50);

    c.bench_function("domain/cart_total_50_products", |b| {
        b.iter(|| cart.total_with_tax());
    });
}

fn bench_place_order_50(c: &mut Criterion) {
    let cart = filled_cart(50);
    let user_id = UserId::new();
    let address = Address {
        id: AddressId::new(),
        user_id,
        first_name: "Bench".into(),
        last_name: "Mark".into(),
        street: "1 Loop Street".into(),
        postal_code: "10000".into(),
        city: "Iteration".into(),
        country: "France".into(),
        phone: "0000000000".into(),
    };
    let carrier = Carrier {
        id: CarrierId::new(),
        name: "Colissimo".into(),
        description: String::new(),
        price: Decimal::new(490, 2),
    };

    c.bench_function("domain/place_order_50_products", |b| {
        b.iter(|| {
            let order = Order::place(NewOrder {
                user_id,
                address: &address,
                carrier: &carrier,
                cart: &cart,
                submission_token: None,
            })
            .unwrap();
            pricing::to_minor_units(order.total_with_tax()).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_cart_add,
    bench_cart_total_50,
    bench_place_order_50,
);
criterion_main!(benches);
