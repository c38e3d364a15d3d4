mod common;

use common::TestApp;
use grocerygo_core::{
    errors::ServiceError,
    services::{compute_grand_total, compute_subtotal, AddToCartInput},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn add_item_copies_grocery_details() {
    let app = TestApp::new().await;
    let grocery = app.seed_grocery("Red Apples", dec!(3.99), "lb").await;

    let item = app
        .state
        .services
        .cart
        .add_item(AddToCartInput {
            grocery_id: grocery.id,
            quantity: 3,
        })
        .await
        .expect("add to cart failed");

    assert_eq!(item.grocery_id, grocery.id);
    assert_eq!(item.grocery_name, "Red Apples");
    assert_eq!(item.price, dec!(3.99));
    assert_eq!(item.quantity, 3);
    assert_eq!(item.unit, "lb");
    assert_eq!(item.total_price(), dec!(11.97));

    let items = app.state.services.cart.list_items().await.unwrap();
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn adding_same_grocery_twice_is_rejected() {
    let app = TestApp::new().await;
    let grocery = app.seed_grocery("Milk", dec!(4.29), "gallon").await;
    let cart = &app.state.services.cart;

    cart.add_item(AddToCartInput {
        grocery_id: grocery.id,
        quantity: 1,
    })
    .await
    .unwrap();

    let err = cart
        .add_item(AddToCartInput {
            grocery_id: grocery.id,
            quantity: 2,
        })
        .await
        .expect_err("duplicate add should be rejected");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    // The rejection must not have created a second line.
    let items = cart.list_items().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 1);
}

#[tokio::test]
async fn add_item_rejects_zero_quantity() {
    let app = TestApp::new().await;
    let grocery = app.seed_grocery("Bananas", dec!(2.49), "bunch").await;

    let err = app
        .state
        .services
        .cart
        .add_item(AddToCartInput {
            grocery_id: grocery.id,
            quantity: 0,
        })
        .await
        .expect_err("zero quantity should be rejected");
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn add_item_rejects_unknown_grocery() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .cart
        .add_item(AddToCartInput {
            grocery_id: Uuid::new_v4(),
            quantity: 1,
        })
        .await
        .expect_err("unknown grocery should be rejected");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn quantity_clamps_at_floor_of_one() {
    let app = TestApp::new().await;
    let grocery = app.seed_grocery("Yogurt", dec!(1.99), "6oz").await;
    let cart = &app.state.services.cart;

    let item = cart
        .add_item(AddToCartInput {
            grocery_id: grocery.id,
            quantity: 2,
        })
        .await
        .unwrap();

    let item = cart.adjust_quantity(item.id, -1).await.unwrap();
    assert_eq!(item.quantity, 1);

    // Repeated decrements never drive quantity below 1.
    for _ in 0..5 {
        let item = cart.adjust_quantity(item.id, -1).await.unwrap();
        assert_eq!(item.quantity, 1);
    }
}

#[tokio::test]
async fn quantity_has_no_ceiling() {
    let app = TestApp::new().await;
    let grocery = app.seed_grocery("Carrots", dec!(1.99), "lb").await;
    let cart = &app.state.services.cart;

    let item = cart
        .add_item(AddToCartInput {
            grocery_id: grocery.id,
            quantity: 1,
        })
        .await
        .unwrap();

    let item = cart.adjust_quantity(item.id, 99).await.unwrap();
    assert_eq!(item.quantity, 100);
    assert_eq!(item.total_price(), dec!(199.00));
}

#[tokio::test]
async fn remove_item_deletes_the_line() {
    let app = TestApp::new().await;
    let grocery = app.seed_grocery("Cheese", dec!(5.99), "lb").await;
    let cart = &app.state.services.cart;

    let item = cart
        .add_item(AddToCartInput {
            grocery_id: grocery.id,
            quantity: 1,
        })
        .await
        .unwrap();

    cart.remove_item(item.id).await.unwrap();
    assert!(cart.list_items().await.unwrap().is_empty());

    let err = cart.remove_item(item.id).await.expect_err("already removed");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn totals_reflect_the_persisted_cart() {
    let app = TestApp::new().await;
    let cart = &app.state.services.cart;

    let apples = app.seed_grocery("Red Apples", dec!(3.99), "lb").await;
    let milk = app.seed_grocery("Milk", dec!(4.29), "gallon").await;

    cart.add_item(AddToCartInput {
        grocery_id: apples.id,
        quantity: 2,
    })
    .await
    .unwrap();
    cart.add_item(AddToCartInput {
        grocery_id: milk.id,
        quantity: 1,
    })
    .await
    .unwrap();

    let subtotal = cart.subtotal().await.unwrap();
    assert_eq!(subtotal, dec!(12.27));

    // Grand total adds the configured flat delivery fee.
    let grand_total = cart.grand_total().await.unwrap();
    assert_eq!(
        grand_total,
        compute_grand_total(subtotal, app.state.config.delivery_fee)
    );
    assert_eq!(grand_total, dec!(15.26));

    let items = cart.list_items().await.unwrap();
    assert_eq!(compute_subtotal(&items), subtotal);
}

#[tokio::test]
async fn empty_cart_subtotal_is_zero() {
    let app = TestApp::new().await;
    assert_eq!(app.state.services.cart.subtotal().await.unwrap(), Decimal::ZERO);
}
