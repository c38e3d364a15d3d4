pub mod cart_item;
pub mod grocery;
pub mod order;
pub mod order_item;
pub mod shopping_list_item;

// Re-export entities
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use grocery::{Entity as Grocery, Model as GroceryModel};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use shopping_list_item::{Entity as ShoppingListItem, Model as ShoppingListItemModel};
