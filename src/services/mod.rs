pub mod cart;
pub mod catalog;
pub mod orders;
pub mod shopping_list;
pub mod store_locator;

pub use cart::{compute_grand_total, compute_subtotal, AddToCartInput, CartService};
pub use catalog::{CatalogService, CreateGroceryInput, GroceryFilter};
pub use orders::{CheckoutInput, OrderService, OrderWithItems};
pub use shopping_list::{AddListItemInput, ShoppingListService};
pub use store_locator::{
    Coordinate, LocatorSnapshot, PermissionStatus, Place, PlaceIdentity, StoreLocator,
    StoreSearchProvider,
};
