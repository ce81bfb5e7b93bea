//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod cart;
pub mod cart_item;
pub mod category;
pub mod combo;
pub mod combo_item;
pub mod food_item;
pub mod order;
pub mod order_detail;
pub mod user;
pub mod user_role;

// Re-export specific types to avoid conflicts
pub use cart::{Column as CartColumn, Entity as Cart, Model as CartModel};
pub use cart_item::{Column as CartItemColumn, Entity as CartItem, Model as CartItemModel};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use combo::{Column as ComboColumn, ComboStatus, Entity as Combo, Model as ComboModel};
pub use combo_item::{Column as ComboItemColumn, Entity as ComboItem, Model as ComboItemModel};
pub use food_item::{
    Column as FoodItemColumn, Entity as FoodItem, ItemStatus, Model as FoodItemModel,
};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel, OrderStatus};
pub use order_detail::{
    Column as OrderDetailColumn, Entity as OrderDetail, Model as OrderDetailModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use user_role::{Column as UserRoleColumn, Entity as UserRole, Model as UserRoleModel};
