pub mod category;
pub mod guest;
pub mod product;
pub mod room;
pub mod sale;

pub use category::Entity as Category;
pub use guest::Entity as Guest;
pub use product::Entity as Product;
pub use room::Entity as Room;
pub use sale::Entity as Sale;
