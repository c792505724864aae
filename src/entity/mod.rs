pub mod amount_ingredients;
pub mod favorites;
pub mod follows;
pub mod ingredients;
pub mod recipe_tags;
pub mod recipes;
pub mod shopping_carts;
pub mod tags;
pub mod users;

pub use amount_ingredients::Entity as AmountIngredients;
pub use favorites::Entity as Favorites;
pub use follows::Entity as Follows;
pub use ingredients::Entity as Ingredients;
pub use recipe_tags::Entity as RecipeTags;
pub use recipes::Entity as Recipes;
pub use shopping_carts::Entity as ShoppingCarts;
pub use tags::Entity as Tags;
pub use users::Entity as Users;
