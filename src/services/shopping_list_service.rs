//! Shopping list built from the recipes in a user's cart.
//!
//! The list is always aggregated from current rows; nothing is cached between calls.

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, sea_query::Query,
};
use uuid::Uuid;

use crate::{
    entity::{
        amount_ingredients::{self, Column as AmountCol, Entity as AmountIngredients},
        ingredients::Column as IngredientCol,
        shopping_carts::{Column as CartCol, Entity as ShoppingCarts},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::ShoppingListItem,
    state::AppState,
};

pub const SHOPPING_LIST_HEADER: &str = "Продукты к покупке:";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_products.txt";

#[derive(Debug, FromQueryResult)]
struct ShoppingListRow {
    name: String,
    measurement_unit: String,
    total_amount: i64,
}

/// Sums ingredient amounts over every recipe in the user's cart, one entry per
/// `(name, unit)` pair, ordered by name.
pub async fn shopping_list<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> AppResult<Vec<ShoppingListItem>> {
    let in_cart = ShoppingCarts::find()
        .filter(CartCol::UserId.eq(user_id))
        .count(db)
        .await?;
    if in_cart == 0 {
        return Err(AppError::EmptyCart);
    }

    let rows = AmountIngredients::find()
        .select_only()
        .column_as(IngredientCol::Name, "name")
        .column_as(IngredientCol::MeasurementUnit, "measurement_unit")
        .column_as(AmountCol::Amount.sum(), "total_amount")
        .join(
            JoinType::InnerJoin,
            amount_ingredients::Relation::Ingredients.def(),
        )
        .filter(
            AmountCol::RecipeId.in_subquery(
                Query::select()
                    .column(CartCol::RecipeId)
                    .from(ShoppingCarts)
                    .and_where(CartCol::UserId.eq(user_id))
                    .to_owned(),
            ),
        )
        .group_by(IngredientCol::Name)
        .group_by(IngredientCol::MeasurementUnit)
        .order_by_asc(IngredientCol::Name)
        .order_by_asc(IngredientCol::MeasurementUnit)
        .into_model::<ShoppingListRow>()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| ShoppingListItem {
            name: row.name,
            measurement_unit: row.measurement_unit,
            total_amount: row.total_amount,
        })
        .collect())
}

pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    let mut out = String::from(SHOPPING_LIST_HEADER);
    out.push('\n');
    for item in items {
        out.push_str(&format!(
            "- {} - {} {}\n",
            item.name, item.total_amount, item.measurement_unit
        ));
    }
    out
}

pub async fn download_shopping_list(state: &AppState, user: &AuthUser) -> AppResult<String> {
    let items = shopping_list(&state.orm, user.user_id).await?;
    tracing::debug!(user_id = %user.user_id, lines = items.len(), "shopping list rendered");
    Ok(render_shopping_list(&items))
}
