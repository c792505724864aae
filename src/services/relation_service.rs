//! Favorite and shopping-cart toggles.
//!
//! Both relations are a unique `(user, recipe)` pair. Creation pre-checks the
//! pair so the common case gets a clean error, and the unique index settles races.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::{
    entity::{
        favorites::{ActiveModel as FavoriteActive, Column as FavCol, Entity as Favorites},
        recipes::Entity as Recipes,
        shopping_carts::{ActiveModel as CartActive, Column as CartCol, Entity as ShoppingCarts},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{RecipeShort, RelationKind},
    response::{ApiResponse, Meta},
    services::recipe_service::recipe_short_from_entity,
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeMark {
    Favorite,
    ShoppingCart,
}

impl RecipeMark {
    pub fn kind(self) -> RelationKind {
        match self {
            RecipeMark::Favorite => RelationKind::Favorite,
            RecipeMark::ShoppingCart => RelationKind::ShoppingCart,
        }
    }
}

pub async fn add_favorite(
    state: &AppState,
    user: &AuthUser,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<RecipeShort>> {
    add_mark(state, user, recipe_id, RecipeMark::Favorite).await
}

pub async fn remove_favorite(
    state: &AppState,
    user: &AuthUser,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    remove_mark(state, user, recipe_id, RecipeMark::Favorite).await
}

pub async fn add_to_shopping_cart(
    state: &AppState,
    user: &AuthUser,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<RecipeShort>> {
    add_mark(state, user, recipe_id, RecipeMark::ShoppingCart).await
}

pub async fn remove_from_shopping_cart(
    state: &AppState,
    user: &AuthUser,
    recipe_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    remove_mark(state, user, recipe_id, RecipeMark::ShoppingCart).await
}

pub async fn add_mark(
    state: &AppState,
    user: &AuthUser,
    recipe_id: Uuid,
    mark: RecipeMark,
) -> AppResult<ApiResponse<RecipeShort>> {
    let recipe = Recipes::find_by_id(recipe_id).one(&state.orm).await?;
    let recipe = match recipe {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    if mark_exists(&state.orm, mark, user.user_id, recipe_id).await? {
        return Err(AppError::DuplicateRelation(mark.kind()));
    }

    insert_mark(&state.orm, mark, user.user_id, recipe_id)
        .await
        .map_err(|err| AppError::from_relation_insert(err, mark.kind()))?;

    tracing::info!(
        user_id = %user.user_id,
        recipe_id = %recipe_id,
        relation = %mark.kind(),
        "recipe marked"
    );

    let message = match mark {
        RecipeMark::Favorite => "Added to favorites",
        RecipeMark::ShoppingCart => "Added to shopping cart",
    };
    Ok(ApiResponse::success(
        message,
        recipe_short_from_entity(recipe),
        Some(Meta::empty()),
    ))
}

pub async fn remove_mark(
    state: &AppState,
    user: &AuthUser,
    recipe_id: Uuid,
    mark: RecipeMark,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let recipe_exists = Recipes::find_by_id(recipe_id).count(&state.orm).await? > 0;
    if !recipe_exists {
        return Err(AppError::NotFound);
    }

    let removed = delete_mark(&state.orm, mark, user.user_id, recipe_id).await?;
    if removed == 0 {
        return Err(AppError::MissingRelation(mark.kind()));
    }

    tracing::info!(
        user_id = %user.user_id,
        recipe_id = %recipe_id,
        relation = %mark.kind(),
        "recipe unmarked"
    );

    let message = match mark {
        RecipeMark::Favorite => "Removed from favorites",
        RecipeMark::ShoppingCart => "Removed from shopping cart",
    };
    Ok(ApiResponse::success(
        message,
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Subset of `recipe_ids` carrying `mark` for `viewer`. Anonymous viewers mark nothing.
pub async fn marked_recipes<C: ConnectionTrait>(
    db: &C,
    viewer: Option<Uuid>,
    mark: RecipeMark,
    recipe_ids: &[Uuid],
) -> AppResult<HashSet<Uuid>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let ids = recipe_ids.iter().copied();
    let marked = match mark {
        RecipeMark::Favorite => Favorites::find()
            .filter(FavCol::UserId.eq(viewer))
            .filter(FavCol::RecipeId.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|f| f.recipe_id)
            .collect(),
        RecipeMark::ShoppingCart => ShoppingCarts::find()
            .filter(CartCol::UserId.eq(viewer))
            .filter(CartCol::RecipeId.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| c.recipe_id)
            .collect(),
    };
    Ok(marked)
}

async fn mark_exists<C: ConnectionTrait>(
    db: &C,
    mark: RecipeMark,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<bool, DbErr> {
    let count = match mark {
        RecipeMark::Favorite => {
            Favorites::find()
                .filter(FavCol::UserId.eq(user_id))
                .filter(FavCol::RecipeId.eq(recipe_id))
                .count(db)
                .await?
        }
        RecipeMark::ShoppingCart => {
            ShoppingCarts::find()
                .filter(CartCol::UserId.eq(user_id))
                .filter(CartCol::RecipeId.eq(recipe_id))
                .count(db)
                .await?
        }
    };
    Ok(count > 0)
}

async fn insert_mark<C: ConnectionTrait>(
    db: &C,
    mark: RecipeMark,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<(), DbErr> {
    let now = Utc::now();
    match mark {
        RecipeMark::Favorite => {
            FavoriteActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                created_at: Set(now.into()),
            }
            .insert(db)
            .await?;
        }
        RecipeMark::ShoppingCart => {
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                created_at: Set(now.into()),
            }
            .insert(db)
            .await?;
        }
    }
    Ok(())
}

async fn delete_mark<C: ConnectionTrait>(
    db: &C,
    mark: RecipeMark,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<u64, DbErr> {
    let result = match mark {
        RecipeMark::Favorite => {
            Favorites::delete_many()
                .filter(FavCol::UserId.eq(user_id))
                .filter(FavCol::RecipeId.eq(recipe_id))
                .exec(db)
                .await?
        }
        RecipeMark::ShoppingCart => {
            ShoppingCarts::delete_many()
                .filter(CartCol::UserId.eq(user_id))
                .filter(CartCol::RecipeId.eq(recipe_id))
                .exec(db)
                .await?
        }
    };
    Ok(result.rows_affected)
}
