use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Query,
};
use uuid::Uuid;

use crate::{
    dto::recipes::{IngredientAmountRequest, RecipeList, RecipeWriteRequest},
    entity::{
        amount_ingredients::{
            ActiveModel as AmountActive, Column as AmountCol, Entity as AmountIngredients,
        },
        favorites::{Column as FavCol, Entity as Favorites},
        ingredients::{Column as IngredientCol, Entity as Ingredients},
        recipe_tags::{
            ActiveModel as RecipeTagActive, Column as RecipeTagCol, Entity as RecipeTags,
        },
        recipes::{
            ActiveModel as RecipeActive, Column as RecipeCol, Entity as Recipes,
            Model as RecipeModel,
        },
        shopping_carts::{Column as CartCol, Entity as ShoppingCarts},
        tags::{Column as TagCol, Entity as Tags},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, MaybeAuthUser, ensure_author_or_admin},
    models::{Recipe, RecipeIngredient, RecipeShort, Tag},
    response::{ApiResponse, Meta},
    routes::params::{RecipeQuery, parse_flag},
    services::{
        relation_service::{RecipeMark, marked_recipes},
        tag_service::tag_from_entity,
        user_service::{followed_authors, user_from_entity},
    },
    state::AppState,
};

const MAX_RECIPE_NAME_LEN: usize = 200;

/// Checks a recipe write before anything touches the store.
pub fn validate_recipe_write(payload: &RecipeWriteRequest) -> AppResult<()> {
    let name = payload.name.trim();
    if name.is_empty() || name.chars().count() > MAX_RECIPE_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "name must be 1 to {MAX_RECIPE_NAME_LEN} characters"
        )));
    }
    if payload.text.trim().is_empty() {
        return Err(AppError::BadRequest("text must not be empty".into()));
    }
    if payload.cooking_time < 1 {
        return Err(AppError::InvalidDuration);
    }
    if payload.tags.is_empty() {
        return Err(AppError::EmptyCollection("tags"));
    }
    if payload.ingredients.is_empty() {
        return Err(AppError::EmptyCollection("ingredients"));
    }
    if payload.ingredients.iter().any(|item| item.amount < 1) {
        return Err(AppError::InvalidAmount);
    }

    let mut seen_tags = HashSet::new();
    if let Some(tag) = payload.tags.iter().find(|tag| !seen_tags.insert(**tag)) {
        return Err(AppError::BadRequest(format!("tag {tag} is listed more than once")));
    }
    let mut seen_ingredients = HashSet::new();
    if let Some(item) = payload
        .ingredients
        .iter()
        .find(|item| !seen_ingredients.insert(item.id))
    {
        return Err(AppError::BadRequest(format!(
            "ingredient {} is listed more than once",
            item.id
        )));
    }
    Ok(())
}

pub async fn list_recipes(
    state: &AppState,
    viewer: &MaybeAuthUser,
    query: RecipeQuery,
) -> AppResult<ApiResponse<RecipeList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let viewer_id = viewer.user_id();

    let mut condition = Condition::all();
    if let Some(author) = query.author {
        condition = condition.add(RecipeCol::AuthorId.eq(author));
    }

    let slugs = query.tag_slugs();
    if !slugs.is_empty() {
        let tag_ids: Vec<Uuid> = Tags::find()
            .filter(TagCol::Slug.is_in(slugs))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        if tag_ids.is_empty() {
            return Ok(ApiResponse::success(
                "Recipes",
                RecipeList { items: Vec::new() },
                Some(Meta::new(page, limit, 0)),
            ));
        }
        condition = condition.add(
            RecipeCol::Id.in_subquery(
                Query::select()
                    .column(RecipeTagCol::RecipeId)
                    .from(RecipeTags)
                    .and_where(RecipeTagCol::TagId.is_in(tag_ids))
                    .to_owned(),
            ),
        );
    }

    // Viewer flags only filter for signed-in users.
    if let Some(viewer_id) = viewer_id {
        if let Some(flag) = parse_flag(query.is_favorited.as_deref()) {
            let favorites = Query::select()
                .column(FavCol::RecipeId)
                .from(Favorites)
                .and_where(FavCol::UserId.eq(viewer_id))
                .to_owned();
            condition = condition.add(if flag {
                RecipeCol::Id.in_subquery(favorites)
            } else {
                RecipeCol::Id.not_in_subquery(favorites)
            });
        }
        if let Some(flag) = parse_flag(query.is_in_shopping_cart.as_deref()) {
            let cart = Query::select()
                .column(CartCol::RecipeId)
                .from(ShoppingCarts)
                .and_where(CartCol::UserId.eq(viewer_id))
                .to_owned();
            condition = condition.add(if flag {
                RecipeCol::Id.in_subquery(cart)
            } else {
                RecipeCol::Id.not_in_subquery(cart)
            });
        }
    }

    let finder = Recipes::find()
        .filter(condition)
        .order_by_desc(RecipeCol::PubDate)
        .order_by_asc(RecipeCol::Id);

    let total = finder.clone().count(&state.orm).await? as i64;
    let recipes = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = build_recipe_cards(&state.orm, viewer_id, recipes).await?;
    Ok(ApiResponse::success(
        "Recipes",
        RecipeList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_recipe(
    state: &AppState,
    viewer: &MaybeAuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Recipe>> {
    let recipe = load_recipe_card(state, viewer.user_id(), id).await?;
    Ok(ApiResponse::success("Recipe", recipe, None))
}

pub async fn create_recipe(
    state: &AppState,
    user: &AuthUser,
    payload: RecipeWriteRequest,
) -> AppResult<ApiResponse<Recipe>> {
    validate_recipe_write(&payload)?;
    let image = payload
        .image
        .as_deref()
        .map(str::trim)
        .filter(|image| !image.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| AppError::BadRequest("image is required".into()))?;

    let txn = state.orm.begin().await?;

    let recipe = RecipeActive {
        id: Set(Uuid::new_v4()),
        author_id: Set(user.user_id),
        name: Set(payload.name.trim().to_owned()),
        image: Set(image),
        text: Set(payload.text),
        cooking_time: Set(payload.cooking_time),
        pub_date: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    replace_associations(&txn, recipe.id, &payload.tags, &payload.ingredients).await?;
    txn.commit().await?;

    tracing::info!(recipe_id = %recipe.id, author_id = %user.user_id, "recipe created");

    let card = load_recipe_card(state, Some(user.user_id), recipe.id).await?;
    Ok(ApiResponse::success("Recipe created", card, Some(Meta::empty())))
}

/// Replaces the recipe's fields, tags and ingredient amounts in one transaction.
pub async fn update_recipe(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RecipeWriteRequest,
) -> AppResult<ApiResponse<Recipe>> {
    let existing = Recipes::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    ensure_author_or_admin(user, existing.author_id)?;
    validate_recipe_write(&payload)?;

    let txn = state.orm.begin().await?;

    let mut active: RecipeActive = existing.into();
    active.name = Set(payload.name.trim().to_owned());
    active.text = Set(payload.text);
    active.cooking_time = Set(payload.cooking_time);
    if let Some(image) = payload.image.as_deref().map(str::trim).filter(|i| !i.is_empty()) {
        active.image = Set(image.to_owned());
    }
    let recipe = active.update(&txn).await?;

    replace_associations(&txn, recipe.id, &payload.tags, &payload.ingredients).await?;
    txn.commit().await?;

    tracing::info!(recipe_id = %recipe.id, editor_id = %user.user_id, "recipe updated");

    let card = load_recipe_card(state, Some(user.user_id), recipe.id).await?;
    Ok(ApiResponse::success("Updated", card, Some(Meta::empty())))
}

pub async fn delete_recipe(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Recipes::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    ensure_author_or_admin(user, existing.author_id)?;

    Recipes::delete_by_id(id).exec(&state.orm).await?;
    tracing::info!(recipe_id = %id, editor_id = %user.user_id, "recipe deleted");

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Drops the recipe's current tag and ingredient rows and writes the given ones.
/// Any error leaves the caller's transaction uncommitted.
async fn replace_associations(
    txn: &DatabaseTransaction,
    recipe_id: Uuid,
    tags: &[Uuid],
    ingredients: &[IngredientAmountRequest],
) -> AppResult<()> {
    RecipeTags::delete_many()
        .filter(RecipeTagCol::RecipeId.eq(recipe_id))
        .exec(txn)
        .await?;
    AmountIngredients::delete_many()
        .filter(AmountCol::RecipeId.eq(recipe_id))
        .exec(txn)
        .await?;

    let known_tags = Tags::find()
        .filter(TagCol::Id.is_in(tags.iter().copied()))
        .count(txn)
        .await?;
    if known_tags as usize != tags.len() {
        return Err(AppError::NotFound);
    }

    let known_ingredients = Ingredients::find()
        .filter(IngredientCol::Id.is_in(ingredients.iter().map(|item| item.id)))
        .count(txn)
        .await?;
    if known_ingredients as usize != ingredients.len() {
        return Err(AppError::NotFound);
    }

    RecipeTags::insert_many(tags.iter().map(|tag_id| RecipeTagActive {
        id: Set(Uuid::new_v4()),
        recipe_id: Set(recipe_id),
        tag_id: Set(*tag_id),
    }))
    .exec_without_returning(txn)
    .await?;

    AmountIngredients::insert_many(ingredients.iter().map(|item| AmountActive {
        id: Set(Uuid::new_v4()),
        recipe_id: Set(recipe_id),
        ingredient_id: Set(item.id),
        amount: Set(item.amount),
    }))
    .exec_without_returning(txn)
    .await?;

    Ok(())
}

async fn load_recipe_card(state: &AppState, viewer: Option<Uuid>, id: Uuid) -> AppResult<Recipe> {
    let recipe = Recipes::find_by_id(id).one(&state.orm).await?;
    let recipe = match recipe {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    build_recipe_cards(&state.orm, viewer, vec![recipe])
        .await?
        .pop()
        .ok_or(AppError::NotFound)
}

/// Assembles full recipe cards with a fixed number of queries, whatever the page size.
pub async fn build_recipe_cards<C: ConnectionTrait>(
    db: &C,
    viewer: Option<Uuid>,
    recipes: Vec<RecipeModel>,
) -> AppResult<Vec<Recipe>> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
    let mut author_ids: Vec<Uuid> = recipes.iter().map(|r| r.author_id).collect();
    author_ids.sort();
    author_ids.dedup();

    let authors: HashMap<Uuid, _> = Users::find()
        .filter(UserCol::Id.is_in(author_ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut tags_by_recipe: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for (link, tag) in RecipeTags::find()
        .find_also_related(Tags)
        .filter(RecipeTagCol::RecipeId.is_in(recipe_ids.iter().copied()))
        .order_by_asc(TagCol::Name)
        .all(db)
        .await?
    {
        match tag {
            Some(tag) => tags_by_recipe
                .entry(link.recipe_id)
                .or_default()
                .push(tag_from_entity(tag)),
            None => tracing::warn!(
                recipe_id = %link.recipe_id,
                tag_id = %link.tag_id,
                "dangling recipe tag"
            ),
        }
    }

    let mut ingredients_by_recipe: HashMap<Uuid, Vec<RecipeIngredient>> = HashMap::new();
    for (amount, ingredient) in AmountIngredients::find()
        .find_also_related(Ingredients)
        .filter(AmountCol::RecipeId.is_in(recipe_ids.iter().copied()))
        .order_by_asc(IngredientCol::Name)
        .all(db)
        .await?
    {
        if let Some(ingredient) = ingredient {
            ingredients_by_recipe
                .entry(amount.recipe_id)
                .or_default()
                .push(RecipeIngredient {
                    id: ingredient.id,
                    name: ingredient.name,
                    measurement_unit: ingredient.measurement_unit,
                    amount: amount.amount,
                });
        }
    }

    let followed = followed_authors(db, viewer, &author_ids).await?;
    let favorited = marked_recipes(db, viewer, RecipeMark::Favorite, &recipe_ids).await?;
    let in_cart = marked_recipes(db, viewer, RecipeMark::ShoppingCart, &recipe_ids).await?;

    let mut cards = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let author = match authors.get(&recipe.author_id) {
            Some(author) => user_from_entity(author.clone(), followed.contains(&author.id)),
            None => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "recipe {} references a missing author",
                    recipe.id
                )));
            }
        };
        cards.push(Recipe {
            id: recipe.id,
            tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
            author,
            ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
            is_favorited: favorited.contains(&recipe.id),
            is_in_shopping_cart: in_cart.contains(&recipe.id),
            name: recipe.name,
            image: recipe.image,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
            pub_date: recipe.pub_date.with_timezone(&Utc),
        });
    }
    Ok(cards)
}

pub(crate) fn recipe_short_from_entity(model: RecipeModel) -> RecipeShort {
    RecipeShort {
        id: model.id,
        name: model.name,
        image: model.image,
        cooking_time: model.cooking_time,
    }
}
