#![allow(dead_code)]

use chrono::Utc;
use recipe_share_api::{
    db::run_migrations,
    dto::recipes::{IngredientAmountRequest, RecipeWriteRequest},
    entity::{
        ingredients::ActiveModel as IngredientActive, tags::ActiveModel as TagActive,
        users::ActiveModel as UserActive,
    },
    middleware::auth::AuthUser,
    models::{ROLE_ADMIN, ROLE_USER},
    services::recipe_service,
    state::AppState,
};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use uuid::Uuid;

/// Fresh in-memory database with the full schema applied.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // A single connection keeps every query on the same in-memory database.
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let orm = Database::connect(options).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm))
}

pub async fn create_user(state: &AppState, username: &str) -> anyhow::Result<AuthUser> {
    create_user_with_role(state, username, ROLE_USER).await
}

pub async fn create_admin(state: &AppState, username: &str) -> anyhow::Result<AuthUser> {
    create_user_with_role(state, username, ROLE_ADMIN).await
}

async fn create_user_with_role(
    state: &AppState,
    username: &str,
    role: &str,
) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_owned()),
        email: Set(format!("{username}@example.com")),
        first_name: Set(username.to_owned()),
        last_name: Set("Tester".to_owned()),
        password_hash: Set("dummy".to_owned()),
        role: Set(role.to_owned()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn create_tag(state: &AppState, slug: &str) -> anyhow::Result<Uuid> {
    let tag = TagActive {
        id: Set(Uuid::new_v4()),
        name: Set(slug.to_uppercase()),
        color: Set(format!("#{}", &Uuid::new_v4().simple().to_string()[..6].to_uppercase())),
        slug: Set(slug.to_owned()),
    }
    .insert(&state.orm)
    .await?;
    Ok(tag.id)
}

pub async fn create_ingredient(state: &AppState, name: &str, unit: &str) -> anyhow::Result<Uuid> {
    let ingredient = IngredientActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_owned()),
        measurement_unit: Set(unit.to_owned()),
    }
    .insert(&state.orm)
    .await?;
    Ok(ingredient.id)
}

pub fn recipe_request(
    name: &str,
    tags: Vec<Uuid>,
    ingredients: &[(Uuid, i32)],
) -> RecipeWriteRequest {
    RecipeWriteRequest {
        tags,
        ingredients: ingredients
            .iter()
            .map(|(id, amount)| IngredientAmountRequest {
                id: *id,
                amount: *amount,
            })
            .collect(),
        name: name.to_owned(),
        image: Some(format!("recipes/images/{name}.png")),
        text: format!("How to cook {name}"),
        cooking_time: 15,
    }
}

pub async fn create_recipe(
    state: &AppState,
    author: &AuthUser,
    payload: RecipeWriteRequest,
) -> anyhow::Result<Uuid> {
    let resp = recipe_service::create_recipe(state, author, payload).await?;
    let recipe = resp.data.ok_or_else(|| anyhow::anyhow!("recipe missing"))?;
    Ok(recipe.id)
}
