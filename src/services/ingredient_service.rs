use sea_orm::{
    ActiveModelTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::{
    dto::ingredients::{CreateIngredientRequest, IngredientList, UpdateIngredientRequest},
    entity::ingredients::{
        ActiveModel as IngredientActive, Column as IngredientCol, Entity as Ingredients,
        Model as IngredientModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Ingredient,
    response::{ApiResponse, Meta},
    routes::params::IngredientQuery,
    state::AppState,
};

const MAX_FIELD_LEN: usize = 200;

fn validate_field(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() || value.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::BadRequest(format!(
            "{field} must be 1 to {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(())
}

pub async fn list_ingredients(
    state: &AppState,
    query: IngredientQuery,
) -> AppResult<ApiResponse<IngredientList>> {
    let mut finder = Ingredients::find();
    if let Some(name) = query.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("{}%", name.to_lowercase());
        finder =
            finder.filter(Expr::expr(Func::lower(Expr::col(IngredientCol::Name))).like(pattern));
    }

    let items = finder
        .order_by_asc(IngredientCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ingredient_from_entity)
        .collect();
    Ok(ApiResponse::success("Ingredients", IngredientList { items }, None))
}

pub async fn get_ingredient(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Ingredient>> {
    let ingredient = Ingredients::find_by_id(id).one(&state.orm).await?;
    match ingredient {
        Some(i) => Ok(ApiResponse::success("Ingredient", ingredient_from_entity(i), None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn create_ingredient(
    state: &AppState,
    user: &AuthUser,
    payload: CreateIngredientRequest,
) -> AppResult<ApiResponse<Ingredient>> {
    ensure_admin(user)?;
    validate_field("name", &payload.name)?;
    validate_field("measurement_unit", &payload.measurement_unit)?;

    let ingredient = IngredientActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_owned()),
        measurement_unit: Set(payload.measurement_unit.trim().to_owned()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(ingredient_id = %ingredient.id, "ingredient created");
    Ok(ApiResponse::success(
        "Ingredient created",
        ingredient_from_entity(ingredient),
        Some(Meta::empty()),
    ))
}

pub async fn update_ingredient(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateIngredientRequest,
) -> AppResult<ApiResponse<Ingredient>> {
    ensure_admin(user)?;
    let existing = Ingredients::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };

    let mut active: IngredientActive = existing.into();
    if let Some(name) = payload.name {
        validate_field("name", &name)?;
        active.name = Set(name.trim().to_owned());
    }
    if let Some(unit) = payload.measurement_unit {
        validate_field("measurement_unit", &unit)?;
        active.measurement_unit = Set(unit.trim().to_owned());
    }

    let ingredient = active.update(&state.orm).await?;
    Ok(ApiResponse::success(
        "Updated",
        ingredient_from_entity(ingredient),
        Some(Meta::empty()),
    ))
}

pub async fn delete_ingredient(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Ingredients::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(ingredient_id = %id, "ingredient deleted");
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) fn ingredient_from_entity(model: IngredientModel) -> Ingredient {
    Ingredient {
        id: model.id,
        name: model.name,
        measurement_unit: model.measurement_unit,
    }
}
