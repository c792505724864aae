use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::tags::{CreateTagRequest, TagList, UpdateTagRequest},
    entity::tags::{ActiveModel as TagActive, Column as TagCol, Entity as Tags, Model as TagModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Tag,
    response::{ApiResponse, Meta},
    state::AppState,
};

const MAX_TAG_LEN: usize = 200;

pub fn validate_slug(slug: &str) -> AppResult<()> {
    let valid = !slug.is_empty()
        && slug.len() <= MAX_TAG_LEN
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(AppError::BadRequest(
            "slug may only contain latin letters, digits, - and _".into(),
        ));
    }
    Ok(())
}

/// Colors are stored as `#RRGGBB`.
pub fn validate_color(color: &str) -> AppResult<()> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(AppError::BadRequest("color must look like #RRGGBB".into()));
    }
    Ok(())
}

fn validate_tag_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() || name.chars().count() > MAX_TAG_LEN {
        return Err(AppError::BadRequest(format!(
            "tag name must be 1 to {MAX_TAG_LEN} characters"
        )));
    }
    Ok(())
}

fn map_unique(err: sea_orm::DbErr) -> AppError {
    match err.sql_err() {
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
            AppError::BadRequest("tag name, color and slug must be unique".into())
        }
        _ => AppError::OrmError(err),
    }
}

pub async fn list_tags(state: &AppState) -> AppResult<ApiResponse<TagList>> {
    let items = Tags::find()
        .order_by_asc(TagCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(tag_from_entity)
        .collect();
    Ok(ApiResponse::success("Tags", TagList { items }, None))
}

pub async fn get_tag(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Tag>> {
    let tag = Tags::find_by_id(id).one(&state.orm).await?;
    match tag {
        Some(t) => Ok(ApiResponse::success("Tag", tag_from_entity(t), None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn create_tag(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTagRequest,
) -> AppResult<ApiResponse<Tag>> {
    ensure_admin(user)?;
    validate_tag_name(&payload.name)?;
    validate_color(&payload.color)?;
    validate_slug(&payload.slug)?;

    let tag = TagActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_owned()),
        color: Set(payload.color.to_uppercase()),
        slug: Set(payload.slug),
    }
    .insert(&state.orm)
    .await
    .map_err(map_unique)?;

    tracing::info!(tag_id = %tag.id, slug = %tag.slug, "tag created");
    Ok(ApiResponse::success(
        "Tag created",
        tag_from_entity(tag),
        Some(Meta::empty()),
    ))
}

pub async fn update_tag(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateTagRequest,
) -> AppResult<ApiResponse<Tag>> {
    ensure_admin(user)?;
    let existing = Tags::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(t) => t,
        None => return Err(AppError::NotFound),
    };

    let mut active: TagActive = existing.into();
    if let Some(name) = payload.name {
        validate_tag_name(&name)?;
        active.name = Set(name.trim().to_owned());
    }
    if let Some(color) = payload.color {
        validate_color(&color)?;
        active.color = Set(color.to_uppercase());
    }
    if let Some(slug) = payload.slug {
        validate_slug(&slug)?;
        active.slug = Set(slug);
    }

    let tag = active.update(&state.orm).await.map_err(map_unique)?;
    Ok(ApiResponse::success(
        "Updated",
        tag_from_entity(tag),
        Some(Meta::empty()),
    ))
}

pub async fn delete_tag(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Tags::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(tag_id = %id, "tag deleted");
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub(crate) fn tag_from_entity(model: TagModel) -> Tag {
    Tag {
        id: model.id,
        name: model.name,
        color: model.color,
        slug: model.slug,
    }
}
