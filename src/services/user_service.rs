use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::{
    dto::users::{RegisterRequest, UserList},
    entity::{
        follows::{Column as FollowCol, Entity as Follows},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, MaybeAuthUser},
    models::{ROLE_USER, User},
    response::{ApiResponse, Meta},
    routes::params::UserQuery,
    services::auth_service::{hash_password, validate_password},
    state::AppState,
};

const MAX_NAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;

/// Usernames may hold word characters plus `.`, `@`, `+` and `-`.
pub fn validate_username(username: &str) -> AppResult<()> {
    if username.is_empty() || username.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "username must be 1 to {MAX_NAME_LEN} characters"
        )));
    }
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'));
    if !valid {
        return Err(AppError::BadRequest(
            "username may only contain letters, digits and . @ + - _".into(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> AppResult<()> {
    let valid = email.len() <= MAX_EMAIL_LEN
        && match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
            }
            None => false,
        };
    if !valid {
        return Err(AppError::BadRequest("invalid email address".into()));
    }
    Ok(())
}

fn validate_person_name(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() || value.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "{field} must be 1 to {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        email,
        username,
        first_name,
        last_name,
        password,
    } = payload;
    let email = email.trim().to_lowercase();
    let username = username.trim().to_owned();

    validate_email(&email)?;
    validate_username(&username)?;
    validate_person_name("first_name", &first_name)?;
    validate_person_name("last_name", &last_name)?;
    validate_password(&password)?;

    let taken = Users::find()
        .filter(
            Condition::any()
                .add(UserCol::Email.eq(email.as_str()))
                .add(UserCol::Username.eq(username.as_str())),
        )
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::BadRequest(
            "Username or email is already taken".into(),
        ));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        first_name: Set(first_name.trim().to_owned()),
        last_name: Set(last_name.trim().to_owned()),
        password_hash: Set(hash_password(&password)?),
        role: Set(ROLE_USER.to_owned()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| match err.sql_err() {
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
            AppError::BadRequest("Username or email is already taken".into())
        }
        _ => AppError::OrmError(err),
    })?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(ApiResponse::success(
        "User created",
        user_from_entity(user, false),
        None,
    ))
}

pub async fn list_users(
    state: &AppState,
    viewer: &MaybeAuthUser,
    query: UserQuery,
) -> AppResult<ApiResponse<UserList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = Users::find();
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("{}%", search.to_lowercase());
        finder = finder.filter(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(UserCol::Username))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col(UserCol::Email))).like(pattern)),
        );
    }
    let finder = finder.order_by_asc(UserCol::Username);

    let total = finder.clone().count(&state.orm).await? as i64;
    let users = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let author_ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    let followed = followed_authors(&state.orm, viewer.user_id(), &author_ids).await?;

    let items = users
        .into_iter()
        .map(|u| {
            let subscribed = followed.contains(&u.id);
            user_from_entity(u, subscribed)
        })
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_user(
    state: &AppState,
    viewer: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    let user = Users::find_by_id(id).one(&state.orm).await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let followed = followed_authors(&state.orm, Some(viewer.user_id), &[user.id]).await?;
    let subscribed = followed.contains(&user.id);
    Ok(ApiResponse::success("User", user_from_entity(user, subscribed), None))
}

pub async fn me(state: &AppState, viewer: &AuthUser) -> AppResult<ApiResponse<User>> {
    let user = Users::find_by_id(viewer.user_id).one(&state.orm).await?;
    match user {
        Some(u) => Ok(ApiResponse::success("Current user", user_from_entity(u, false), None)),
        None => Err(AppError::NotFound),
    }
}

/// Subset of `author_ids` that `viewer` follows. Anonymous viewers follow nobody.
pub async fn followed_authors<C: ConnectionTrait>(
    db: &C,
    viewer: Option<Uuid>,
    author_ids: &[Uuid],
) -> AppResult<HashSet<Uuid>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let rows = Follows::find()
        .filter(FollowCol::UserId.eq(viewer))
        .filter(FollowCol::AuthorId.is_in(author_ids.iter().copied()))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|f| f.author_id).collect())
}

pub(crate) fn user_from_entity(model: UserModel, is_subscribed: bool) -> User {
    User {
        id: model.id,
        email: model.email,
        username: model.username,
        first_name: model.first_name,
        last_name: model.last_name,
        is_subscribed,
    }
}
