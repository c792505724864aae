use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, sea_query::Query,
};
use uuid::Uuid;

use crate::{
    dto::users::SubscriptionList,
    entity::{
        follows::{ActiveModel as FollowActive, Column as FollowCol, Entity as Follows},
        recipes::{Column as RecipeCol, Entity as Recipes},
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{RecipeShort, RelationKind, Subscription},
    response::{ApiResponse, Meta},
    routes::params::SubscriptionQuery,
    services::recipe_service::recipe_short_from_entity,
    state::AppState,
};

pub async fn subscribe(
    state: &AppState,
    user: &AuthUser,
    author_id: Uuid,
    recipes_limit: Option<u64>,
) -> AppResult<ApiResponse<Subscription>> {
    let author = Users::find_by_id(author_id).one(&state.orm).await?;
    let author = match author {
        Some(a) => a,
        None => return Err(AppError::NotFound),
    };
    if author.id == user.user_id {
        return Err(AppError::SelfReference);
    }

    let already = Follows::find()
        .filter(FollowCol::UserId.eq(user.user_id))
        .filter(FollowCol::AuthorId.eq(author_id))
        .count(&state.orm)
        .await?;
    if already > 0 {
        return Err(AppError::DuplicateRelation(RelationKind::Follow));
    }

    FollowActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        author_id: Set(author_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::from_relation_insert(err, RelationKind::Follow))?;

    tracing::info!(user_id = %user.user_id, author_id = %author_id, "subscribed");

    let card = subscription_cards(&state.orm, vec![author], recipes_limit)
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Subscribed", card, Some(Meta::empty())))
}

pub async fn unsubscribe(
    state: &AppState,
    user: &AuthUser,
    author_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let author_exists = Users::find_by_id(author_id).count(&state.orm).await? > 0;
    if !author_exists {
        return Err(AppError::NotFound);
    }

    let result = Follows::delete_many()
        .filter(FollowCol::UserId.eq(user.user_id))
        .filter(FollowCol::AuthorId.eq(author_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::MissingRelation(RelationKind::Follow));
    }

    tracing::info!(user_id = %user.user_id, author_id = %author_id, "unsubscribed");
    Ok(ApiResponse::success(
        "Unsubscribed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_subscriptions(
    state: &AppState,
    user: &AuthUser,
    query: SubscriptionQuery,
) -> AppResult<ApiResponse<SubscriptionList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Users::find()
        .filter(
            UserCol::Id.in_subquery(
                Query::select()
                    .column(FollowCol::AuthorId)
                    .from(Follows)
                    .and_where(FollowCol::UserId.eq(user.user_id))
                    .to_owned(),
            ),
        )
        .order_by_asc(UserCol::Username);

    let total = finder.clone().count(&state.orm).await? as i64;
    let authors = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = subscription_cards(&state.orm, authors, query.recipes_limit).await?;
    Ok(ApiResponse::success(
        "Subscriptions",
        SubscriptionList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Builds follower-side cards for `authors`; every card is `is_subscribed`.
async fn subscription_cards<C: ConnectionTrait>(
    db: &C,
    authors: Vec<UserModel>,
    recipes_limit: Option<u64>,
) -> AppResult<Vec<Subscription>> {
    if authors.is_empty() {
        return Ok(Vec::new());
    }

    let author_ids: Vec<Uuid> = authors.iter().map(|a| a.id).collect();
    let mut recipes_by_author: HashMap<Uuid, Vec<RecipeShort>> = HashMap::new();
    for recipe in Recipes::find()
        .filter(RecipeCol::AuthorId.is_in(author_ids))
        .order_by_desc(RecipeCol::PubDate)
        .all(db)
        .await?
    {
        recipes_by_author
            .entry(recipe.author_id)
            .or_default()
            .push(recipe_short_from_entity(recipe));
    }

    let cards = authors
        .into_iter()
        .map(|author| {
            let mut recipes = recipes_by_author.remove(&author.id).unwrap_or_default();
            let recipes_count = recipes.len() as i64;
            if let Some(limit) = recipes_limit {
                recipes.truncate(limit as usize);
            }
            Subscription {
                id: author.id,
                email: author.email,
                username: author.username,
                first_name: author.first_name,
                last_name: author.last_name,
                is_subscribed: true,
                recipes,
                recipes_count,
            }
        })
        .collect();
    Ok(cards)
}
