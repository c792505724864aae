mod common;

use chrono::Utc;
use recipe_share_api::{
    entity::{
        favorites::{ActiveModel as FavoriteActive, Column as FavCol, Entity as Favorites},
        follows::{ActiveModel as FollowActive, Entity as Follows},
    },
    error::AppError,
    models::RelationKind,
    services::{follow_service, relation_service},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use common::{
    create_ingredient, create_recipe, create_tag, create_user, recipe_request, setup_state,
};

#[tokio::test]
async fn favoriting_twice_keeps_a_single_row() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let author = create_user(&state, "author").await?;
    let reader = create_user(&state, "reader").await?;
    let tag = create_tag(&state, "lunch").await?;
    let flour = create_ingredient(&state, "flour", "g").await?;
    let recipe = create_recipe(
        &state,
        &author,
        recipe_request("pancakes", vec![tag], &[(flour, 200)]),
    )
    .await?;

    let first = relation_service::add_favorite(&state, &reader, recipe).await?;
    let short = first.data.expect("short card");
    assert_eq!(short.id, recipe);
    assert_eq!(short.name, "pancakes");

    let second = relation_service::add_favorite(&state, &reader, recipe).await;
    assert!(matches!(
        second,
        Err(AppError::DuplicateRelation(RelationKind::Favorite))
    ));

    let rows = Favorites::find()
        .filter(FavCol::UserId.eq(reader.user_id))
        .filter(FavCol::RecipeId.eq(recipe))
        .count(&state.orm)
        .await?;
    assert_eq!(rows, 1);
    Ok(())
}

#[tokio::test]
async fn removing_a_missing_favorite_is_rejected() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let author = create_user(&state, "author").await?;
    let tag = create_tag(&state, "dinner").await?;
    let salt = create_ingredient(&state, "salt", "pinch").await?;
    let recipe = create_recipe(
        &state,
        &author,
        recipe_request("soup", vec![tag], &[(salt, 1)]),
    )
    .await?;

    let result = relation_service::remove_favorite(&state, &author, recipe).await;
    assert!(matches!(
        result,
        Err(AppError::MissingRelation(RelationKind::Favorite))
    ));
    Ok(())
}

#[tokio::test]
async fn shopping_cart_toggle_round_trip() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let cook = create_user(&state, "cook").await?;
    let tag = create_tag(&state, "breakfast").await?;
    let egg = create_ingredient(&state, "egg", "pcs").await?;
    let recipe = create_recipe(
        &state,
        &cook,
        recipe_request("omelette", vec![tag], &[(egg, 3)]),
    )
    .await?;

    relation_service::add_to_shopping_cart(&state, &cook, recipe).await?;
    let again = relation_service::add_to_shopping_cart(&state, &cook, recipe).await;
    assert!(matches!(
        again,
        Err(AppError::DuplicateRelation(RelationKind::ShoppingCart))
    ));

    relation_service::remove_from_shopping_cart(&state, &cook, recipe).await?;
    let gone = relation_service::remove_from_shopping_cart(&state, &cook, recipe).await;
    assert!(matches!(
        gone,
        Err(AppError::MissingRelation(RelationKind::ShoppingCart))
    ));
    Ok(())
}

#[tokio::test]
async fn marking_an_unknown_recipe_is_not_found() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "user").await?;

    let fav = relation_service::add_favorite(&state, &user, Uuid::new_v4()).await;
    assert!(matches!(fav, Err(AppError::NotFound)));

    let cart = relation_service::remove_from_shopping_cart(&state, &user, Uuid::new_v4()).await;
    assert!(matches!(cart, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn following_yourself_is_rejected() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "narcissus").await?;

    let result = follow_service::subscribe(&state, &user, user.user_id, None).await;
    assert!(matches!(result, Err(AppError::SelfReference)));
    assert_eq!(Follows::find().count(&state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn unfollowing_someone_not_followed_is_rejected() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let follower = create_user(&state, "follower").await?;
    let author = create_user(&state, "author").await?;

    let result = follow_service::unsubscribe(&state, &follower, author.user_id).await;
    assert!(matches!(
        result,
        Err(AppError::MissingRelation(RelationKind::Follow))
    ));

    let unknown = follow_service::subscribe(&state, &follower, Uuid::new_v4(), None).await;
    assert!(matches!(unknown, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn subscription_card_lists_newest_recipes_first() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let follower = create_user(&state, "follower").await?;
    let author = create_user(&state, "author").await?;
    let tag = create_tag(&state, "lunch").await?;
    let rice = create_ingredient(&state, "rice", "g").await?;
    for name in ["first", "second", "third"] {
        create_recipe(&state, &author, recipe_request(name, vec![tag], &[(rice, 100)])).await?;
    }

    let card = follow_service::subscribe(&state, &follower, author.user_id, Some(2))
        .await?
        .data
        .expect("subscription card");
    assert!(card.is_subscribed);
    assert_eq!(card.recipes_count, 3);
    assert_eq!(card.recipes.len(), 2);

    let dup = follow_service::subscribe(&state, &follower, author.user_id, None).await;
    assert!(matches!(
        dup,
        Err(AppError::DuplicateRelation(RelationKind::Follow))
    ));

    let list = follow_service::list_subscriptions(
        &state,
        &follower,
        recipe_share_api::routes::params::SubscriptionQuery {
            recipes_limit: Some(1),
            ..Default::default()
        },
    )
    .await?;
    let items = list.data.expect("subscriptions").items;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, author.user_id);
    assert_eq!(items[0].recipes.len(), 1);
    assert_eq!(list.meta.and_then(|m| m.total), Some(1));

    follow_service::unsubscribe(&state, &follower, author.user_id).await?;
    assert_eq!(Follows::find().count(&state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn second_favorite_row_maps_to_duplicate_relation() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let author = create_user(&state, "author").await?;
    let reader = create_user(&state, "reader").await?;
    let tag = create_tag(&state, "lunch").await?;
    let flour = create_ingredient(&state, "flour", "g").await?;
    let recipe = create_recipe(
        &state,
        &author,
        recipe_request("pancakes", vec![tag], &[(flour, 200)]),
    )
    .await?;

    let mark = || FavoriteActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(reader.user_id),
        recipe_id: Set(recipe),
        created_at: Set(Utc::now().into()),
    };
    mark().insert(&state.orm).await?;
    let err = match mark().insert(&state.orm).await {
        Ok(_) => anyhow::bail!("second favorite row was accepted"),
        Err(err) => err,
    };

    assert!(matches!(
        AppError::from_relation_insert(err, RelationKind::Favorite),
        AppError::DuplicateRelation(RelationKind::Favorite)
    ));
    let rows = Favorites::find()
        .filter(FavCol::UserId.eq(reader.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(rows, 1);
    Ok(())
}

#[tokio::test]
async fn second_follow_row_maps_to_duplicate_relation() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let author = create_user(&state, "author").await?;
    let reader = create_user(&state, "reader").await?;

    let follow = || FollowActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(reader.user_id),
        author_id: Set(author.user_id),
        created_at: Set(Utc::now().into()),
    };
    follow().insert(&state.orm).await?;
    let err = match follow().insert(&state.orm).await {
        Ok(_) => anyhow::bail!("second follow row was accepted"),
        Err(err) => err,
    };

    assert!(matches!(
        AppError::from_relation_insert(err, RelationKind::Follow),
        AppError::DuplicateRelation(RelationKind::Follow)
    ));
    assert_eq!(Follows::find().count(&state.orm).await?, 1);
    Ok(())
}
