mod common;

use recipe_share_api::{
    dto::{
        ingredients::{CreateIngredientRequest, UpdateIngredientRequest},
        tags::{CreateTagRequest, UpdateTagRequest},
    },
    error::AppError,
    routes::params::IngredientQuery,
    services::{
        ingredient_service,
        tag_service::{self, validate_color, validate_slug},
    },
};

use common::{create_admin, create_ingredient, create_user, setup_state};

#[test]
fn slug_and_color_formats() {
    assert!(validate_slug("quick-dinner_2").is_ok());
    assert!(validate_slug("").is_err());
    assert!(validate_slug("with space").is_err());
    assert!(validate_slug("завтрак").is_err());

    assert!(validate_color("#49b64e").is_ok());
    assert!(validate_color("#E26C2D").is_ok());
    assert!(validate_color("E26C2D").is_err());
    assert!(validate_color("#E26C2").is_err());
    assert!(validate_color("#GGGGGG").is_err());
}

#[tokio::test]
async fn tags_are_admin_managed() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = create_admin(&state, "admin").await?;
    let user = create_user(&state, "user").await?;

    let request = || CreateTagRequest {
        name: "Dinner".into(),
        color: "#8775d2".into(),
        slug: "dinner".into(),
    };

    let denied = tag_service::create_tag(&state, &user, request()).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let tag = tag_service::create_tag(&state, &admin, request())
        .await?
        .data
        .expect("tag");
    assert_eq!(tag.color, "#8775D2");

    let duplicate = tag_service::create_tag(&state, &admin, request()).await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let renamed = tag_service::update_tag(
        &state,
        &admin,
        tag.id,
        UpdateTagRequest {
            name: Some("Supper".into()),
            color: None,
            slug: None,
        },
    )
    .await?
    .data
    .expect("tag");
    assert_eq!(renamed.name, "Supper");
    assert_eq!(renamed.slug, "dinner");

    let listed = tag_service::list_tags(&state).await?.data.expect("tags");
    assert_eq!(listed.items.len(), 1);

    tag_service::delete_tag(&state, &admin, tag.id).await?;
    let missing = tag_service::get_tag(&state, tag.id).await;
    assert!(matches!(missing, Err(AppError::NotFound)));
    Ok(())
}

#[tokio::test]
async fn ingredient_search_is_a_case_insensitive_prefix() -> anyhow::Result<()> {
    let state = setup_state().await?;
    create_ingredient(&state, "Sugar", "g").await?;
    create_ingredient(&state, "salt", "g").await?;
    create_ingredient(&state, "brown sugar", "g").await?;

    let found = ingredient_service::list_ingredients(
        &state,
        IngredientQuery {
            name: Some("SU".into()),
        },
    )
    .await?
    .data
    .expect("ingredients");
    let names: Vec<_> = found.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Sugar"]);

    let all = ingredient_service::list_ingredients(&state, IngredientQuery::default())
        .await?
        .data
        .expect("ingredients");
    assert_eq!(all.items.len(), 3);
    Ok(())
}

#[tokio::test]
async fn ingredients_are_admin_managed() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = create_admin(&state, "admin").await?;
    let user = create_user(&state, "user").await?;

    let denied = ingredient_service::create_ingredient(
        &state,
        &user,
        CreateIngredientRequest {
            name: "butter".into(),
            measurement_unit: "g".into(),
        },
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let butter = ingredient_service::create_ingredient(
        &state,
        &admin,
        CreateIngredientRequest {
            name: "butter".into(),
            measurement_unit: "g".into(),
        },
    )
    .await?
    .data
    .expect("ingredient");

    let updated = ingredient_service::update_ingredient(
        &state,
        &admin,
        butter.id,
        UpdateIngredientRequest {
            name: None,
            measurement_unit: Some("kg".into()),
        },
    )
    .await?
    .data
    .expect("ingredient");
    assert_eq!(updated.measurement_unit, "kg");

    let blank = ingredient_service::update_ingredient(
        &state,
        &admin,
        butter.id,
        UpdateIngredientRequest {
            name: Some("   ".into()),
            measurement_unit: None,
        },
    )
    .await;
    assert!(matches!(blank, Err(AppError::BadRequest(_))));

    ingredient_service::delete_ingredient(&state, &admin, butter.id).await?;
    let again = ingredient_service::delete_ingredient(&state, &admin, butter.id).await;
    assert!(matches!(again, Err(AppError::NotFound)));
    Ok(())
}
