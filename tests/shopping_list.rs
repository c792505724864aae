mod common;

use recipe_share_api::{
    entity::{favorites::Entity as Favorites, shopping_carts::Entity as ShoppingCarts},
    error::AppError,
    models::ShoppingListItem,
    services::{
        recipe_service, relation_service,
        shopping_list_service::{SHOPPING_LIST_HEADER, render_shopping_list, shopping_list},
    },
};
use sea_orm::{EntityTrait, PaginatorTrait};

use common::{
    create_ingredient, create_recipe, create_tag, create_user, recipe_request, setup_state,
};

#[tokio::test]
async fn same_ingredient_across_recipes_is_summed() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let cook = create_user(&state, "cook").await?;
    let tag = create_tag(&state, "baking").await?;
    let flour = create_ingredient(&state, "flour", "g").await?;
    let milk = create_ingredient(&state, "milk", "ml").await?;

    let bread = create_recipe(
        &state,
        &cook,
        recipe_request("bread", vec![tag], &[(flour, 100)]),
    )
    .await?;
    let crepes = create_recipe(
        &state,
        &cook,
        recipe_request("crepes", vec![tag], &[(flour, 50), (milk, 250)]),
    )
    .await?;

    relation_service::add_to_shopping_cart(&state, &cook, bread).await?;
    relation_service::add_to_shopping_cart(&state, &cook, crepes).await?;

    let items = shopping_list(&state.orm, cook.user_id).await?;
    assert_eq!(
        items,
        vec![
            ShoppingListItem {
                name: "flour".into(),
                measurement_unit: "g".into(),
                total_amount: 150,
            },
            ShoppingListItem {
                name: "milk".into(),
                measurement_unit: "ml".into(),
                total_amount: 250,
            },
        ]
    );
    Ok(())
}

#[tokio::test]
async fn empty_cart_cannot_be_downloaded() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let cook = create_user(&state, "cook").await?;

    let result = shopping_list(&state.orm, cook.user_id).await;
    assert!(matches!(result, Err(AppError::EmptyCart)));
    Ok(())
}

#[tokio::test]
async fn other_users_carts_are_ignored() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let alice = create_user(&state, "alice").await?;
    let bob = create_user(&state, "bob").await?;
    let tag = create_tag(&state, "dinner").await?;
    let rice = create_ingredient(&state, "rice", "g").await?;
    let recipe = create_recipe(
        &state,
        &alice,
        recipe_request("pilaf", vec![tag], &[(rice, 300)]),
    )
    .await?;

    relation_service::add_to_shopping_cart(&state, &alice, recipe).await?;

    let result = shopping_list(&state.orm, bob.user_id).await;
    assert!(matches!(result, Err(AppError::EmptyCart)));
    assert_eq!(shopping_list(&state.orm, alice.user_id).await?.len(), 1);
    Ok(())
}

#[test]
fn rendered_list_has_header_and_one_line_per_item() {
    let items = vec![
        ShoppingListItem {
            name: "flour".into(),
            measurement_unit: "g".into(),
            total_amount: 150,
        },
        ShoppingListItem {
            name: "milk".into(),
            measurement_unit: "ml".into(),
            total_amount: 250,
        },
    ];

    let text = render_shopping_list(&items);
    assert_eq!(
        text,
        format!("{SHOPPING_LIST_HEADER}\n- flour - 150 g\n- milk - 250 ml\n")
    );
}

#[tokio::test]
async fn deleting_a_recipe_drops_its_marks() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let cook = create_user(&state, "cook").await?;
    let tag = create_tag(&state, "snack").await?;
    let nuts = create_ingredient(&state, "nuts", "g").await?;
    let recipe = create_recipe(
        &state,
        &cook,
        recipe_request("trail mix", vec![tag], &[(nuts, 80)]),
    )
    .await?;

    relation_service::add_favorite(&state, &cook, recipe).await?;
    relation_service::add_to_shopping_cart(&state, &cook, recipe).await?;

    recipe_service::delete_recipe(&state, &cook, recipe).await?;

    assert_eq!(Favorites::find().count(&state.orm).await?, 0);
    assert_eq!(ShoppingCarts::find().count(&state.orm).await?, 0);
    Ok(())
}
