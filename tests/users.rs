mod common;

use recipe_share_api::{
    dto::users::{RegisterRequest, SetPasswordRequest},
    entity::users::Entity as Users,
    error::AppError,
    middleware::auth::{AuthUser, MaybeAuthUser},
    models::ROLE_USER,
    routes::params::UserQuery,
    services::{
        auth_service::verify_password,
        follow_service,
        user_service::{self, validate_email, validate_username},
    },
};
use sea_orm::EntityTrait;

use common::{create_user, setup_state};

fn registration(username: &str, email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_owned(),
        username: username.to_owned(),
        first_name: "Ivan".to_owned(),
        last_name: "Petrov".to_owned(),
        password: "s3cret-pass".to_owned(),
    }
}

#[test]
fn username_and_email_rules() {
    assert!(validate_username("chef.bob+1@home-kitchen_").is_ok());
    assert!(validate_username("").is_err());
    assert!(validate_username("bad name").is_err());
    assert!(validate_username("semi;colon").is_err());
    assert!(validate_username(&"a".repeat(151)).is_err());

    assert!(validate_email("cook@example.com").is_ok());
    assert!(validate_email("cook@localhost").is_err());
    assert!(validate_email("@example.com").is_err());
}

#[tokio::test]
async fn register_then_change_password() -> anyhow::Result<()> {
    let state = setup_state().await?;

    let created = user_service::register_user(&state, registration("ivan", "Ivan@Example.com"))
        .await?
        .data
        .expect("user");
    assert_eq!(created.email, "ivan@example.com");
    assert!(!created.is_subscribed);

    let stored = Users::find_by_id(created.id)
        .one(&state.orm)
        .await?
        .expect("stored user");
    assert_eq!(stored.role, ROLE_USER);
    assert!(verify_password("s3cret-pass", &stored.password_hash)?);

    let auth = AuthUser {
        user_id: created.id,
        role: stored.role.clone(),
    };
    let wrong = recipe_share_api::services::auth_service::set_password(
        &state,
        &auth,
        SetPasswordRequest {
            current_password: "nope".into(),
            new_password: "another-pass".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::BadRequest(_))));

    recipe_share_api::services::auth_service::set_password(
        &state,
        &auth,
        SetPasswordRequest {
            current_password: "s3cret-pass".into(),
            new_password: "another-pass".into(),
        },
    )
    .await?;
    let stored = Users::find_by_id(created.id)
        .one(&state.orm)
        .await?
        .expect("stored user");
    assert!(verify_password("another-pass", &stored.password_hash)?);
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_is_rejected() -> anyhow::Result<()> {
    let state = setup_state().await?;
    user_service::register_user(&state, registration("ivan", "ivan@example.com")).await?;

    let same_email =
        user_service::register_user(&state, registration("other", "IVAN@example.com")).await;
    assert!(matches!(same_email, Err(AppError::BadRequest(_))));

    let same_name =
        user_service::register_user(&state, registration("ivan", "new@example.com")).await;
    assert!(matches!(same_name, Err(AppError::BadRequest(_))));

    let weak = RegisterRequest {
        password: "short".into(),
        ..registration("fresh", "fresh@example.com")
    };
    assert!(matches!(
        user_service::register_user(&state, weak).await,
        Err(AppError::BadRequest(_))
    ));
    Ok(())
}

#[tokio::test]
async fn search_and_subscription_flags() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let viewer = create_user(&state, "viewer").await?;
    let anna = create_user(&state, "anna").await?;
    create_user(&state, "andrew").await?;
    create_user(&state, "boris").await?;

    follow_service::subscribe(&state, &viewer, anna.user_id, None).await?;

    let found = user_service::list_users(
        &state,
        &MaybeAuthUser(Some(viewer.clone())),
        UserQuery {
            search: Some("AN".into()),
            ..Default::default()
        },
    )
    .await?;
    let users = found.data.expect("users").items;
    let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, ["andrew", "anna"]);
    assert!(users.iter().any(|u| u.username == "anna" && u.is_subscribed));
    assert!(users.iter().any(|u| u.username == "andrew" && !u.is_subscribed));

    let profile = user_service::get_user(&state, &viewer, anna.user_id)
        .await?
        .data
        .expect("profile");
    assert!(profile.is_subscribed);

    let paged = user_service::list_users(
        &state,
        &MaybeAuthUser(None),
        UserQuery {
            page: Some(2),
            per_page: Some(3),
            search: None,
        },
    )
    .await?;
    assert_eq!(paged.data.expect("users").items.len(), 1);
    assert_eq!(paged.meta.and_then(|m| m.total), Some(4));
    Ok(())
}
