use axum::http::Uri;
use axum_extra::extract::Query;
use recipe_share_api::routes::params::{Pagination, RecipeQuery};

#[test]
fn huge_page_saturates_instead_of_overflowing() {
    let (page, per_page, offset) = Pagination {
        page: Some(i64::MAX),
        per_page: Some(100),
    }
    .normalize();

    assert_eq!(page, i64::MAX);
    assert_eq!(per_page, 100);
    assert_eq!(offset, i64::MAX);
}

#[test]
fn pagination_defaults_and_clamps() {
    assert_eq!(Pagination::default().normalize(), (1, 6, 0));

    let clamped = Pagination {
        page: Some(-3),
        per_page: Some(1000),
    };
    assert_eq!(clamped.normalize(), (1, 100, 0));

    let third = Pagination {
        page: Some(3),
        per_page: Some(10),
    };
    assert_eq!(third.normalize(), (3, 10, 20));
}

#[test]
fn repeated_tags_keys_are_collected() -> anyhow::Result<()> {
    let uri: Uri = "/api/recipes?tags=breakfast&tags=dinner,lunch&page=2&limit=3".parse()?;
    let Query(query) = Query::<RecipeQuery>::try_from_uri(&uri)?;

    assert_eq!(query.tag_slugs(), ["breakfast", "dinner", "lunch"]);
    assert_eq!(query.page, Some(2));
    assert_eq!(query.per_page, Some(3));
    Ok(())
}

#[test]
fn missing_tags_means_no_tag_filter() -> anyhow::Result<()> {
    let uri: Uri = "/api/recipes?is_favorited=1".parse()?;
    let Query(query) = Query::<RecipeQuery>::try_from_uri(&uri)?;

    assert!(query.tag_slugs().is_empty());
    assert_eq!(query.is_favorited.as_deref(), Some("1"));
    Ok(())
}
