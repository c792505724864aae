use sea_orm_migration::prelude::*;

use super::{Recipes, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Follows {
    Table,
    Id,
    UserId,
    AuthorId,
    CreatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum Favorites {
    Table,
}

#[derive(DeriveIden, Clone, Copy)]
enum ShoppingCarts {
    Table,
}

#[derive(DeriveIden)]
enum Mark {
    Id,
    UserId,
    RecipeId,
    CreatedAt,
}

/// Favorites and shopping carts share one shape: a unique (user, recipe) pair.
fn recipe_mark_table(
    table: impl IntoIden + Copy + 'static,
    prefix: &str,
) -> TableCreateStatement {
    Table::create()
        .table(table)
        .if_not_exists()
        .col(ColumnDef::new(Mark::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Mark::UserId).uuid().not_null())
        .col(ColumnDef::new(Mark::RecipeId).uuid().not_null())
        .col(
            ColumnDef::new(Mark::CreatedAt)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{prefix}_user"))
                .from(table, Mark::UserId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{prefix}_recipe"))
                .from(table, Mark::RecipeId)
                .to(Recipes::Table, Recipes::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

fn unique_user_recipe(
    table: impl IntoIden + Copy + 'static,
    prefix: &str,
) -> IndexCreateStatement {
    Index::create()
        .name(format!("uq_{prefix}_user_recipe"))
        .table(table)
        .col(Mark::UserId)
        .col(Mark::RecipeId)
        .unique()
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Follows::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Follows::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Follows::UserId).uuid().not_null())
                    .col(ColumnDef::new(Follows::AuthorId).uuid().not_null())
                    .col(
                        ColumnDef::new(Follows::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .check(Expr::col(Follows::UserId).ne(Expr::col(Follows::AuthorId)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follows_user")
                            .from(Follows::Table, Follows::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follows_author")
                            .from(Follows::Table, Follows::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_follows_user_author")
                    .table(Follows::Table)
                    .col(Follows::UserId)
                    .col(Follows::AuthorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(recipe_mark_table(Favorites::Table, "favorites"))
            .await?;
        manager
            .create_index(unique_user_recipe(Favorites::Table, "favorites"))
            .await?;

        manager
            .create_table(recipe_mark_table(ShoppingCarts::Table, "shopping_carts"))
            .await?;
        manager
            .create_index(unique_user_recipe(ShoppingCarts::Table, "shopping_carts"))
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ShoppingCarts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Favorites::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Follows::Table).to_owned())
            .await
    }
}
