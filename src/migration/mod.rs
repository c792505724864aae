use sea_orm_migration::prelude::*;

mod m20251017_000001_create_users;
mod m20251017_000002_create_catalog;
mod m20251017_000003_create_recipes;
mod m20251017_000004_create_user_relations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251017_000001_create_users::Migration),
            Box::new(m20251017_000002_create_catalog::Migration),
            Box::new(m20251017_000003_create_recipes::Migration),
            Box::new(m20251017_000004_create_user_relations::Migration),
        ]
    }
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Username,
    Email,
    FirstName,
    LastName,
    PasswordHash,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Tags {
    Table,
    Id,
    Name,
    Color,
    Slug,
}

#[derive(DeriveIden)]
pub(crate) enum Ingredients {
    Table,
    Id,
    Name,
    MeasurementUnit,
}

#[derive(DeriveIden)]
pub(crate) enum Recipes {
    Table,
    Id,
    AuthorId,
    Name,
    Image,
    Text,
    CookingTime,
    PubDate,
}
