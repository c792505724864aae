use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::Utc;
use recipe_share_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    models::{ROLE_ADMIN, ROLE_USER},
};
use serde::Deserialize;
use uuid::Uuid;

const INGREDIENTS_FILE: &str = "data/ingredients.json";

#[derive(Debug, Deserialize)]
struct IngredientRecord {
    name: String,
    measurement_unit: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    // Ensure the schema exists before writing rows.
    let orm = create_orm_conn(&config.database_url, 1).await?;
    run_migrations(&orm).await?;

    let pool = create_pool(&config.database_url).await?;

    let admin_id =
        ensure_user_with_role(&pool, "admin", "admin@example.com", "admin12345", ROLE_ADMIN)
            .await?;
    let user_id =
        ensure_user_with_role(&pool, "cook", "cook@example.com", "cook12345", ROLE_USER).await?;
    seed_tags(&pool).await?;
    seed_ingredients(&pool, INGREDIENTS_FILE).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users
            (id, username, email, first_name, last_name, password_hash, role, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(username)
    .bind("Seed")
    .bind(password_hash)
    .bind(role)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_tags(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let tags = [
        ("Завтрак", "#E26C2D", "breakfast"),
        ("Обед", "#49B64E", "lunch"),
        ("Ужин", "#8775D2", "dinner"),
    ];

    for (name, color, slug) in tags {
        sqlx::query(
            r#"
            INSERT INTO tags (id, name, color, slug)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(color)
        .bind(slug)
        .execute(pool)
        .await?;
    }

    println!("Seeded tags");
    Ok(())
}

async fn seed_ingredients(pool: &sqlx::PgPool, path: &str) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(path).await?;
    let records: Vec<IngredientRecord> = serde_json::from_str(&raw)?;

    let mut inserted = 0_u64;
    for record in &records {
        let result = sqlx::query(
            r#"
            INSERT INTO ingredients (id, name, measurement_unit)
            SELECT $1, $2, $3
            WHERE NOT EXISTS (
                SELECT 1 FROM ingredients WHERE name = $2 AND measurement_unit = $3
            )
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.name)
        .bind(&record.measurement_unit)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }

    println!("Seeded ingredients: {inserted} new of {}", records.len());
    Ok(())
}
