use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_restaurant_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let master_id = ensure_user(&pool, None, "Master", "master@example.com", "master123", "master").await?;
    let restaurant_id = ensure_restaurant(&pool, "Demo Burger", "demo-burger").await?;
    let admin_id = ensure_user(
        &pool,
        Some(restaurant_id),
        "Admin",
        "admin@demo-burger.example",
        "admin123",
        "admin",
    )
    .await?;
    ensure_user(
        &pool,
        Some(restaurant_id),
        "Cashier",
        "cashier@demo-burger.example",
        "cashier123",
        "cashier",
    )
    .await?;
    ensure_user(
        &pool,
        Some(restaurant_id),
        "Kitchen",
        "kitchen@demo-burger.example",
        "kitchen123",
        "kitchen",
    )
    .await?;
    seed_tables(&pool, restaurant_id).await?;
    seed_products(&pool, restaurant_id).await?;

    println!("Seed completed. Master ID: {master_id}, Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_restaurant(pool: &sqlx::PgPool, name: &str, slug: &str) -> anyhow::Result<Uuid> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO restaurants (id, name, slug, status, plan_type)
        VALUES ($1, $2, $3, 'active', 'premium')
        ON CONFLICT (slug) DO UPDATE SET status = EXCLUDED.status
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    let restaurant_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM restaurants WHERE slug = $1")
                .bind(slug)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured restaurant {slug}");
    Ok(restaurant_id)
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    restaurant_id: Option<Uuid>,
    name: &str,
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
        INSERT INTO user_profiles (id, restaurant_id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(restaurant_id)
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM user_profiles WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_tables(pool: &sqlx::PgPool, restaurant_id: Uuid) -> anyhow::Result<()> {
    for number in 1..=8 {
        sqlx::query(
            r#"
            INSERT INTO dining_tables (id, restaurant_id, number, seats)
            VALUES ($1, $2, $3, 4)
            ON CONFLICT (restaurant_id, number) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(restaurant_id)
        .bind(number)
        .execute(pool)
        .await?;
    }

    println!("Seeded tables");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool, restaurant_id: Uuid) -> anyhow::Result<()> {
    // Prices in centavos.
    let products = vec![
        ("X-Burger", "House burger with cheese", "burgers", 1800_i64),
        ("X-Bacon", "Burger with bacon and cheese", "burgers", 2200),
        ("Fries", "Crispy potato fries", "sides", 900),
        ("Soda Can", "Assorted flavors", "drinks", 600),
        ("Milkshake", "Vanilla or chocolate", "drinks", 1400),
    ];

    for (name, desc, category, price) in products {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO products (id, restaurant_id, name, description, category, price)
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (
                SELECT 1 FROM products WHERE restaurant_id = $2 AND name = $3
            )
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(restaurant_id)
        .bind(name)
        .bind(desc)
        .bind(category)
        .bind(price)
        .fetch_optional(pool)
        .await?;

        if let Some((product_id,)) = row {
            if category == "burgers" {
                seed_addons(pool, product_id).await?;
            }
        }
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_addons(pool: &sqlx::PgPool, product_id: Uuid) -> anyhow::Result<()> {
    let addons = vec![("Extra cheese", 300_i64), ("Extra bacon", 500), ("Fried egg", 200)];

    for (name, price) in addons {
        sqlx::query(
            r#"
            INSERT INTO product_addons (id, product_id, name, price)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(name)
        .bind(price)
        .execute(pool)
        .await?;
    }

    Ok(())
}
