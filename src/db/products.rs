use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewProduct, Product, ProductImage};

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    product: &NewProduct,
    image: Option<&ProductImage>,
) -> Result<Product, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "INSERT INTO products (user_id, name, sku, category, quantity, price, description, image)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(user_id)
    .bind(&product.name)
    .bind(&product.sku)
    .bind(&product.category)
    .bind(product.quantity)
    .bind(product.price)
    .bind(&product.description)
    .bind(image.map(Json))
    .fetch_one(pool)
    .await
}

pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Overwrite every mutable column. The SKU is fixed at creation.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    product: &NewProduct,
    image: Option<&ProductImage>,
) -> Result<Product, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "UPDATE products
         SET name = $3, category = $4, quantity = $5, price = $6, description = $7,
             image = $8, updated_at = now()
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(&product.name)
    .bind(&product.category)
    .bind(product.quantity)
    .bind(product.price)
    .bind(&product.description)
    .bind(image.map(Json))
    .fetch_one(pool)
    .await
}

/// Delete and return the product, or `None` if the caller does not own one with this id.
pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "DELETE FROM products WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
