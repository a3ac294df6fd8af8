use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Product {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub category: String,
    pub quantity: i32,
    pub price: f64,
    pub description: String,
    pub image: Option<Json<ProductImage>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata of an uploaded product image, stored as JSONB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub file_name: String,
    /// Public path the file is served from, e.g. `/uploads/<name>`.
    pub file_path: String,
    pub file_type: String,
    pub file_size: String,
}

/// Validated field values for an insert.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub sku: Option<String>,
    pub category: String,
    pub quantity: i32,
    pub price: f64,
    pub description: String,
}
