use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::extract::{ApiBytes, ApiPath};
use crate::models::{NewProduct, Product, ProductImage};
use crate::state::SharedState;
use crate::upload::{self, FormData};
use crate::validation::{self, ValidationError};

const IMAGE_FIELD: &str = "image";

fn required(form: &FormData, key: &'static str) -> Result<String, ValidationError> {
    form.text(key)
        .ok_or_else(|| ValidationError::new(key, "Please fill in all the required fields"))
}

fn new_product(form: &FormData) -> Result<NewProduct, ValidationError> {
    let name = required(form, "name")?;
    let category = required(form, "category")?;
    let description = required(form, "description")?;
    let price = form
        .float("price")?
        .ok_or_else(|| ValidationError::new("price", "Please fill in all the required fields"))?;
    let quantity = form.int("quantity")?.unwrap_or(0);

    validation::validate_name(&name)?;
    validation::validate_price(price)?;
    validation::validate_quantity(quantity)?;

    Ok(NewProduct {
        name,
        sku: form.text("sku"),
        category,
        quantity,
        price,
        description,
    })
}

/// Fields present in the form replace the existing values; absent ones are kept.
fn merged_product(form: &FormData, existing: &Product) -> Result<NewProduct, ValidationError> {
    let product = NewProduct {
        name: form.text("name").unwrap_or_else(|| existing.name.clone()),
        sku: existing.sku.clone(),
        category: form.text("category").unwrap_or_else(|| existing.category.clone()),
        quantity: form.int("quantity")?.unwrap_or(existing.quantity),
        price: form.float("price")?.unwrap_or(existing.price),
        description: form
            .text("description")
            .unwrap_or_else(|| existing.description.clone()),
    };

    validation::validate_name(&product.name)?;
    validation::validate_price(product.price)?;
    validation::validate_quantity(product.quantity)?;

    Ok(product)
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = db::products::list(&state.pool, auth.id()).await?;
    Ok(Json(products))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    headers: HeaderMap,
    ApiBytes(body): ApiBytes,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let form = upload::parse_form(&headers, body, IMAGE_FIELD)
        .await
        .map_err(AppError::BadRequest)?;
    let fields = new_product(&form)?;

    let image = match &form.file {
        Some(file) => Some(upload::store_image(&state.config.upload_dir, file).await?),
        None => None,
    };

    let product = match db::products::create(&state.pool, auth.id(), &fields, image.as_ref()).await
    {
        Ok(product) => product,
        Err(e) => {
            if let Some(image) = &image {
                upload::remove_image(&state.config.upload_dir, image).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(user_id = %auth.id(), product_id = %product.id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Product>, AppError> {
    let product = db::products::find_by_id(&state.pool, id, auth.id())
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(Json(product))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
    headers: HeaderMap,
    ApiBytes(body): ApiBytes,
) -> Result<Json<Product>, AppError> {
    let existing = db::products::find_by_id(&state.pool, id, auth.id())
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let form = upload::parse_form(&headers, body, IMAGE_FIELD)
        .await
        .map_err(AppError::BadRequest)?;
    let fields = merged_product(&form, &existing)?;

    let previous_image: Option<ProductImage> = existing.image.as_ref().map(|img| img.0.clone());
    let new_image = match &form.file {
        Some(file) => Some(upload::store_image(&state.config.upload_dir, file).await?),
        None => None,
    };
    let image = new_image.as_ref().or(previous_image.as_ref());

    let updated = match db::products::update(&state.pool, id, auth.id(), &fields, image).await {
        Ok(product) => product,
        Err(e) => {
            if let Some(image) = &new_image {
                upload::remove_image(&state.config.upload_dir, image).await;
            }
            return Err(match e {
                sqlx::Error::RowNotFound => AppError::NotFound("Product not found".to_string()),
                _ => AppError::Database(e),
            });
        }
    };

    if let (Some(_), Some(old)) = (&new_image, &previous_image) {
        upload::remove_image(&state.config.upload_dir, old).await;
    }

    Ok(Json(updated))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let product = db::products::delete(&state.pool, id, auth.id())
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if let Some(image) = &product.image {
        upload::remove_image(&state.config.upload_dir, image).await;
    }

    tracing::info!(user_id = %auth.id(), product_id = %id, "Product deleted");

    Ok(Json(json!({ "message": "Product deleted" })))
}
