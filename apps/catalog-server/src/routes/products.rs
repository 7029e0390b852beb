//! # Product Endpoints
//!
//! ```text
//! POST   /api/products                  register (201, 409 if known)
//! GET    /api/products                  list everything
//!        ?pending=true                  only products awaiting a price
//!        ?low_stock=true                only products with stock below 5
//! GET    /api/products/barcode/{code}   lookup for the register (404 if pending)
//! PUT    /api/products/{id}             curate name / prices / stock
//! DELETE /api/products/{id}
//! ```
//!
//! A product registered from an unknown scan has no sell price. Until someone
//! prices it, lookup answers 404 so the register keeps treating it as unknown.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use scanpay_core::{NewProduct, Product, ProductCreated, ProductDraft, ProductUpdate};
use scanpay_db::ProductFilter;
use serde::Deserialize;
use tracing::{debug, info};

use super::MessageBody;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub pending: bool,

    #[serde(default)]
    pub low_stock: bool,
}

impl ListQuery {
    /// `pending` wins when both are set.
    fn filter(&self) -> ProductFilter {
        if self.pending {
            ProductFilter::PendingCuration
        } else if self.low_stock {
            ProductFilter::LowStock
        } else {
            ProductFilter::All
        }
    }
}

pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProductCreated>)> {
    let Json(request) = payload?;
    let draft = ProductDraft::from_registration(&request)?;
    let product = state.db.products().insert(&draft).await?;

    info!(
        barcode = %product.barcode,
        pending = product.is_pending_curation(),
        "Product registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(ProductCreated {
            message: "Product added".to_string(),
            barcode: product.barcode,
        }),
    ))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let filter = query.filter();
    let products = state.db.products().list(filter).await?;
    debug!(count = products.len(), filter = ?filter, "Listed products");
    Ok(Json(products))
}

pub async fn get_by_barcode(
    State(state): State<AppState>,
    Path(barcode): Path<String>,
) -> ApiResult<Json<Product>> {
    match state.db.products().get_by_barcode(&barcode).await? {
        Some(product) if !product.is_pending_curation() => Ok(Json(product)),
        Some(_) => {
            debug!(barcode = %barcode, "Lookup of product pending curation");
            Err(ApiError::not_found("Product not found"))
        }
        None => Err(ApiError::not_found("Product not found")),
    }
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<ProductUpdate>, JsonRejection>,
) -> ApiResult<Json<MessageBody>> {
    let Json(update) = payload?;
    update.validate()?;
    let product = state.db.products().update(id, &update).await?;

    info!(id, barcode = %product.barcode, "Product updated");
    Ok(Json(MessageBody::new("Product updated")))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageBody>> {
    state.db.products().delete(id).await?;

    info!(id, "Product deleted");
    Ok(Json(MessageBody::new("Product deleted")))
}
