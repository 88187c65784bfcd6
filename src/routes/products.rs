use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::catalog::{NewProduct, ProductFilter, ProductQuery, ProductUpdate};
use crate::db::{Store, StoreError};
use crate::error::ApiError;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/products")
            .route(web::get().to(list_products))
            .route(web::post().to(create_product)),
    )
    .service(
        web::resource("/products/{slug}")
            .route(web::get().to(get_product))
            .route(web::put().to(update_product))
            .route(web::delete().to(delete_product)),
    );
}

fn name_taken(err: StoreError) -> ApiError {
    match err {
        StoreError::Duplicate(_) => ApiError::BadRequest("Product with this name already exists".into()),
        other => other.into(),
    }
}

async fn list_products(store: web::Data<dyn Store>, query: web::Query<ProductQuery>) -> Result<HttpResponse, ApiError> {
    let filter = ProductFilter::from(query.into_inner());
    let products = store.list_products(&filter).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Products fetched successfully",
        "count": products.len(),
        "products": products,
    })))
}

async fn get_product(store: web::Data<dyn Store>, slug: web::Path<String>) -> Result<HttpResponse, ApiError> {
    match store.find_product(&slug).await? {
        Some(product) => Ok(HttpResponse::Ok().json(product)),
        None => Err(ApiError::NotFound("Product not found".into())),
    }
}

async fn create_product(store: web::Data<dyn Store>, data: web::Json<NewProduct>) -> Result<HttpResponse, ApiError> {
    let product = data.into_inner().into_product()?;
    store.insert_product(&product).await.map_err(name_taken)?;

    log::info!("Created product {}", product.slug);
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Product created successfully",
        "product": product,
    })))
}

async fn update_product(
    store: web::Data<dyn Store>,
    slug: web::Path<String>,
    data: web::Json<ProductUpdate>,
) -> Result<HttpResponse, ApiError> {
    let slug = slug.into_inner();
    let mut product = store
        .find_product(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))?;

    data.into_inner().apply(&mut product)?;
    if !store.replace_product(&slug, &product).await.map_err(name_taken)? {
        return Err(ApiError::NotFound("Product not found".into()));
    }

    log::info!("Updated product {} (now {})", slug, product.slug);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Product updated successfully",
        "product": product,
    })))
}

async fn delete_product(store: web::Data<dyn Store>, slug: web::Path<String>) -> Result<HttpResponse, ApiError> {
    if store.delete_product(&slug).await? {
        log::info!("Deleted product {}", slug);
        Ok(HttpResponse::Ok().json(json!({ "message": "Product deleted successfully" })))
    } else {
        Err(ApiError::NotFound("Product not found".into()))
    }
}
