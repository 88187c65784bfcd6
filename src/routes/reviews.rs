use actix_web::{web, HttpResponse};
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use validator::Validate;

use super::object_id;
use crate::db::Store;
use crate::error::{field_errors, ApiError};
use crate::models::{not_blank, Review};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/reviews")
            .route(web::get().to(list_reviews))
            .route(web::post().to(create_review)),
    )
    .route("/reviews/{product_id}", web::get().to(product_reviews));
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct NewReview {
    #[validate(required(message = "Product ID is required"))]
    product_id: Option<String>,
    #[validate(required(message = "Author is required"), custom(function = "not_blank", message = "Author is required"))]
    author: Option<String>,
    #[validate(
        required(message = "Rating is required"),
        range(min = 1, max = 5, message = "Rating must be between 1 and 5")
    )]
    rating: Option<i64>,
    #[validate(required(message = "Review text is required"), custom(function = "not_blank", message = "Review text is required"))]
    text: Option<String>,
    avatar_url: Option<String>,
}

impl NewReview {
    fn into_review(self) -> Result<Review, ApiError> {
        if let Err(errors) = self.validate() {
            let missing = errors
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .any(|err| err.code == "required" || err.code == "blank");
            let message = if missing { "All fields are required" } else { "Invalid review" };
            return Err(ApiError::validation(message, field_errors(&errors)));
        }
        let (Some(product_id), Some(author), Some(rating), Some(text)) =
            (self.product_id, self.author, self.rating, self.text)
        else {
            return Err(ApiError::BadRequest("All fields are required".into()));
        };
        let product_id = object_id(&product_id, "product")?;
        let rating = u8::try_from(rating).map_err(|_| ApiError::BadRequest("Rating must be between 1 and 5".into()))?;

        let author = author.trim().to_string();
        let avatar_url = self
            .avatar_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| format!("https://ui-avatars.com/api/?name={}", urlencoding::encode(&author)));

        Ok(Review {
            id: ObjectId::new().to_hex(),
            product_id,
            author,
            avatar_url,
            rating,
            text,
            date: Utc::now(),
        })
    }
}

async fn list_reviews(store: web::Data<dyn Store>) -> Result<HttpResponse, ApiError> {
    let reviews = store.list_reviews(None).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

async fn product_reviews(store: web::Data<dyn Store>, product_id: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let product_id = object_id(&product_id, "product")?;
    let reviews = store.list_reviews(Some(&product_id)).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

async fn create_review(store: web::Data<dyn Store>, data: web::Json<NewReview>) -> Result<HttpResponse, ApiError> {
    let review = data.into_inner().into_review()?;
    store.insert_review(&review).await?;
    log::info!("Review {} added for product {}", review.id, review.product_id);
    Ok(HttpResponse::Created().json(review))
}
