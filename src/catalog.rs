//! Product catalog rules: slugs, listing filters, creation and updates.

use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use validator::Validate;

use crate::error::{field_errors, ApiError, FieldError};
use crate::models::{list_or_json, not_blank, optional_list_or_json, Product, SizeGuide};

pub const MISSING_FIELDS: &str = "Missing required fields: name, price, description, or category";

/// Derives a URL-safe slug from a product name.
///
/// ASCII letters and digits are kept (lowercased), `&` reads as "and", runs
/// of whitespace, `-` or `_` collapse to a single `-`, everything else is
/// dropped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut dash = false;

    for c in name.chars() {
        if c == '&' {
            if !slug.is_empty() {
                slug.push('-');
            }
            slug.push_str("and");
            dash = true;
        } else if c.is_ascii_alphanumeric() {
            if dash && !slug.is_empty() {
                slug.push('-');
            }
            dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            dash = true;
        }
    }
    slug
}

/// Query string accepted by `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub newest: Option<String>,
    pub bestseller: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub newest: Option<bool>,
    pub bestseller: Option<bool>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        // A present flag filters on `value == "true"`; "false" or anything
        // else selects the unflagged products.
        let flag = |value: Option<String>| value.filter(|v| !v.is_empty()).map(|v| v == "true");
        ProductFilter {
            category: query.category.filter(|c| !c.is_empty()),
            newest: flag(query.newest),
            bestseller: flag(query.bestseller),
        }
    }
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.category.as_ref().map_or(true, |c| &product.category == c)
            && self.newest.map_or(true, |n| product.newest == n)
            && self.bestseller.map_or(true, |b| product.bestseller == b)
    }
}

/// Body of `POST /products`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(required(message = "Name is required"), custom(function = "not_blank", message = "Name is required"))]
    pub name: Option<String>,
    #[serde(default)]
    pub tagline: String,
    #[validate(
        required(message = "Price is required"),
        range(exclusive_min = 0.0, message = "Price must be greater than zero")
    )]
    pub price: Option<f64>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, deserialize_with = "list_or_json")]
    pub gallery_images: Vec<String>,
    #[validate(
        required(message = "Description is required"),
        custom(function = "not_blank", message = "Description is required")
    )]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "list_or_json")]
    pub details: Vec<String>,
    #[serde(default, deserialize_with = "list_or_json")]
    pub size_guide: Vec<SizeGuide>,
    #[validate(
        required(message = "Category is required"),
        custom(function = "not_blank", message = "Category is required")
    )]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "list_or_json")]
    pub colors: Vec<String>,
    #[serde(default)]
    pub newest: Option<bool>,
    #[serde(default)]
    pub bestseller: Option<bool>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i64>,
}

impl NewProduct {
    /// Validates the input and builds the document to insert.
    pub fn into_product(self) -> Result<Product, ApiError> {
        if let Err(errors) = self.validate() {
            return Err(ApiError::validation(MISSING_FIELDS, field_errors(&errors)));
        }
        let (Some(name), Some(price), Some(description), Some(category)) =
            (self.name, self.price, self.description, self.category)
        else {
            return Err(ApiError::BadRequest(MISSING_FIELDS.to_string()));
        };

        let name = name.trim().to_string();
        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(ApiError::validation(
                "Product name must contain letters or digits",
                vec![FieldError::new("name", "Product name must contain letters or digits")],
            ));
        }

        let now = Utc::now();
        Ok(Product {
            id: ObjectId::new().to_hex(),
            name,
            slug,
            tagline: self.tagline,
            price,
            image_url: self.image_url,
            gallery_images: self.gallery_images,
            description,
            details: self.details,
            size_guide: self.size_guide,
            category,
            colors: self.colors,
            newest: self.newest.unwrap_or(false),
            bestseller: self.bestseller.unwrap_or(false),
            stock: self.stock.unwrap_or(0),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Body of `PUT /products/{slug}`. Only the fields present are changed.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[validate(custom(function = "not_blank", message = "Name must not be blank"))]
    pub name: Option<String>,
    pub tagline: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "Price must be greater than zero"))]
    pub price: Option<f64>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "optional_list_or_json")]
    pub gallery_images: Option<Vec<String>>,
    #[validate(custom(function = "not_blank", message = "Description must not be blank"))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "optional_list_or_json")]
    pub details: Option<Vec<String>>,
    #[serde(default, deserialize_with = "optional_list_or_json")]
    pub size_guide: Option<Vec<SizeGuide>>,
    #[validate(custom(function = "not_blank", message = "Category must not be blank"))]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "optional_list_or_json")]
    pub colors: Option<Vec<String>>,
    pub newest: Option<bool>,
    pub bestseller: Option<bool>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i64>,
}

impl ProductUpdate {
    /// Applies the update to `product`, re-deriving the slug on rename.
    pub fn apply(self, product: &mut Product) -> Result<(), ApiError> {
        self.validate()?;

        if let Some(name) = self.name {
            let name = name.trim().to_string();
            let slug = slugify(&name);
            if slug.is_empty() {
                return Err(ApiError::validation(
                    "Product name must contain letters or digits",
                    vec![FieldError::new("name", "Product name must contain letters or digits")],
                ));
            }
            product.name = name;
            product.slug = slug;
        }
        if let Some(tagline) = self.tagline {
            product.tagline = tagline;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image_url) = self.image_url {
            product.image_url = image_url;
        }
        if let Some(gallery_images) = self.gallery_images {
            product.gallery_images = gallery_images;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(details) = self.details {
            product.details = details;
        }
        if let Some(size_guide) = self.size_guide {
            product.size_guide = size_guide;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(colors) = self.colors {
            product.colors = colors;
        }
        if let Some(newest) = self.newest {
            product.newest = newest;
        }
        if let Some(bestseller) = self.bestseller {
            product.bestseller = bestseller;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        product.updated_at = Utc::now();
        Ok(())
    }
}
