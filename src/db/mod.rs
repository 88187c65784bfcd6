//! Persistence for products, orders, reviews, contact messages and admins.
//!
//! Handlers only see the [`Store`] trait. [`MongoStore`] backs the running
//! service; [`MemoryStore`] keeps everything in process for tests and local
//! runs without a database.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::ProductFilter;
use crate::models::{AdminAccount, ContactMessage, Order, OrderStatus, Product, Review};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index (product slug, admin email) rejected the write.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

/// Listing methods return newest documents first.
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError>;
    async fn find_product(&self, slug: &str) -> Result<Option<Product>, StoreError>;
    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;
    /// Replaces the product currently stored under `slug`. Returns `false`
    /// when there is none.
    async fn replace_product(&self, slug: &str, product: &Product) -> Result<bool, StoreError>;
    async fn delete_product(&self, slug: &str) -> Result<bool, StoreError>;

    async fn list_orders(&self, email: Option<&str>) -> Result<Vec<Order>, StoreError>;
    async fn find_order(&self, id: &str) -> Result<Option<Order>, StoreError>;
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError>;
    async fn set_order_status(&self, id: &str, status: OrderStatus) -> Result<Option<Order>, StoreError>;

    async fn list_reviews(&self, product_id: Option<&str>) -> Result<Vec<Review>, StoreError>;
    async fn insert_review(&self, review: &Review) -> Result<(), StoreError>;

    async fn list_contacts(&self) -> Result<Vec<ContactMessage>, StoreError>;
    async fn insert_contact(&self, message: &ContactMessage) -> Result<(), StoreError>;

    async fn find_admin(&self, email: &str) -> Result<Option<AdminAccount>, StoreError>;
    /// Creates the admin or refreshes its name and password hash.
    async fn upsert_admin(&self, admin: &AdminAccount) -> Result<(), StoreError>;
}
