use async_trait::async_trait;
use futures::stream::StreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{
    ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument, UpdateOptions,
};
use mongodb::{Client, Collection, Cursor, Database, IndexModel};
use serde::de::DeserializeOwned;

use super::{Store, StoreError};
use crate::catalog::ProductFilter;
use crate::models::{AdminAccount, ContactMessage, Order, OrderStatus, Product, Review};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    products: Collection<Product>,
    orders: Collection<Order>,
    reviews: Collection<Review>,
    contacts: Collection<ContactMessage>,
    admins: Collection<AdminAccount>,
}

impl MongoStore {
    /// Connects, selects `database_name` and makes sure the unique indexes
    /// exist.
    pub async fn connect(database_url: &str, database_name: &str) -> Result<Self, StoreError> {
        let client_options = ClientOptions::parse(database_url).await?;
        let client = Client::with_options(client_options)?;
        let store = Self::new(&client.database(database_name));
        store.ensure_indexes().await?;
        log::info!("Connected to MongoDB database {}", database_name);
        Ok(store)
    }

    pub fn new(db: &Database) -> Self {
        MongoStore {
            products: db.collection("products"),
            orders: db.collection("orders"),
            reviews: db.collection("reviews"),
            contacts: db.collection("contacts"),
            admins: db.collection("admins"),
        }
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let unique = || IndexOptions::builder().unique(true).build();
        self.products
            .create_index(IndexModel::builder().keys(doc! { "slug": 1 }).options(unique()).build(), None)
            .await?;
        self.admins
            .create_index(IndexModel::builder().keys(doc! { "email": 1 }).options(unique()).build(), None)
            .await?;
        self.reviews
            .create_index(IndexModel::builder().keys(doc! { "productId": 1 }).build(), None)
            .await?;
        self.orders
            .create_index(IndexModel::builder().keys(doc! { "customerEmail": 1 }).build(), None)
            .await?;
        Ok(())
    }
}

// ObjectIds grow with creation time, so sorting on `_id` lists newest first.
fn newest_first() -> FindOptions {
    FindOptions::builder().sort(doc! { "_id": -1 }).build()
}

async fn collect<T>(mut cursor: Cursor<T>) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let mut docs = Vec::new();
    while let Some(result) = cursor.next().await {
        docs.push(result?);
    }
    Ok(docs)
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn write_error(err: mongodb::error::Error, what: &str) -> StoreError {
    if is_duplicate_key(&err) {
        StoreError::Duplicate(what.to_string())
    } else {
        StoreError::Database(err)
    }
}

fn product_filter(filter: &ProductFilter) -> Document {
    let mut query = Document::new();
    if let Some(category) = &filter.category {
        query.insert("category", category.as_str());
    }
    if let Some(newest) = filter.newest {
        query.insert("newest", newest);
    }
    if let Some(bestseller) = filter.bestseller {
        query.insert("bestseller", bestseller);
    }
    query
}

#[async_trait]
impl Store for MongoStore {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let cursor = self.products.find(product_filter(filter), newest_first()).await?;
        collect(cursor).await
    }

    async fn find_product(&self, slug: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.find_one(doc! { "slug": slug }, None).await?)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        self.products
            .insert_one(product, None)
            .await
            .map_err(|e| write_error(e, &product.slug))?;
        Ok(())
    }

    async fn replace_product(&self, slug: &str, product: &Product) -> Result<bool, StoreError> {
        let result = self
            .products
            .replace_one(doc! { "slug": slug }, product, None)
            .await
            .map_err(|e| write_error(e, &product.slug))?;
        Ok(result.matched_count == 1)
    }

    async fn delete_product(&self, slug: &str) -> Result<bool, StoreError> {
        let result = self.products.delete_one(doc! { "slug": slug }, None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn list_orders(&self, email: Option<&str>) -> Result<Vec<Order>, StoreError> {
        let filter = match email {
            Some(email) => doc! { "customerEmail": email },
            None => doc! {},
        };
        let cursor = self.orders.find(filter, newest_first()).await?;
        collect(cursor).await
    }

    async fn find_order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.find_one(doc! { "_id": id }, None).await?)
    }

    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.insert_one(order, None).await?;
        Ok(())
    }

    async fn set_order_status(&self, id: &str, status: OrderStatus) -> Result<Option<Order>, StoreError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .orders
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": { "status": status.as_str() } }, options)
            .await?;
        Ok(updated)
    }

    async fn list_reviews(&self, product_id: Option<&str>) -> Result<Vec<Review>, StoreError> {
        let filter = match product_id {
            Some(product_id) => doc! { "productId": product_id },
            None => doc! {},
        };
        let cursor = self.reviews.find(filter, newest_first()).await?;
        collect(cursor).await
    }

    async fn insert_review(&self, review: &Review) -> Result<(), StoreError> {
        self.reviews.insert_one(review, None).await?;
        Ok(())
    }

    async fn list_contacts(&self) -> Result<Vec<ContactMessage>, StoreError> {
        let cursor = self.contacts.find(None, newest_first()).await?;
        collect(cursor).await
    }

    async fn insert_contact(&self, message: &ContactMessage) -> Result<(), StoreError> {
        self.contacts.insert_one(message, None).await?;
        Ok(())
    }

    async fn find_admin(&self, email: &str) -> Result<Option<AdminAccount>, StoreError> {
        Ok(self.admins.find_one(doc! { "email": email }, None).await?)
    }

    async fn upsert_admin(&self, admin: &AdminAccount) -> Result<(), StoreError> {
        let update = doc! {
            "$set": { "name": admin.name.as_str(), "passwordHash": admin.password_hash.as_str() },
            "$setOnInsert": { "_id": admin.id.as_str() },
        };
        let options = UpdateOptions::builder().upsert(true).build();
        self.admins
            .update_one(doc! { "email": admin.email.as_str() }, update, options)
            .await
            .map_err(|e| write_error(e, &admin.email))?;
        Ok(())
    }
}
