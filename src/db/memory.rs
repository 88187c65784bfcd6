use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::{Store, StoreError};
use crate::catalog::ProductFilter;
use crate::models::{AdminAccount, ContactMessage, Order, OrderStatus, Product, Review};

#[derive(Default)]
struct Collections {
    products: Vec<Product>,
    orders: Vec<Order>,
    reviews: Vec<Review>,
    contacts: Vec<ContactMessage>,
    admins: Vec<AdminAccount>,
}

/// Keeps every collection in memory. Documents are held in insertion order
/// and listed newest first, like the Mongo store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn newest_first<T: Clone>(docs: &[T], keep: impl Fn(&T) -> bool) -> Vec<T> {
    docs.iter().rev().filter(|&d| keep(d)).cloned().collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        Ok(newest_first(&self.read().products, |p| filter.matches(p)))
    }

    async fn find_product(&self, slug: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.read().products.iter().find(|p| p.slug == slug).cloned())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut db = self.write();
        if db.products.iter().any(|p| p.slug == product.slug) {
            return Err(StoreError::Duplicate(product.slug.clone()));
        }
        db.products.push(product.clone());
        Ok(())
    }

    async fn replace_product(&self, slug: &str, product: &Product) -> Result<bool, StoreError> {
        let mut db = self.write();
        let Some(index) = db.products.iter().position(|p| p.slug == slug) else {
            return Ok(false);
        };
        let taken = db
            .products
            .iter()
            .enumerate()
            .any(|(i, p)| i != index && p.slug == product.slug);
        if taken {
            return Err(StoreError::Duplicate(product.slug.clone()));
        }
        db.products[index] = product.clone();
        Ok(true)
    }

    async fn delete_product(&self, slug: &str) -> Result<bool, StoreError> {
        let mut db = self.write();
        let before = db.products.len();
        db.products.retain(|p| p.slug != slug);
        Ok(db.products.len() < before)
    }

    async fn list_orders(&self, email: Option<&str>) -> Result<Vec<Order>, StoreError> {
        Ok(newest_first(&self.read().orders, |o| {
            email.map_or(true, |e| o.customer_email == e)
        }))
    }

    async fn find_order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.read().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        self.write().orders.push(order.clone());
        Ok(())
    }

    async fn set_order_status(&self, id: &str, status: OrderStatus) -> Result<Option<Order>, StoreError> {
        let mut db = self.write();
        Ok(db.orders.iter_mut().find(|o| o.id == id).map(|order| {
            order.status = status;
            order.clone()
        }))
    }

    async fn list_reviews(&self, product_id: Option<&str>) -> Result<Vec<Review>, StoreError> {
        Ok(newest_first(&self.read().reviews, |r| {
            product_id.map_or(true, |id| r.product_id == id)
        }))
    }

    async fn insert_review(&self, review: &Review) -> Result<(), StoreError> {
        self.write().reviews.push(review.clone());
        Ok(())
    }

    async fn list_contacts(&self) -> Result<Vec<ContactMessage>, StoreError> {
        Ok(newest_first(&self.read().contacts, |_| true))
    }

    async fn insert_contact(&self, message: &ContactMessage) -> Result<(), StoreError> {
        self.write().contacts.push(message.clone());
        Ok(())
    }

    async fn find_admin(&self, email: &str) -> Result<Option<AdminAccount>, StoreError> {
        Ok(self.read().admins.iter().find(|a| a.email == email).cloned())
    }

    async fn upsert_admin(&self, admin: &AdminAccount) -> Result<(), StoreError> {
        let mut db = self.write();
        match db.admins.iter_mut().find(|a| a.email == admin.email) {
            Some(existing) => {
                existing.name = admin.name.clone();
                existing.password_hash = admin.password_hash.clone();
            }
            None => db.admins.push(admin.clone()),
        }
        Ok(())
    }
}
