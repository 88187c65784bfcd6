//! Shopping cart arithmetic.
//!
//! The cart lives in the shopper's browser; the server only rebuilds one from
//! submitted items to price it, so the merge rules here must match the
//! client's.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Largest quantity accepted for a single cart or order line.
pub const MAX_QUANTITY: u32 = 999;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub name: String,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    #[validate(range(min = 1, max = 999, message = "Quantity must be between 1 and 999"))]
    pub quantity: u32,
}

impl CartItem {
    fn same_variant(&self, other: &CartItem) -> bool {
        self.id == other.id && self.size == other.size && self.color == other.color
    }

    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds `item`, merging it into an existing line for the same product,
    /// size and color. A merged line takes the newer name, price, image and
    /// description.
    pub fn add(&mut self, item: CartItem) {
        match self.items.iter_mut().find(|line| line.same_variant(&item)) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(item.quantity);
                line.name = item.name;
                line.price = item.price;
                line.image_url = item.image_url;
                line.description = item.description;
            }
            None => self.items.push(item),
        }
    }

    /// Removes every line for product `id`, whatever its size or color.
    pub fn remove(&mut self, id: &str) {
        self.items.retain(|line| line.id != id);
    }

    /// Sets the quantity of every line for `id`; anything below 1 removes them.
    pub fn update_quantity(&mut self, id: &str, quantity: u32) {
        if quantity < 1 {
            self.remove(id);
            return;
        }
        for line in self.items.iter_mut().filter(|line| line.id == id) {
            line.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().fold(0, |count, line| count.saturating_add(line.quantity))
    }
}

impl FromIterator<CartItem> for Cart {
    fn from_iter<I: IntoIterator<Item = CartItem>>(iter: I) -> Self {
        let mut cart = Cart::new();
        for item in iter {
            cart.add(item);
        }
        cart
    }
}
