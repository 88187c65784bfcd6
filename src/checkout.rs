//! Checkout: pricing a cart and turning a submitted checkout form into an order.

use std::collections::HashMap;

use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::cart::{Cart, CartItem, MAX_QUANTITY};
use crate::error::{field_errors, ApiError, FieldError};
use crate::models::{not_blank, Order, OrderLine, OrderStatus, ShippingMethod};

pub const TAX_RATE: f64 = 0.08;

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Price breakdown shown on the checkout summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub item_count: u32,
    pub subtotal: f64,
    pub shipping: f64,
    pub tax: f64,
    pub total: f64,
    pub shipping_method: ShippingMethod,
    pub shipping_days: u32,
}

impl Quote {
    pub fn new(subtotal: f64, item_count: u32, method: ShippingMethod) -> Self {
        // The total is the sum of the rounded parts shown to the shopper.
        let subtotal = round_cents(subtotal);
        let (shipping, tax) = if subtotal > 0.0 {
            (method.shipping_fee(), round_cents(subtotal * TAX_RATE))
        } else {
            (0.0, 0.0)
        };
        Quote {
            item_count,
            subtotal,
            shipping,
            tax,
            total: round_cents(subtotal + shipping + tax),
            shipping_method: method,
            shipping_days: method.shipping_days(),
        }
    }

    pub fn for_cart(cart: &Cart, method: ShippingMethod) -> Self {
        Quote::new(cart.total(), cart.item_count(), method)
    }

    pub fn for_lines(lines: &[OrderLine], method: ShippingMethod) -> Self {
        let subtotal = lines.iter().map(|l| l.price * f64::from(l.quantity)).sum();
        let count = lines.iter().fold(0, |count: u32, l| count.saturating_add(l.quantity));
        Quote::new(subtotal, count, method)
    }
}

/// Body of `POST /checkout/quote`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[validate(nested)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub shipping_method: ShippingMethod,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub items: Vec<CartItem>,
    pub quote: Quote,
}

impl QuoteRequest {
    /// Merges duplicate lines the way the client cart does, then prices them.
    pub fn price(self) -> Result<QuoteResponse, ApiError> {
        self.validate()?;
        let cart: Cart = self.items.into_iter().collect();
        let quote = Quote::for_cart(&cart, self.shipping_method);
        Ok(QuoteResponse {
            items: cart.items().to_vec(),
            quote,
        })
    }
}

/// Text fields of the multipart checkout form.
///
/// Everything arrives as a string; `products` holds the JSON-encoded line
/// items and `tax`/`total` are optional decimal strings.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderForm {
    #[validate(custom(function = "not_blank", message = "Customer name is required"))]
    pub customer_name: String,
    #[validate(email(message = "Invalid Email"))]
    pub customer_email: String,
    #[validate(custom(function = "not_blank", message = "Address is required"))]
    pub address: String,
    #[validate(custom(function = "not_blank", message = "City is required"))]
    pub city: String,
    #[validate(custom(function = "not_blank", message = "Postal code is required"))]
    pub postal_code: String,
    #[validate(custom(function = "not_blank", message = "Country is required"))]
    pub country: String,
    #[validate(custom(function = "not_blank", message = "Payment method is required"))]
    pub payment_method: String,
    pub products: String,
    pub shipping_method: Option<String>,
    pub tax: Option<String>,
    pub total: Option<String>,
}

impl OrderForm {
    pub fn from_fields(fields: HashMap<String, String>) -> Result<Self, ApiError> {
        let value = serde_json::Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect(),
        );
        serde_json::from_value(value).map_err(|e| ApiError::BadRequest(format!("Invalid order form: {e}")))
    }

    /// Validates every field and builds the order, collecting all field
    /// errors rather than stopping at the first.
    pub fn into_order(mut self, payment_proof: Option<String>) -> Result<Order, ApiError> {
        self.customer_email = self.customer_email.trim().to_string();
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors(&e),
        };

        let products = match serde_json::from_str::<Vec<OrderLine>>(&self.products) {
            Ok(lines) if lines.is_empty() => {
                errors.push(FieldError::new("products", "Order must contain at least one product"));
                lines
            }
            Ok(lines) => {
                if lines.iter().any(|l| !(1..=MAX_QUANTITY).contains(&l.quantity)) {
                    errors.push(FieldError::new(
                        "products",
                        format!("Each product needs a quantity between 1 and {MAX_QUANTITY}"),
                    ));
                }
                if lines.iter().any(|l| !l.price.is_finite() || l.price < 0.0) {
                    errors.push(FieldError::new("products", "Product prices cannot be negative"));
                }
                lines
            }
            Err(_) => {
                errors.push(FieldError::new("products", "Products must be a JSON array of line items"));
                Vec::new()
            }
        };

        let shipping_method = match self.shipping_method.as_deref().map(str::trim) {
            None | Some("") => ShippingMethod::Standard,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                errors.push(FieldError::new("shippingMethod", "Shipping method must be standard or express"));
                ShippingMethod::Standard
            }),
        };

        let tax = parse_amount("tax", self.tax.as_deref(), &mut errors);
        let total = parse_amount("total", self.total.as_deref(), &mut errors);

        if !errors.is_empty() {
            errors.sort_by(|a, b| a.field.cmp(&b.field));
            return Err(ApiError::validation("Validation failed", errors));
        }

        let quote = Quote::for_lines(&products, shipping_method);
        Ok(Order {
            id: ObjectId::new().to_hex(),
            customer_name: self.customer_name.trim().to_string(),
            customer_email: self.customer_email,
            address: self.address,
            city: self.city,
            postal_code: self.postal_code,
            country: self.country,
            products,
            shipping_method,
            shipping_days: shipping_method.shipping_days(),
            tax: tax.unwrap_or(quote.tax),
            total: total.unwrap_or(quote.total),
            payment_method: self.payment_method,
            payment_proof,
            status: OrderStatus::Processing,
            date: Utc::now(),
        })
    }
}

fn parse_amount(field: &str, raw: Option<&str>, errors: &mut Vec<FieldError>) -> Option<f64> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;
    match raw.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Some(amount),
        _ => {
            errors.push(FieldError::new(field, format!("{field} must be a non-negative number")));
            None
        }
    }
}
