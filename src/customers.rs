//! Customers and dashboard figures derived from stored orders.
//!
//! There is no customer collection: a customer is every order sharing an
//! email address.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Order, OrderStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub total_orders: usize,
    pub total_spent: f64,
    pub join_date: DateTime<Utc>,
    pub last_order: DateTime<Utc>,
}

fn counts_toward_sales(order: &Order) -> bool {
    order.status != OrderStatus::Cancelled
}

/// Groups orders by email, case-insensitively.
///
/// The name comes from the customer's latest order. Newest customers first.
pub fn group_customers(orders: &[Order]) -> Vec<Customer> {
    let mut by_email: HashMap<String, Customer> = HashMap::new();

    for order in orders {
        let key = order.customer_email.trim().to_lowercase();
        let spent = if counts_toward_sales(order) { order.total } else { 0.0 };

        by_email
            .entry(key)
            .and_modify(|c| {
                c.total_orders += 1;
                c.total_spent += spent;
                if order.date < c.join_date {
                    c.join_date = order.date;
                }
                if order.date >= c.last_order {
                    c.last_order = order.date;
                    c.name = order.customer_name.clone();
                }
            })
            .or_insert_with(|| Customer {
                name: order.customer_name.clone(),
                email: order.customer_email.trim().to_string(),
                total_orders: 1,
                total_spent: spent,
                join_date: order.date,
                last_order: order.date,
            });
    }

    let mut customers: Vec<Customer> = by_email.into_values().collect();
    customers.sort_by(|a, b| b.join_date.cmp(&a.join_date).then_with(|| a.email.cmp(&b.email)));
    customers
}

/// Revenue across all orders that were not cancelled.
pub fn total_sales(orders: &[Order]) -> f64 {
    orders.iter().filter(|o| counts_toward_sales(o)).map(|o| o.total).sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: usize,
    pub total_orders: usize,
    pub total_customers: usize,
    pub total_sales: f64,
    pub orders_by_status: BTreeMap<String, usize>,
}

impl DashboardStats {
    pub fn compute(total_products: usize, orders: &[Order]) -> Self {
        let mut orders_by_status: BTreeMap<String, usize> = OrderStatus::ALL
            .into_iter()
            .map(|s| (s.to_string(), 0))
            .collect();
        for order in orders {
            *orders_by_status.entry(order.status.to_string()).or_default() += 1;
        }

        DashboardStats {
            total_products,
            total_orders: orders.len(),
            total_customers: group_customers(orders).len(),
            total_sales: total_sales(orders),
            orders_by_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::ShippingMethod;

    fn order(email: &str, name: &str, day: u32, total: f64, status: OrderStatus) -> Order {
        Order {
            id: format!("{email}-{day}"),
            customer_name: name.into(),
            customer_email: email.into(),
            address: "1 Main St".into(),
            city: "Busan".into(),
            postal_code: "48058".into(),
            country: "KR".into(),
            products: vec![],
            shipping_method: ShippingMethod::Standard,
            shipping_days: 12,
            tax: 0.0,
            total,
            payment_method: "card".into(),
            payment_proof: None,
            status,
            date: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn orders_group_by_email() {
        let orders = vec![
            order("ana@example.com", "Ana", 1, 40.0, OrderStatus::Delivered),
            order("Ana@Example.com", "Ana Lee", 5, 60.0, OrderStatus::Processing),
            order("ana@example.com", "Ana", 3, 99.0, OrderStatus::Cancelled),
            order("bo@example.com", "Bo", 2, 10.0, OrderStatus::Shipped),
        ];

        let customers = group_customers(&orders);
        assert_eq!(customers.len(), 2);

        let ana = customers.iter().find(|c| c.email.eq_ignore_ascii_case("ana@example.com")).unwrap();
        assert_eq!(ana.total_orders, 3);
        assert_eq!(ana.total_spent, 100.0);
        assert_eq!(ana.name, "Ana Lee");
        assert_eq!(ana.join_date, orders[0].date);

        // Bo joined on the 2nd, after Ana on the 1st.
        assert_eq!(customers[0].email, "bo@example.com");
    }

    #[test]
    fn cancelled_orders_are_not_sales() {
        let orders = vec![
            order("a@example.com", "A", 1, 20.0, OrderStatus::Processing),
            order("b@example.com", "B", 2, 30.0, OrderStatus::Cancelled),
        ];
        assert_eq!(total_sales(&orders), 20.0);

        let stats = DashboardStats::compute(7, &orders);
        assert_eq!(stats.total_products, 7);
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.total_customers, 2);
        assert_eq!(stats.orders_by_status["Cancelled"], 1);
        assert_eq!(stats.orders_by_status["Delivered"], 0);
    }
}
