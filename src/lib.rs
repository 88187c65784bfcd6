pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod customers;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod uploads;
