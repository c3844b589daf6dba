//! Univendor Admin library.
//!
//! This crate provides the variant administration functionality as a
//! library, allowing it to be tested and reused:
//!
//! - [`variants`] - The variant matrix builder (editor sessions)
//! - [`db`] - `PostgreSQL` repositories for products and variants
//! - [`services`] - Image storage, operator notices, session registry
//! - [`routes`] - The axum JSON API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod variants;
