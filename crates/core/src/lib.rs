//! Univendor Core - Shared domain types.
//!
//! This crate provides the types used across the Univendor components:
//! - `admin` - Variant administration service (editor sessions, persistence, HTTP API)
//! - `cli` - Command-line tools for schema migrations
//!
//! # Architecture
//!
//! The core crate contains only types and pure validation - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, attributes, draft variants, SKUs, and validation errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
