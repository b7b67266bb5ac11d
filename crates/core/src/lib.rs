//! Core business logic for Quotely.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Quote pricing, the catalog rules, credentials and object storage live here;
//! the db and api crates only load, persist and expose what this crate decides.
//!
//! # Modules
//!
//! - `quote` - Line pricing, totals, approval workflow, notifications
//! - `catalog` - Category tree and product field rules
//! - `auth` - Password hashing, session tokens, roles
//! - `storage` - Product image and logo uploads

pub mod auth;
pub mod catalog;
pub mod quote;
pub mod storage;
