//! # Services
//!
//! Clients and helpers the HTTP handlers delegate to.
//!
//! ## Available Services
//!
//! - **Consent** (`consent`) - Client for the external consent manager
//! - **Decrypt** (`decrypt`) - Recovering consents from signed export payloads
//! - **JWT** (`jwt`) - Access tokens protecting the private routes

pub mod consent;
pub mod decrypt;
pub mod jwt;
