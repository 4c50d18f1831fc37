//! # Utility Modules
//!
//! Small helpers shared by the handlers and services.
//!
//! ## Available Utilities
//!
//! - **Constants** (`constant`) - Default timeouts, header names and fixed messages
//! - **Secrets** (`secret`) - Reading secrets from files or environment variables
//! - **URL** (`url`) - Joining base URLs and relative paths

pub mod constant;
pub mod secret;
pub mod url;
