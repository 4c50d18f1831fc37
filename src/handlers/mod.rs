//! # HTTP Request Handlers
//!
//! One async function per endpoint. Handlers extract parameters, call the
//! consent manager through [`ConsentClient`](crate::services::consent::ConsentClient)
//! and shape the answer.
//!
//! ## Available Handlers
//!
//! - **Consent** (`consent`) - Reading, giving and exchanging consents (private)
//! - **Privacy notices** (`privacy_notice`) - Notices users consent to (private)
//! - **Exchanges** (`exchange`) - Available data exchanges (private)
//! - **Public** (`public`) - Consent export/import, logins and the template route
//! - **Health Check** (`health_check`) - Application health monitoring

mod consent;
mod exchange;
mod health_check;
mod privacy_notice;
pub mod public;

pub use consent::*;
pub use exchange::*;
pub use health_check::*;
pub use privacy_notice::*;
