//! Core types shared by the Healthchecks.io clients.
//!
//! This crate provides the pieces both clients are built from:
//!
//! - **Error types**: [`HealthchecksError`], the two wrapped transport kinds
//!   ([`RequestError`], [`StatusCodeError`]) and [`classify`]
//! - **Validation**: static schemas for identifiers, tag lists, flips queries
//!   and check definitions
//! - **Requests**: [`RequestOptions`], the shared `send` path and
//!   [`ApiResponse`] normalisation
//!
//! # Error handling
//!
//! ```rust
//! use healthchecks_core::{classify, HealthchecksError, Result};
//!
//! fn example_operation() -> Result<String> {
//!     Err(HealthchecksError::validation("The 'uuid' cannot be empty"))
//! }
//!
//! match example_operation().map_err(classify) {
//!     Ok(val) => println!("Success: {}", val),
//!     Err(HealthchecksError::Validation(msg)) => println!("Rejected: {}", msg),
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```

pub mod error;
pub mod request;
pub mod validation;

pub use error::{
    classify, is_request_error, is_response_error, reason_phrase, ErrorCause, ErrorResponse,
    HealthchecksError, RequestError, RequestMeta, Result, StatusCodeError, TransportError,
};
pub use request::{
    ApiResponse, FullResponse, QueryParams, RawResponse, RequestOptions, ResponseFormat,
};
pub use validation::{ensure_valid, validate, Schema, ValidationResult};

/// Value of the `User-Agent` header sent by both clients.
pub const USER_AGENT: &str = concat!("HealthChecks-IO-Client-Rust/", env!("CARGO_PKG_VERSION"));

/// Prelude module for convenient imports.
///
/// ```rust
/// use healthchecks_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{HealthchecksError, RequestError, Result, StatusCodeError};
    pub use crate::request::{ApiResponse, FullResponse};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let _error = HealthchecksError::config("test");
        let _response = ApiResponse::Data(serde_json::Value::Null);
    }

    #[test]
    fn user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("HealthChecks-IO-Client-Rust/"));
        assert!(USER_AGENT.ends_with(env!("CARGO_PKG_VERSION")));
    }
}
