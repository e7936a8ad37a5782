//! # zapi-core
//!
//! Transport and marshalling layer for the Zevenet load balancer API (ZAPI).
//!
//! This crate provides the session, the generic request verbs, error
//! classification and the boolean-aware field mapper that resource crates
//! build on.
//!
//! ## Modules
//!
//! - [`client`] - Session, transport and the generic get/create/update/delete verbs
//! - [`config`] - Session configuration
//! - [`error`] - Error types and classification of failed responses
//! - [`mapping`] - Conversion between transfer and domain objects
//! - [`path`] - Resource path encoding
//! - [`request`] - Request descriptors

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod mapping;
pub mod path;
pub mod request;

// Re-export commonly used types
pub use client::{ApiResponse, ZapiSession};
pub use config::{ConfigOptions, ZapiConfig};
pub use error::{ApiError, Error, Result};
pub use mapping::{BoolRepr, MapFrom, MappingError};
