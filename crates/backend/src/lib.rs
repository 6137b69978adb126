//! Client for the external e-learning backend.
//!
//! All durable state lives behind this REST API. The crate exposes the API as
//! a set of traits so the coordinators can run against either the real
//! service ([`HttpBackend`]) or an in-memory stand-in ([`InMemoryBackend`]).

pub mod api;
pub mod auth;
pub mod error;
pub mod http;
pub mod memory;
pub mod payment;

pub use api::{
    AdminApi, AuthApi, CartApi, CatalogApi, ContactRequest, ContentApi, FullBackend, PaymentApi,
    SignupRequest,
};
pub use auth::{AuthToken, TokenSource};
pub use error::{BackendError, Result};
pub use http::HttpBackend;
pub use memory::{InMemoryBackend, Operation};
pub use payment::{GatewayResponse, PaymentOrder};
