//! Application layer of the e-learning client.
//!
//! Wires the backend client, the persisted session and the coordinators
//! together, and provides the views of the `nebula` command-line front-end.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod console;
pub mod context;
pub mod error;
pub mod session;
pub mod storage;

use backend::HttpBackend;

pub use config::Config;
pub use context::AppContext;
pub use error::{AppError, Result};
pub use session::{Session, SessionService};
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};

/// Creates the context used by the binary: HTTP backend and file-backed token.
pub fn create_context(config: Config) -> AppContext<HttpBackend, FileTokenStore> {
    let backend = HttpBackend::new(config.api_base_url.clone());
    let store = FileTokenStore::new(config.token_path.clone());
    AppContext::new(config, backend, store)
}
