//! SmartLibrary - terminal client for the SmartLibrary book-lending service.
//!
//! Browse the catalog, read and write reviews, reserve books and manage the
//! account from the command line. Admins get book and review management.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        smartlibrary (bin)                       │
//! │  clap commands, interactive browser, session handling           │
//! └───────────────┬───────────────────────────────┬─────────────────┘
//!                 │                               │
//! ┌───────────────┴───────────────┐ ┌─────────────┴─────────────────┐
//! │  catalog                      │ │  api                          │
//! │  filter, pages, detail view   │ │  REST calls, error contract   │
//! │  backend or public source     │ │  auth, books, profile, admin  │
//! └───────────────┬───────────────┘ └─────────────┬─────────────────┘
//!                 │                               │
//! ┌───────────────┴───────────────────────────────┴─────────────────┐
//! │  model · validate · session · config · render                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The server owns every consistency rule. The client checks presence and
//! format before sending and classifies what comes back.

// === Core Modules ===

/// Records exchanged with the API.
pub mod model;

/// Client-side form validation.
pub mod validate;

/// REST API client.
pub mod api;

/// Catalog view and sources.
pub mod catalog;

// === Client State ===

/// Client configuration.
pub mod config;

/// Persisted login session.
pub mod session;

// === Terminal Front End ===

/// Interactive browser commands.
pub mod browse;

/// Plain-text rendering.
pub mod render;

// === Re-exports ===

pub use api::{ApiClient, ApiError};
pub use catalog::{CatalogSource, CatalogView, PublicCatalog};
pub use config::ClientConfig;
pub use session::{Session, SessionStore};
