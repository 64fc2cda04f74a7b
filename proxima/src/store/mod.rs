//! Remote business store abstraction
//!
//! This module provides the [`RemoteStore`] trait the rest of the library is
//! written against, plus two implementations:
//!
//! - [`PostgrestStore`]: the production backend over HTTP (reqwest)
//! - [`InMemoryStore`]: a process-local store for tests and offline use
//!
//! The store is always constructed by the caller and passed in, never held
//! as a global.
//!
//! # Example
//!
//! ```ignore
//! use proxima::store::{PostgrestConfig, PostgrestStore, RemoteStore};
//!
//! let store = PostgrestStore::new(PostgrestConfig::new(url, api_key))?;
//! let nearby = store.nearby_businesses(19.4326, -99.1332, 1_000.0).await?;
//! ```

mod memory;
mod postgrest;
mod traits;
mod types;

pub use memory::InMemoryStore;
pub use postgrest::{PostgrestConfig, PostgrestStore, DEFAULT_REQUEST_TIMEOUT};
pub use traits::{RemoteStore, StoreError};
pub use types::{Business, NewBusiness, NewRating};
