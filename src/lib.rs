//! Front-end core of a single-author history blog backed by a hosted
//! identity & storage service.
//!
//! ARCHITECTURE
//! ============
//! - `articles` / `catalog`: the compiled-in catalog and its pure filter.
//! - `remote`: the service contract, its HTTP client, and the fallback used
//!   when the service is not configured.
//! - `services`: auth flow, saved set, and account controllers.
//! - `state` / `view`: the single owner of per-reader state and the router.

pub mod articles;
pub mod catalog;
pub mod config;
pub mod remote;
pub mod services;
pub mod state;
pub mod view;

#[cfg(test)]
mod test_support;
