//! Reader-facing controllers layered over the remote service.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the auth flow, the saved-article set, and the account
//! panel so the app state can stay focused on routing and session plumbing.
//! None of them touch HTTP directly; they only see `RemoteService`.

pub mod account;
pub mod auth_flow;
pub mod credentials;
pub mod saved;
