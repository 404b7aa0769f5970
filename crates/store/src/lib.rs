//! Secret storage backends for persisting authentication state.
//!
//! Provides an in-memory store for testing and an OS-keyring-backed store for
//! production.

pub mod keyring;
pub mod memory;

pub use keyring::KeyringSecretStore;
pub use memory::InMemorySecretStore;
