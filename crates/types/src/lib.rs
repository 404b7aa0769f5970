//! Core types and traits for the maxline workspace.
//!
//! This crate defines the shared abstractions used across all layers of
//! maxline, including the unified error type, the access/refresh token pair,
//! and the async traits that each layer implements.

pub mod error;
pub mod token;
pub mod traits;

pub use error::MaxlineError;
pub use token::TokenPair;
pub use traits::{ByteStream, InvocationClient, SecretStore, TextStream};
