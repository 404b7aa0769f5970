//! Configuration loading for maxline.
//!
//! Uses figment for YAML-based configuration with sensible defaults and
//! `MAXLINE_`-prefixed environment variable overrides. Loaded values are
//! passed explicitly to component constructors; there is no process-wide
//! configuration singleton.

pub mod schema;

pub use schema::Config;
