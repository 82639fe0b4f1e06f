//! # Sitegrade Common Library
//!
//! Shared code for the sitegrade workspace:
//! - Error types (`Error`, `Result`)
//! - TOML configuration loading and path resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
