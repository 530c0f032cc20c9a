//! # Firmscan Common Library
//!
//! Shared code for the firmscan services:
//! - Error types
//! - Country vocabulary (supported registries)
//! - Configuration loading

pub mod config;
pub mod country;
pub mod error;

pub use country::Country;
pub use error::{Error, Result};
