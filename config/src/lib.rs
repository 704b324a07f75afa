//! # Config Crate
//!
//! Centralized configuration constants for the HDDS translation pipeline.
//! Tolerances, recursion limits, naming conventions and the validated
//! [`constants::TranslationConfig`] snapshot live here so the document and
//! composition crates never scatter literals.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{approx_zero, TranslationConfig, DEFAULT_ROOT_VOLUME};
//!
//! let config = TranslationConfig::default();
//! assert_eq!(config.root_volume, DEFAULT_ROOT_VOLUME);
//! assert!(approx_zero(1e-12));
//! ```

pub mod constants;

#[cfg(test)]
mod tests;
