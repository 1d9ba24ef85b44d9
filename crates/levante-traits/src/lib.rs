#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for the levante FX sentiment pipeline.
//!
//! This crate provides the foundational pieces shared by every other levante
//! crate: the error taxonomy, the tradable-currency universe, calendar-date
//! helpers, and the regression-model interfaces.

/// The version of the levante-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod model;
pub mod types;
pub mod universe;

// Re-exports
pub use error::{LevanteError, Result};
pub use model::{FEATURE_ORDER, FeatureScaler, Regressor};
pub use types::Date;
pub use universe::CurrencyEntity;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
