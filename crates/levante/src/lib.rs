#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Version information for the levante crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Core types
// ============================================================================

/// Shared types: error taxonomy, date helpers, currency universe, and the
/// model/scaler interfaces.
pub mod traits {
    pub use levante_traits::*;
}

// Re-export the most-used names at the top level.
pub use levante_traits::{Date, FeatureScaler, LevanteError, Regressor, Result, universe};

// ============================================================================
// Ingestion
// ============================================================================

/// GDELT event ingestion: per-day aggregation, caching, bulk collection.
pub mod gdelt {
    pub use levante_gdelt::*;
}

/// FX price fetching and normalization.
pub mod prices {
    pub use levante_prices::*;
}

// ============================================================================
// Dataset and signals
// ============================================================================

/// Merged sentiment/return dataset assembly.
pub mod dataset {
    pub use levante_dataset::*;
}

/// Cross-sectional ranking and entry matrices.
pub mod signals {
    pub use levante_signals::*;
}

/// Baseline model pair (standard scaler + ridge regressor).
pub mod model {
    pub use levante_model::*;
}

/// Signal backtesting.
pub mod eval {
    pub use levante_eval::*;
}

// ============================================================================
// Prelude
// ============================================================================

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::dataset::DatasetBuilder;
    pub use crate::eval::{BacktestConfig, SignalBacktest};
    pub use crate::gdelt::{BulkCollector, DayAggregator, EventFilters, EventsClient, ParquetDayStore};
    pub use crate::model::{RidgeRegressor, StandardScaler, train_model};
    pub use crate::prices::{PriceFetcher, QuoteClient};
    pub use crate::signals::{EntryMatrices, Prediction, build_entries, signals_from_features};
    pub use crate::{Date, FeatureScaler, LevanteError, Regressor, Result};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_re_exports() {
        fn _accept_regressor(_r: &dyn Regressor) {}
        fn _accept_scaler(_s: &dyn FeatureScaler) {}
        let _err: LevanteError = LevanteError::NoFeatureColumns;
    }
}
