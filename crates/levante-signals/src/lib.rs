//! Signal construction for levante.
//!
//! Turns per-currency return predictions into boolean long/short entry
//! matrices by cross-sectional rank, and provides the wide→long feature
//! reshaping that connects the merged dataset to any fitted model. Signal
//! construction is decoupled from model choice: anything implementing the
//! `Regressor`/`FeatureScaler` interfaces plugs into
//! [`signals_from_features`].

mod entries;
mod features;
mod pipeline;

pub use entries::{EntryMatrices, Prediction, build_entries};
pub use features::{FeatureRow, feature_matrix, wide_to_long};
pub use pipeline::signals_from_features;
