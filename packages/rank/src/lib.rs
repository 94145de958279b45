#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Distress scoring and geographically diversified ranking.
//!
//! [`score_parcels`] turns aggregated [`ParcelRecord`]s into a totally
//! ordered list of [`ScoredParcel`]s. [`diversify`] then picks a top-N that
//! spans neighborhoods instead of letting the busiest one dominate.
//!
//! [`ParcelRecord`]: parcel_distress_parcel_models::ParcelRecord
//! [`ScoredParcel`]: parcel_distress_parcel_models::ScoredParcel

pub mod diversify;
pub mod score;

pub use diversify::{DiversifyOptions, diversify};
pub use score::{ScoreWeights, score_parcels};

use thiserror::Error;

/// Errors from loading ranking configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid TOML for this type.
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A weight is negative or not a finite number.
    #[error("Weight '{name}' must be a finite non-negative number, got {value}")]
    InvalidWeight {
        /// The weight's field name.
        name: String,
        /// The rejected value.
        value: f64,
    },
}
