#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parcel key derivation and per-parcel aggregation.
//!
//! Turns the raw rows of the pipeline datasets into one [`ParcelRecord`]
//! per parcel. Each source dataset names its fields differently, so every
//! read goes through the alias tables in [`fields`].

pub mod aggregate;
pub mod events;
pub mod fields;
pub mod land_use;
pub mod tract;

pub use aggregate::{AggregateOptions, AggregateStats, Aggregation, aggregate, aggregate_with_stats};
pub use events::{EventHits, count_event_hits, parcel_keys};
pub use parcel_distress_parcel_models::{ParcelKey, ParcelRecord};
pub use tract::TractCounters;
