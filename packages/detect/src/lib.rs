#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rain detection from camera frames.
//!
//! Raindrops on a camera housing and rain streaks in the air both add
//! fine high-contrast structure to a frame. [`density`] turns a frame into
//! an edge-density score and [`aggregate`] folds scores into one record
//! per (neighborhood, street) pair.

pub mod aggregate;
pub mod density;

pub use aggregate::RainAggregator;
pub use density::{DensityEstimator, DetectConfig, EdgeDensityEstimator};
