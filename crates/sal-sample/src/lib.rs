#![deny(missing_docs)]
#![doc = "Autoregressive joint sampling over spatial prediction tasks."]

//! Produces spatially coherent joint samples from any
//! [`sal_core::SpatialModel`] by running its sequential sampling primitive
//! over a deterministic location subset and infilling the remaining target
//! locations conditioned on the drawn values.

pub mod sampler;
pub mod subset;

pub use sampler::{ar_sample, ArOptions};
pub use subset::{select_ar_subset, SubsetSelection};
