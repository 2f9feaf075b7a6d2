#![deny(missing_docs)]
#![doc = "Exact Gaussian-process spatial model conforming to the sal-core capability contract."]

//! A dense, exact GP regression model. It gives every acquisition function
//! and the autoregressive sampler a fully capable
//! [`sal_core::SpatialModel`] to run against, in driver code and in tests
//! alike.

pub mod kernel;
pub mod linalg;
pub mod model;

pub use kernel::Kernel;
pub use model::{GpModel, GpPosterior, GP_TAG};
