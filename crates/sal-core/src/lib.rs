#![deny(missing_docs)]
#![doc = "Core data model and contracts for the SAL sensor-placement toolkit."]

//! Shared foundation for the SAL workspace: the [`ObservationTask`] value
//! type and its pure copy-on-modify helpers, the [`SpatialModel`] capability
//! trait with the [`Query`] tagged union, structured errors, and the
//! deterministic RNG handle.

pub mod errors;
pub mod model;
pub mod rng;
pub mod task;

pub use errors::{ErrorInfo, SalError};
pub use model::{ArModelOutput, PosteriorState, Query, SpatialModel};
pub use rng::{derive_substream_seed, RngHandle};
pub use task::{ContextSet, Matrix, ObservationTask, TargetSet};
