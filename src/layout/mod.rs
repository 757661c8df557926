//! Storage layouts for control points, weights and knots.
//!
//! The evaluation engine is written once against [`AddressableGrid`]; each
//! concrete storage kind (nested `Vec`s, a flat strided view, or any custom
//! get/set-indexable type) implements it. Layout inference classifies a source
//! at configuration time and the accessor builder turns it into an addressing
//! scheme used on every evaluation.

pub(crate) mod accessor;
mod grid;
pub(crate) mod inference;
mod strided;

pub use grid::{AddressableGrid, Layout, Scalar, StridedView};
pub use strided::StridedGrid;
