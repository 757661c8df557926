//! nurbs - Non-uniform rational B-splines of any dimension
//!
//! Curves, surfaces and higher-dimensional tensor-product splines evaluated by
//! a generalized de Boor recursion. Control points, weights and knots can live
//! in nested `Vec`s, a flat strided buffer or any custom [`AddressableGrid`].
//! Evaluation procedures are compiled once per spline shape and shared
//! process-wide.
//!
//! # Example
//!
//! ```
//! use nurbs::{Boundary, Nurbs, SplineDefinition};
//!
//! let mut spline = Nurbs::configure(
//!     SplineDefinition::new()
//!         .points(vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 4.0]])
//!         .weights(vec![1.0, 2.0, 1.0])
//!         .boundary(Boundary::Clamped),
//! )?;
//!
//! let [start, end] = spline.domain()[0];
//! assert_eq!(spline.point(&[start])?, vec![0.0, 0.0]);
//! assert_eq!(spline.point(&[end])?, vec![2.0, 4.0]);
//!
//! // Tangent along the only parametric axis.
//! let mut tangent = spline.derivative_evaluator(1, 0)?;
//! let mut out = Vec::new();
//! tangent.evaluate(&mut out, &[2.5])?;
//! assert_eq!(out.len(), 2);
//!
//! // Which control points matter at t = 2.5?
//! let mut support = Vec::new();
//! spline.support(&mut support, &[2.5])?;
//! assert_eq!(support, vec![0, 1, 2]);
//!
//! // Move the whole curve by (1, 1).
//! spline.transform(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0])?;
//! assert_eq!(spline.point(&[start])?, vec![1.0, 1.0]);
//! # Ok::<(), nurbs::NurbsError>(())
//! ```

pub mod cache;
mod derivative;
pub mod error;
mod eval;
pub mod layout;
pub mod spline;
mod support;
mod transform;

pub use cache::{cached_procedures, CacheStats};
pub use error::{GridRole, NurbsError, Parameter};
pub use eval::{BasisEvaluator, Evaluator};
pub use layout::{AddressableGrid, Layout, Scalar, StridedGrid, StridedView};
pub use spline::{
    AxisKey, Boundary, BoundarySpec, DegreeSpec, HullSize, Nurbs, SizeSpec, SpecializationKey,
    SplineDefinition,
};
