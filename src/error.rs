//! Error types for spline configuration and evaluation.

use std::fmt;
use thiserror::Error;

/// Which part of a spline definition a data source was supplied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridRole {
    /// Control points.
    Points,
    /// Control point weights.
    Weights,
    /// Knot vectors.
    Knots,
}

impl fmt::Display for GridRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GridRole::Points => "points",
            GridRole::Weights => "weights",
            GridRole::Knots => "knots",
        })
    }
}

/// A parameter value as reported by a failed bounds check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parameter {
    /// No value was supplied for the axis.
    Missing,
    /// The offending value (possibly NaN).
    Value(f64),
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Missing => f.write_str("undefined"),
            Parameter::Value(v) => write!(f, "{}", v),
        }
    }
}

/// Errors that can occur while configuring or evaluating a spline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NurbsError {
    /// The dimensionality of the control hull could not be inferred.
    #[error("invalid control hull shape: {reason}")]
    Shape {
        /// What was wrong with the shape.
        reason: String,
    },

    /// An explicit per-axis degree vector has no entry for an axis.
    #[error("missing degree in dimension {axis}")]
    MissingDegree {
        /// Parametric axis without a degree.
        axis: usize,
    },

    /// An explicit degree needs more control points than the axis has.
    #[error(
        "expected at least {} points for degree {degree} spline in dimension {axis} but got only {points}",
        .degree + 1
    )]
    InsufficientPoints {
        /// Parametric axis.
        axis: usize,
        /// Requested degree.
        degree: usize,
        /// Control points available along the axis.
        points: usize,
    },

    /// A boundary token is not one of `open`, `clamped` or `closed`.
    #[error("boundary type must be one of open, clamped, closed; got {token:?}")]
    Boundary {
        /// The unrecognized token.
        token: String,
    },

    /// A knot vector has the wrong number of entries.
    #[error("expected {expected} knots in dimension {axis} but got {actual}")]
    KnotLength {
        /// Parametric axis.
        axis: usize,
        /// Required knot count.
        expected: usize,
        /// Supplied knot count.
        actual: usize,
    },

    /// A data source has a storage shape that cannot be addressed.
    #[error("unsupported {role} layout: {reason}")]
    UnsupportedLayout {
        /// Which source was rejected.
        role: GridRole,
        /// Why it was rejected.
        reason: String,
    },

    /// A parameter lies outside the valid domain (bounds checking only).
    #[error(
        "invalid spline parameter in dimension {axis}: valid domain is [{min}, {max}] but got t{axis} = {value}"
    )]
    Domain {
        /// Parametric axis.
        axis: usize,
        /// Lower end of the domain.
        min: f64,
        /// Upper end of the domain.
        max: f64,
        /// The rejected parameter.
        value: Parameter,
    },

    /// The wrong number of parameters was passed to an evaluation.
    #[error("expected {expected} parameters but got {actual}")]
    ParameterCount {
        /// Number of parametric axes.
        expected: usize,
        /// Number of parameters supplied.
        actual: usize,
    },

    /// The requested operation is not available for this configuration.
    #[error("unsupported operation: {reason}")]
    UnsupportedOperation {
        /// Description of the operation.
        reason: String,
    },
}

impl NurbsError {
    pub(crate) fn shape(reason: impl Into<String>) -> Self {
        NurbsError::Shape {
            reason: reason.into(),
        }
    }

    pub(crate) fn layout(role: GridRole, reason: impl Into<String>) -> Self {
        NurbsError::UnsupportedLayout {
            role,
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        NurbsError::UnsupportedOperation {
            reason: reason.into(),
        }
    }

    /// Returns true for the degree family (`MissingDegree`, `InsufficientPoints`).
    pub fn is_degree_error(&self) -> bool {
        matches!(
            self,
            NurbsError::MissingDegree { .. } | NurbsError::InsufficientPoints { .. }
        )
    }
}
