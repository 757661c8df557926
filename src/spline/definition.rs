//! The definition bundle a spline is configured from.

use super::boundary::Boundary;
use crate::layout::{AddressableGrid, Scalar};

/// How degrees were requested.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DegreeSpec {
    /// Quadratic, lowered to fit axes with fewer than three points.
    #[default]
    Default,
    /// The same explicit degree on every axis.
    Uniform(usize),
    /// One explicit degree per axis. A `None` entry is an error.
    PerAxis(Vec<Option<usize>>),
}

impl From<usize> for DegreeSpec {
    fn from(degree: usize) -> Self {
        DegreeSpec::Uniform(degree)
    }
}

impl From<Vec<usize>> for DegreeSpec {
    fn from(degrees: Vec<usize>) -> Self {
        DegreeSpec::PerAxis(degrees.into_iter().map(Some).collect())
    }
}

impl From<&[usize]> for DegreeSpec {
    fn from(degrees: &[usize]) -> Self {
        DegreeSpec::PerAxis(degrees.iter().copied().map(Some).collect())
    }
}

impl<const N: usize> From<[usize; N]> for DegreeSpec {
    fn from(degrees: [usize; N]) -> Self {
        DegreeSpec::PerAxis(degrees.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<usize>>> for DegreeSpec {
    fn from(degrees: Vec<Option<usize>>) -> Self {
        DegreeSpec::PerAxis(degrees)
    }
}

/// Boundary tokens: one default plus optional per-axis overrides.
///
/// Tokens stay unparsed until validation so that a bad token surfaces as a
/// configuration error rather than at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundarySpec {
    /// Token for axes without an override. `None` means `open`.
    pub default: Option<String>,
    /// Per-axis overrides, indexed by parametric axis.
    pub per_axis: Vec<Option<String>>,
}

impl BoundarySpec {
    /// The same boundary on every axis.
    pub fn uniform(token: impl Into<String>) -> Self {
        Self {
            default: Some(token.into()),
            per_axis: Vec::new(),
        }
    }

    /// Overrides the boundary of one axis.
    pub fn with_axis(mut self, axis: usize, token: impl Into<String>) -> Self {
        if self.per_axis.len() <= axis {
            self.per_axis.resize(axis + 1, None);
        }
        self.per_axis[axis] = Some(token.into());
        self
    }
}

impl From<Boundary> for BoundarySpec {
    fn from(boundary: Boundary) -> Self {
        BoundarySpec::uniform(boundary.as_str())
    }
}

impl From<&str> for BoundarySpec {
    fn from(token: &str) -> Self {
        BoundarySpec::uniform(token)
    }
}

impl From<String> for BoundarySpec {
    fn from(token: String) -> Self {
        BoundarySpec::uniform(token)
    }
}

impl From<Vec<Boundary>> for BoundarySpec {
    fn from(boundaries: Vec<Boundary>) -> Self {
        Self {
            default: None,
            per_axis: boundaries
                .into_iter()
                .map(|b| Some(b.as_str().to_string()))
                .collect(),
        }
    }
}

impl From<Vec<Option<Boundary>>> for BoundarySpec {
    fn from(boundaries: Vec<Option<Boundary>>) -> Self {
        Self {
            default: None,
            per_axis: boundaries
                .into_iter()
                .map(|b| b.map(|b| b.as_str().to_string()))
                .collect(),
        }
    }
}

impl From<Vec<&str>> for BoundarySpec {
    fn from(tokens: Vec<&str>) -> Self {
        Self {
            default: None,
            per_axis: tokens.into_iter().map(|t| Some(t.to_string())).collect(),
        }
    }
}

/// Control hull size for configurations without points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeSpec {
    /// A curve with this many control points.
    Scalar(usize),
    /// Control points per axis.
    PerAxis(Vec<usize>),
}

impl SizeSpec {
    pub(crate) fn to_vec(&self) -> Vec<usize> {
        match self {
            SizeSpec::Scalar(n) => vec![*n],
            SizeSpec::PerAxis(v) => v.clone(),
        }
    }
}

impl From<usize> for SizeSpec {
    fn from(n: usize) -> Self {
        SizeSpec::Scalar(n)
    }
}

impl From<Vec<usize>> for SizeSpec {
    fn from(size: Vec<usize>) -> Self {
        SizeSpec::PerAxis(size)
    }
}

impl<const N: usize> From<[usize; N]> for SizeSpec {
    fn from(size: [usize; N]) -> Self {
        SizeSpec::PerAxis(size.to_vec())
    }
}

/// Everything needed to configure a [`Nurbs`](crate::Nurbs).
///
/// Built by value:
///
/// ```
/// use nurbs::{Boundary, SplineDefinition};
///
/// let definition = SplineDefinition::new()
///     .points(vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 4.0]])
///     .weights(vec![1.0, 2.0, 1.0])
///     .degree(2)
///     .boundary(Boundary::Clamped);
/// # let _ = definition;
/// ```
#[derive(Debug)]
pub struct SplineDefinition<F> {
    pub(crate) points: Option<Box<dyn AddressableGrid<F>>>,
    pub(crate) weights: Option<Box<dyn AddressableGrid<F>>>,
    pub(crate) knots: Option<Box<dyn AddressableGrid<F>>>,
    pub(crate) degree: DegreeSpec,
    pub(crate) boundary: BoundarySpec,
    pub(crate) size: Option<SizeSpec>,
    pub(crate) check_bounds: bool,
    pub(crate) debug: bool,
}

impl<F> Default for SplineDefinition<F> {
    fn default() -> Self {
        Self {
            points: None,
            weights: None,
            knots: None,
            degree: DegreeSpec::Default,
            boundary: BoundarySpec::default(),
            size: None,
            check_bounds: false,
            debug: false,
        }
    }
}

impl<F: Scalar> SplineDefinition<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Control points, addressed as `[i_0, .., i_{M-1}, coordinate]`.
    pub fn points(mut self, points: impl AddressableGrid<F> + 'static) -> Self {
        self.points = Some(Box::new(points));
        self
    }

    /// Per-point weights. Their presence makes the spline rational.
    pub fn weights(mut self, weights: impl AddressableGrid<F> + 'static) -> Self {
        self.weights = Some(Box::new(weights));
        self
    }

    /// Knots from any source: a flat sequence (axis 0) or one row per axis.
    pub fn knots(mut self, knots: impl AddressableGrid<F> + 'static) -> Self {
        self.knots = Some(Box::new(knots));
        self
    }

    /// Knots of a curve.
    pub fn knot_vector(self, knots: Vec<F>) -> Self {
        self.knots(knots)
    }

    /// Per-axis knots; `None` leaves an axis uniform.
    pub fn knot_vectors(self, knots: Vec<Option<Vec<F>>>) -> Self {
        self.knots(knots)
    }

    pub fn degree(mut self, degree: impl Into<DegreeSpec>) -> Self {
        self.degree = degree.into();
        self
    }

    pub fn boundary(mut self, boundary: impl Into<BoundarySpec>) -> Self {
        self.boundary = boundary.into();
        self
    }

    /// Control hull size, used only when no points are supplied.
    pub fn size(mut self, size: impl Into<SizeSpec>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Validates parameters against the domain on every evaluation.
    pub fn check_bounds(mut self, check: bool) -> Self {
        self.check_bounds = check;
        self
    }

    /// Logs the compiled evaluation plan at `debug` level.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
