//! Normalisation of a [`SplineDefinition`] into per-axis vectors.

use super::boundary::Boundary;
use super::definition::{BoundarySpec, DegreeSpec, SplineDefinition};
use crate::error::NurbsError;
use crate::layout::accessor::KnotAccessor;
use crate::layout::inference::{infer_knots, infer_points, infer_weights, KnotLayout};
use crate::layout::{AddressableGrid, Layout, Scalar};
use log::debug;

const DEFAULT_DEGREE: usize = 2;

/// The canonical form of a definition.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Normalized {
    pub size: Vec<usize>,
    /// Whether `size` was read from the point source.
    pub size_from_points: bool,
    pub dimension: usize,
    pub degree: Vec<usize>,
    pub boundary: Vec<Boundary>,
    pub points: Option<Layout>,
    pub weights: Option<Layout>,
    pub knots: Option<KnotLayout>,
    /// Per axis: no explicit knots.
    pub uniform: Vec<bool>,
}

/// Control hull extents, before degrees and knots are considered.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Hull {
    pub size: Vec<usize>,
    pub dimension: usize,
    pub points: Option<Layout>,
    pub from_points: bool,
}

pub(crate) fn normalize<F: Scalar>(def: &SplineDefinition<F>) -> Result<Normalized, NurbsError> {
    let hull = match def.points.as_deref() {
        Some(grid) => {
            let shape = infer_points(grid)?;
            Hull {
                size: shape.size,
                dimension: shape.dimension,
                points: Some(shape.layout),
                from_points: true,
            }
        }
        None => {
            let size = def.size.as_ref().map(|s| s.to_vec()).ok_or_else(|| {
                NurbsError::shape("either points or a control hull size must be provided")
            })?;
            if size.is_empty() {
                return Err(NurbsError::shape(
                    "size must be a number or a vector of length at least one",
                ));
            }
            Hull {
                size,
                dimension: 0,
                points: None,
                from_points: false,
            }
        }
    };
    normalize_axes(
        hull,
        def.weights.as_deref(),
        def.knots.as_deref(),
        &def.degree,
        &def.boundary,
    )
}

/// Resolves degrees, boundaries and knots against a known hull size.
pub(crate) fn normalize_axes<F: Scalar>(
    hull: Hull,
    weights: Option<&dyn AddressableGrid<F>>,
    knots: Option<&dyn AddressableGrid<F>>,
    degree: &DegreeSpec,
    boundary: &BoundarySpec,
) -> Result<Normalized, NurbsError> {
    let Hull {
        size,
        dimension,
        points,
        from_points,
    } = hull;
    check_size(&size)?;

    let weights = weights.map(|grid| infer_weights(grid, &size)).transpose()?;
    let degree = normalize_degree(degree, &size)?;
    let boundary = normalize_boundary(boundary, size.len())?;

    let (knots, uniform) = match knots {
        Some(grid) => {
            let layout = infer_knots(grid)?;
            let access = KnotAccessor::new(grid, layout.flat);
            let uniform = check_knots(&access, &size, &degree, &boundary)?;
            (Some(layout), uniform)
        }
        None => (None, vec![true; size.len()]),
    };

    Ok(Normalized {
        size,
        size_from_points: from_points,
        dimension,
        degree,
        boundary,
        points,
        weights,
        knots,
        uniform,
    })
}

fn check_size(size: &[usize]) -> Result<(), NurbsError> {
    match size.iter().position(|&s| s == 0) {
        Some(axis) => Err(NurbsError::shape(format!(
            "control hull has no points in dimension {}",
            axis
        ))),
        None => Ok(()),
    }
}

fn normalize_degree(spec: &DegreeSpec, size: &[usize]) -> Result<Vec<usize>, NurbsError> {
    let explicit = |axis: usize, degree: usize| {
        if size[axis] <= degree {
            Err(NurbsError::InsufficientPoints {
                axis,
                degree,
                points: size[axis],
            })
        } else {
            Ok(degree)
        }
    };

    match spec {
        DegreeSpec::Default => Ok(size
            .iter()
            .enumerate()
            .map(|(axis, &s)| {
                if s <= DEFAULT_DEGREE {
                    debug!(
                        "lowering degree in dimension {} from {} to {} to fit {} points",
                        axis,
                        DEFAULT_DEGREE,
                        s - 1,
                        s
                    );
                    s - 1
                } else {
                    DEFAULT_DEGREE
                }
            })
            .collect()),
        DegreeSpec::Uniform(p) => (0..size.len()).map(|axis| explicit(axis, *p)).collect(),
        DegreeSpec::PerAxis(degrees) => (0..size.len())
            .map(|axis| match degrees.get(axis).copied().flatten() {
                Some(p) => explicit(axis, p),
                None => Err(NurbsError::MissingDegree { axis }),
            })
            .collect(),
    }
}

fn normalize_boundary(spec: &BoundarySpec, axes: usize) -> Result<Vec<Boundary>, NurbsError> {
    let default = match &spec.default {
        Some(token) => token.parse()?,
        None => Boundary::Open,
    };
    (0..axes)
        .map(|axis| match spec.per_axis.get(axis).and_then(Option::as_deref) {
            Some(token) => token.parse(),
            None => Ok(default),
        })
        .collect()
}

/// Checks knot counts and reports which axes have no knots.
///
/// Closed axes need `s + 1` knots but also accept `s + p + 1`, in which case
/// only the first `s + 1` are used.
fn check_knots<F: Scalar>(
    access: &KnotAccessor<'_, F>,
    size: &[usize],
    degree: &[usize],
    boundary: &[Boundary],
) -> Result<Vec<bool>, NurbsError> {
    let mut uniform = Vec::with_capacity(size.len());
    for axis in 0..size.len() {
        let actual = access.row_len(axis);
        uniform.push(actual == 0);
        if actual == 0 {
            continue;
        }
        let (s, p) = (size[axis], degree[axis]);
        let ok = if boundary[axis].is_closed() {
            actual == s + 1 || actual == s + p + 1
        } else {
            actual == s + p + 1
        };
        if !ok {
            let expected = if boundary[axis].is_closed() { s + 1 } else { s + p + 1 };
            return Err(NurbsError::KnotLength {
                axis,
                expected,
                actual,
            });
        }
    }
    Ok(uniform)
}
