//! Classification of data sources into hull shapes and knot layouts.

use super::grid::{AddressableGrid, Layout};
use crate::error::{GridRole, NurbsError};

/// What a control point source tells us about the hull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PointShape {
    /// Control points per parametric axis.
    pub size: Vec<usize>,
    /// Coordinates per control point.
    pub dimension: usize,
    pub layout: Layout,
}

/// How knots are arranged in their source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KnotLayout {
    pub layout: Layout,
    /// A single flat sequence holding the knots of axis 0.
    pub flat: bool,
}

fn require_regular<F>(grid: &dyn AddressableGrid<F>, role: GridRole) -> Result<Vec<usize>, NurbsError> {
    let shape = grid.shape();
    if shape.is_empty() {
        return Err(NurbsError::layout(role, "source reports no extents"));
    }
    if !grid.is_regular() {
        let reason = match grid.layout() {
            Layout::Nested => "nested rows have differing lengths",
            Layout::Strided => "shape and stride do not fit the data buffer",
            Layout::Custom => "custom source is not addressable over its shape",
        };
        return Err(NurbsError::layout(role, reason));
    }
    Ok(shape)
}

/// Walks the point source down to its coordinate level.
pub(crate) fn infer_points<F>(grid: &dyn AddressableGrid<F>) -> Result<PointShape, NurbsError> {
    let shape = require_regular(grid, GridRole::Points)?;
    let Some((&dimension, size)) = shape.split_last().filter(|(_, size)| !size.is_empty()) else {
        return Err(NurbsError::shape("expected an array of points"));
    };
    Ok(PointShape {
        size: size.to_vec(),
        dimension,
        layout: grid.layout(),
    })
}

/// Weights must cover exactly the point index grid.
pub(crate) fn infer_weights<F>(
    grid: &dyn AddressableGrid<F>,
    size: &[usize],
) -> Result<Layout, NurbsError> {
    let shape = require_regular(grid, GridRole::Weights)?;
    if shape != size {
        return Err(NurbsError::shape(format!(
            "weights of shape {:?} do not match control hull size {:?}",
            shape, size
        )));
    }
    Ok(grid.layout())
}

/// Knots are either one flat sequence or one row per axis.
pub(crate) fn infer_knots<F>(grid: &dyn AddressableGrid<F>) -> Result<KnotLayout, NurbsError> {
    let layout = grid.layout();
    let shape = if layout == Layout::Nested {
        // Rows may legitimately differ in length, one per axis.
        grid.shape()
    } else {
        require_regular(grid, GridRole::Knots)?
    };
    match shape.len() {
        0 => Err(NurbsError::layout(GridRole::Knots, "source reports no extents")),
        1 => Ok(KnotLayout { layout, flat: true }),
        2 => Ok(KnotLayout {
            layout,
            flat: false,
        }),
        n => Err(NurbsError::layout(
            GridRole::Knots,
            format!("expected one knot row per axis but got a {}-dimensional source", n),
        )),
    }
}
