//! Which control points influence the spline at a parameter.

use crate::error::NurbsError;
use crate::layout::Scalar;
use crate::spline::{Nurbs, SpecializationKey};

/// Window slots of every cell of the support, compiled per shape.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SupportPlan {
    axes: usize,
    cells: usize,
    /// `cells × axes`, row-major over the window.
    slots: Vec<usize>,
}

impl SupportPlan {
    pub fn compile(key: &SpecializationKey) -> Self {
        let window: Vec<usize> = key.degrees().iter().map(|p| p + 1).collect();
        let axes = window.len();
        let cells: usize = window.iter().product();
        let mut slots = Vec::with_capacity(cells * axes);
        for c in 0..cells {
            let mut rest = c;
            let start = slots.len();
            slots.resize(start + axes, 0);
            for d in (0..axes).rev() {
                slots[start + d] = rest % window[d];
                rest /= window[d];
            }
        }
        Self { axes, cells, slots }
    }

    /// Length of the flattened output.
    pub fn len(&self) -> usize {
        self.cells * self.axes
    }
}

impl<F: Scalar> Nurbs<F> {
    /// Writes the multi-indices of the control points supporting `params`.
    ///
    /// `out` is replaced by `∏(p_d + 1)` multi-indices of
    /// [`spline_dimension`](Nurbs::spline_dimension) entries each, in
    /// row-major window order. Indices wrap on closed axes.
    ///
    /// ```
    /// use nurbs::{Boundary, Nurbs, SplineDefinition};
    ///
    /// let spline = Nurbs::<f64>::configure(
    ///     SplineDefinition::new().size(8).degree(3).boundary(Boundary::Closed),
    /// )
    /// .unwrap();
    /// let mut out = Vec::new();
    /// spline.support(&mut out, &[1.0]).unwrap();
    /// assert_eq!(out, vec![6, 7, 0, 1]);
    /// ```
    pub fn support(&self, out: &mut Vec<usize>, params: &[F]) -> Result<(), NurbsError> {
        self.check_parameters(params)?;
        let plan = &self.procedures.support;
        let spans: Vec<usize> = (0..plan.axes)
            .map(|d| self.axis(d).locate(params[d]).0)
            .collect();

        out.clear();
        out.reserve(plan.len());
        for slots in plan.slots.chunks_exact(plan.axes) {
            for (d, &slot) in slots.iter().enumerate() {
                out.push(self.axis(d).control_index(spans[d], slot));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spline::{Boundary, SplineDefinition};

    fn sized(size: impl Into<crate::spline::SizeSpec>, degree: usize, boundary: Boundary) -> Nurbs<f64> {
        Nurbs::configure(
            SplineDefinition::new()
                .size(size)
                .degree(degree)
                .boundary(boundary),
        )
        .unwrap()
    }

    fn support(spline: &Nurbs<f64>, params: &[f64]) -> Vec<usize> {
        let mut out = Vec::new();
        spline.support(&mut out, params).unwrap();
        out
    }

    #[test]
    fn test_plan_slots() {
        let spline = sized([3, 4], 1, Boundary::Open);
        let plan = &spline.procedures.support;
        assert_eq!(plan.len(), 8);
        assert_eq!(&plan.slots[..6], &[0, 0, 0, 1, 1, 0]);
    }

    #[test]
    fn test_clamped_curve_support() {
        let spline = sized(8, 3, Boundary::Clamped);
        assert_eq!(support(&spline, &[3.0]), vec![0, 1, 2, 3]);
        assert_eq!(support(&spline, &[5.5]), vec![2, 3, 4, 5]);
        assert_eq!(support(&spline, &[8.0]), vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_closed_curve_support_wraps() {
        let spline = sized(8, 3, Boundary::Closed);
        assert_eq!(support(&spline, &[0.0]), vec![5, 6, 7, 0]);
        assert_eq!(support(&spline, &[1.0]), vec![6, 7, 0, 1]);
        assert_eq!(support(&spline, &[8.0]), vec![5, 6, 7, 0]);
    }

    #[test]
    fn test_non_uniform_support() {
        let knots: Vec<f64> = (0..12).map(|i| (i * i) as f64).collect();
        let spline = Nurbs::<f64>::configure(
            SplineDefinition::new()
                .size(8)
                .degree(3)
                .knot_vector(knots.clone()),
        )
        .unwrap();
        assert_eq!(support(&spline, &[9.0]), vec![0, 1, 2, 3]);
        assert_eq!(support(&spline, &[64.0]), vec![4, 5, 6, 7]);

        let closed = Nurbs::<f64>::configure(
            SplineDefinition::new()
                .size(8)
                .degree(3)
                .knot_vector(knots)
                .boundary(Boundary::Closed),
        )
        .unwrap();
        assert_eq!(support(&closed, &[0.0]), vec![5, 6, 7, 0]);
        assert_eq!(support(&closed, &[2.0]), vec![6, 7, 0, 1]);
        assert_eq!(support(&closed, &[4.0]), vec![7, 0, 1, 2]);
        // The right end folds onto the left end.
        assert_eq!(support(&closed, &[64.0]), vec![5, 6, 7, 0]);
    }

    #[test]
    fn test_surface_support() {
        let spline = sized([6, 5], 3, Boundary::Open);
        let out = support(&spline, &[3.0, 3.0]);
        let expected: Vec<usize> = (0..4)
            .flat_map(|i| (0..4).flat_map(move |j| [i, j]))
            .collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_mixed_boundary_surface_support() {
        let spline = Nurbs::<f64>::configure(
            SplineDefinition::new()
                .size([6, 5])
                .degree(3)
                .boundary(vec![Boundary::Closed, Boundary::Clamped]),
        )
        .unwrap();
        let out = support(&spline, &[0.0, 3.0]);
        assert_eq!(out.len(), 32);
        let first: Vec<usize> = out.chunks(2).step_by(4).map(|ij| ij[0]).collect();
        assert_eq!(first, vec![3, 4, 5, 0]);
        let second: Vec<usize> = out.chunks(2).take(4).map(|ij| ij[1]).collect();
        assert_eq!(second, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_output_is_resized() {
        let spline = sized(8, 2, Boundary::Open);
        let mut out = vec![1, 2, 3, 4, 5];
        spline.support(&mut out, &[3.0]).unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn test_support_checks_bounds() {
        let spline = Nurbs::<f64>::configure(
            SplineDefinition::new()
                .size(8)
                .degree(2)
                .check_bounds(true),
        )
        .unwrap();
        let mut out = Vec::new();
        assert!(matches!(
            spline.support(&mut out, &[1.0]),
            Err(NurbsError::Domain { axis: 0, .. })
        ));
        assert!(matches!(
            spline.support(&mut out, &[3.0, 3.0]),
            Err(NurbsError::ParameterCount { .. })
        ));
    }
}
