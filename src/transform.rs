//! Projective transforms of the control hull.
//!
//! Applying a homogeneous matrix to the control points and evaluating gives
//! the same result as evaluating and transforming the point, so a spline can
//! be moved, scaled or put in perspective by rewriting its hull in place.

use crate::error::NurbsError;
use crate::layout::accessor::next_index;
use crate::layout::Scalar;
use crate::spline::{Nurbs, SpecializationKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransformPlan {
    /// Coordinates per point; the matrix is `(dimension + 1)²`.
    pub dimension: usize,
}

impl TransformPlan {
    pub fn compile(key: &SpecializationKey) -> Self {
        Self {
            dimension: key.dimension,
        }
    }

    pub fn matrix_len(&self) -> usize {
        (self.dimension + 1) * (self.dimension + 1)
    }

    /// Maps one point in place. `m` is column-major.
    fn apply<F: Scalar>(&self, m: &[F], x: &[F], out: &mut [F]) {
        let n = self.dimension;
        let column = |j: usize| &m[j * (n + 1)..(j + 1) * (n + 1)];

        let mut w = column(n)[n];
        for (j, &xj) in x.iter().enumerate() {
            w = w + column(j)[n] * xj;
        }
        if w == F::zero() {
            w = F::one();
        }

        for (i, o) in out.iter_mut().enumerate() {
            let mut v = column(n)[i];
            for (j, &xj) in x.iter().enumerate() {
                v = v + column(j)[i] * xj;
            }
            *o = v / w;
        }
    }
}

impl<F: Scalar> Nurbs<F> {
    /// Applies a homogeneous `(N+1)×(N+1)` matrix to every control point.
    ///
    /// The matrix is given as a flat column-major array; the last row holds
    /// the projective terms and the last column the translation. Weights are
    /// left untouched. Splines without points are returned unchanged.
    ///
    /// ```
    /// use nurbs::{Nurbs, SplineDefinition};
    ///
    /// let mut spline = Nurbs::configure(
    ///     SplineDefinition::new().points(vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
    /// )
    /// .unwrap();
    /// // Translate by (10, 20).
    /// spline
    ///     .transform(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 10.0, 20.0, 1.0])
    ///     .unwrap();
    /// assert_eq!(spline.point(&[1.0]).unwrap(), vec![11.0, 22.0]);
    /// ```
    pub fn transform(&mut self, matrix: &[F]) -> Result<&mut Self, NurbsError> {
        let plan = self.procedures.transform.clone();
        let size = self.size().to_vec();
        if self.points.is_none() {
            return Ok(self);
        }
        if matrix.len() != plan.matrix_len() {
            return Err(NurbsError::shape(format!(
                "expected a {0}x{0} transform matrix with {1} entries, got {2}",
                plan.dimension + 1,
                plan.matrix_len(),
                matrix.len()
            )));
        }

        let Some(points) = self.points.as_deref_mut() else {
            return Ok(self);
        };
        let n = plan.dimension;
        let axes = size.len();
        let mut index = vec![0; axes + 1];
        let mut x = vec![F::zero(); n];
        let mut y = vec![F::zero(); n];
        loop {
            for (k, xk) in x.iter_mut().enumerate() {
                index[axes] = k;
                *xk = points.get(&index);
            }
            plan.apply(matrix, &x, &mut y);
            for (k, &yk) in y.iter().enumerate() {
                index[axes] = k;
                points.set(&index, yk);
            }
            if !next_index(&mut index[..axes], &size) {
                break;
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::StridedGrid;
    use crate::spline::SplineDefinition;
    use approx::assert_relative_eq;

    fn rows(spline: &Nurbs<f64>) -> Vec<Vec<f64>> {
        let points = spline.points().unwrap();
        let shape = points.shape();
        (0..shape[0])
            .map(|i| (0..shape[1]).map(|k| points.get(&[i, k])).collect())
            .collect()
    }

    #[test]
    fn test_transform_2d_curve() {
        let mut spline = Nurbs::configure(
            SplineDefinition::new().points(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]),
        )
        .unwrap();
        spline
            .transform(&[1.0, 2.0, 0.0, 4.0, 5.0, 0.0, 8.0, 9.0, 1.0])
            .unwrap();
        assert_eq!(
            rows(&spline),
            vec![vec![17.0, 21.0], vec![27.0, 35.0], vec![37.0, 49.0]]
        );
    }

    #[test]
    fn test_transform_3d_curve() {
        let mut spline = Nurbs::configure(
            SplineDefinition::new()
                .points(vec![vec![1.0, 2.0, 3.0], vec![3.0, 4.0, 5.0], vec![5.0, 6.0, 7.0]]),
        )
        .unwrap();
        spline
            .transform(&[
                1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0, 8.0, 9.0, 10.0, 0.0, 12.0, 13.0, 14.0, 1.0,
            ])
            .unwrap();
        assert_eq!(
            rows(&spline),
            vec![
                vec![45.0, 52.0, 59.0],
                vec![71.0, 84.0, 97.0],
                vec![97.0, 116.0, 135.0]
            ]
        );
    }

    #[test]
    fn test_perspective_divide() {
        // w = x + 1: maps (1, 2) to (0.5, 1).
        let mut spline =
            Nurbs::configure(SplineDefinition::new().points(vec![vec![1.0, 2.0], vec![3.0, 4.0]]))
                .unwrap();
        spline
            .transform(&[1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
            .unwrap();
        assert_eq!(rows(&spline), vec![vec![0.5, 1.0], vec![0.75, 1.0]]);
    }

    #[test]
    fn test_zero_w_is_treated_as_one() {
        let mut spline =
            Nurbs::configure(SplineDefinition::new().points(vec![vec![1.0], vec![2.0]])).unwrap();
        // w = -x + 1 vanishes at x = 1.
        spline.transform(&[2.0, -1.0, 0.0, 1.0]).unwrap();
        assert_eq!(rows(&spline), vec![vec![2.0], vec![-4.0]]);
    }

    #[test]
    fn test_transform_commutes_with_rational_evaluation() {
        let points = vec![vec![0.0, 0.0], vec![1.0, 3.0], vec![3.0, 1.0], vec![4.0, 4.0]];
        let definition = || {
            SplineDefinition::new()
                .points(points.clone())
                .weights(vec![1.0, 2.0, 0.5, 1.0])
                .degree(2)
        };
        let original = Nurbs::configure(definition()).unwrap();
        let mut moved = Nurbs::configure(definition()).unwrap();
        // Rotation by 90 degrees plus translation (2, -1).
        let m = [0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 2.0, -1.0, 1.0];
        moved.transform(&m).unwrap();

        for t in [2.0, 2.3, 2.9, 3.5, 4.0] {
            let p = original.point(&[t]).unwrap();
            let q = moved.point(&[t]).unwrap();
            assert_relative_eq!(q[0], -p[1] + 2.0, epsilon = 1e-12);
            assert_relative_eq!(q[1], p[0] - 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_transform_surface_in_strided_storage() {
        let mut spline = Nurbs::configure(
            SplineDefinition::new()
                .points(StridedGrid::packed((0..12).map(f64::from).collect(), vec![2, 3, 2])),
        )
        .unwrap();
        // Uniform scale by 2.
        spline
            .transform(&[2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0])
            .unwrap();
        let points = spline.points().unwrap();
        assert_eq!(points.get(&[1, 2, 1]), 22.0);
        assert_eq!(points.get(&[0, 1, 0]), 4.0);
    }

    #[test]
    fn test_matrix_length_is_checked() {
        let mut spline =
            Nurbs::configure(SplineDefinition::new().points(vec![vec![1.0, 2.0], vec![3.0, 4.0]]))
                .unwrap();
        let err = spline.transform(&[1.0, 0.0, 0.0, 1.0]).unwrap_err();
        assert!(matches!(err, NurbsError::Shape { .. }));
        assert_eq!(rows(&spline), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_size_only_transform_is_a_no_op() {
        let mut spline = Nurbs::<f64>::configure(SplineDefinition::new().size(4)).unwrap();
        assert!(spline.transform(&[1.0]).is_ok());
    }
}
