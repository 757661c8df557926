//! Central-difference derivatives, a cross-check for the analytic ones.

use crate::error::NurbsError;
use crate::layout::Scalar;
use crate::spline::Nurbs;

/// Relative step used when none is given, as a fraction of the axis' domain
/// width.
const DEFAULT_STEP: f64 = 1e-4;

impl<F: Scalar> Nurbs<F> {
    /// First derivative along `axis` by central differences.
    ///
    /// The step is `step` (default `1e-4`) times the width of the axis'
    /// domain. Closed axes wrap the perturbed parameters
    /// around the period; other axes clamp them into the domain and divide by
    /// the clamped distance. Only `order == 1` is supported.
    pub fn numerical_derivative(
        &self,
        out: &mut Vec<F>,
        order: usize,
        axis: usize,
        params: &[F],
        step: Option<F>,
    ) -> Result<(), NurbsError> {
        if order != 1 {
            return Err(NurbsError::unsupported(format!(
                "numerical derivative supports order 1 only, got {}",
                order
            )));
        }
        if axis >= self.spline_dimension() {
            return Err(NurbsError::unsupported(format!(
                "no parametric axis {} in a {}-dimensional spline",
                axis,
                self.spline_dimension()
            )));
        }
        self.check_parameters(params)?;

        let h = match step {
            Some(h) => h,
            None => F::from(DEFAULT_STEP).unwrap_or_else(F::epsilon),
        };
        let geometry = self.axis(axis);
        let [lo, hi] = geometry.domain();
        let dt = (hi - lo) * h;

        let t = params[axis];
        let (tm, tp, denominator) = if geometry.boundary.is_closed() {
            let period = hi - lo;
            let wrap = |u: F| lo + ((u - lo) % period + period) % period;
            (wrap(t - dt), wrap(t + dt), dt + dt)
        } else {
            let tm = (t - dt).max(lo).min(hi);
            let tp = (t + dt).max(lo).min(hi);
            (tm, tp, tp - tm)
        };

        let mut evaluator = self.evaluator(&[])?;
        let mut shifted = params.to_vec();
        shifted[axis] = tm;
        let minus = evaluator.point(&shifted)?;
        shifted[axis] = tp;
        evaluator.evaluate(out, &shifted)?;
        for (o, m) in out.iter_mut().zip(minus) {
            *o = (*o - m) / denominator;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::NurbsError;
    use crate::spline::{Boundary, Nurbs, SplineDefinition};
    use approx::assert_relative_eq;

    fn curve(values: &[f64]) -> Vec<Vec<f64>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    /// Compares analytic and numerical derivatives along `axis` over a sweep.
    fn assert_derivatives_agree(spline: &Nurbs<f64>, axis: usize) {
        let domain = spline.domain();
        let mut analytic = spline.derivative_evaluator(1, axis).unwrap();
        let mut numeric = Vec::new();
        let fixed: Vec<f64> = domain.iter().map(|[lo, hi]| 0.37 * lo + 0.63 * hi).collect();
        let [lo, hi] = domain[axis];
        for i in 0..=10 {
            let mut params = fixed.clone();
            params[axis] = lo + (hi - lo) * i as f64 / 10.0;
            let exact = analytic.point(&params).unwrap();
            spline
                .numerical_derivative(&mut numeric, 1, axis, &params, None)
                .unwrap();
            for (a, n) in exact.iter().zip(&numeric) {
                assert_relative_eq!(*a, *n, epsilon = 1e-3, max_relative = 1e-3);
            }
        }
    }

    #[test]
    fn test_curve_derivatives() {
        for boundary in [Boundary::Open, Boundary::Clamped, Boundary::Closed] {
            for degree in [2, 3] {
                let spline = Nurbs::configure(
                    SplineDefinition::new()
                        .points(curve(&[0.0, 1.0, 4.0, 2.0, 4.0]))
                        .degree(degree)
                        .boundary(boundary),
                )
                .unwrap();
                assert_derivatives_agree(&spline, 0);
            }
        }
    }

    #[test]
    fn test_rational_curve_derivatives() {
        for boundary in [Boundary::Open, Boundary::Clamped, Boundary::Closed] {
            for (degree, weights) in [(2, vec![2.0, 4.0, 3.0, 5.0, 3.0]), (3, vec![1.0, 3.0, 2.0, 4.0, 3.0])] {
                let spline = Nurbs::configure(
                    SplineDefinition::new()
                        .points(vec![
                            vec![0.0, 3.0],
                            vec![1.0, 4.0],
                            vec![4.0, 2.0],
                            vec![2.0, 0.0],
                            vec![4.0, 7.0],
                        ])
                        .weights(weights)
                        .degree(degree)
                        .boundary(boundary),
                )
                .unwrap();
                assert_derivatives_agree(&spline, 0);
            }
        }
    }

    #[test]
    fn test_non_uniform_derivatives() {
        let spline = Nurbs::configure(
            SplineDefinition::new()
                .points(curve(&[0.0, 1.0, 4.0, 2.0, 4.0, 1.0]))
                .weights(vec![1.0, 2.0, 1.5, 0.5, 1.0, 2.0])
                .knot_vector(vec![0.0, 0.5, 1.0, 2.0, 3.5, 4.0, 5.0, 6.5, 7.0, 8.0])
                .degree(3),
        )
        .unwrap();
        assert_derivatives_agree(&spline, 0);
    }

    #[test]
    fn test_surface_derivatives() {
        let points: Vec<Vec<Vec<f64>>> = (0..4)
            .map(|i| {
                (0..5)
                    .map(|j| vec![i as f64, j as f64, ((i + 2 * j) % 3) as f64])
                    .collect()
            })
            .collect();
        let weights: Vec<Vec<f64>> = (0..4)
            .map(|i| (0..5).map(|j| 1.0 + ((i * j) % 4) as f64 * 0.5).collect())
            .collect();
        for rational in [false, true] {
            let mut definition = SplineDefinition::new()
                .points(points.clone())
                .boundary(vec![Boundary::Clamped, Boundary::Closed]);
            if rational {
                definition = definition.weights(weights.clone());
            }
            let spline = Nurbs::configure(definition).unwrap();
            assert_derivatives_agree(&spline, 0);
            assert_derivatives_agree(&spline, 1);
        }
    }

    #[test]
    fn test_clamped_step_at_domain_edge() {
        // Linear segment: the one-sided difference is still exact.
        let spline = Nurbs::configure(SplineDefinition::new().points(vec![vec![1.0], vec![4.0]])).unwrap();
        let mut out = Vec::new();
        spline.numerical_derivative(&mut out, 1, 0, &[1.0], None).unwrap();
        assert_relative_eq!(out[0], 3.0, epsilon = 1e-9);
        spline.numerical_derivative(&mut out, 1, 0, &[2.0], Some(1e-2)).unwrap();
        assert_relative_eq!(out[0], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_step_scales_with_domain_width() {
        // Domain [2, 5]: a relative step of 0.1 moves t by 0.3.
        let spline = Nurbs::configure(
            SplineDefinition::new()
                .points(curve(&[0.0, 1.0, 4.0, 2.0, 4.0]))
                .boundary(Boundary::Open)
                .degree(2),
        )
        .unwrap();
        let mut out = Vec::new();
        spline.numerical_derivative(&mut out, 1, 0, &[2.0], Some(0.1)).unwrap();
        let expected = (spline.point(&[2.3]).unwrap()[0] - spline.point(&[2.0]).unwrap()[0]) / 0.3;
        assert_relative_eq!(expected, 1.3, epsilon = 1e-12);
        assert_relative_eq!(out[0], 1.3, epsilon = 1e-12);
    }

    #[test]
    fn test_repeated_start_knots_keep_a_finite_step() {
        // The first knot interval of the domain is empty.
        let spline = Nurbs::configure(
            SplineDefinition::new()
                .points(curve(&[0.0, 1.0, 4.0, 2.0, 4.0, 1.0]))
                .knot_vector(vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 2.0, 2.0])
                .degree(2),
        )
        .unwrap();
        let mut out = Vec::new();
        spline.numerical_derivative(&mut out, 1, 0, &[0.5], None).unwrap();
        assert!(out[0].is_finite());
        let exact = spline.derivative_evaluator(1, 0).unwrap().point(&[0.5]).unwrap();
        assert_relative_eq!(out[0], exact[0], epsilon = 1e-3, max_relative = 1e-3);
    }

    #[test]
    fn test_unsupported_requests() {
        let spline = Nurbs::configure(SplineDefinition::new().points(curve(&[0.0, 1.0, 4.0]))).unwrap();
        let mut out = Vec::new();
        assert!(matches!(
            spline.numerical_derivative(&mut out, 2, 0, &[2.5], None),
            Err(NurbsError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            spline.numerical_derivative(&mut out, 1, 1, &[2.5], None),
            Err(NurbsError::UnsupportedOperation { .. })
        ));
    }
}
