//! Spline configuration: the validated control hull and its per-axis shape.

mod boundary;
mod definition;
mod key;
pub(crate) mod validate;

pub use boundary::Boundary;
pub use definition::{BoundarySpec, DegreeSpec, SizeSpec, SplineDefinition};
pub use key::{AxisKey, SpecializationKey};

use crate::cache;
use crate::error::{NurbsError, Parameter};
use crate::eval::plan::{EvaluationPlan, PlanKey};
use crate::eval::span::Axis;
use crate::layout::accessor::KnotAccessor;
use crate::layout::{AddressableGrid, Scalar};
use crate::support::SupportPlan;
use crate::transform::TransformPlan;
use std::sync::Arc;
use validate::{Hull, Normalized};

/// Where the control hull size comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HullSize {
    /// Given explicitly; can be changed with [`Nurbs::set_size`].
    Fixed(Vec<usize>),
    /// Read from the shape of the point source at configuration time.
    ///
    /// Point storage can be edited in place but never reshaped, so the size
    /// stays in step with the points.
    DerivedFromPoints(Vec<usize>),
}

impl HullSize {
    fn as_slice(&self) -> &[usize] {
        match self {
            HullSize::Fixed(size) | HullSize::DerivedFromPoints(size) => size,
        }
    }
}

/// Compiled procedures shared with every spline of the same key.
#[derive(Debug, Clone)]
pub(crate) struct Procedures {
    pub evaluate: Arc<EvaluationPlan>,
    pub support: Arc<SupportPlan>,
    pub transform: Arc<TransformPlan>,
}

impl Procedures {
    fn lookup(key: &SpecializationKey) -> Self {
        Self {
            evaluate: EvaluationPlan::cached(&PlanKey::point(key.clone())),
            support: cache::support_plans().get_or_compile(key, SupportPlan::compile),
            transform: cache::transform_plans().get_or_compile(key, TransformPlan::compile),
        }
    }
}

/// A non-uniform rational B-spline of any parametric and spatial dimension.
///
/// # Example
///
/// ```
/// use nurbs::{Boundary, Nurbs, SplineDefinition};
///
/// let spline = Nurbs::configure(
///     SplineDefinition::new()
///         .points(vec![vec![0.0], vec![1.0], vec![4.0]])
///         .degree(2)
///         .boundary(Boundary::Clamped),
/// )
/// .unwrap();
///
/// assert_eq!(spline.domain(), vec![[2.0, 3.0]]);
/// assert_eq!(spline.point(&[2.5]).unwrap(), vec![1.5]);
/// ```
#[derive(Debug)]
pub struct Nurbs<F: Scalar> {
    pub(crate) points: Option<Box<dyn AddressableGrid<F>>>,
    pub(crate) weights: Option<Box<dyn AddressableGrid<F>>>,
    pub(crate) knots: Option<Box<dyn AddressableGrid<F>>>,
    flat_knots: bool,
    hull: HullSize,
    dimension: usize,
    degree: Vec<usize>,
    boundary: Vec<Boundary>,
    degree_spec: DegreeSpec,
    boundary_spec: BoundarySpec,
    key: SpecializationKey,
    pub(crate) procedures: Procedures,
}

fn specialization_key(n: &Normalized, check_bounds: bool, debug: bool) -> SpecializationKey {
    let axes = n
        .degree
        .iter()
        .zip(&n.boundary)
        .zip(&n.uniform)
        .map(|((&degree, &boundary), &uniform)| AxisKey {
            degree,
            boundary,
            uniform,
        })
        .collect();
    SpecializationKey {
        dimension: n.dimension,
        rational: n.weights.is_some(),
        axes,
        points: n.points,
        weights: n.weights,
        knots: n.knots.map(|k| k.layout),
        check_bounds,
        debug,
    }
}

impl<F: Scalar> Nurbs<F> {
    /// Validates a definition and builds a spline from it.
    pub fn configure(definition: SplineDefinition<F>) -> Result<Self, NurbsError> {
        let normalized = validate::normalize(&definition)?;
        let key = specialization_key(&normalized, definition.check_bounds, definition.debug);
        let procedures = Procedures::lookup(&key);
        Ok(Self::assemble(definition, normalized, key, procedures))
    }

    /// Replaces the whole configuration.
    ///
    /// Procedures are looked up again only if the shape changed. On error the
    /// spline is left as it was.
    pub fn reconfigure(&mut self, definition: SplineDefinition<F>) -> Result<(), NurbsError> {
        let normalized = validate::normalize(&definition)?;
        let key = specialization_key(&normalized, definition.check_bounds, definition.debug);
        let procedures = if key == self.key {
            self.procedures.clone()
        } else {
            Procedures::lookup(&key)
        };
        *self = Self::assemble(definition, normalized, key, procedures);
        Ok(())
    }

    fn assemble(
        definition: SplineDefinition<F>,
        n: Normalized,
        key: SpecializationKey,
        procedures: Procedures,
    ) -> Self {
        let hull = if n.size_from_points {
            HullSize::DerivedFromPoints(n.size)
        } else {
            HullSize::Fixed(n.size)
        };
        Self {
            points: definition.points,
            weights: definition.weights,
            knots: definition.knots,
            flat_knots: n.knots.is_some_and(|k| k.flat),
            hull,
            dimension: n.dimension,
            degree: n.degree,
            boundary: n.boundary,
            degree_spec: definition.degree,
            boundary_spec: definition.boundary,
            key,
            procedures,
        }
    }

    /// Changes the control hull size of a spline configured without points.
    ///
    /// Degrees, boundaries and knots are checked against the new size.
    pub fn set_size(&mut self, size: impl Into<SizeSpec>) -> Result<(), NurbsError> {
        if let HullSize::DerivedFromPoints(_) = self.hull {
            return Err(NurbsError::unsupported(
                "size is derived from the control points and cannot be assigned",
            ));
        }
        let hull = Hull {
            size: size.into().to_vec(),
            dimension: 0,
            points: None,
            from_points: false,
        };
        let n = validate::normalize_axes(
            hull,
            self.weights.as_deref(),
            self.knots.as_deref(),
            &self.degree_spec,
            &self.boundary_spec,
        )?;
        let key = specialization_key(&n, self.key.check_bounds, self.key.debug);
        if key != self.key {
            self.procedures = Procedures::lookup(&key);
            self.key = key;
        }
        self.flat_knots = n.knots.is_some_and(|k| k.flat);
        self.degree = n.degree;
        self.boundary = n.boundary;
        self.hull = HullSize::Fixed(n.size);
        Ok(())
    }

    /// Number of parametric axes.
    pub fn spline_dimension(&self) -> usize {
        self.degree.len()
    }

    /// Coordinates per control point; zero without points.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Control points per axis.
    pub fn size(&self) -> &[usize] {
        self.hull.as_slice()
    }

    pub fn hull_size(&self) -> &HullSize {
        &self.hull
    }

    pub fn degree(&self) -> &[usize] {
        &self.degree
    }

    pub fn boundary(&self) -> &[Boundary] {
        &self.boundary
    }

    pub fn is_rational(&self) -> bool {
        self.weights.is_some()
    }

    pub fn checks_bounds(&self) -> bool {
        self.key.check_bounds
    }

    pub fn key(&self) -> &SpecializationKey {
        &self.key
    }

    /// Valid parameter interval per axis, computed from the current shape.
    pub fn domain(&self) -> Vec<[F; 2]> {
        (0..self.spline_dimension())
            .map(|d| self.axis(d).domain())
            .collect()
    }

    pub fn points(&self) -> Option<&dyn AddressableGrid<F>> {
        self.points.as_deref()
    }

    /// Live point storage. Edits are seen by the next evaluation.
    pub fn points_mut(&mut self) -> Option<&mut (dyn AddressableGrid<F> + 'static)> {
        self.points.as_deref_mut()
    }

    pub fn weights(&self) -> Option<&dyn AddressableGrid<F>> {
        self.weights.as_deref()
    }

    pub fn weights_mut(&mut self) -> Option<&mut (dyn AddressableGrid<F> + 'static)> {
        self.weights.as_deref_mut()
    }

    pub fn knots(&self) -> Option<&dyn AddressableGrid<F>> {
        self.knots.as_deref()
    }

    /// Explicit knots of one axis, or `None` if the axis is uniform.
    pub fn knot_vector(&self, axis: usize) -> Option<Vec<F>> {
        let access = self.knot_accessor()?;
        let len = access.row_len(axis);
        if axis >= self.spline_dimension() || len == 0 {
            return None;
        }
        Some((0..len).map(|i| access.knot(axis, i)).collect())
    }

    fn knot_accessor(&self) -> Option<KnotAccessor<'_, F>> {
        self.knots
            .as_deref()
            .map(|grid| KnotAccessor::new(grid, self.flat_knots))
    }

    /// Knot geometry of axis `d`.
    pub(crate) fn axis(&self, d: usize) -> Axis<'_, F> {
        Axis {
            index: d,
            degree: self.degree[d],
            size: self.size()[d],
            boundary: self.boundary[d],
            knots: if self.key.axes[d].uniform {
                None
            } else {
                self.knot_accessor()
            },
        }
    }

    /// Checks parameter count and, if enabled, that each lies in its domain.
    pub(crate) fn check_parameters(&self, params: &[F]) -> Result<(), NurbsError> {
        let axes = self.spline_dimension();
        if self.key.check_bounds {
            for d in 0..axes {
                let [min, max] = self.axis(d).domain();
                let value = match params.get(d) {
                    None => Parameter::Missing,
                    Some(&t) if t.is_nan() || t < min || t > max => {
                        Parameter::Value(t.to_f64().unwrap_or(f64::NAN))
                    }
                    Some(_) => continue,
                };
                return Err(NurbsError::Domain {
                    axis: d,
                    min: min.to_f64().unwrap_or(f64::NAN),
                    max: max.to_f64().unwrap_or(f64::NAN),
                    value,
                });
            }
        }
        if params.len() != axes {
            return Err(NurbsError::ParameterCount {
                expected: axes,
                actual: params.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::StridedGrid;
    use approx::assert_relative_eq;

    fn curve(values: &[f64]) -> Vec<Vec<f64>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    #[test]
    fn test_curve_shapes() {
        let spline =
            Nurbs::configure(SplineDefinition::new().points(vec![vec![1.0, 2.0], vec![4.0, 5.0], vec![7.0, 8.0]]))
                .unwrap();
        assert_eq!(spline.spline_dimension(), 1);
        assert_eq!(spline.dimension(), 2);
        assert_eq!(spline.size(), &[3]);
        assert_eq!(spline.degree(), &[2]);
        assert!(!spline.is_rational());
        assert!(matches!(spline.hull_size(), HullSize::DerivedFromPoints(_)));
    }

    #[test]
    fn test_zero_dimensional_points_rejected() {
        let err = Nurbs::configure(SplineDefinition::new().points(vec![1.0, 2.0, 3.0, 4.0]))
            .unwrap_err();
        assert!(matches!(err, NurbsError::Shape { .. }));
    }

    #[test]
    fn test_domain() {
        let spline = Nurbs::configure(SplineDefinition::new().points(curve(&[1.0, 2.0, 3.0]))).unwrap();
        assert_eq!(spline.domain(), vec![[2.0, 3.0]]);

        let spline = Nurbs::configure(
            SplineDefinition::new()
                .points(curve(&[0.0, 1.0, 4.0, 2.0, 4.0]))
                .boundary(Boundary::Closed),
        )
        .unwrap();
        assert_eq!(spline.domain(), vec![[0.0, 5.0]]);

        let spline = Nurbs::configure(
            SplineDefinition::new()
                .points(curve(&[0.0, 1.0, 3.0, 2.0, 4.0]))
                .degree(3)
                .knot_vector(vec![1.0, 2.0, 4.0, 8.0, 16.0, 32.0])
                .boundary(Boundary::Closed),
        )
        .unwrap();
        assert_eq!(spline.domain(), vec![[1.0, 32.0]]);
    }

    #[test]
    fn test_knot_vector_accessor() {
        let spline = Nurbs::configure(
            SplineDefinition::new()
                .points(vec![vec![vec![0.0], vec![1.0]], vec![vec![20.0], vec![21.0]]])
                .degree(vec![1, 1])
                .knot_vectors(vec![None, Some(vec![6.0, 7.0, 8.0, 9.0])]),
        )
        .unwrap();
        assert_eq!(spline.knot_vector(0), None);
        assert_eq!(spline.knot_vector(1), Some(vec![6.0, 7.0, 8.0, 9.0]));
        assert_eq!(spline.knot_vector(2), None);
        assert_eq!(spline.domain(), vec![[1.0, 2.0], [7.0, 8.0]]);
    }

    #[test]
    fn test_size_only_mode() {
        let mut spline = Nurbs::<f64>::configure(SplineDefinition::new().size(10)).unwrap();
        assert_eq!(spline.spline_dimension(), 1);
        assert_eq!(spline.dimension(), 0);
        assert_eq!(spline.size(), &[10]);

        spline.set_size(vec![5]).unwrap();
        assert_eq!(spline.size(), &[5]);
        assert_eq!(spline.domain(), vec![[2.0, 5.0]]);

        spline.set_size([4, 4]).unwrap();
        assert_eq!(spline.degree(), &[2, 2]);

        spline
            .reconfigure(SplineDefinition::new().points(curve(&[1.0, 2.0, 3.0])))
            .unwrap();
        assert_eq!(spline.size(), &[3]);
        assert!(matches!(
            spline.set_size(5),
            Err(NurbsError::UnsupportedOperation { .. })
        ));
        assert_eq!(spline.size(), &[3]);
    }

    #[test]
    fn test_set_size_rechecks_explicit_degree() {
        let mut spline = Nurbs::<f64>::configure(SplineDefinition::new().size(6).degree(3)).unwrap();
        let err = spline.set_size(3).unwrap_err();
        assert!(err.is_degree_error());
        assert_eq!(spline.size(), &[6]);
    }

    #[test]
    fn test_failed_reconfigure_leaves_spline_untouched() {
        let mut spline = Nurbs::configure(SplineDefinition::new().points(curve(&[1.0, 4.0]))).unwrap();
        let err = spline
            .reconfigure(SplineDefinition::new().points(vec![1.0, 1.0, 4.0]))
            .unwrap_err();
        assert!(err.to_string().contains("expected an array of points"));
        assert_eq!(spline.size(), &[2]);
        assert_eq!(spline.degree(), &[1]);
    }

    #[test]
    fn test_reconfigure_reuses_procedures_for_same_shape() {
        let mut spline = Nurbs::configure(SplineDefinition::new().points(curve(&[1.0, 4.0]))).unwrap();
        let before = Arc::clone(&spline.procedures.evaluate);
        spline
            .reconfigure(SplineDefinition::new().points(curve(&[2.0, 5.0])))
            .unwrap();
        assert!(Arc::ptr_eq(&before, &spline.procedures.evaluate));
    }

    #[test]
    fn test_strided_and_nested_share_shape_but_not_key() {
        let rows = curve(&[0.0, 1.0, 4.0]);
        let nested = Nurbs::configure(SplineDefinition::new().points(rows.clone())).unwrap();
        let strided =
            Nurbs::configure(SplineDefinition::new().points(StridedGrid::from_rows(&rows))).unwrap();
        assert_eq!(nested.size(), strided.size());
        assert_ne!(nested.key(), strided.key());
    }

    #[test]
    fn test_parameter_checks() {
        let spline = Nurbs::configure(
            SplineDefinition::new()
                .points(curve(&[0.0, 1.0, 3.0, 2.0, 4.0]))
                .check_bounds(true),
        )
        .unwrap();
        let err = spline.check_parameters(&[-2.0]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid spline parameter in dimension 0: valid domain is [2, 5] but got t0 = -2"
        );
        assert!(spline.check_parameters(&[8.0]).is_err());
        assert!(spline.check_parameters(&[f64::NAN]).unwrap_err().to_string().ends_with("NaN"));
        assert!(spline.check_parameters(&[]).unwrap_err().to_string().ends_with("undefined"));
        assert!(spline.check_parameters(&[2.0]).is_ok());
        assert!(spline.check_parameters(&[5.0]).is_ok());
        assert_eq!(
            spline.check_parameters(&[2.5, 1.0]).unwrap_err(),
            NurbsError::ParameterCount {
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn test_surface_parameter_checks() {
        let spline = Nurbs::configure(
            SplineDefinition::new()
                .points(vec![
                    curve(&[0.0, 1.0, 2.0, 4.0]),
                    curve(&[3.0, 2.0, 4.0, 5.0]),
                ])
                .check_bounds(true),
        )
        .unwrap();
        let domain = spline.domain();
        assert_relative_eq!(domain[0][0], 1.0);
        assert_relative_eq!(domain[1][1], 4.0);

        let err = spline.check_parameters(&[1.5]).unwrap_err();
        assert_eq!(
            err,
            NurbsError::Domain {
                axis: 1,
                min: 2.0,
                max: 4.0,
                value: Parameter::Missing
            }
        );
        assert!(spline.check_parameters(&[1.5, 2.5]).is_ok());
    }
}
